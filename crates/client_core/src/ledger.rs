use std::{collections::HashMap, io::Read};

use chrono::{NaiveDate, NaiveDateTime};
use shared::{
    domain::TxnType,
    protocol::{Account, NewTransaction, Transaction},
};

use crate::{
    error::{ClientError, ValidationError},
    validation,
};

pub const RECENT_TRANSACTIONS: usize = 5;
/// Columns a CSV upload must carry; the backend accepts anything else as optional.
pub const REQUIRED_CSV_COLUMNS: [&str; 2] = ["amount", "txn_type"];

/// Newest first; undated entries sort last.
pub fn recent_transactions(transactions: &[Transaction], limit: usize) -> Vec<Transaction> {
    let mut sorted = transactions.to_vec();
    sorted.sort_by(|a, b| b.txn_date.cmp(&a.txn_date));
    sorted.truncate(limit);
    sorted
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AccountsOverview {
    pub total_accounts: usize,
    pub total_balance: f64,
    pub positive_accounts: usize,
}

impl AccountsOverview {
    pub fn from_accounts(accounts: &[Account]) -> Self {
        Self {
            total_accounts: accounts.len(),
            total_balance: accounts.iter().map(|a| a.balance).sum(),
            positive_accounts: accounts.iter().filter(|a| a.balance > 0.0).count(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CashTotals {
    pub credits: f64,
    pub debits: f64,
}

impl CashTotals {
    pub fn add(&mut self, txn_type: TxnType, amount: f64) {
        match txn_type {
            TxnType::Credit => self.credits += amount.abs(),
            TxnType::Debit => self.debits += amount.abs(),
        }
    }

    pub fn net(&self) -> f64 {
        self.credits - self.debits
    }

    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let mut totals = Self::default();
        for txn in transactions {
            totals.add(txn.txn_type, txn.amount);
        }
        totals
    }
}

pub fn validate_transaction(txn: &NewTransaction) -> Result<(), ValidationError> {
    validation::require_positive("amount", txn.amount)
}

/// Accepts `YYYY-MM-DD`, or a date and time separated by `T` or a space.
pub fn parse_txn_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

#[derive(Debug, Clone, PartialEq)]
pub struct CsvRow {
    pub line: usize,
    pub account_id: Option<i64>,
    pub amount: f64,
    pub txn_type: TxnType,
    pub txn_date: Option<NaiveDateTime>,
    pub description: Option<String>,
    pub merchant: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRowError {
    pub line: usize,
    pub message: String,
}

/// Local dry run of a transactions CSV before it is uploaded. Every row is
/// checked and all problems are reported together.
#[derive(Debug, Clone, Default)]
pub struct CsvImportPreview {
    pub rows: Vec<CsvRow>,
    pub errors: Vec<CsvRowError>,
}

impl CsvImportPreview {
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, ClientError> {
        let mut raw = Vec::new();
        reader
            .read_to_end(&mut raw)
            .map_err(|err| ClientError::CsvImport(format!("unreadable file: {err}")))?;
        let lines = LineIndex::new(&raw);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(raw.as_slice());

        let headers = reader
            .headers()
            .map_err(|err| ClientError::CsvImport(format!("unreadable header: {err}")))?;
        let columns: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.to_ascii_lowercase(), idx))
            .collect();

        let missing: Vec<&str> = REQUIRED_CSV_COLUMNS
            .iter()
            .copied()
            .filter(|name| !columns.contains_key(*name))
            .collect();
        if !missing.is_empty() {
            return Err(ClientError::CsvImport(format!(
                "missing column(s): {}",
                missing.join(", ")
            )));
        }

        let mut preview = Self::default();
        for (idx, record) in reader.records().enumerate() {
            // line 1 is the header
            let fallback_line = idx + 2;
            let record = match record {
                Ok(record) => record,
                Err(err) => {
                    preview.errors.push(CsvRowError {
                        line: err
                            .position()
                            .map_or(fallback_line, |pos| lines.line_of(pos)),
                        message: err.to_string(),
                    });
                    continue;
                }
            };
            let line = record
                .position()
                .map_or(fallback_line, |pos| lines.line_of(pos));

            let field = |name: &str| {
                columns
                    .get(name)
                    .and_then(|idx| record.get(*idx))
                    .filter(|value| !value.is_empty())
            };

            match parse_row(line, field) {
                Ok(row) => preview.rows.push(row),
                Err(message) => preview.errors.push(CsvRowError { line, message }),
            }
        }

        Ok(preview)
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn totals(&self) -> CashTotals {
        let mut totals = CashTotals::default();
        for row in &self.rows {
            totals.add(row.txn_type, row.amount);
        }
        totals
    }

    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| format!("line {}: {}", e.line, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Maps record offsets to 1-based lines of the file as an editor shows them.
/// The csv reader skips blank lines without counting them.
struct LineIndex<'a> {
    raw: &'a [u8],
    newlines: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(raw: &'a [u8]) -> Self {
        let newlines = raw
            .iter()
            .enumerate()
            .filter(|(_, byte)| **byte == b'\n')
            .map(|(idx, _)| idx)
            .collect();
        Self { raw, newlines }
    }

    fn line_of(&self, pos: &csv::Position) -> usize {
        // a record position can sit on the line breaks in front of it
        let mut start = pos.byte() as usize;
        while matches!(self.raw.get(start), Some(b'\r' | b'\n')) {
            start += 1;
        }
        1 + self.newlines.partition_point(|&offset| offset < start)
    }
}

fn parse_row<'r>(line: usize, field: impl Fn(&str) -> Option<&'r str>) -> Result<CsvRow, String> {
    let amount_raw = field("amount").ok_or("missing amount")?;
    let amount: f64 = amount_raw
        .parse()
        .map_err(|_| format!("amount '{amount_raw}' is not a number"))?;
    if !amount.is_finite() {
        return Err(format!("amount '{amount_raw}' is not a number"));
    }

    let txn_type = field("txn_type")
        .ok_or("missing txn_type")?
        .parse::<TxnType>()?;

    let txn_date = match field("txn_date") {
        Some(raw) => Some(parse_txn_date(raw).ok_or(format!("txn_date '{raw}' is not an ISO date"))?),
        None => None,
    };

    let account_id = match field("account_id") {
        Some(raw) => Some(
            raw.parse::<i64>()
                .map_err(|_| format!("account_id '{raw}' is not an integer"))?,
        ),
        None => None,
    };

    Ok(CsvRow {
        line,
        account_id,
        amount,
        txn_type,
        txn_date,
        description: field("description").map(str::to_string),
        merchant: field("merchant").map(str::to_string),
        category: field("category").map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use shared::domain::{AccountId, TransactionId};

    use super::*;

    fn txn(id: i64, date: Option<&str>, txn_type: TxnType, amount: f64) -> Transaction {
        Transaction {
            id: TransactionId(id),
            account_id: AccountId(1),
            amount,
            txn_type,
            description: None,
            merchant: None,
            currency: None,
            category: None,
            txn_date: date.and_then(parse_txn_date),
        }
    }

    #[test]
    fn recent_sorts_newest_first_and_truncates() {
        let txns = vec![
            txn(1, Some("2026-01-01"), TxnType::Debit, 1.0),
            txn(2, None, TxnType::Debit, 1.0),
            txn(3, Some("2026-03-01"), TxnType::Debit, 1.0),
            txn(4, Some("2026-02-01T09:30:00"), TxnType::Debit, 1.0),
        ];
        let ids: Vec<i64> = recent_transactions(&txns, 3).iter().map(|t| t.id.0).collect();
        assert_eq!(ids, vec![3, 4, 1]);
    }

    #[test]
    fn overview_counts_positive_balances() {
        let accounts = vec![
            Account {
                id: AccountId(1),
                bank_name: "SBI".into(),
                account_type: "savings".into(),
                balance: 1500.0,
            },
            Account {
                id: AccountId(2),
                bank_name: "HDFC".into(),
                account_type: "checking".into(),
                balance: -200.0,
            },
        ];
        let overview = AccountsOverview::from_accounts(&accounts);
        assert_eq!(overview.total_accounts, 2);
        assert_eq!(overview.total_balance, 1300.0);
        assert_eq!(overview.positive_accounts, 1);
    }

    #[test]
    fn totals_split_credits_and_debits() {
        let totals = CashTotals::from_transactions(&[
            txn(1, None, TxnType::Credit, 5000.0),
            txn(2, None, TxnType::Debit, 1200.0),
        ]);
        assert_eq!(totals.credits, 5000.0);
        assert_eq!(totals.debits, 1200.0);
        assert_eq!(totals.net(), 3800.0);
    }

    #[test]
    fn parses_iso_dates_and_datetimes() {
        assert!(parse_txn_date("2026-01-05").is_some());
        assert!(parse_txn_date("2026-01-05T10:15:00").is_some());
        assert!(parse_txn_date("2026-01-05 10:15:00.250").is_some());
        assert!(parse_txn_date("05/01/2026").is_none());
    }

    #[test]
    fn preview_collects_rows_and_errors() {
        let csv = "\
txn_date,description,amount,txn_type,merchant,category
2026-01-05,Lunch,250,debit,Zomato,Food
2026-01-06,Salary,50000,Credit,,
2026-01-07,Refund,abc,credit,Amazon,
bad-date,Coffee,90,debit,CCD,Food

2026-01-09,Gift,100,transfer,,
";
        let preview = CsvImportPreview::from_reader(csv.as_bytes()).expect("preview");
        assert_eq!(preview.rows.len(), 2);
        assert_eq!(preview.rows[0].merchant.as_deref(), Some("Zomato"));
        assert_eq!(preview.rows[1].merchant, None);
        assert_eq!(preview.rows[1].txn_type, TxnType::Credit);

        let lines: Vec<usize> = preview.errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![4, 5, 7]);
        assert!(preview.errors[0].message.contains("not a number"));
        assert!(preview.errors[1].message.contains("ISO date"));
        assert!(preview.errors[2].message.contains("unknown transaction type"));
        assert!(!preview.is_clean());

        let totals = preview.totals();
        assert_eq!(totals.debits, 250.0);
        assert_eq!(totals.credits, 50000.0);
    }

    #[test]
    fn line_numbers_count_blank_and_crlf_lines() {
        let csv = "amount,txn_type\r\n\r\n\r\n10,debit\r\nx,debit\r\n\r\n20,bogus\r\n";
        let preview = CsvImportPreview::from_reader(csv.as_bytes()).expect("preview");
        assert_eq!(preview.rows.len(), 1);
        let lines: Vec<usize> = preview.errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![5, 7]);
        assert!(preview.error_summary().starts_with("line 5: "));
    }

    #[test]
    fn preview_requires_amount_and_type_columns() {
        let err = CsvImportPreview::from_reader("date,description\n2026-01-01,x\n".as_bytes())
            .expect_err("missing columns");
        assert!(err.to_string().contains("amount, txn_type"));
    }

    #[test]
    fn non_positive_amount_is_rejected() {
        let mut draft = NewTransaction {
            account_id: AccountId(1),
            amount: 0.0,
            txn_type: TxnType::Debit,
            description: None,
            merchant: None,
            currency: None,
            txn_date: None,
        };
        assert_eq!(validate_transaction(&draft).expect_err("amount").field, "amount");
        draft.amount = 10.0;
        assert!(validate_transaction(&draft).is_ok());
    }
}
