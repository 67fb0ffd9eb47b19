//! Currency display helpers. The backend keeps every amount in rupees.

use shared::{
    domain::{Currency, TxnType},
    protocol::Transaction,
};

/// Formats rupees the way `en-IN` does: `₹12,34,567.50`.
pub fn format_inr(amount: f64) -> String {
    format_in_currency(amount, Currency::Inr)
}

pub fn convert_from_inr(amount_inr: f64, currency: Currency) -> f64 {
    amount_inr * currency.rate_from_inr()
}

/// Converts a rupee amount to `currency` and formats it.
pub fn format_amount(amount_inr: f64, currency: Currency) -> String {
    format_in_currency(convert_from_inr(amount_inr, currency), currency)
}

/// Formats an amount already expressed in `currency`.
pub fn format_in_currency(amount: f64, currency: Currency) -> String {
    if !amount.is_finite() {
        return amount.to_string();
    }

    let digits = currency.minor_digits();
    let fixed = format!("{:.*}", digits, amount.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (fixed.as_str(), None),
    };

    let grouped = match currency {
        Currency::Inr => group_indian(int_part),
        _ => group_thousands(int_part),
    };

    let is_zero = fixed.chars().all(|c| c == '0' || c == '.');
    let sign = if amount < 0.0 && !is_zero { "-" } else { "" };

    match frac_part {
        Some(frac) => format!("{sign}{}{grouped}.{frac}", currency.symbol()),
        None => format!("{sign}{}{grouped}", currency.symbol()),
    }
}

/// `+₹250.00` for credits and `-₹250.00` for debits.
pub fn signed_amount(txn: &Transaction, currency: Currency) -> String {
    let sign = match txn.txn_type {
        TxnType::Credit => '+',
        TxnType::Debit => '-',
    };
    format!("{sign}{}", format_amount(txn.amount.abs(), currency))
}

/// Recovers a number from formatted text such as `-₹1,23,456.50` or `Rs. 1,250/-`.
/// The number starts at the first digit, or at a `.` right before one unless
/// the `.` is glued to a word (`Rs.500`). A `-` before the number, or before a
/// currency symbol in front of it, makes it negative. Grouping commas are
/// dropped and anything after the number is ignored.
pub fn parse_currency_text(text: &str) -> Option<f64> {
    let chars: Vec<char> = text.chars().collect();
    let start = chars.iter().enumerate().position(|(idx, c)| match c {
        '0'..='9' => true,
        '.' => {
            let digit_follows = chars.get(idx + 1).is_some_and(char::is_ascii_digit);
            let after_word = idx > 0 && chars[idx - 1].is_alphabetic();
            digit_follows && !after_word
        }
        _ => false,
    })?;
    let negative = chars[..start]
        .iter()
        .rev()
        .find(|c| !is_currency_symbol(**c))
        == Some(&'-');

    let mut number = String::from(if negative { "-" } else { "" });
    for c in &chars[start..] {
        match c {
            '0'..='9' | '.' => number.push(*c),
            ',' => {}
            _ => break,
        }
    }

    if number.matches('.').count() > 1 {
        return None;
    }
    number.parse().ok()
}

fn is_currency_symbol(c: char) -> bool {
    !(c.is_alphanumeric() || c.is_whitespace() || c == '-')
}

fn group_indian(int_part: &str) -> String {
    if int_part.len() <= 3 {
        return int_part.to_string();
    }
    let (head, tail) = int_part.split_at(int_part.len() - 3);
    let mut pairs = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        pairs.push(&head[start..end]);
        end = start;
    }
    pairs.reverse();
    format!("{},{tail}", pairs.join(","))
}

fn group_thousands(int_part: &str) -> String {
    let mut groups = Vec::new();
    let mut end = int_part.len();
    while end > 0 {
        let start = end.saturating_sub(3);
        groups.push(&int_part[start..end]);
        end = start;
    }
    groups.reverse();
    groups.join(",")
}

#[cfg(test)]
mod tests {
    use shared::domain::{AccountId, TransactionId};

    use super::*;

    #[test]
    fn groups_rupees_in_lakhs_and_crores() {
        assert_eq!(format_inr(0.0), "₹0.00");
        assert_eq!(format_inr(999.0), "₹999.00");
        assert_eq!(format_inr(1000.0), "₹1,000.00");
        assert_eq!(format_inr(100000.0), "₹1,00,000.00");
        assert_eq!(format_inr(1234567.5), "₹12,34,567.50");
        assert_eq!(format_inr(123456789.0), "₹12,34,56,789.00");
    }

    #[test]
    fn negative_rupees_keep_sign_before_symbol() {
        assert_eq!(format_inr(-500.0), "-₹500.00");
        assert_eq!(format_inr(-0.001), "₹0.00");
    }

    #[test]
    fn converts_for_other_currencies() {
        assert_eq!(format_amount(100000.0, Currency::Usd), "$1,200.00");
        assert_eq!(format_amount(1000.0, Currency::Jpy), "¥1,800");
        assert_eq!(format_amount(2500.0, Currency::Inr), "₹2,500.00");
    }

    #[test]
    fn signs_follow_transaction_type() {
        let mut txn = Transaction {
            id: TransactionId(1),
            account_id: AccountId(1),
            amount: 250.0,
            txn_type: TxnType::Debit,
            description: None,
            merchant: None,
            currency: None,
            category: None,
            txn_date: None,
        };
        assert_eq!(signed_amount(&txn, Currency::Inr), "-₹250.00");
        txn.txn_type = TxnType::Credit;
        assert_eq!(signed_amount(&txn, Currency::Inr), "+₹250.00");
    }

    #[test]
    fn parses_formatted_text_back() {
        assert_eq!(parse_currency_text("₹1,23,456.50"), Some(123456.5));
        assert_eq!(parse_currency_text("-$1,200.00"), Some(-1200.0));
        assert_eq!(parse_currency_text(".75"), Some(0.75));
        assert_eq!(parse_currency_text("n/a"), None);
    }

    #[test]
    fn rupee_abbreviation_is_not_a_decimal_point() {
        assert_eq!(parse_currency_text("Rs.500"), Some(500.0));
        assert_eq!(parse_currency_text("Rs. 1,250"), Some(1250.0));
        assert_eq!(parse_currency_text("Rs 1,250/-"), Some(1250.0));
        assert_eq!(parse_currency_text("INR 99.50"), Some(99.5));
    }

    #[test]
    fn ambiguous_decimal_points_are_rejected() {
        assert_eq!(parse_currency_text("1.250.00"), None);
        assert_eq!(parse_currency_text("Rs."), None);
    }
}
