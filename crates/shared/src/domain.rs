use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(AccountId);
id_newtype!(TransactionId);
id_newtype!(CategoryId);
id_newtype!(BudgetId);
id_newtype!(BillId);
id_newtype!(RewardId);
id_newtype!(AlertId);
id_newtype!(TicketId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxnType {
    Credit,
    Debit,
}

impl TxnType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }
}

impl FromStr for TxnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "credit" => Ok(Self::Credit),
            "debit" => Ok(Self::Debit),
            other => Err(format!("unknown transaction type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    #[default]
    Upcoming,
    Paid,
    Overdue,
}

impl BillStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
        }
    }
}

/// Read-state filter accepted by `GET /alerts/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertFilter {
    #[default]
    All,
    Read,
    Unread,
}

impl AlertFilter {
    /// Value of the `status` query parameter; `All` sends none.
    pub fn query_value(self) -> Option<&'static str> {
        match self {
            Self::All => None,
            Self::Read => Some("read"),
            Self::Unread => Some("unread"),
        }
    }
}

impl FromStr for AlertFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "read" => Ok(Self::Read),
            "unread" => Ok(Self::Unread),
            other => Err(format!("unknown alert filter '{other}'")),
        }
    }
}

/// Display currencies. Amounts are stored in INR by the backend and converted
/// with a fixed rate for display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Inr,
    Usd,
    Eur,
    Gbp,
    Jpy,
}

impl Currency {
    pub const ALL: [Currency; 5] = [Self::Inr, Self::Usd, Self::Eur, Self::Gbp, Self::Jpy];

    pub fn code(self) -> &'static str {
        match self {
            Self::Inr => "INR",
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Jpy => "JPY",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Inr => "₹",
            Self::Usd => "$",
            Self::Eur => "€",
            Self::Gbp => "£",
            Self::Jpy => "¥",
        }
    }

    /// Units of this currency per one rupee.
    pub fn rate_from_inr(self) -> f64 {
        match self {
            Self::Inr => 1.0,
            Self::Usd => 0.012,
            Self::Eur => 0.011,
            Self::Gbp => 0.0095,
            Self::Jpy => 1.8,
        }
    }

    pub fn minor_digits(self) -> usize {
        match self {
            Self::Jpy => 0,
            _ => 2,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unsupported currency '{wanted}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_bare_integers() {
        assert_eq!(serde_json::to_string(&AccountId(42)).expect("json"), "42");
        let id: BillId = serde_json::from_str("7").expect("parse");
        assert_eq!(id, BillId(7));
    }

    #[test]
    fn currency_parses_case_insensitively() {
        assert_eq!("usd".parse::<Currency>(), Ok(Currency::Usd));
        assert_eq!(" JPY ".parse::<Currency>(), Ok(Currency::Jpy));
        assert!("btc".parse::<Currency>().is_err());
    }

    #[test]
    fn alert_filter_all_sends_no_query() {
        assert_eq!(AlertFilter::All.query_value(), None);
        assert_eq!(AlertFilter::Unread.query_value(), Some("unread"));
    }

    #[test]
    fn txn_type_wire_format_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&TxnType::Debit).expect("json"),
            "\"debit\""
        );
        assert_eq!("Credit".parse::<TxnType>(), Ok(TxnType::Credit));
    }
}
