use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use shared::{
    domain::BillStatus,
    protocol::{Bill, NewBill},
};

use crate::{error::ValidationError, validation};

/// Unpaid bills due within this many days are flagged for a reminder.
pub const DUE_SOON_DAYS: i64 = 3;

/// Paid stays paid; otherwise a bill past its due date is overdue.
pub fn effective_status(due_date: NaiveDate, stored: BillStatus, today: NaiveDate) -> BillStatus {
    if stored == BillStatus::Paid {
        BillStatus::Paid
    } else if today > due_date {
        BillStatus::Overdue
    } else {
        BillStatus::Upcoming
    }
}

pub fn is_due_soon(bill: &Bill, today: NaiveDate) -> bool {
    effective_status(bill.due_date, bill.status, today) != BillStatus::Paid
        && bill.due_date <= today + Duration::days(DUE_SOON_DAYS)
}

/// Status sent when the user flips the paid toggle.
pub fn toggled_status(current: BillStatus) -> BillStatus {
    match current {
        BillStatus::Paid => BillStatus::Upcoming,
        BillStatus::Upcoming | BillStatus::Overdue => BillStatus::Paid,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BillFilter {
    #[default]
    All,
    Upcoming,
    Paid,
    Overdue,
}

impl BillFilter {
    pub fn matches(self, bill: &Bill, today: NaiveDate) -> bool {
        let status = effective_status(bill.due_date, bill.status, today);
        match self {
            Self::All => true,
            Self::Upcoming => status == BillStatus::Upcoming,
            Self::Paid => status == BillStatus::Paid,
            Self::Overdue => status == BillStatus::Overdue,
        }
    }
}

impl FromStr for BillFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "upcoming" => Ok(Self::Upcoming),
            "paid" => Ok(Self::Paid),
            "overdue" => Ok(Self::Overdue),
            other => Err(format!("unknown bill filter '{other}'")),
        }
    }
}

pub fn filter_bills(bills: &[Bill], filter: BillFilter, today: NaiveDate) -> Vec<&Bill> {
    bills
        .iter()
        .filter(|bill| filter.matches(bill, today))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BillTotals {
    pub count: usize,
    pub unpaid_total: f64,
    pub overdue_count: usize,
    pub auto_pay_count: usize,
}

impl BillTotals {
    pub fn compute(bills: &[Bill], today: NaiveDate) -> Self {
        bills.iter().fold(Self::default(), |mut totals, bill| {
            let status = effective_status(bill.due_date, bill.status, today);
            totals.count += 1;
            if status != BillStatus::Paid {
                totals.unpaid_total += bill.amount_due;
            }
            if status == BillStatus::Overdue {
                totals.overdue_count += 1;
            }
            if bill.auto_pay {
                totals.auto_pay_count += 1;
            }
            totals
        })
    }
}

pub fn validate_bill(bill: &NewBill) -> Result<(), ValidationError> {
    validation::require("biller_name", &bill.biller_name)?;
    validation::require_positive("amount_due", bill.amount_due)
}

#[cfg(test)]
mod tests {
    use shared::domain::BillId;

    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).expect("date")
    }

    fn bill(id: i64, due: NaiveDate, status: BillStatus, amount: f64) -> Bill {
        Bill {
            id: BillId(id),
            user_id: None,
            biller_name: format!("Biller {id}"),
            amount_due: amount,
            due_date: due,
            status,
            auto_pay: id % 2 == 0,
            overdue: false,
            created_at: None,
        }
    }

    #[test]
    fn status_derives_from_due_date() {
        assert_eq!(
            effective_status(day(10), BillStatus::Upcoming, day(10)),
            BillStatus::Upcoming
        );
        assert_eq!(
            effective_status(day(10), BillStatus::Upcoming, day(11)),
            BillStatus::Overdue
        );
        assert_eq!(
            effective_status(day(1), BillStatus::Paid, day(20)),
            BillStatus::Paid
        );
    }

    #[test]
    fn due_soon_covers_three_days_and_overdue() {
        let today = day(10);
        assert!(is_due_soon(&bill(1, day(13), BillStatus::Upcoming, 1.0), today));
        assert!(!is_due_soon(&bill(1, day(14), BillStatus::Upcoming, 1.0), today));
        assert!(is_due_soon(&bill(1, day(2), BillStatus::Upcoming, 1.0), today));
        assert!(!is_due_soon(&bill(1, day(11), BillStatus::Paid, 1.0), today));
    }

    #[test]
    fn toggle_flips_between_paid_and_upcoming() {
        assert_eq!(toggled_status(BillStatus::Paid), BillStatus::Upcoming);
        assert_eq!(toggled_status(BillStatus::Overdue), BillStatus::Paid);
    }

    #[test]
    fn filter_and_totals_use_effective_status() {
        let today = day(15);
        let bills = vec![
            bill(1, day(10), BillStatus::Upcoming, 500.0),
            bill(2, day(20), BillStatus::Upcoming, 300.0),
            bill(3, day(5), BillStatus::Paid, 900.0),
        ];

        let overdue = filter_bills(&bills, BillFilter::Overdue, today);
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id, BillId(1));

        let totals = BillTotals::compute(&bills, today);
        assert_eq!(totals.count, 3);
        assert_eq!(totals.unpaid_total, 800.0);
        assert_eq!(totals.overdue_count, 1);
        assert_eq!(totals.auto_pay_count, 1);
    }

    #[test]
    fn new_bill_needs_name_and_amount() {
        let mut draft = NewBill {
            biller_name: "Electricity".into(),
            amount_due: 0.0,
            due_date: day(1),
            auto_pay: false,
        };
        assert_eq!(validate_bill(&draft).expect_err("amount").field, "amount_due");
        draft.amount_due = 1200.0;
        assert!(validate_bill(&draft).is_ok());
    }
}
