use std::collections::BTreeMap;

use shared::protocol::{BurnRate, CashflowBucket, CategorySpend, MerchantSpend};

/// Window the backend averages the burn rate over.
pub const BURN_RATE_WINDOW_DAYS: f64 = 30.0;

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyCashflow {
    /// `YYYY-MM`
    pub month: String,
    pub income: f64,
    pub expenses: f64,
}

impl MonthlyCashflow {
    pub fn net(&self) -> f64 {
        self.income - self.expenses
    }

    pub fn savings_rate(&self) -> Option<f64> {
        savings_rate(self.income, self.expenses)
    }
}

/// The backend keys cashflow by month; `BTreeMap` keeps `YYYY-MM` keys in
/// chronological order.
pub fn monthly_cashflow(buckets: BTreeMap<String, CashflowBucket>) -> Vec<MonthlyCashflow> {
    buckets
        .into_iter()
        .map(|(month, bucket)| MonthlyCashflow {
            month,
            income: bucket.income,
            expenses: bucket.expense,
        })
        .collect()
}

/// Share of income left after expenses, in percent.
pub fn savings_rate(income: f64, expenses: f64) -> Option<f64> {
    if income <= 0.0 {
        return None;
    }
    Some((income - expenses) / income * 100.0)
}

#[derive(Debug, Clone, Default)]
pub struct Insights {
    pub cashflow: Vec<MonthlyCashflow>,
    pub categories: Vec<CategorySpend>,
    pub merchants: Vec<MerchantSpend>,
    /// Average debit spend per day over the last 30 days.
    pub burn_rate: f64,
}

impl Insights {
    pub fn new(
        cashflow: BTreeMap<String, CashflowBucket>,
        mut categories: Vec<CategorySpend>,
        merchants: Vec<MerchantSpend>,
        burn_rate: BurnRate,
    ) -> Self {
        categories.sort_by(|a, b| b.amount.total_cmp(&a.amount));
        Self {
            cashflow: monthly_cashflow(cashflow),
            categories,
            merchants,
            burn_rate: burn_rate.burn_rate,
        }
    }

    pub fn projected_monthly_spend(&self) -> f64 {
        self.burn_rate * BURN_RATE_WINDOW_DAYS
    }

    pub fn total_income(&self) -> f64 {
        self.cashflow.iter().map(|m| m.income).sum()
    }

    pub fn total_expenses(&self) -> f64 {
        self.cashflow.iter().map(|m| m.expenses).sum()
    }

    pub fn top_category(&self) -> Option<&CategorySpend> {
        self.categories.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(income: f64, expense: f64) -> CashflowBucket {
        CashflowBucket { income, expense }
    }

    #[test]
    fn cashflow_is_sorted_by_month() {
        let mut raw = BTreeMap::new();
        raw.insert("2026-03".to_string(), bucket(100.0, 40.0));
        raw.insert("2025-12".to_string(), bucket(50.0, 60.0));
        raw.insert("2026-01".to_string(), bucket(0.0, 10.0));

        let months: Vec<String> = monthly_cashflow(raw).into_iter().map(|m| m.month).collect();
        assert_eq!(months, vec!["2025-12", "2026-01", "2026-03"]);
    }

    #[test]
    fn savings_rate_needs_income() {
        assert_eq!(savings_rate(1000.0, 250.0), Some(75.0));
        assert_eq!(savings_rate(1000.0, 1500.0), Some(-50.0));
        assert_eq!(savings_rate(0.0, 10.0), None);
    }

    #[test]
    fn bundle_orders_categories_and_projects_spend() {
        let mut raw = BTreeMap::new();
        raw.insert("2026-01".to_string(), bucket(5000.0, 1200.0));
        raw.insert("2026-02".to_string(), bucket(3000.0, 800.0));

        let insights = Insights::new(
            raw,
            vec![
                CategorySpend {
                    category: "Food".into(),
                    amount: 300.0,
                },
                CategorySpend {
                    category: "Rent".into(),
                    amount: 1500.0,
                },
            ],
            Vec::new(),
            BurnRate { burn_rate: 66.67 },
        );

        assert_eq!(insights.top_category().map(|c| c.category.as_str()), Some("Rent"));
        assert_eq!(insights.total_income(), 8000.0);
        assert_eq!(insights.total_expenses(), 2000.0);
        assert!((insights.projected_monthly_spend() - 2000.1).abs() < 1e-9);
        assert_eq!(insights.cashflow[0].net(), 3800.0);
    }
}
