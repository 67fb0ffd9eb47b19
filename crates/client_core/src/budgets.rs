use shared::{
    domain::BudgetId,
    protocol::{Budget, BudgetDraft},
};

use crate::{error::ValidationError, validation};

pub const EXCEEDED_WARNING: &str = "Budget limit exceeded";
pub const WITHIN_LIMIT: &str = "Within limit";
pub const MIN_BUDGET_YEAR: i32 = 2000;

/// Spend against one category budget, as shown on a budget card.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetProgress {
    pub id: BudgetId,
    pub category: String,
    pub month: u32,
    pub year: i32,
    pub limit: f64,
    pub spent: f64,
    /// Clamped to 0..=100 for the progress bar.
    pub percentage: f64,
    pub exceeded: bool,
    pub warning: &'static str,
}

impl BudgetProgress {
    /// The warning is recomputed from the amounts; whatever text the backend
    /// attached is ignored.
    pub fn from_budget(budget: &Budget) -> Self {
        let spent = budget.spent_amount.max(0.0);
        let limit = budget.limit_amount;
        let exceeded = spent > limit;

        Self {
            id: budget.id,
            category: budget.category.clone(),
            month: budget.month,
            year: budget.year,
            limit,
            spent,
            percentage: percentage_of_limit(spent, limit),
            exceeded,
            warning: if exceeded {
                EXCEEDED_WARNING
            } else {
                WITHIN_LIMIT
            },
        }
    }

    pub fn remaining(&self) -> f64 {
        (self.limit - self.spent).max(0.0)
    }
}

pub fn percentage_of_limit(spent: f64, limit: f64) -> f64 {
    if limit <= 0.0 {
        return if spent > 0.0 { 100.0 } else { 0.0 };
    }
    (spent / limit * 100.0).clamp(0.0, 100.0)
}

pub fn progress_for(budgets: &[Budget]) -> Vec<BudgetProgress> {
    budgets.iter().map(BudgetProgress::from_budget).collect()
}

/// `(category, spent)` slices for the spending pie; empty slices are dropped.
pub fn spending_distribution(budgets: &[Budget]) -> Vec<(String, f64)> {
    budgets
        .iter()
        .filter(|b| b.spent_amount > 0.0)
        .map(|b| (b.category.clone(), b.spent_amount))
        .collect()
}

pub fn validate_budget(draft: &BudgetDraft) -> Result<(), ValidationError> {
    if !(1..=12).contains(&draft.month) {
        return Err(ValidationError::new("month", "must be between 1 and 12"));
    }
    if draft.year < MIN_BUDGET_YEAR {
        return Err(ValidationError::new(
            "year",
            format!("must be {MIN_BUDGET_YEAR} or later"),
        ));
    }
    validation::require("category", &draft.category)?;
    validation::require_positive("limit_amount", draft.limit_amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget(spent: f64, limit: f64) -> Budget {
        Budget {
            id: BudgetId(1),
            month: 2,
            year: 2026,
            category: "Food".into(),
            limit_amount: limit,
            spent_amount: spent,
            warning: Some("stale text".into()),
        }
    }

    #[test]
    fn percentage_is_clamped_to_one_hundred() {
        let progress = BudgetProgress::from_budget(&budget(7500.0, 5000.0));
        assert_eq!(progress.percentage, 100.0);
        assert!(progress.exceeded);
        assert_eq!(progress.warning, EXCEEDED_WARNING);
        assert_eq!(progress.remaining(), 0.0);
    }

    #[test]
    fn spending_at_limit_is_within_limit() {
        let progress = BudgetProgress::from_budget(&budget(5000.0, 5000.0));
        assert_eq!(progress.percentage, 100.0);
        assert!(!progress.exceeded);
        assert_eq!(progress.warning, WITHIN_LIMIT);
    }

    #[test]
    fn partial_spend_is_proportional() {
        let progress = BudgetProgress::from_budget(&budget(1250.0, 5000.0));
        assert_eq!(progress.percentage, 25.0);
        assert_eq!(progress.remaining(), 3750.0);
    }

    #[test]
    fn zero_limit_does_not_divide_by_zero() {
        assert_eq!(percentage_of_limit(0.0, 0.0), 0.0);
        assert_eq!(percentage_of_limit(10.0, 0.0), 100.0);
    }

    #[test]
    fn distribution_skips_untouched_budgets() {
        let slices = spending_distribution(&[budget(0.0, 100.0), budget(40.0, 100.0)]);
        assert_eq!(slices, vec![("Food".to_string(), 40.0)]);
    }

    #[test]
    fn draft_with_missing_fields_is_rejected() {
        let mut draft = BudgetDraft {
            month: 13,
            year: 2026,
            category: "Travel".into(),
            limit_amount: 1000.0,
        };
        assert_eq!(validate_budget(&draft).expect_err("month").field, "month");
        draft.month = 4;
        draft.category = String::new();
        assert_eq!(validate_budget(&draft).expect_err("category").field, "category");
        draft.category = "Travel".into();
        draft.limit_amount = 0.0;
        assert_eq!(
            validate_budget(&draft).expect_err("limit").field,
            "limit_amount"
        );
        draft.limit_amount = 1000.0;
        assert!(validate_budget(&draft).is_ok());
    }
}
