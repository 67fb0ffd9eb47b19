use chrono::NaiveDate;
use client_core::{
    bills::{self, BillTotals},
    budgets::BudgetProgress,
    format::{format_amount, signed_amount},
    insights::Insights,
    ledger::{AccountsOverview, CashTotals},
    rewards::{RedeemQuote, RewardLevel, MIN_REDEEM_POINTS},
    Dashboard,
};
use shared::{
    domain::Currency,
    protocol::{Account, Alert, Bill, Category, Reward, Ticket, Transaction, UserProfile},
};

const BAR_WIDTH: usize = 20;

/// Left-aligned text table sized to its widest cell.
struct Table {
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl Table {
    fn new(headers: Vec<&'static str>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    fn print(&self) {
        if self.rows.is_empty() {
            println!("(none)");
            return;
        }
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (idx, cell) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(idx) {
                    *width = (*width).max(cell.chars().count());
                }
            }
        }

        let line = |cells: Vec<&str>| {
            let padded: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{cell:<width$}"))
                .collect();
            println!("{}", padded.join("  ").trim_end());
        };
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        line(self.headers.clone());
        line(rule.iter().map(String::as_str).collect());
        for row in &self.rows {
            line(row.iter().map(String::as_str).collect());
        }
    }
}

fn progress_bar(percentage: f64) -> String {
    let filled = ((percentage / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

fn date_of(txn: &Transaction) -> String {
    txn.txn_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".into())
}

pub fn profile(user: &UserProfile) {
    println!("{} <{}>", user.name, user.email);
    println!("  id:          {}", user.id);
    println!("  phone:       {}", user.phone.as_deref().unwrap_or("-"));
    println!(
        "  two-factor:  {}",
        if user.two_factor_enabled { "on" } else { "off" }
    );
    if let Some(image) = &user.profile_image {
        println!("  avatar:      {image}");
    }
}

pub fn accounts(accounts: &[Account], currency: Currency) {
    let mut table = Table::new(vec!["ID", "BANK", "TYPE", "BALANCE"]);
    for account in accounts {
        table.row(vec![
            account.id.to_string(),
            account.bank_name.clone(),
            account.account_type.clone(),
            format_amount(account.balance, currency),
        ]);
    }
    table.print();

    let overview = AccountsOverview::from_accounts(accounts);
    println!(
        "\n{} accounts ({} in credit), total {}",
        overview.total_accounts,
        overview.positive_accounts,
        format_amount(overview.total_balance, currency)
    );
}

pub fn transactions(txns: &[Transaction], currency: Currency) {
    let mut table = Table::new(vec![
        "ID", "DATE", "ACCOUNT", "AMOUNT", "MERCHANT", "CATEGORY", "DESCRIPTION",
    ]);
    for txn in txns {
        table.row(vec![
            txn.id.to_string(),
            date_of(txn),
            txn.account_id.to_string(),
            signed_amount(txn, currency),
            txn.merchant.clone().unwrap_or_default(),
            txn.category.clone().unwrap_or_default(),
            txn.description.clone().unwrap_or_default(),
        ]);
    }
    table.print();
}

pub fn cash_totals(totals: &CashTotals, currency: Currency) {
    println!(
        "in {}  out {}  net {}",
        format_amount(totals.credits, currency),
        format_amount(totals.debits, currency),
        format_amount(totals.net(), currency)
    );
}

pub fn categories(categories: &[Category]) {
    let mut table = Table::new(vec!["ID", "NAME", "KEYWORDS"]);
    for category in categories {
        table.row(vec![
            category.id.to_string(),
            category.name.clone(),
            category.keywords.clone(),
        ]);
    }
    table.print();
}

pub fn budgets(progress: &[BudgetProgress], currency: Currency) {
    if progress.is_empty() {
        println!("(no budgets)");
        return;
    }
    for budget in progress {
        println!(
            "#{} {} {:02}/{}  {} {:>5.1}%  {} of {}  {}",
            budget.id,
            budget.category,
            budget.month,
            budget.year,
            progress_bar(budget.percentage),
            budget.percentage,
            format_amount(budget.spent, currency),
            format_amount(budget.limit, currency),
            budget.warning,
        );
    }
}

pub fn bills(bills_list: &[&Bill], all: &[Bill], today: NaiveDate, currency: Currency) {
    let mut table = Table::new(vec!["ID", "BILLER", "AMOUNT", "DUE", "STATUS", "AUTO-PAY", ""]);
    for bill in bills_list {
        let status = bills::effective_status(bill.due_date, bill.status, today);
        table.row(vec![
            bill.id.to_string(),
            bill.biller_name.clone(),
            format_amount(bill.amount_due, currency),
            bill.due_date.to_string(),
            status.as_str().to_string(),
            if bill.auto_pay { "on" } else { "off" }.to_string(),
            if bills::is_due_soon(bill, today) {
                "due soon".to_string()
            } else {
                String::new()
            },
        ]);
    }
    table.print();

    let totals = BillTotals::compute(all, today);
    println!(
        "\n{} bills, {} unpaid, {} overdue, {} on auto-pay",
        totals.count,
        format_amount(totals.unpaid_total, currency),
        totals.overdue_count,
        totals.auto_pay_count
    );
}

pub fn reward(reward: Option<&Reward>, currency: Currency) {
    let points = reward.map_or(0, |r| r.points_balance);
    let quote = RedeemQuote::for_points(points);
    println!("Points:    {points}");
    println!("Level:     {}", RewardLevel::for_points(points));
    println!(
        "Worth:     {} ({} points redeemable)",
        format_amount(quote.value_rupees as f64, currency),
        quote.redeemable_points
    );
    if !quote.can_redeem() {
        println!("Earn at least {} points to redeem.", MIN_REDEEM_POINTS);
    }
}

pub fn alerts(alerts: &[Alert]) {
    let mut table = Table::new(vec!["ID", "WHEN", "SEVERITY", "TITLE", "MESSAGE", "READ"]);
    for alert in alerts {
        table.row(vec![
            alert.id.to_string(),
            alert.created_at.format("%Y-%m-%d %H:%M").to_string(),
            alert.severity.clone(),
            alert.title.clone(),
            alert.message.clone(),
            if alert.is_read { "yes" } else { "no" }.to_string(),
        ]);
    }
    table.print();
}

pub fn insights(insights: &Insights, currency: Currency) {
    println!("Monthly cashflow");
    let mut table = Table::new(vec!["MONTH", "INCOME", "EXPENSES", "NET", "SAVED"]);
    for month in &insights.cashflow {
        table.row(vec![
            month.month.clone(),
            format_amount(month.income, currency),
            format_amount(month.expenses, currency),
            format_amount(month.net(), currency),
            month
                .savings_rate()
                .map_or_else(|| "-".to_string(), |rate| format!("{rate:.1}%")),
        ]);
    }
    table.print();
    let (income, expenses) = (insights.total_income(), insights.total_expenses());
    println!(
        "Total: {} in, {} out, {} net",
        format_amount(income, currency),
        format_amount(expenses, currency),
        format_amount(income - expenses, currency)
    );

    println!("\nSpending by category");
    let mut table = Table::new(vec!["CATEGORY", "AMOUNT"]);
    for spend in &insights.categories {
        table.row(vec![spend.category.clone(), format_amount(spend.amount, currency)]);
    }
    table.print();
    if let Some(top) = insights.top_category() {
        println!("Most spent on {} ({})", top.category, format_amount(top.amount, currency));
    }

    println!("\nTop merchants");
    let mut table = Table::new(vec!["MERCHANT", "AMOUNT"]);
    for spend in &insights.merchants {
        table.row(vec![spend.merchant.clone(), format_amount(spend.amount, currency)]);
    }
    table.print();

    println!(
        "\nBurn rate {} per day, about {} per month",
        format_amount(insights.burn_rate, currency),
        format_amount(insights.projected_monthly_spend(), currency)
    );
}

pub fn dashboard(dashboard: &Dashboard, unread_alerts: u64, currency: Currency) {
    let summary = &dashboard.summary;
    println!("Balance:   {}", format_amount(summary.balance, currency));
    println!("Accounts:  {}", summary.accounts);
    println!("Income:    {}", format_amount(summary.income, currency));
    println!("Expenses:  {}", format_amount(summary.expenses, currency));
    println!(
        "Rewards:   {} points ({})",
        summary.reward_points,
        RewardLevel::for_points(summary.reward_points)
    );
    println!("Alerts:    {unread_alerts} unread");

    if !summary.spending_distribution.is_empty() {
        println!("\nSpending");
        let total: f64 = summary.spending_distribution.iter().map(|s| s.amount).sum();
        for slice in &summary.spending_distribution {
            let share = if total > 0.0 { slice.amount / total * 100.0 } else { 0.0 };
            println!(
                "  {:<14} {} {:>5.1}%",
                slice.category,
                progress_bar(share),
                share
            );
        }
    }

    println!("\nRecent transactions");
    transactions(&dashboard.recent, currency);
}

pub fn tickets(tickets: &[Ticket]) {
    let mut table = Table::new(vec!["ID", "OPENED", "STATUS", "CATEGORY", "SUBJECT"]);
    for ticket in tickets {
        table.row(vec![
            ticket.id.to_string(),
            ticket.created_at.format("%Y-%m-%d").to_string(),
            ticket.status.clone(),
            ticket.category.clone(),
            ticket.subject.clone(),
        ]);
    }
    table.print();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_bar_is_clamped() {
        assert_eq!(progress_bar(0.0), format!("[{}]", "-".repeat(BAR_WIDTH)));
        assert_eq!(progress_bar(50.0), format!("[{}{}]", "#".repeat(10), "-".repeat(10)));
        assert_eq!(progress_bar(250.0), format!("[{}]", "#".repeat(BAR_WIDTH)));
    }
}
