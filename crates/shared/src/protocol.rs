use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::{
    AccountId, AlertId, BillId, BillStatus, BudgetId, CategoryId, Currency, RewardId, TicketId,
    TransactionId, TxnType, UserId,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// ---------------------------------------------------------------- users

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub two_factor_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwoFactorRequest {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// The demo backend echoes the one-time code back instead of mailing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgotPasswordResponse {
    pub message: String,
    #[serde(default)]
    pub otp: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileImageResponse {
    pub message: String,
    pub profile_image: String,
}

// ---------------------------------------------------------------- accounts

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub bank_name: String,
    pub account_type: String,
    pub balance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    pub bank_name: String,
    pub account_type: String,
    #[serde(default)]
    pub balance: f64,
}

// ---------------------------------------------------------------- transactions

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub amount: f64,
    pub txn_type: TxnType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub merchant: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub txn_date: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub account_id: AccountId,
    pub amount: f64,
    pub txn_type: TxnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txn_date: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub keywords: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryDraft {
    pub name: String,
    #[serde(default)]
    pub keywords: String,
}

// ---------------------------------------------------------------- budgets

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: BudgetId,
    pub month: u32,
    pub year: i32,
    pub category: String,
    pub limit_amount: f64,
    #[serde(default)]
    pub spent_amount: f64,
    #[serde(default)]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetDraft {
    pub month: u32,
    pub year: i32,
    pub category: String,
    pub limit_amount: f64,
}

// ---------------------------------------------------------------- bills

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    pub id: BillId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub biller_name: String,
    pub amount_due: f64,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub status: BillStatus,
    #[serde(default)]
    pub auto_pay: bool,
    #[serde(default)]
    pub overdue: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBill {
    pub biller_name: String,
    pub amount_due: f64,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub auto_pay: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biller_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_due: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BillStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_pay: Option<bool>,
}

// ---------------------------------------------------------------- rewards

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reward {
    pub id: RewardId,
    pub program_name: String,
    pub points_balance: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReward {
    pub program_name: String,
    #[serde(default)]
    pub points_balance: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardUpdate {
    pub points_balance: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemResponse {
    pub message: String,
    pub credited_amount: i64,
    pub remaining_points: i64,
}

// ---------------------------------------------------------------- alerts

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub title: String,
    pub alert_type: String,
    pub message: String,
    pub severity: String,
    pub created_at: NaiveDateTime,
    pub is_read: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UnreadCount {
    pub unread: u64,
}

// ---------------------------------------------------------------- insights

/// One month of the month-keyed object returned by `/insights/monthly-cashflow`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CashflowBucket {
    #[serde(default)]
    pub income: f64,
    #[serde(default)]
    pub expense: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySpend {
    pub category: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantSpend {
    pub merchant: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BurnRate {
    pub burn_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub balance: f64,
    pub accounts: u64,
    pub income: f64,
    pub expenses: f64,
    #[serde(default)]
    pub reward_points: i64,
    #[serde(default)]
    pub spending_distribution: Vec<CategorySpend>,
}

// ---------------------------------------------------------------- support

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub subject: String,
    pub description: String,
    pub category: String,
    pub status: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTicket {
    pub subject: String,
    pub description: String,
    pub category: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_accepts_backend_naive_timestamps() {
        let txn: Transaction = serde_json::from_str(
            r#"{"id":3,"account_id":1,"amount":250.0,"txn_type":"debit","merchant":"Zomato","currency":"INR","category":null,"txn_date":"2026-01-05T10:15:30.123456"}"#,
        )
        .expect("parse");
        assert_eq!(txn.txn_type, TxnType::Debit);
        assert_eq!(txn.merchant.as_deref(), Some("Zomato"));
        assert!(txn.category.is_none());
        assert!(txn.txn_date.is_some());
    }

    #[test]
    fn bill_update_only_sends_set_fields() {
        let update = BillUpdate {
            status: Some(BillStatus::Paid),
            ..BillUpdate::default()
        };
        assert_eq!(
            serde_json::to_string(&update).expect("json"),
            r#"{"status":"paid"}"#
        );
    }

    #[test]
    fn new_transaction_sends_currency_code() {
        let txn = NewTransaction {
            account_id: AccountId(2),
            amount: 99.5,
            txn_type: TxnType::Credit,
            description: None,
            merchant: None,
            currency: Some(Currency::Usd),
            txn_date: None,
        };
        let value = serde_json::to_value(&txn).expect("json");
        assert_eq!(value["currency"], "USD");
        assert_eq!(value["account_id"], 2);
        assert!(value.get("merchant").is_none());
    }
}
