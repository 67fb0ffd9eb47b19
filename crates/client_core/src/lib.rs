use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
    time::Duration,
};

use chrono::Utc;
use reqwest::{
    multipart::{Form, Part},
    Client, Method, RequestBuilder,
};
use serde::de::DeserializeOwned;
use shared::{
    domain::{AccountId, AlertFilter, AlertId, BillId, BudgetId, CategoryId, RewardId, TransactionId},
    protocol::{
        Account, Alert, Bill, BillUpdate, Budget, BudgetDraft, BurnRate, CashflowBucket, Category,
        CategoryDraft, CategorySpend, ChangePasswordRequest, DashboardSummary,
        ForgotPasswordRequest, ForgotPasswordResponse, MerchantSpend, MessageResponse, NewAccount,
        NewBill, NewReward, NewTicket, NewTransaction, ProfileImageResponse, RedeemResponse,
        ResetPasswordRequest, Reward, RewardUpdate, Ticket, TokenResponse, Transaction,
        TwoFactorRequest, UnreadCount, UpdateProfileRequest, UserProfile, VerifyOtpRequest,
    },
};
use tracing::{debug, info, warn};

pub mod assistant;
pub mod bills;
pub mod budgets;
pub mod config;
pub mod error;
pub mod format;
pub mod insights;
pub mod ledger;
pub mod rewards;
pub mod session;
pub mod transport;
pub mod validation;

pub use config::Settings;
pub use error::{ClientError, Result, ValidationError};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore};

use budgets::BudgetProgress;
use insights::Insights;
use ledger::CsvImportPreview;
use rewards::RedeemQuote;
use validation::RegistrationForm;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Pdf => "pdf",
        }
    }

    /// Name the downloaded report is saved under.
    pub fn file_name(self) -> String {
        format!("transactions.{}", self.extension())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "pdf" => Ok(Self::Pdf),
            other => Err(format!("unknown export format '{other}'")),
        }
    }
}

/// Landing page data: backend totals plus the latest few transactions.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub summary: DashboardSummary,
    pub recent: Vec<Transaction>,
}

/// Result of a CSV import: what was checked locally and what the backend said.
#[derive(Debug, Clone)]
pub struct CsvUpload {
    pub preview: CsvImportPreview,
    pub response: MessageResponse,
}

/// Typed client for the banking backend. Every method is one request/response
/// cycle; nothing is cached between calls.
pub struct BankingClient {
    http: Client,
    base_url: String,
    sessions: Arc<dyn SessionStore>,
}

impl BankingClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: config::normalize_base_url(base_url)?,
            sessions,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            &settings.api_base_url,
            settings.request_timeout(),
            Arc::new(FileSessionStore::new(settings.session_path.clone())),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> Result<Option<Session>> {
        self.sessions.load()
    }

    /// Email of the last successful login. It survives logout and session
    /// expiry so it can be prefilled.
    pub fn remembered_email(&self) -> Result<Option<String>> {
        self.sessions.remembered_email()
    }

    fn url(&self, path: &str) -> String {
        transport::endpoint(&self.base_url, path)
    }

    fn bearer(&self) -> Result<String> {
        let session = self.sessions.load()?.ok_or(ClientError::NotLoggedIn)?;
        if session.is_expired_at(Utc::now()) {
            warn!("stored session has expired; clearing it");
            self.sessions.clear()?;
            return Err(ClientError::SessionExpired);
        }
        Ok(session.access_token)
    }

    fn authorized(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let token = self.bearer()?;
        debug!(%method, path, "authorized request");
        Ok(self.http.request(method, self.url(path)).bearer_auth(token))
    }

    /// A 401 means the backend no longer accepts the token.
    fn forget_on_unauthorized<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(ClientError::Api { status: 401, .. }) = &result {
            warn!("backend rejected the session token; clearing stored session");
            if let Err(err) = self.sessions.clear() {
                warn!(error = %err, "failed to clear stored session");
            }
        }
        result
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let result = transport::send_json(request).await;
        self.forget_on_unauthorized(result)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.fetch(self.authorized(Method::GET, path)?).await
    }

    async fn delete(&self, path: &str) -> Result<MessageResponse> {
        self.fetch(self.authorized(Method::DELETE, path)?).await
    }

    // ------------------------------------------------------------ users

    pub async fn register(&self, form: &RegistrationForm) -> Result<MessageResponse> {
        let request = form.validate()?;
        let response = transport::send_json(
            self.http
                .post(self.url("/users/register"))
                .json(&request),
        )
        .await?;
        info!(email = %request.email, "registered user");
        Ok(response)
    }

    /// Exchanges credentials for a bearer token and stores it. The backend
    /// compares emails exactly, so only surrounding whitespace is removed.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        validation::require("email", email)?;
        validation::require("password", password)?;

        let email = email.trim().to_string();
        let token: TokenResponse = transport::send_json(
            self.http
                .post(self.url("/users/login"))
                .form(&[("username", email.as_str()), ("password", password)]),
        )
        .await?;

        let session = Session {
            access_token: token.access_token,
            token_type: token.token_type,
            email: Some(email),
        };
        self.sessions.save(&session)?;
        info!(email = ?session.email, "logged in");
        Ok(session)
    }

    pub fn logout(&self) -> Result<()> {
        self.sessions.clear()?;
        info!("logged out");
        Ok(())
    }

    pub async fn me(&self) -> Result<UserProfile> {
        self.get("/users/me").await
    }

    pub async fn update_profile(&self, update: &UpdateProfileRequest) -> Result<MessageResponse> {
        validation::require("name", &update.name)?;
        if !update.phone.trim().is_empty() {
            validation::validate_phone(&update.phone)?;
        }
        let response = self
            .fetch(
                self.authorized(Method::PUT, "/users/update-profile")?
                    .json(update),
            )
            .await?;
        info!("profile updated");
        Ok(response)
    }

    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<MessageResponse> {
        validation::require("current_password", current_password)?;
        validation::validate_password_strength(new_password)?;
        let body = ChangePasswordRequest {
            current_password: current_password.to_string(),
            new_password: new_password.to_string(),
        };
        let response = self
            .fetch(
                self.authorized(Method::PUT, "/users/change-password")?
                    .json(&body),
            )
            .await?;
        info!("password changed");
        Ok(response)
    }

    pub async fn set_two_factor(&self, enabled: bool) -> Result<MessageResponse> {
        let response = self
            .fetch(
                self.authorized(Method::PUT, "/users/two-factor")?
                    .json(&TwoFactorRequest { enabled }),
            )
            .await?;
        info!(enabled, "two-factor setting updated");
        Ok(response)
    }

    /// Deletes the user on the backend and drops the local session.
    pub async fn delete_user(&self) -> Result<MessageResponse> {
        let response = self.delete("/users/delete-account").await?;
        self.sessions.clear()?;
        info!("user deleted");
        Ok(response)
    }

    pub async fn upload_profile_image(&self, path: &Path) -> Result<ProfileImageResponse> {
        let part = file_part(path).await?;
        let response = self
            .fetch(
                self.authorized(Method::POST, "/users/upload-profile")?
                    .multipart(Form::new().part("file", part)),
            )
            .await?;
        info!(path = %path.display(), "profile image uploaded");
        Ok(response)
    }

    pub async fn forgot_password(&self, email: &str) -> Result<ForgotPasswordResponse> {
        validation::validate_email(email)?;
        transport::send_json(
            self.http
                .post(self.url("/users/forgot-password"))
                .json(&ForgotPasswordRequest {
                    email: email.trim().to_string(),
                }),
        )
        .await
    }

    pub async fn verify_forgot_otp(&self, email: &str, otp: &str) -> Result<MessageResponse> {
        validation::require("otp", otp)?;
        transport::send_json(
            self.http
                .post(self.url("/users/verify-forgot-otp"))
                .json(&VerifyOtpRequest {
                    email: email.trim().to_string(),
                    otp: otp.trim().to_string(),
                }),
        )
        .await
    }

    pub async fn reset_password(&self, email: &str, new_password: &str) -> Result<MessageResponse> {
        validation::validate_email(email)?;
        validation::validate_password_strength(new_password)?;
        let response = transport::send_json(
            self.http
                .post(self.url("/users/reset-password"))
                .json(&ResetPasswordRequest {
                    email: email.trim().to_string(),
                    new_password: new_password.to_string(),
                }),
        )
        .await?;
        info!("password reset");
        Ok(response)
    }

    // ------------------------------------------------------------ accounts

    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        self.get("/accounts/").await
    }

    pub async fn create_account(&self, account: &NewAccount) -> Result<Account> {
        validation::validate_account(account)?;
        let created: Account = self
            .fetch(self.authorized(Method::POST, "/accounts/")?.json(account))
            .await?;
        info!(account_id = %created.id, bank = %created.bank_name, "account created");
        Ok(created)
    }

    pub async fn delete_account(&self, id: AccountId) -> Result<MessageResponse> {
        let response = self.delete(&format!("/accounts/{id}")).await?;
        info!(account_id = %id, "account deleted");
        Ok(response)
    }

    // ------------------------------------------------------------ transactions

    pub async fn list_transactions(&self) -> Result<Vec<Transaction>> {
        self.get("/transactions/").await
    }

    pub async fn list_account_transactions(&self, account_id: AccountId) -> Result<Vec<Transaction>> {
        self.get(&format!("/transactions/{account_id}")).await
    }

    pub async fn create_transaction(&self, txn: &NewTransaction) -> Result<Transaction> {
        ledger::validate_transaction(txn)?;
        let created: Transaction = self
            .fetch(self.authorized(Method::POST, "/transactions/")?.json(txn))
            .await?;
        info!(
            txn_id = %created.id,
            account_id = %created.account_id,
            txn_type = created.txn_type.as_str(),
            "transaction created"
        );
        Ok(created)
    }

    /// Checks the file locally and uploads it only when every row is valid.
    pub async fn upload_transactions_csv(
        &self,
        path: &Path,
        account_id: Option<AccountId>,
    ) -> Result<CsvUpload> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| ClientError::io(path, err))?;
        let preview = CsvImportPreview::from_reader(bytes.as_slice())?;
        if !preview.is_clean() {
            return Err(ClientError::CsvImport(preview.error_summary()));
        }
        if preview.rows.is_empty() {
            return Err(ClientError::CsvImport("file has no transactions".into()));
        }

        let part = Part::bytes(bytes)
            .file_name(file_name_of(path))
            .mime_str("text/csv")?;
        let mut form = Form::new().part("file", part);
        if let Some(account_id) = account_id {
            form = form.text("account_id", account_id.to_string());
        }

        let response = self
            .fetch(
                self.authorized(Method::POST, "/transactions/upload-csv")?
                    .multipart(form),
            )
            .await?;
        info!(rows = preview.rows.len(), path = %path.display(), "csv uploaded");
        Ok(CsvUpload { preview, response })
    }

    pub async fn set_transaction_category(
        &self,
        id: TransactionId,
        category: &str,
    ) -> Result<MessageResponse> {
        validation::require("category", category)?;
        let response = self
            .fetch(
                self.authorized(Method::PUT, &format!("/transactions/{id}/category"))?
                    .query(&[("category", category.trim())]),
            )
            .await?;
        info!(txn_id = %id, category, "transaction categorized");
        Ok(response)
    }

    // ------------------------------------------------------------ categories

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.get("/categories/").await
    }

    pub async fn create_category(&self, draft: &CategoryDraft) -> Result<Category> {
        validation::validate_category(draft)?;
        let created: Category = self
            .fetch(self.authorized(Method::POST, "/categories/")?.json(draft))
            .await?;
        info!(category_id = %created.id, name = %created.name, "category created");
        Ok(created)
    }

    pub async fn update_category(&self, id: CategoryId, draft: &CategoryDraft) -> Result<Category> {
        validation::validate_category(draft)?;
        let updated = self
            .fetch(
                self.authorized(Method::PUT, &format!("/categories/{id}"))?
                    .json(draft),
            )
            .await?;
        info!(category_id = %id, "category updated");
        Ok(updated)
    }

    pub async fn delete_category(&self, id: CategoryId) -> Result<MessageResponse> {
        let response = self.delete(&format!("/categories/{id}")).await?;
        info!(category_id = %id, "category deleted");
        Ok(response)
    }

    // ------------------------------------------------------------ budgets

    pub async fn list_budgets(&self) -> Result<Vec<Budget>> {
        self.get("/budgets/").await
    }

    pub async fn budget_progress(&self) -> Result<Vec<BudgetProgress>> {
        let budgets: Vec<Budget> = self.get("/budgets/progress").await?;
        Ok(budgets::progress_for(&budgets))
    }

    pub async fn create_budget(&self, draft: &BudgetDraft) -> Result<Budget> {
        budgets::validate_budget(draft)?;
        let created: Budget = self
            .fetch(self.authorized(Method::POST, "/budgets/")?.json(draft))
            .await?;
        info!(budget_id = %created.id, category = %created.category, "budget created");
        Ok(created)
    }

    pub async fn update_budget(&self, id: BudgetId, draft: &BudgetDraft) -> Result<Budget> {
        budgets::validate_budget(draft)?;
        let updated = self
            .fetch(
                self.authorized(Method::PUT, &format!("/budgets/{id}"))?
                    .json(draft),
            )
            .await?;
        info!(budget_id = %id, "budget updated");
        Ok(updated)
    }

    pub async fn delete_budget(&self, id: BudgetId) -> Result<MessageResponse> {
        let response = self.delete(&format!("/budgets/{id}")).await?;
        info!(budget_id = %id, "budget deleted");
        Ok(response)
    }

    // ------------------------------------------------------------ bills

    pub async fn list_bills(&self) -> Result<Vec<Bill>> {
        self.get("/bills/").await
    }

    pub async fn create_bill(&self, bill: &NewBill) -> Result<Bill> {
        bills::validate_bill(bill)?;
        let created: Bill = self
            .fetch(self.authorized(Method::POST, "/bills/")?.json(bill))
            .await?;
        info!(bill_id = %created.id, biller = %created.biller_name, "bill created");
        Ok(created)
    }

    pub async fn update_bill(&self, id: BillId, update: &BillUpdate) -> Result<Bill> {
        if let Some(name) = &update.biller_name {
            validation::require("biller_name", name)?;
        }
        if let Some(amount) = update.amount_due {
            validation::require_positive("amount_due", amount)?;
        }
        let updated = self
            .fetch(
                self.authorized(Method::PUT, &format!("/bills/{id}"))?
                    .json(update),
            )
            .await?;
        info!(bill_id = %id, "bill updated");
        Ok(updated)
    }

    pub async fn delete_bill(&self, id: BillId) -> Result<MessageResponse> {
        let response = self.delete(&format!("/bills/{id}")).await?;
        info!(bill_id = %id, "bill deleted");
        Ok(response)
    }

    async fn find_bill(&self, id: BillId) -> Result<Bill> {
        self.list_bills()
            .await?
            .into_iter()
            .find(|bill| bill.id == id)
            .ok_or(ClientError::NotFound {
                kind: "bill",
                id: id.0,
            })
    }

    /// Paid bills go back to upcoming, anything else becomes paid.
    pub async fn toggle_bill_paid(&self, id: BillId) -> Result<Bill> {
        let bill = self.find_bill(id).await?;
        let update = BillUpdate {
            status: Some(bills::toggled_status(bill.status)),
            ..BillUpdate::default()
        };
        self.update_bill(id, &update).await
    }

    pub async fn toggle_bill_auto_pay(&self, id: BillId) -> Result<Bill> {
        let bill = self.find_bill(id).await?;
        let update = BillUpdate {
            auto_pay: Some(!bill.auto_pay),
            ..BillUpdate::default()
        };
        self.update_bill(id, &update).await
    }

    // ------------------------------------------------------------ rewards

    pub async fn list_rewards(&self) -> Result<Vec<Reward>> {
        self.get("/rewards/").await
    }

    pub async fn create_reward(&self, reward: &NewReward) -> Result<Reward> {
        validation::require("program_name", &reward.program_name)?;
        let created: Reward = self
            .fetch(self.authorized(Method::POST, "/rewards/")?.json(reward))
            .await?;
        info!(reward_id = %created.id, program = %created.program_name, "reward created");
        Ok(created)
    }

    pub async fn update_reward(&self, id: RewardId, points_balance: i64) -> Result<Reward> {
        if points_balance < 0 {
            return Err(ValidationError::new("points_balance", "must not be negative").into());
        }
        let updated = self
            .fetch(
                self.authorized(Method::PUT, &format!("/rewards/{id}"))?
                    .json(&RewardUpdate { points_balance }),
            )
            .await?;
        info!(reward_id = %id, points_balance, "reward updated");
        Ok(updated)
    }

    pub async fn delete_reward(&self, id: RewardId) -> Result<MessageResponse> {
        let response = self.delete(&format!("/rewards/{id}")).await?;
        info!(reward_id = %id, "reward deleted");
        Ok(response)
    }

    /// Redeems whole tens of points into the given account; leftover points
    /// below ten stay on the balance.
    pub async fn redeem_rewards(&self, account_id: AccountId, points: i64) -> Result<RedeemResponse> {
        let quote = RedeemQuote::for_points(points);
        if !quote.can_redeem() {
            return Err(ValidationError::new(
                "points",
                format!("minimum {} points required", rewards::MIN_REDEEM_POINTS),
            )
            .into());
        }

        let response: RedeemResponse = self
            .fetch(
                self.authorized(Method::POST, "/rewards/redeem")?
                    .query(&[
                        ("account_id", account_id.0),
                        ("points", quote.redeemable_points),
                    ]),
            )
            .await?;
        info!(
            account_id = %account_id,
            points = quote.redeemable_points,
            credited = response.credited_amount,
            "rewards redeemed"
        );
        Ok(response)
    }

    // ------------------------------------------------------------ alerts

    pub async fn list_alerts(&self, filter: AlertFilter) -> Result<Vec<Alert>> {
        let mut request = self.authorized(Method::GET, "/alerts/")?;
        if let Some(status) = filter.query_value() {
            request = request.query(&[("status", status)]);
        }
        self.fetch(request).await
    }

    pub async fn toggle_alert(&self, id: AlertId) -> Result<MessageResponse> {
        let response = self
            .fetch(self.authorized(Method::PUT, &format!("/alerts/{id}/toggle"))?)
            .await?;
        info!(alert_id = %id, "alert toggled");
        Ok(response)
    }

    pub async fn unread_alert_count(&self) -> Result<u64> {
        let count: UnreadCount = self.get("/alerts/unread-count").await?;
        Ok(count.unread)
    }

    pub async fn latest_alerts(&self) -> Result<Vec<Alert>> {
        self.get("/alerts/latest").await
    }

    // ------------------------------------------------------------ insights

    pub async fn monthly_cashflow(&self) -> Result<BTreeMap<String, CashflowBucket>> {
        self.get("/insights/monthly-cashflow").await
    }

    pub async fn spending_by_category(&self) -> Result<Vec<CategorySpend>> {
        self.get("/insights/spending-by-category").await
    }

    pub async fn top_merchants(&self) -> Result<Vec<MerchantSpend>> {
        self.get("/insights/top-merchants").await
    }

    pub async fn burn_rate(&self) -> Result<BurnRate> {
        self.get("/insights/burn-rate").await
    }

    /// The four insight reports, fetched concurrently.
    pub async fn insights(&self) -> Result<Insights> {
        let (cashflow, categories, merchants, burn_rate) = futures::try_join!(
            self.monthly_cashflow(),
            self.spending_by_category(),
            self.top_merchants(),
            self.burn_rate(),
        )?;
        Ok(Insights::new(cashflow, categories, merchants, burn_rate))
    }

    // ------------------------------------------------------------ dashboard

    pub async fn dashboard_summary(&self) -> Result<DashboardSummary> {
        self.get("/dashboard/summary").await
    }

    pub async fn dashboard(&self) -> Result<Dashboard> {
        let (summary, transactions) =
            futures::try_join!(self.dashboard_summary(), self.list_transactions())?;
        Ok(Dashboard {
            summary,
            recent: ledger::recent_transactions(&transactions, ledger::RECENT_TRANSACTIONS),
        })
    }

    // ------------------------------------------------------------ exports

    /// Downloads the backend-generated report into `dest_dir`.
    pub async fn export_transactions(&self, format: ExportFormat, dest_dir: &Path) -> Result<PathBuf> {
        let request =
            self.authorized(Method::GET, &format!("/exports/transactions/{format}"))?;
        let result = transport::send_bytes(request).await;
        let bytes = self.forget_on_unauthorized(result)?;

        tokio::fs::create_dir_all(dest_dir)
            .await
            .map_err(|err| ClientError::io(dest_dir, err))?;
        let target = dest_dir.join(format.file_name());
        tokio::fs::write(&target, &bytes)
            .await
            .map_err(|err| ClientError::io(&target, err))?;

        info!(path = %target.display(), bytes = bytes.len(), "report downloaded");
        Ok(target)
    }

    // ------------------------------------------------------------ support

    pub async fn create_ticket(&self, ticket: &NewTicket) -> Result<Ticket> {
        validation::validate_ticket(ticket)?;
        let created: Ticket = self
            .fetch(self.authorized(Method::POST, "/tickets/")?.json(ticket))
            .await?;
        info!(ticket_id = %created.id, "support ticket opened");
        Ok(created)
    }

    pub async fn list_tickets(&self) -> Result<Vec<Ticket>> {
        self.get("/tickets/").await
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string())
}

async fn file_part(path: &Path) -> Result<Part> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|err| ClientError::io(path, err))?;
    Ok(Part::bytes(bytes).file_name(file_name_of(path)))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
