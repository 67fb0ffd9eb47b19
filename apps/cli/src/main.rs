use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{
    assistant::{Assistant, Conversation},
    bills::{filter_bills, BillFilter},
    config::{load_settings, normalize_base_url},
    format::{format_amount, parse_currency_text},
    ledger::{self, CashTotals},
    rewards,
    validation::RegistrationForm,
    BankingClient, ClientError, ExportFormat, Settings,
};
use shared::{
    domain::{
        AccountId, AlertFilter, AlertId, BillId, BudgetId, CategoryId, Currency, TransactionId,
        TxnType,
    },
    protocol::{
        BudgetDraft, CategoryDraft, NewAccount, NewBill, NewTicket, NewTransaction,
        UpdateProfileRequest,
    },
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod render;

const SUPPORT_EMAIL: &str = "support@financehub.com";
const SUPPORT_PHONE: &str = "1-800-FINANCE";

#[derive(Parser, Debug)]
#[command(name = "bankdash", version, about = "Terminal dashboard for the banking backend")]
struct Cli {
    /// Settings file; defaults to ./bankdash.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Display currency (INR, USD, EUR, GBP, JPY).
    #[arg(long, global = true)]
    currency: Option<Currency>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        /// Defaults to the last email used.
        email: Option<String>,
        #[arg(long, env = "BANKDASH_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    Logout,
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, env = "BANKDASH_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    Whoami,
    Dashboard,
    Accounts {
        #[command(subcommand)]
        action: AccountsCommand,
    },
    Transactions {
        #[command(subcommand)]
        action: TransactionsCommand,
    },
    Categories {
        #[command(subcommand)]
        action: CategoriesCommand,
    },
    Budgets {
        #[command(subcommand)]
        action: BudgetsCommand,
    },
    Bills {
        #[command(subcommand)]
        action: BillsCommand,
    },
    Rewards {
        #[command(subcommand)]
        action: RewardsCommand,
    },
    Alerts {
        #[command(subcommand)]
        action: AlertsCommand,
    },
    Insights,
    /// Download the backend transaction report.
    Export {
        format: ExportFormat,
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },
    /// Forgotten password recovery.
    Password {
        #[command(subcommand)]
        action: PasswordCommand,
    },
    Support {
        #[command(subcommand)]
        action: SupportCommand,
    },
    /// Ask the help assistant; starts a chat when no message is given.
    Assistant { message: Vec<String> },
    /// Print the effective settings as TOML.
    Config,
}

#[derive(Subcommand, Debug)]
enum AccountsCommand {
    List,
    Add {
        bank_name: String,
        account_type: String,
        #[arg(long, default_value = "0", value_parser = parse_money)]
        balance: f64,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum TransactionsCommand {
    List {
        #[arg(long)]
        account: Option<i64>,
    },
    Add {
        account: i64,
        #[arg(value_parser = parse_money)]
        amount: f64,
        txn_type: TxnType,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        merchant: Option<String>,
        #[arg(long)]
        txn_currency: Option<Currency>,
        /// YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS
        #[arg(long)]
        date: Option<String>,
    },
    /// Check a CSV file locally, then upload it.
    Import {
        path: PathBuf,
        #[arg(long)]
        account: Option<i64>,
        /// Only run the local checks.
        #[arg(long)]
        dry_run: bool,
    },
    Categorize {
        id: i64,
        category: String,
    },
}

#[derive(Subcommand, Debug)]
enum CategoriesCommand {
    List,
    Add {
        name: String,
        /// Comma-separated merchant keywords.
        #[arg(long, default_value = "")]
        keywords: String,
    },
    Update {
        id: i64,
        name: String,
        #[arg(long, default_value = "")]
        keywords: String,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum BudgetsCommand {
    List,
    Add {
        category: String,
        #[arg(value_parser = parse_money)]
        limit: f64,
        #[arg(long)]
        month: Option<u32>,
        #[arg(long)]
        year: Option<i32>,
    },
    Update {
        id: i64,
        category: String,
        #[arg(value_parser = parse_money)]
        limit: f64,
        #[arg(long)]
        month: Option<u32>,
        #[arg(long)]
        year: Option<i32>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum BillsCommand {
    List {
        #[arg(long, default_value = "all")]
        filter: BillFilter,
    },
    Add {
        biller_name: String,
        #[arg(value_parser = parse_money)]
        amount: f64,
        due_date: NaiveDate,
        #[arg(long)]
        auto_pay: bool,
    },
    /// Toggle between paid and upcoming.
    Pay {
        id: i64,
    },
    Autopay {
        id: i64,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum RewardsCommand {
    Show,
    Redeem {
        #[arg(long)]
        account: i64,
        /// Defaults to the whole balance.
        #[arg(long)]
        points: Option<i64>,
    },
}

#[derive(Subcommand, Debug)]
enum AlertsCommand {
    List {
        #[arg(long, default_value = "all")]
        filter: AlertFilter,
    },
    Toggle {
        id: i64,
    },
    Count,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Switch {
    On,
    Off,
}

#[derive(Subcommand, Debug)]
enum SettingsCommand {
    /// Show the profile, or update it when a field is given.
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    Password {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
    },
    TwoFactor {
        state: Switch,
    },
    Avatar {
        path: PathBuf,
    },
    DeleteUser {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum PasswordCommand {
    Forgot { email: String },
    Verify { email: String, otp: String },
    Reset {
        email: String,
        #[arg(long)]
        new: String,
    },
}

#[derive(Subcommand, Debug)]
enum SupportCommand {
    List,
    Open {
        subject: String,
        description: String,
        #[arg(long, default_value = "general")]
        category: String,
    },
    Contact,
}

fn parse_money(raw: &str) -> std::result::Result<f64, String> {
    parse_currency_text(raw).ok_or_else(|| format!("'{raw}' is not an amount"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            if err
                .downcast_ref::<ClientError>()
                .is_some_and(ClientError::is_unauthorized)
            {
                eprintln!("hint: run `bankdash login` first");
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn effective_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(api_url) = &cli.api_url {
        settings.api_base_url =
            normalize_base_url(api_url).with_context(|| format!("invalid --api-url '{api_url}'"))?;
    }
    if let Some(currency) = cli.currency {
        settings.currency = currency;
    }
    Ok(settings)
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn budget_period(month: Option<u32>, year: Option<i32>) -> (u32, i32) {
    let today = Local::now().date_naive();
    (month.unwrap_or(today.month()), year.unwrap_or(today.year()))
}

async fn run(cli: Cli) -> Result<()> {
    let settings = effective_settings(&cli)?;
    init_tracing(&settings.log_filter);
    debug!(api = %settings.api_base_url, "settings loaded");

    let currency = settings.currency;
    let client = BankingClient::from_settings(&settings)
        .with_context(|| format!("cannot reach api at '{}'", settings.api_base_url))?;

    match cli.command {
        Command::Login { email, password } => {
            let email = match email.or(client.remembered_email()?) {
                Some(email) => email,
                None => prompt("email")?,
            };
            let password = match password {
                Some(password) => password,
                None => prompt("password")?,
            };
            let session = client.login(&email, &password).await?;
            match session.expires_at() {
                Some(exp) => println!("logged in as {email} (session valid until {exp})"),
                None => println!("logged in as {email}"),
            }
        }
        Command::Logout => {
            client.logout()?;
            println!("logged out");
        }
        Command::Register {
            name,
            email,
            phone,
            password,
        } => {
            let password = match password {
                Some(password) => password,
                None => prompt("password")?,
            };
            let confirm_password = prompt("confirm password")?;
            let form = RegistrationForm {
                name,
                email,
                phone,
                password,
                confirm_password,
            };
            let response = client.register(&form).await?;
            println!("{}", response.message);
        }
        Command::Whoami => render::profile(&client.me().await?),
        Command::Dashboard => {
            let dashboard = client.dashboard().await?;
            let unread = client.unread_alert_count().await?;
            render::dashboard(&dashboard, unread, currency);
        }
        Command::Accounts { action } => accounts(&client, action, currency).await?,
        Command::Transactions { action } => transactions(&client, action, currency).await?,
        Command::Categories { action } => categories(&client, action).await?,
        Command::Budgets { action } => budgets(&client, action, currency).await?,
        Command::Bills { action } => bills(&client, action, currency).await?,
        Command::Rewards { action } => reward_points(&client, action, currency).await?,
        Command::Alerts { action } => alerts(&client, action).await?,
        Command::Insights => render::insights(&client.insights().await?, currency),
        Command::Export { format, dir } => {
            let path = client.export_transactions(format, &dir).await?;
            println!("saved {}", path.display());
        }
        Command::Settings { action } => user_settings(&client, action).await?,
        Command::Password { action } => password_recovery(&client, action).await?,
        Command::Support { action } => support(&client, action).await?,
        Command::Assistant { message } => assistant(&client, message).await?,
        Command::Config => print!("{}", settings.to_toml()?),
    }

    Ok(())
}

async fn accounts(client: &BankingClient, action: AccountsCommand, currency: Currency) -> Result<()> {
    match action {
        AccountsCommand::List => render::accounts(&client.list_accounts().await?, currency),
        AccountsCommand::Add {
            bank_name,
            account_type,
            balance,
        } => {
            let account = client
                .create_account(&NewAccount {
                    bank_name,
                    account_type,
                    balance,
                })
                .await?;
            println!("created account {} ({})", account.id, account.bank_name);
        }
        AccountsCommand::Delete { id } => {
            println!("{}", client.delete_account(AccountId(id)).await?.message);
        }
    }
    Ok(())
}

async fn transactions(
    client: &BankingClient,
    action: TransactionsCommand,
    currency: Currency,
) -> Result<()> {
    match action {
        TransactionsCommand::List { account } => {
            let txns = match account {
                Some(id) => client.list_account_transactions(AccountId(id)).await?,
                None => client.list_transactions().await?,
            };
            let txns = ledger::recent_transactions(&txns, txns.len());
            render::transactions(&txns, currency);
            render::cash_totals(&CashTotals::from_transactions(&txns), currency);
        }
        TransactionsCommand::Add {
            account,
            amount,
            txn_type,
            description,
            merchant,
            txn_currency,
            date,
        } => {
            let txn_date = date
                .map(|raw| {
                    ledger::parse_txn_date(&raw).ok_or_else(|| anyhow!("invalid --date '{raw}'"))
                })
                .transpose()?;
            let created = client
                .create_transaction(&NewTransaction {
                    account_id: AccountId(account),
                    amount,
                    txn_type,
                    description,
                    merchant,
                    currency: txn_currency,
                    txn_date,
                })
                .await?;
            println!("created transaction {}", created.id);
            if txn_type == TxnType::Debit {
                let points = rewards::points_for_debit(amount);
                if points > 0 {
                    println!("earns {points} reward points");
                }
            }
        }
        TransactionsCommand::Import {
            path,
            account,
            dry_run,
        } => {
            if dry_run {
                let file = std::fs::File::open(&path)
                    .with_context(|| format!("cannot open {}", path.display()))?;
                let preview = ledger::CsvImportPreview::from_reader(file)?;
                println!("{} valid rows", preview.rows.len());
                render::cash_totals(&preview.totals(), currency);
                for error in &preview.errors {
                    println!("line {}: {}", error.line, error.message);
                }
                if !preview.is_clean() {
                    bail!("{} rows have errors", preview.errors.len());
                }
            } else {
                let upload = client
                    .upload_transactions_csv(&path, account.map(AccountId))
                    .await?;
                println!(
                    "{} ({} rows)",
                    upload.response.message,
                    upload.preview.rows.len()
                );
            }
        }
        TransactionsCommand::Categorize { id, category } => {
            let response = client
                .set_transaction_category(TransactionId(id), &category)
                .await?;
            println!("{}", response.message);
        }
    }
    Ok(())
}

async fn categories(client: &BankingClient, action: CategoriesCommand) -> Result<()> {
    match action {
        CategoriesCommand::List => render::categories(&client.list_categories().await?),
        CategoriesCommand::Add { name, keywords } => {
            let created = client
                .create_category(&CategoryDraft { name, keywords })
                .await?;
            println!("created category {} ({})", created.id, created.name);
        }
        CategoriesCommand::Update { id, name, keywords } => {
            let updated = client
                .update_category(CategoryId(id), &CategoryDraft { name, keywords })
                .await?;
            println!("updated category {} ({})", updated.id, updated.name);
        }
        CategoriesCommand::Delete { id } => {
            println!("{}", client.delete_category(CategoryId(id)).await?.message);
        }
    }
    Ok(())
}

async fn budgets(client: &BankingClient, action: BudgetsCommand, currency: Currency) -> Result<()> {
    match action {
        BudgetsCommand::List => render::budgets(&client.budget_progress().await?, currency),
        BudgetsCommand::Add {
            category,
            limit,
            month,
            year,
        } => {
            let (month, year) = budget_period(month, year);
            let created = client
                .create_budget(&BudgetDraft {
                    month,
                    year,
                    category,
                    limit_amount: limit,
                })
                .await?;
            println!("created budget {} for {}", created.id, created.category);
        }
        BudgetsCommand::Update {
            id,
            category,
            limit,
            month,
            year,
        } => {
            let (month, year) = budget_period(month, year);
            let updated = client
                .update_budget(
                    BudgetId(id),
                    &BudgetDraft {
                        month,
                        year,
                        category,
                        limit_amount: limit,
                    },
                )
                .await?;
            println!("updated budget {}", updated.id);
        }
        BudgetsCommand::Delete { id } => {
            println!("{}", client.delete_budget(BudgetId(id)).await?.message);
        }
    }
    Ok(())
}

async fn bills(client: &BankingClient, action: BillsCommand, currency: Currency) -> Result<()> {
    let today = Local::now().date_naive();
    match action {
        BillsCommand::List { filter } => {
            let all = client.list_bills().await?;
            let shown = filter_bills(&all, filter, today);
            render::bills(&shown, &all, today, currency);
        }
        BillsCommand::Add {
            biller_name,
            amount,
            due_date,
            auto_pay,
        } => {
            let created = client
                .create_bill(&NewBill {
                    biller_name,
                    amount_due: amount,
                    due_date,
                    auto_pay,
                })
                .await?;
            println!("created bill {} due {}", created.id, created.due_date);
        }
        BillsCommand::Pay { id } => {
            let bill = client.toggle_bill_paid(BillId(id)).await?;
            println!("bill {} is now {}", bill.id, bill.status.as_str());
        }
        BillsCommand::Autopay { id } => {
            let bill = client.toggle_bill_auto_pay(BillId(id)).await?;
            println!(
                "auto-pay for bill {} is {}",
                bill.id,
                if bill.auto_pay { "on" } else { "off" }
            );
        }
        BillsCommand::Delete { id } => {
            println!("{}", client.delete_bill(BillId(id)).await?.message);
        }
    }
    Ok(())
}

async fn reward_points(
    client: &BankingClient,
    action: RewardsCommand,
    currency: Currency,
) -> Result<()> {
    let all = client.list_rewards().await?;
    let bank = rewards::bank_reward(&all);
    match action {
        RewardsCommand::Show => render::reward(bank, currency),
        RewardsCommand::Redeem { account, points } => {
            let points = points.unwrap_or_else(|| bank.map_or(0, |r| r.points_balance));
            let response = client.redeem_rewards(AccountId(account), points).await?;
            println!(
                "{}: {} credited, {} points left",
                response.message,
                format_amount(response.credited_amount as f64, currency),
                response.remaining_points
            );
        }
    }
    Ok(())
}

async fn alerts(client: &BankingClient, action: AlertsCommand) -> Result<()> {
    match action {
        AlertsCommand::List { filter } => render::alerts(&client.list_alerts(filter).await?),
        AlertsCommand::Toggle { id } => {
            println!("{}", client.toggle_alert(AlertId(id)).await?.message);
        }
        AlertsCommand::Count => println!("{}", client.unread_alert_count().await?),
    }
    Ok(())
}

async fn user_settings(client: &BankingClient, action: SettingsCommand) -> Result<()> {
    match action {
        SettingsCommand::Profile { name, phone } => {
            if name.is_none() && phone.is_none() {
                render::profile(&client.me().await?);
                return Ok(());
            }
            let current = client.me().await?;
            let update = UpdateProfileRequest {
                name: name.unwrap_or(current.name),
                phone: phone.or(current.phone).unwrap_or_default(),
            };
            println!("{}", client.update_profile(&update).await?.message);
        }
        SettingsCommand::Password { current, new } => {
            println!("{}", client.change_password(&current, &new).await?.message);
        }
        SettingsCommand::TwoFactor { state } => {
            let enabled = matches!(state, Switch::On);
            println!("{}", client.set_two_factor(enabled).await?.message);
        }
        SettingsCommand::Avatar { path } => {
            let response = client.upload_profile_image(&path).await?;
            println!("{} ({})", response.message, response.profile_image);
        }
        SettingsCommand::DeleteUser { yes } => {
            if !yes {
                let answer = prompt("delete your user and all its data? type 'yes'")?;
                if answer.trim() != "yes" {
                    println!("cancelled");
                    return Ok(());
                }
            }
            println!("{}", client.delete_user().await?.message);
        }
    }
    Ok(())
}

async fn password_recovery(client: &BankingClient, action: PasswordCommand) -> Result<()> {
    match action {
        PasswordCommand::Forgot { email } => {
            let response = client.forgot_password(&email).await?;
            println!("{}", response.message);
            if let Some(otp) = response.otp {
                println!("one-time code: {otp}");
            }
        }
        PasswordCommand::Verify { email, otp } => {
            println!("{}", client.verify_forgot_otp(&email, &otp).await?.message);
        }
        PasswordCommand::Reset { email, new } => {
            println!("{}", client.reset_password(&email, &new).await?.message);
        }
    }
    Ok(())
}

async fn support(client: &BankingClient, action: SupportCommand) -> Result<()> {
    match action {
        SupportCommand::List => render::tickets(&client.list_tickets().await?),
        SupportCommand::Open {
            subject,
            description,
            category,
        } => {
            let ticket = client
                .create_ticket(&NewTicket {
                    subject,
                    description,
                    category,
                })
                .await?;
            println!("opened ticket {} ({})", ticket.id, ticket.status);
        }
        SupportCommand::Contact => {
            println!("Email: {SUPPORT_EMAIL}");
            println!("Phone: {SUPPORT_PHONE}");
            println!("Hours: 24/7 Support");
        }
    }
    Ok(())
}

async fn assistant(client: &BankingClient, message: Vec<String>) -> Result<()> {
    // the assistant works offline; the name is only a nicety
    let name = match client.me().await {
        Ok(user) => Some(user.name),
        Err(err) => {
            debug!(error = %err, "assistant running without a profile");
            None
        }
    };
    let bot = Assistant::new(name.as_deref());

    if !message.is_empty() {
        println!("{}", bot.reply(&message.join(" ")));
        return Ok(());
    }

    let mut chat = Conversation::new(bot);
    if let Some(greeting) = chat.turns().first() {
        println!("{}", greeting.text);
    }
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if matches!(input, "exit" | "quit") {
            break;
        }
        if let Some(reply) = chat.send(input) {
            println!("{reply}");
        }
    }
    Ok(())
}
