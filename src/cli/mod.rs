pub mod accounts;
pub mod config;
pub mod groups;
pub mod login;
pub mod password;
pub mod prompt;
pub mod reports;
pub mod transactions;
pub mod users;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::api::{ApiClient, HttpTransport};
use crate::auth::AuthGate;
use crate::error::{LedgerError, Result};
use crate::paginate::Paginator;
use crate::reports::Report;
use crate::session::{Session, SessionStore};
use crate::settings::{load_settings, session_path};

/// Everything a screen needs: the API client and the session store.
pub struct Context {
    pub api: ApiClient,
    pub store: SessionStore,
}

impl Context {
    pub fn from_settings(api_url_flag: Option<&str>) -> Result<Self> {
        let settings = load_settings();
        let base_url = settings.resolve_api_url(api_url_flag);
        tracing::debug!(%base_url, "using API origin");
        let transport = HttpTransport::new(&base_url, settings.request_timeout())?;
        let store = SessionStore::on_disk(session_path());

        let mut changes = store.subscribe();
        tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let user_id = changes.borrow_and_update().as_ref().map(|s| s.user_id);
                match user_id {
                    Some(user_id) => tracing::info!(user_id, "session stored"),
                    None => tracing::info!("session cleared"),
                }
            }
        });

        Ok(Self {
            api: ApiClient::new(Arc::new(transport)),
            store,
        })
    }

    /// Pass `gate`, returning the session and a client that carries its token.
    pub async fn enter(&self, gate: AuthGate) -> Result<(Session, ApiClient)> {
        let session = gate.enter(&self.api, &self.store).await?;
        let api = self.api.with_token(&session.token);
        Ok((session, api))
    }
}

/// Jump to `page`, rejecting pages past the end of a non-empty list.
fn open_page(paginator: &mut Paginator, page: usize, item_count: usize) -> Result<()> {
    if item_count == 0 || paginator.set_page(page, item_count) {
        return Ok(());
    }
    Err(LedgerError::validation(format!(
        "Page {page} does not exist (1-{})",
        paginator.total_pages(item_count)
    )))
}

fn page_footer(paginator: &Paginator, item_count: usize) -> String {
    let mut footer = format!(
        "Page {} of {} ({} per page)",
        paginator.current(),
        paginator.total_pages(item_count).max(1),
        paginator.page_size()
    );
    let mut back = *paginator;
    if back.prev(item_count) {
        footer.push_str(&format!("  prev: --page {}", back.current()));
    }
    let mut ahead = *paginator;
    if ahead.next(item_count) {
        footer.push_str(&format!("  next: --page {}", ahead.current()));
    }
    footer
}

#[derive(Parser)]
#[command(
    name = "ledgerdesk",
    version,
    about = "Command-line client for a double-entry bookkeeping service."
)]
pub struct Cli {
    /// API origin (overrides settings and LEDGERDESK_API_URL)
    #[arg(long = "api-url", global = true)]
    pub api_url: Option<String>,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store the session.
    Login {
        /// Username (prompted when omitted)
        username: Option<String>,
    },
    /// Forget the stored session.
    Logout,
    /// Show the signed-in user and where they land.
    Whoami,
    /// Change your password.
    Password,
    /// Manage users (admins only).
    Users {
        #[command(subcommand)]
        command: UsersCommands,
    },
    /// Manage the chart of accounts.
    Accounts {
        #[command(subcommand)]
        command: AccountsCommands,
    },
    /// Manage the account-group hierarchy.
    Groups {
        #[command(subcommand)]
        command: GroupsCommands,
    },
    /// Record and review double-entry transactions.
    Transactions {
        #[command(subcommand)]
        command: TransactionsCommands,
    },
    /// Download a PDF report.
    Report {
        #[arg(value_enum)]
        report: Report,
        /// Where to write the PDF (default: the report's file name)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// View or change client settings.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Print shell completions.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum UsersCommands {
    /// List users, 50 per page.
    List {
        #[arg(long, default_value = "1")]
        page: usize,
    },
    /// Show one user.
    Show { id: i64 },
    /// Add a user (password is prompted).
    Add {
        username: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        address: String,
        /// Create the user as an admin
        #[arg(long)]
        admin: bool,
        /// Hire date, YYYY-MM-DD (admins only)
        #[arg(long = "date-hired", default_value = "")]
        date_hired: String,
        /// End date, YYYY-MM-DD (admins only)
        #[arg(long = "date-finished", default_value = "")]
        date_finished: String,
    },
    /// Change a user's password and address (password is prompted).
    Edit {
        id: i64,
        #[arg(long)]
        address: Option<String>,
    },
    /// Delete a user.
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum AccountsCommands {
    /// List master accounts.
    List,
    /// Add a master account.
    Add {
        name: String,
        /// Opening amount, e.g. 100 or 100.50
        #[arg(long)]
        amount: String,
        /// Group path, e.g. Assets/Current/Bank (see `groups paths`)
        #[arg(long)]
        group: String,
    },
    /// Edit a master account; omitted fields keep their current value.
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        amount: Option<String>,
        #[arg(long)]
        group: Option<String>,
    },
    /// Delete a master account.
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum GroupsCommands {
    /// Show the group tree under the four root categories.
    List,
    /// List group paths usable with `accounts add --group`.
    Paths,
    /// List root categories.
    Categories,
    /// Add a group under a category or a parent group.
    Add {
        name: String,
        /// Root category: Assets, Liabilities, Income or Expenses
        #[arg(long)]
        category: String,
        /// Parent group id (omit for a top-level group)
        #[arg(long)]
        parent: Option<i64>,
    },
    /// Rename a group.
    Rename { id: i64, name: String },
    /// Delete a group without children.
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum TransactionsCommands {
    /// List transactions, 3 per page.
    List {
        #[arg(long, default_value = "1")]
        page: usize,
    },
    /// List accounts allowed on each side of a pair.
    Accounts,
    /// Record a transaction interactively, pair by pair.
    Enter,
    /// Record a transaction from debit/credit pairs.
    Add {
        /// Transaction date, YYYY-MM-DD (default today)
        #[arg(long)]
        date: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
        /// FIRST:SECOND:AMOUNT[:NOTES] debiting FIRST (assets/income)
        /// and crediting SECOND (liabilities/expenses)
        #[arg(long = "debit", value_name = "PAIR")]
        debits: Vec<String>,
        /// FIRST:SECOND:AMOUNT[:NOTES] crediting FIRST and debiting SECOND
        #[arg(long = "credit", value_name = "PAIR")]
        credits: Vec<String>,
    },
    /// Delete a transaction.
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the current settings.
    Show,
    /// Set the API origin.
    SetUrl { url: String },
    /// Set a request timeout in seconds (0 disables it).
    SetTimeout { seconds: u64 },
}
