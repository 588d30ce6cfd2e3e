mod amount;
mod api;
mod auth;
mod cli;
mod error;
mod fmt;
mod groups;
mod ledger;
mod logging;
mod models;
mod paginate;
mod reports;
mod session;
mod settings;
mod users;

use clap::{CommandFactory, Parser};

use cli::{
    AccountsCommands, Cli, Commands, ConfigCommands, Context, GroupsCommands,
    TransactionsCommands, UsersCommands,
};
use error::Result;

async fn dispatch(command: Commands, api_url: Option<String>) -> Result<()> {
    let api_url = api_url.as_deref();
    match command {
        Commands::Config { command } => {
            return match command {
                ConfigCommands::Show => cli::config::show(api_url),
                ConfigCommands::SetUrl { url } => cli::config::set_url(&url),
                ConfigCommands::SetTimeout { seconds } => cli::config::set_timeout(seconds),
            };
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "ledgerdesk", &mut std::io::stdout());
            return Ok(());
        }
        _ => {}
    }

    let ctx = Context::from_settings(api_url)?;
    match command {
        Commands::Login { username } => cli::login::login(&ctx, username).await,
        Commands::Logout => cli::login::logout(&ctx),
        Commands::Whoami => cli::login::whoami(&ctx).await,
        Commands::Password => cli::password::run(&ctx).await,
        Commands::Users { command } => match command {
            UsersCommands::List { page } => cli::users::list(&ctx, page).await,
            UsersCommands::Show { id } => cli::users::show(&ctx, id).await,
            UsersCommands::Add {
                username,
                name,
                email,
                address,
                admin,
                date_hired,
                date_finished,
            } => {
                let form = users::UserForm {
                    username,
                    password: String::new(),
                    name,
                    email,
                    address,
                    admin,
                    date_hired,
                    date_finished,
                };
                cli::users::add(&ctx, form).await
            }
            UsersCommands::Edit { id, address } => cli::users::edit(&ctx, id, address).await,
            UsersCommands::Delete { id, yes } => cli::users::delete(&ctx, id, yes).await,
        },
        Commands::Accounts { command } => match command {
            AccountsCommands::List => cli::accounts::list(&ctx).await,
            AccountsCommands::Add {
                name,
                amount,
                group,
            } => cli::accounts::add(&ctx, &name, &amount, &group).await,
            AccountsCommands::Edit {
                id,
                name,
                amount,
                group,
            } => cli::accounts::edit(&ctx, id, name, amount, group).await,
            AccountsCommands::Delete { id } => cli::accounts::delete(&ctx, id).await,
        },
        Commands::Groups { command } => match command {
            GroupsCommands::List => cli::groups::list(&ctx).await,
            GroupsCommands::Paths => cli::groups::paths(&ctx).await,
            GroupsCommands::Categories => cli::groups::categories(&ctx).await,
            GroupsCommands::Add {
                name,
                category,
                parent,
            } => cli::groups::add(&ctx, &name, &category, parent).await,
            GroupsCommands::Rename { id, name } => cli::groups::rename(&ctx, id, &name).await,
            GroupsCommands::Delete { id } => cli::groups::delete(&ctx, id).await,
        },
        Commands::Transactions { command } => match command {
            TransactionsCommands::List { page } => cli::transactions::list(&ctx, page).await,
            TransactionsCommands::Accounts => cli::transactions::accounts(&ctx).await,
            TransactionsCommands::Enter => cli::transactions::enter(&ctx).await,
            TransactionsCommands::Add {
                date,
                description,
                debits,
                credits,
            } => cli::transactions::add(&ctx, date, &description, &debits, &credits).await,
            TransactionsCommands::Delete { id, yes } => {
                cli::transactions::delete(&ctx, id, yes).await
            }
        },
        Commands::Report { report, output } => {
            cli::reports::run(&ctx, report, output.as_deref()).await
        }
        Commands::Config { .. } | Commands::Completions { .. } => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    // Ctrl-C drops the command future, which aborts its in-flight requests.
    let result = tokio::select! {
        result = dispatch(cli.command, cli.api_url) => result,
        _ = tokio::signal::ctrl_c() => Err(error::LedgerError::Cancelled),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
