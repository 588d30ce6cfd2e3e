use std::collections::HashMap;

use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use super::{open_page, page_footer, prompt, Context};
use crate::amount::{is_partial_amount, Amount};
use crate::api::resource::{Accounts, Collection, Groups, ResourceClient, Transactions};
use crate::api::scope::RequestScope;
use crate::api::ApiClient;
use crate::auth::AuthGate;
use crate::error::{LedgerError, Result};
use crate::fmt::{money, money_or_blank};
use crate::ledger::{AccountOption, AccountOptions, EntryForm};
use crate::models::{Account, Group};
use crate::paginate::{Paginator, TRANSACTION_PAGE_SIZE};

/// Fetch the group tree and the account list side by side.
async fn load_reference_data(api: &ApiClient) -> Result<(Vec<Group>, Vec<Account>)> {
    let mut scope = RequestScope::new();
    let groups = ResourceClient::<Groups>::new(api.clone());
    let accounts = ResourceClient::<Accounts>::new(api.clone());
    let groups = scope.spawn(async move { groups.list().await });
    let accounts = scope.spawn(async move { accounts.list().await });
    tokio::try_join!(groups.wait(), accounts.wait())
}

fn account_label(names: &HashMap<i64, String>, id: Option<i64>) -> String {
    match id {
        Some(id) => names.get(&id).cloned().unwrap_or_else(|| id.to_string()),
        None => String::new(),
    }
}

pub async fn list(ctx: &Context, page: usize) -> Result<()> {
    let (_, api) = ctx.enter(AuthGate::staff()).await?;

    let mut scope = RequestScope::new();
    let transactions = ResourceClient::<Transactions>::new(api.clone());
    let accounts = ResourceClient::<Accounts>::new(api);
    let transactions = scope.spawn(async move { transactions.list().await });
    let accounts = scope.spawn(async move { accounts.list().await });
    let (transactions, accounts) = tokio::try_join!(transactions.wait(), accounts.wait())?;

    let names: HashMap<i64, String> = accounts.into_iter().map(|a| (a.id, a.name)).collect();
    let mut paginator = Paginator::new(TRANSACTION_PAGE_SIZE);
    open_page(&mut paginator, page, transactions.len())?;

    if transactions.is_empty() {
        println!("No transactions recorded.");
        return Ok(());
    }
    for tx in paginator.visible(&transactions) {
        println!(
            "{} {}  {}",
            format!("#{}", tx.number).bold(),
            tx.date,
            tx.description
        );
        let mut table = Table::new();
        table.set_header(vec!["Account", "Counter Account", "Debit", "Credit", "Notes"]);
        for line in &tx.lines {
            table.add_row(vec![
                Cell::new(account_label(&names, line.first_account_id)),
                Cell::new(account_label(&names, line.second_account_id)),
                Cell::new(money_or_blank(line.debit)).set_alignment(CellAlignment::Right),
                Cell::new(money_or_blank(line.credit)).set_alignment(CellAlignment::Right),
                Cell::new(&line.notes),
            ]);
        }
        println!("{table}\n");
    }
    println!("{}", page_footer(&paginator, transactions.len()).dimmed());
    Ok(())
}

pub async fn accounts(ctx: &Context) -> Result<()> {
    let (_, api) = ctx.enter(AuthGate::staff()).await?;
    let (groups, accounts) = load_reference_data(&api).await?;
    let options = AccountOptions::build(&groups, &accounts);

    for (title, side) in [
        ("FIRST (assets, income)", &options.assets_income),
        ("SECOND (liabilities, expenses)", &options.liabilities_expenses),
    ] {
        let mut table = Table::new();
        table.set_header(vec!["ID", "Account"]);
        for option in side {
            table.add_row(vec![Cell::new(option.id), Cell::new(&option.name)]);
        }
        println!("{}\n{table}", title.bold());
    }
    Ok(())
}

/// One `FIRST:SECOND:AMOUNT[:NOTES]` argument.
#[derive(Debug, Clone, PartialEq)]
pub struct PairArg {
    pub first: String,
    pub second: String,
    pub amount: Amount,
    pub notes: String,
}

impl PairArg {
    pub fn parse(raw: &str) -> Result<Self> {
        let mut parts = raw.splitn(4, ':');
        let (Some(first), Some(second), Some(amount)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(LedgerError::validation(format!(
                "Expected FIRST:SECOND:AMOUNT[:NOTES], got '{raw}'"
            )));
        };
        for id in [first, second] {
            if id.trim().parse::<i64>().is_err() {
                return Err(LedgerError::validation(format!("'{id}' is not an account id")));
            }
        }
        Ok(Self {
            first: first.trim().to_string(),
            second: second.trim().to_string(),
            amount: Amount::parse(amount.trim())?,
            notes: parts.next().unwrap_or_default().to_string(),
        })
    }
}

/// Lay out debit pairs first, then credit pairs, two rows each.
pub fn build_form(
    date: Option<String>,
    description: &str,
    debits: &[PairArg],
    credits: &[PairArg],
) -> Result<EntryForm> {
    if debits.is_empty() && credits.is_empty() {
        return Err(LedgerError::validation(
            "Add at least one --debit or --credit pair",
        ));
    }
    let mut form = EntryForm::new();
    if let Some(date) = date {
        form.date = date;
    }
    form.description = description.to_string();

    let entries = debits
        .iter()
        .map(|p| (p, true))
        .chain(credits.iter().map(|p| (p, false)));
    for (n, (pair, is_debit)) in entries.enumerate() {
        if n > 0 {
            form.add_pair();
        }
        let row = n * 2;
        let amount = pair.amount.to_string();
        form.set_account(row, &pair.first)?;
        form.set_account(row + 1, &pair.second)?;
        if is_debit {
            form.set_debit(row, &amount)?;
        } else {
            form.set_credit(row, &amount)?;
        }
        form.set_notes(row, &pair.notes)?;
        form.set_notes(row + 1, &pair.notes)?;
    }
    Ok(form)
}

pub async fn add(
    ctx: &Context,
    date: Option<String>,
    description: &str,
    debits: &[String],
    credits: &[String],
) -> Result<()> {
    let debits = debits.iter().map(|d| PairArg::parse(d)).collect::<Result<Vec<_>>>()?;
    let credits = credits.iter().map(|c| PairArg::parse(c)).collect::<Result<Vec<_>>>()?;
    let form = build_form(date, description, &debits, &credits)?;

    let (session, api) = ctx.enter(AuthGate::staff()).await?;
    let (groups, accounts) = load_reference_data(&api).await?;
    AccountOptions::build(&groups, &accounts).check(&form)?;

    let (debit, credit) = form.totals();
    println!("Total debit {}  Total credit {}", money(debit), money(credit));

    let mut transactions = Collection::new(ResourceClient::<Transactions>::new(api));
    transactions.create(&form.to_payload(session.user_id)).await?;
    println!(
        "{} {} transactions on record.",
        "Transaction submitted successfully!".green(),
        transactions.items().len()
    );
    Ok(())
}

fn print_choices(title: &str, choices: &[AccountOption]) {
    let listed: Vec<String> = choices.iter().map(|o| format!("{}={}", o.id, o.name)).collect();
    println!("{} {}", title.bold(), listed.join(", ").dimmed());
}

fn print_form(form: &EntryForm) {
    let mut table = Table::new();
    table.set_header(vec!["Row", "Account", "Debit", "Credit", "Notes"]);
    for (idx, row) in form.rows().iter().enumerate() {
        table.add_row(vec![
            Cell::new(idx + 1),
            Cell::new(&row.account),
            Cell::new(&row.debit).set_alignment(CellAlignment::Right),
            Cell::new(&row.credit).set_alignment(CellAlignment::Right),
            Cell::new(&row.notes),
        ]);
    }
    let (debit, credit) = form.totals();
    println!("{table}");
    println!("Total debit {}  Total credit {}", money(debit), money(credit));
}

async fn prompt_amount() -> Result<Amount> {
    loop {
        let input = prompt::line("Amount").await?;
        let input = input.trim();
        if !is_partial_amount(input) {
            println!("{}", "Digits only, with at most two decimals.".red());
            continue;
        }
        match Amount::parse(input) {
            Ok(amount) => return Ok(amount),
            Err(e) => println!("{}", e.to_string().red()),
        }
    }
}

async fn fill_header(form: &mut EntryForm) -> Result<()> {
    let date = prompt::line(&format!("Date [{}]", form.date)).await?;
    if !date.trim().is_empty() {
        form.date = date.trim().to_string();
    }
    form.description = prompt::line("Description").await?;
    Ok(())
}

/// Prompt for the pair starting at `row`.
async fn fill_pair(form: &mut EntryForm, options: &AccountOptions, row: usize) -> Result<()> {
    print_choices("FIRST:", options.for_row(row));
    form.set_account(row, &prompt::line("First account id").await?)?;
    print_choices("SECOND:", options.for_row(row + 1));
    form.set_account(row + 1, &prompt::line("Second account id").await?)?;

    let side = prompt::line("Debit or credit the first account? [D/c]").await?;
    let debit_first = !side.trim().eq_ignore_ascii_case("c");
    let amount = prompt_amount().await?.to_string();
    if debit_first {
        form.set_debit(row, &amount)?;
    } else {
        form.set_credit(row, &amount)?;
    }

    let notes = prompt::line("Notes").await?;
    form.set_notes(row, &notes)?;
    form.set_notes(row + 1, &notes)?;
    Ok(())
}

pub async fn enter(ctx: &Context) -> Result<()> {
    let (session, api) = ctx.enter(AuthGate::staff()).await?;
    let (groups, accounts) = load_reference_data(&api).await?;
    let options = AccountOptions::build(&groups, &accounts);

    let mut form = EntryForm::new();
    fill_header(&mut form).await?;
    fill_pair(&mut form, &options, 0).await?;
    loop {
        print_form(&form);
        let choice =
            prompt::line("[a]dd pair  [r]emove last pair  [c]lear  [s]ubmit  [q]uit").await?;
        match choice.trim() {
            "a" => {
                form.add_pair();
                let row = form.rows().len() - 2;
                fill_pair(&mut form, &options, row).await?;
            }
            "r" => {
                if !form.remove_pair() {
                    println!("An entry keeps at least one pair.");
                }
            }
            "c" => {
                form.reset();
                fill_header(&mut form).await?;
                fill_pair(&mut form, &options, 0).await?;
            }
            "s" => break,
            "q" => {
                println!("Cancelled.");
                return Ok(());
            }
            other => println!("Unknown choice '{other}'"),
        }
    }

    options.check(&form)?;
    let mut transactions = Collection::new(ResourceClient::<Transactions>::new(api));
    transactions.create(&form.to_payload(session.user_id)).await?;
    println!("{}", "Transaction submitted successfully!".green());
    Ok(())
}

pub async fn delete(ctx: &Context, id: i64, yes: bool) -> Result<()> {
    let (_, api) = ctx.enter(AuthGate::staff()).await?;
    if !yes && !prompt::confirm(&format!("Delete transaction #{id}?")).await? {
        println!("Cancelled.");
        return Ok(());
    }
    ResourceClient::<Transactions>::new(api).delete(id).await?;
    println!("Deleted transaction #{id}");
    Ok(())
}
