use comfy_table::{Cell, CellAlignment, Table};

use super::Context;
use crate::amount::Amount;
use crate::api::resource::{Accounts, Collection, Groups, ResourceClient};
use crate::auth::AuthGate;
use crate::error::{LedgerError, Result};
use crate::fmt::money;
use crate::groups::{flatten_paths, resolve_path};
use crate::models::{AccountUpdate, NewAccount};

pub async fn list(ctx: &Context) -> Result<()> {
    let (_, api) = ctx.enter(AuthGate::staff()).await?;
    let mut accounts = Collection::new(ResourceClient::<Accounts>::new(api));
    accounts.load().await?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Opening", "Closing", "Group"]);
    for account in accounts.items() {
        table.add_row(vec![
            Cell::new(account.id),
            Cell::new(&account.name),
            Cell::new(money(account.opening_amount)).set_alignment(CellAlignment::Right),
            Cell::new(money(account.closing_amount)).set_alignment(CellAlignment::Right),
            Cell::new(&account.group_name),
        ]);
    }
    println!("Master accounts\n{table}");
    Ok(())
}

pub async fn add(ctx: &Context, name: &str, amount: &str, group: &str) -> Result<()> {
    let amount = Amount::parse(amount)?;
    let (_, api) = ctx.enter(AuthGate::staff()).await?;

    let groups = ResourceClient::<Groups>::new(api.clone()).list().await?;
    let group_id = resolve_path(&groups, group)?;

    let mut accounts = Collection::new(ResourceClient::<Accounts>::new(api));
    accounts
        .create(&NewAccount {
            name: name.to_string(),
            amount,
            group_id,
        })
        .await?;
    println!("Added account: {name} ({amount})");
    Ok(())
}

pub async fn edit(
    ctx: &Context,
    id: i64,
    name: Option<String>,
    amount: Option<String>,
    group: Option<String>,
) -> Result<()> {
    let amount = amount.as_deref().map(Amount::parse).transpose()?;
    let (_, api) = ctx.enter(AuthGate::staff()).await?;

    let mut accounts = Collection::new(ResourceClient::<Accounts>::new(api.clone()));
    accounts.load().await?;
    let current = accounts
        .find(id)
        .cloned()
        .ok_or_else(|| LedgerError::validation(format!("No account with id {id}")))?;

    let groups = ResourceClient::<Groups>::new(api).list().await?;
    let group_id = match group {
        Some(path) => resolve_path(&groups, &path)?,
        // Listings carry only the group name; match it against path leaves.
        None => flatten_paths(&groups)
            .into_iter()
            .find(|(path, _)| path.rsplit('/').next() == Some(current.group_name.as_str()))
            .map(|(_, id)| id)
            .ok_or_else(|| LedgerError::validation("Invalid group selected."))?,
    };

    let update = AccountUpdate {
        account_id: id,
        name: name.unwrap_or(current.name),
        amount: amount.unwrap_or_else(|| Amount::from_f64(current.opening_amount)),
        group_id,
    };
    accounts.update(&update).await?;
    println!("Updated account {id}: {}", update.name);
    Ok(())
}

pub async fn delete(ctx: &Context, id: i64) -> Result<()> {
    let (_, api) = ctx.enter(AuthGate::staff()).await?;
    ResourceClient::<Accounts>::new(api).delete(id).await?;
    println!("Deleted account {id}");
    Ok(())
}
