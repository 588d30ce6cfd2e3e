use colored::Colorize;
use comfy_table::{Cell, Table};

use super::Context;
use crate::api::resource::{Collection, Groups, ResourceClient};
use crate::auth::AuthGate;
use crate::error::{LedgerError, Result};
use crate::groups::{
    by_category, check_deletable, fetch_categories, find, flatten_paths, new_group,
    root_categories, root_of, RootCategory,
};
use crate::models::{Group, GroupUpdate};

fn print_branch(group: &Group, depth: usize) {
    let indent = "  ".repeat(depth + 1);
    let id = format!("#{}", group.group_id);
    println!("{indent}{} {}", group.group_name, id.dimmed());
    for child in &group.children {
        print_branch(child, depth + 1);
    }
}

pub async fn list(ctx: &Context) -> Result<()> {
    let (_, api) = ctx.enter(AuthGate::staff()).await?;
    let mut groups = Collection::new(ResourceClient::<Groups>::new(api));
    groups.load().await?;

    for (root, members) in by_category(groups.items()) {
        println!("{}", root.name().bold());
        if members.is_empty() {
            println!("  {}", "(no groups)".dimmed());
        }
        for group in members {
            print_branch(group, 0);
        }
    }
    Ok(())
}

pub async fn paths(ctx: &Context) -> Result<()> {
    let (_, api) = ctx.enter(AuthGate::staff()).await?;
    let groups = ResourceClient::<Groups>::new(api).list().await?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Path"]);
    for (path, id) in flatten_paths(&groups) {
        table.add_row(vec![Cell::new(id), Cell::new(path)]);
    }
    println!("{table}");
    Ok(())
}

pub async fn categories(ctx: &Context) -> Result<()> {
    let (_, api) = ctx.enter(AuthGate::staff()).await?;
    let categories = root_categories(fetch_categories(&api).await?);

    let mut table = Table::new();
    table.set_header(vec!["ID", "Category"]);
    for category in categories {
        table.add_row(vec![Cell::new(category.id), Cell::new(category.name)]);
    }
    println!("{table}");
    Ok(())
}

pub async fn add(ctx: &Context, name: &str, category: &str, parent: Option<i64>) -> Result<()> {
    let root = RootCategory::from_name(category).ok_or_else(|| {
        LedgerError::validation(format!(
            "Unknown category '{category}'. Choose Assets, Liabilities, Income or Expenses"
        ))
    })?;
    let draft = new_group(name, parent, root.id())?;
    let (_, api) = ctx.enter(AuthGate::staff()).await?;

    let mut groups = Collection::new(ResourceClient::<Groups>::new(api));
    groups.load().await?;
    if let Some(parent_id) = draft.parent_id {
        if root_of(groups.items(), parent_id) != Some(root) {
            return Err(LedgerError::validation(format!(
                "Group {parent_id} is not under {}",
                root.name()
            )));
        }
    }

    groups.create(&draft).await?;
    println!("Added group: {name} under {}", root.name());
    Ok(())
}

pub async fn rename(ctx: &Context, id: i64, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(LedgerError::validation("Group name cannot be empty"));
    }
    let (_, api) = ctx.enter(AuthGate::staff()).await?;

    let mut groups = Collection::new(ResourceClient::<Groups>::new(api));
    groups.load().await?;
    let root = root_of(groups.items(), id)
        .ok_or_else(|| LedgerError::validation(format!("No group with id {id}")))?;

    groups
        .update(&GroupUpdate {
            group_id: id,
            name: name.to_string(),
            account_id: root.id(),
        })
        .await?;
    println!("Renamed group {id} to {name}");
    Ok(())
}

pub async fn delete(ctx: &Context, id: i64) -> Result<()> {
    let (_, api) = ctx.enter(AuthGate::staff()).await?;

    let mut groups = Collection::new(ResourceClient::<Groups>::new(api));
    groups.load().await?;
    let group = find(groups.items(), id)
        .ok_or_else(|| LedgerError::validation(format!("No group with id {id}")))?;
    check_deletable(group)?;

    groups.delete(id).await?;
    println!("Deleted group {id}");
    Ok(())
}
