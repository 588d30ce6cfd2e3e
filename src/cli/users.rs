use colored::Colorize;
use comfy_table::{Cell, Table};

use super::{open_page, page_footer, prompt, Context};
use crate::api::resource::{Collection, ResourceClient, Users};
use crate::api::scope::RequestScope;
use crate::auth::AuthGate;
use crate::error::{LedgerError, Result};
use crate::fmt::yes_no;
use crate::paginate::{Paginator, USER_PAGE_SIZE};
use crate::users::{can_delete, fetch_user, user_update, UserForm};

pub async fn list(ctx: &Context, page: usize) -> Result<()> {
    let (_, api) = ctx.enter(AuthGate::admin()).await?;

    let mut scope = RequestScope::new();
    let client = ResourceClient::<Users>::new(api);
    let users = scope.spawn(async move { client.list().await }).wait().await?;

    let mut paginator = Paginator::new(USER_PAGE_SIZE);
    open_page(&mut paginator, page, users.len())?;

    let mut table = Table::new();
    table.set_header(vec![
        "ID", "Username", "Name", "Email", "Admin", "Address", "Hired", "Finished", "Can Delete",
    ]);
    for user in paginator.visible(&users) {
        table.add_row(vec![
            Cell::new(user.id),
            Cell::new(&user.username),
            Cell::new(&user.name),
            Cell::new(&user.email),
            Cell::new(yes_no(user.is_admin)),
            Cell::new(&user.address),
            Cell::new(&user.date_hired),
            Cell::new(&user.date_finished),
            Cell::new(yes_no(can_delete(user, &users))),
        ]);
    }
    println!("Users\n{table}");
    println!("{}", page_footer(&paginator, users.len()).dimmed());
    Ok(())
}

pub async fn show(ctx: &Context, id: i64) -> Result<()> {
    let (_, api) = ctx.enter(AuthGate::admin()).await?;
    let user = fetch_user(&api, id).await?;

    println!("{}", user.name.bold());
    println!("  ID:        {}", user.id);
    println!("  Username:  {}", user.username);
    println!("  Email:     {}", user.email);
    println!("  Admin:     {}", yes_no(user.is_admin));
    println!("  Address:   {}", user.address);
    println!("  Hired:     {}", user.date_hired);
    println!("  Finished:  {}", user.date_finished);
    Ok(())
}

pub async fn add(ctx: &Context, form: UserForm) -> Result<()> {
    let (session, api) = ctx.enter(AuthGate::admin()).await?;

    let password = prompt::password("Password for new user").await?;
    let username = form.username.clone();
    let draft = UserForm {
        password: password.to_string(),
        ..form
    }
    .into_new_user(session.user_id)?;

    let mut users = Collection::new(ResourceClient::<Users>::new(api));
    users.create(&draft).await?;
    println!("{} {username}", "Added user:".green());
    Ok(())
}

pub async fn edit(ctx: &Context, id: i64, address: Option<String>) -> Result<()> {
    let (_, api) = ctx.enter(AuthGate::admin()).await?;
    let current = fetch_user(&api, id).await?;

    let label = format!("New password for {}", current.username);
    let password = prompt::password(&label).await?;
    if password.trim().is_empty() {
        return Err(LedgerError::validation("Password is required"));
    }
    let address = address.unwrap_or(current.address);

    let mut users = Collection::new(ResourceClient::<Users>::new(api));
    users
        .update(&user_update(id, password.to_string(), address))
        .await?;
    println!("Updated user {}", current.username);
    Ok(())
}

pub async fn delete(ctx: &Context, id: i64, yes: bool) -> Result<()> {
    let (_, api) = ctx.enter(AuthGate::admin()).await?;

    let mut users = Collection::new(ResourceClient::<Users>::new(api));
    users.load().await?;
    let user = users
        .find(id)
        .cloned()
        .ok_or_else(|| LedgerError::validation(format!("No user with id {id}")))?;
    if !can_delete(&user, users.items()) {
        return Err(LedgerError::validation("Cannot delete the only admin"));
    }
    if !yes && !prompt::confirm(&format!("Delete user \"{}\"?", user.username)).await? {
        println!("Cancelled.");
        return Ok(());
    }

    users.delete(id).await?;
    println!("Deleted user {}", user.username);
    Ok(())
}
