use colored::Colorize;

use super::{prompt, Context};
use crate::auth::{self, landing_route, AuthGate, GateOutcome};
use crate::error::Result;

pub async fn login(ctx: &Context, username: Option<String>) -> Result<()> {
    // A still-valid session goes straight to its landing page.
    if let Some(session) = ctx.store.get()? {
        let validation = auth::validate(&ctx.api, &session).await;
        if validation.valid {
            println!(
                "Already signed in as {} → {}",
                session.name.bold(),
                landing_route(validation)
            );
            return Ok(());
        }
        ctx.store.clear()?;
    }

    let username = match username {
        Some(u) => u,
        None => prompt::line("Username").await?,
    };
    let password = prompt::password("Password").await?;
    let session = auth::login(&ctx.api, &ctx.store, &username, &password).await?;

    let validation = auth::validate(&ctx.api, &session).await;
    println!(
        "{} Welcome, {} → {}",
        "Signed in.".green(),
        session.name.bold(),
        landing_route(validation)
    );
    Ok(())
}

pub fn logout(ctx: &Context) -> Result<()> {
    ctx.store.clear()?;
    println!("Signed out.");
    Ok(())
}

pub async fn whoami(ctx: &Context) -> Result<()> {
    match AuthGate::any().check(&ctx.api, &ctx.store).await? {
        GateOutcome::Granted { session, admin } => {
            println!("User:     {} (id {})", session.name, session.user_id);
            println!("Role:     {}", if admin { "admin" } else { "user" });
            println!(
                "Since:    {}",
                session.issued_at.format("%Y-%m-%d %H:%M UTC")
            );
            println!(
                "Landing:  {}",
                landing_route(auth::Validation { valid: true, admin })
            );
        }
        GateOutcome::Redirect(route) => {
            println!("Not signed in → {route}");
        }
    }
    Ok(())
}
