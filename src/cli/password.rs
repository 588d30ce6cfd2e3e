use colored::Colorize;

use super::{prompt, Context};
use crate::auth::{self, AuthGate};
use crate::error::Result;

pub async fn run(ctx: &Context) -> Result<()> {
    let (session, api) = ctx.enter(AuthGate::staff()).await?;

    let old = prompt::password("Old password").await?;
    let new = prompt::password("New password").await?;
    let confirm = prompt::password("Confirm password").await?;
    auth::change_password(&api, &session, &old, &new, &confirm).await?;

    println!("{}", "Password changed successfully".green());
    Ok(())
}
