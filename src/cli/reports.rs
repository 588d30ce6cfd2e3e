use std::path::Path;

use colored::Colorize;

use super::Context;
use crate::auth::AuthGate;
use crate::error::Result;
use crate::fmt::format_bytes;
use crate::reports::{download, Report};

pub async fn run(ctx: &Context, report: Report, output: Option<&Path>) -> Result<()> {
    let (_, api) = ctx.enter(AuthGate::staff()).await?;
    let (path, size) = download(&api, report, output).await?;
    println!(
        "{} {} → {} ({})",
        "Saved".green(),
        report.title(),
        path.display(),
        format_bytes(size)
    );
    Ok(())
}
