//! Babies command implementation.

use anyhow::{Context as _, Result};
use clap::Args;
use colored::Colorize;

use crate::cli::ConnectionArgs;
use crate::output;
use crate::session::Context;

#[derive(Args, Debug)]
pub struct BabiesArgs {
    /// Print JSON instead of a list
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: BabiesArgs, connection: &ConnectionArgs) -> Result<()> {
    let ctx = Context::new(connection)?;
    ctx.require_session()?;

    let babies = ctx
        .authenticator()
        .babies()
        .await
        .context("Failed to list babies")?;

    if args.json {
        return output::json(&babies);
    }

    if babies.is_empty() {
        output::note("No babies on this account.");
        return Ok(());
    }

    for baby in &babies {
        let birthday = baby
            .birthday
            .as_deref()
            .map(|b| format!(" born {}", b))
            .unwrap_or_default();
        println!("{}  {}{}", baby.uid.as_str().bold(), baby.display_name(), birthday.dimmed());
    }

    Ok(())
}
