//! Status command implementation.

use anyhow::{Context as _, Result};
use clap::Args;
use colored::Colorize;

use crate::cli::ConnectionArgs;
use crate::output;
use crate::session::Context;

#[derive(Args, Debug)]
pub struct StatusArgs {}

pub async fn run(_args: StatusArgs, connection: &ConnectionArgs) -> Result<()> {
    let ctx = Context::new(connection)?;

    let access = ctx.session.access_token().context("Failed to read session")?;
    let refresh = ctx.session.refresh_token().context("Failed to read session")?;

    let state = if access.is_some() {
        "logged in".green()
    } else {
        "logged out".red()
    };

    output::field("Status", &state.to_string());
    output::field("API", ctx.api.base_url().as_str());
    output::field("Flavor", &format!("{:?}", ctx.api.flavor()).to_lowercase());
    output::field("Session", &ctx.session_path.display().to_string());
    if access.is_some() {
        output::field(
            "Refresh token",
            if refresh.is_some() { "stored" } else { "none" },
        );
    }

    Ok(())
}
