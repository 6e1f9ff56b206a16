//! Logout command implementation.

use anyhow::{Context as _, Result};
use clap::Args;

use crate::cli::ConnectionArgs;
use crate::output;
use crate::session::Context;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub async fn run(_args: LogoutArgs, connection: &ConnectionArgs) -> Result<()> {
    let ctx = Context::new(connection)?;

    let was_authenticated = ctx
        .session
        .is_authenticated()
        .context("Failed to read session")?;
    ctx.session.clear().context("Failed to clear session")?;
    ctx.session
        .storage()
        .destroy()
        .context("Failed to remove session file")?;

    if was_authenticated {
        output::success("Logged out");
    } else {
        output::note("No active session.");
    }

    Ok(())
}
