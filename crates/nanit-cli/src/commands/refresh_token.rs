//! Refresh token command implementation.

use anyhow::{Context as _, Result};
use clap::Args;

use nanit_core::VendorApi;

use crate::cli::ConnectionArgs;
use crate::output;
use crate::session::Context;

#[derive(Args, Debug)]
pub struct RefreshTokenArgs {}

pub async fn run(_args: RefreshTokenArgs, connection: &ConnectionArgs) -> Result<()> {
    let ctx = Context::new(connection)?;
    ctx.require_session()?;

    let access = ctx.session.access_token()?.context("No access token stored")?;
    let refresh = ctx
        .session
        .refresh_token()?
        .context("No refresh token stored. Run 'nanit login' again.")?;

    output::note("Refreshing session...");

    let pair = ctx
        .api
        .refresh(&access, &refresh)
        .await
        .context("Failed to refresh session")?;
    let rotated = pair.refresh_token.is_some();
    ctx.session
        .store(pair)
        .context("Failed to save refreshed session")?;

    output::success("Session refreshed successfully");
    output::field("Refresh token", if rotated { "rotated" } else { "unchanged" });

    Ok(())
}
