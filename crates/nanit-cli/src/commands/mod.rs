//! Subcommand implementations.

pub mod babies;
pub mod calendar;
pub mod login;
pub mod logout;
pub mod refresh_token;
pub mod serve;
pub mod status;
pub mod summary;

use anyhow::{Context as _, Result};

use nanit_core::{Authenticator, Baby, BabyUid, TokenStorage, VendorApi};

use crate::cli::{Commands, ConnectionArgs};

pub async fn handle(command: Commands, connection: ConnectionArgs) -> Result<()> {
    match command {
        Commands::Login(args) => login::run(args, &connection).await,
        Commands::Logout(args) => logout::run(args, &connection).await,
        Commands::Status(args) => status::run(args, &connection).await,
        Commands::RefreshToken(args) => refresh_token::run(args, &connection).await,
        Commands::Babies(args) => babies::run(args, &connection).await,
        Commands::Calendar(args) => calendar::run(args, &connection).await,
        Commands::Summary(args) => summary::run(args, &connection).await,
        Commands::Serve(args) => serve::run(args, &connection).await,
    }
}

/// The baby named by `--baby`, or the first one on the account.
pub(crate) async fn pick_baby<V: VendorApi, S: TokenStorage>(
    auth: &Authenticator<V, S>,
    requested: Option<&str>,
) -> Result<BabyUid> {
    if let Some(uid) = requested {
        return BabyUid::new(uid).context("Invalid baby uid");
    }

    let babies: Vec<Baby> = auth.babies().await.context("Failed to list babies")?;
    babies
        .into_iter()
        .next()
        .map(|baby| baby.uid)
        .context("No babies on this account")
}
