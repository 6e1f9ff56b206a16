//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::commands::{
    babies::BabiesArgs, calendar::CalendarArgs, login::LoginArgs, logout::LogoutArgs,
    refresh_token::RefreshTokenArgs, serve::ServeArgs, status::StatusArgs, summary::SummaryArgs,
};

/// Track bottle feeds and diaper changes logged in the Nanit app.
#[derive(Parser, Debug)]
#[command(name = "nanit")]
#[command(author, version = env!("NANIT_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where to reach the API and where to keep the session.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// API base URL: the Nanit API, or a nanit proxy with --proxy
    #[arg(
        long,
        env = "NANIT_API_URL",
        default_value = "https://api.nanit.com",
        global = true
    )]
    pub api_url: String,

    /// Talk to a nanit proxy instead of the vendor API
    #[arg(long, global = true)]
    pub proxy: bool,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30, global = true)]
    pub timeout_secs: u64,

    /// Accept invalid TLS certificates from the API (unsafe)
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Session file (defaults to the platform data directory)
    #[arg(long, env = "NANIT_SESSION_FILE", global = true)]
    pub session_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in with email and password, then an MFA code if asked
    Login(LoginArgs),

    /// Forget the stored session
    Logout(LogoutArgs),

    /// Show whether a session is stored
    Status(StatusArgs),

    /// Exchange the refresh token for new tokens
    RefreshToken(RefreshTokenArgs),

    /// List the babies on the account
    Babies(BabiesArgs),

    /// Print care events as JSON lines
    Calendar(CalendarArgs),

    /// Summarise recent feeds and diaper changes
    Summary(SummaryArgs),

    /// Run the HTTP proxy in front of the Nanit API
    Serve(ServeArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "nanit",
            "babies",
            "--proxy",
            "--api-url",
            "http://localhost:3000",
            "-vv",
        ])
        .unwrap();
        assert!(cli.connection.proxy);
        assert_eq!(cli.connection.api_url, "http://localhost:3000");
        assert_eq!(cli.verbose, 2);
    }
}
