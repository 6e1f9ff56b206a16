//! Login command implementation.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context as _, Result, bail};
use clap::Args;
use colored::Colorize;

use nanit_core::{Credentials, LoginFlow, MfaChallenge};

use crate::cli::ConnectionArgs;
use crate::output;
use crate::session::Context;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account email
    #[arg(long)]
    pub email: Option<String>,

    /// Account password (prompted when omitted)
    #[arg(long)]
    pub password: Option<String>,

    /// One-time MFA code, if you already have it
    #[arg(long)]
    pub code: Option<String>,
}

/// Typed at the code prompt to re-enter email and password.
const BACK: &str = "back";

pub async fn run(args: LoginArgs, connection: &ConnectionArgs) -> Result<()> {
    let ctx = Context::new(connection)?;
    let mut flow = LoginFlow::new(Arc::clone(&ctx.api), Arc::clone(&ctx.session));

    let mut email = args.email;
    let mut password = args.password;
    let mut code = args.code;

    while !flow.is_authenticated() {
        let credentials = Credentials::new(
            take_or_prompt(&mut email, "Email")?,
            take_or_prompt(&mut password, "Password")?,
        );

        output::note("Logging in...");
        flow.submit_credentials(credentials)
            .await
            .context("Failed to login")?;

        if let Some(challenge) = flow.challenge() {
            describe(challenge);
        }

        while flow.challenge().is_some() {
            let entered = take_or_prompt(&mut code, &format!("Code (or '{}')", BACK))?;
            if entered.trim().eq_ignore_ascii_case(BACK) {
                flow.back()?;
                break;
            }

            if let Err(err) = flow.submit_code(&entered).await {
                output::error(&format!("Code rejected: {}", err));
            }
        }
    }

    output::success("Logged in successfully");
    println!();
    output::field("API", ctx.api.base_url().as_str());
    output::field("Session", &ctx.session_path.display().to_string());

    Ok(())
}

fn describe(challenge: &MfaChallenge) {
    let target = match (&challenge.phone_suffix, challenge.channel.as_str()) {
        (Some(suffix), _) => format!("the phone ending in {}", suffix),
        (None, "") => "your registered device".to_string(),
        (None, channel) => format!("your {}", channel),
    };
    eprintln!(
        "{} A verification code was sent to {}.",
        "?".yellow(),
        target
    );
}

/// Use a value given on the command line once, then fall back to stdin.
fn take_or_prompt(slot: &mut Option<String>, label: &str) -> Result<String> {
    match slot.take() {
        Some(value) => Ok(value),
        None => prompt(label),
    }
}

fn prompt(label: &str) -> Result<String> {
    eprint!("{}: ", label.bold());
    io::stderr().flush()?;

    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    if read == 0 {
        bail!("No input for {}", label.to_lowercase());
    }

    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
