//! Summary command implementation.

use anyhow::{Context as _, Result};
use chrono::{Duration, Utc};
use clap::Args;
use colored::Colorize;

use nanit_core::{CareSummary, TimeRange};

use crate::cli::ConnectionArgs;
use crate::commands::pick_baby;
use crate::output;
use crate::session::Context;

/// How far back to look for the last feed and dirty diaper.
const LOOKBACK_HOURS: u32 = 7 * 24;

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Baby uid (defaults to the first baby on the account)
    #[arg(long)]
    pub baby: Option<String>,

    /// Hours to total over
    #[arg(long, default_value_t = 24)]
    pub hours: u32,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: SummaryArgs, connection: &ConnectionArgs) -> Result<()> {
    let ctx = Context::new(connection)?;
    ctx.require_session()?;

    let now = Utc::now();
    let range = TimeRange::last_hours(now, LOOKBACK_HOURS.max(args.hours))
        .context("Invalid time window")?;
    let since = now
        .checked_sub_signed(Duration::hours(i64::from(args.hours)))
        .context("Invalid time window")?;
    let auth = ctx.authenticator();
    let baby = pick_baby(&auth, args.baby.as_deref()).await?;

    let events = auth
        .calendar(&baby, range)
        .await
        .context("Failed to fetch calendar")?;
    let summary = CareSummary::from_events(&events, since, now);

    if args.json {
        return output::json(&summary);
    }

    println!("{}", format!("Last {} hours", args.hours).bold());
    output::field(
        "Feeds",
        &format!(
            "{} ({:.0} ml / {:.1} oz)",
            summary.feeds,
            summary.total_feed_ml,
            summary.total_feed_oz()
        ),
    );
    output::field("Diaper changes", &summary.diaper_changes.to_string());
    if let Some(secs) = summary.average_feed_interval_secs {
        output::field("Feed every", &output::span(secs));
    }
    if let Some(secs) = summary.average_diaper_interval_secs {
        output::field("Change every", &output::span(secs));
    }

    println!();
    output::field(
        "Last feed",
        &summary
            .last_feed
            .map(|t| output::when(t, now))
            .unwrap_or_else(|| "none this week".to_string()),
    );
    output::field(
        "Last change",
        &summary
            .last_diaper_change
            .map(|t| output::when(t, now))
            .unwrap_or_else(|| "none this week".to_string()),
    );
    output::field(
        "Last dirty diaper",
        &summary
            .last_dirty_diaper
            .map(|t| output::when(t, now))
            .unwrap_or_else(|| "none this week".to_string()),
    );

    Ok(())
}
