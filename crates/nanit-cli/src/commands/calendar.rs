//! Calendar command implementation.

use anyhow::{Context as _, Result, bail};
use chrono::Utc;
use clap::Args;

use nanit_core::TimeRange;

use crate::cli::ConnectionArgs;
use crate::commands::pick_baby;
use crate::output;
use crate::session::Context;

#[derive(Args, Debug)]
pub struct CalendarArgs {
    /// Baby uid (defaults to the first baby on the account)
    #[arg(long)]
    pub baby: Option<String>,

    /// Window ending now, in hours
    #[arg(long, default_value_t = 24, conflicts_with_all = ["start", "end"])]
    pub hours: u32,

    /// Window start, epoch seconds
    #[arg(long, requires = "end")]
    pub start: Option<i64>,

    /// Window end, epoch seconds
    #[arg(long, requires = "start")]
    pub end: Option<i64>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl CalendarArgs {
    fn range(&self) -> Result<TimeRange> {
        let range = match (self.start, self.end) {
            (Some(start), Some(end)) => TimeRange::new(start, end),
            (None, None) => TimeRange::last_hours(Utc::now(), self.hours),
            _ => bail!("--start and --end must be given together"),
        };
        range.context("Invalid time window")
    }
}

pub async fn run(args: CalendarArgs, connection: &ConnectionArgs) -> Result<()> {
    let ctx = Context::new(connection)?;
    ctx.require_session()?;

    let range = args.range()?;
    let auth = ctx.authenticator();
    let baby = pick_baby(&auth, args.baby.as_deref()).await?;

    let mut events = auth
        .calendar(&baby, range)
        .await
        .context("Failed to fetch calendar")?;
    events.sort_by_key(|e| e.timestamp);

    if events.is_empty() {
        output::note("No events in this window.");
        return Ok(());
    }

    for event in &events {
        if args.pretty {
            output::json_pretty(event)?;
        } else {
            output::json(event)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(hours: u32, start: Option<i64>, end: Option<i64>) -> CalendarArgs {
        CalendarArgs {
            baby: None,
            hours,
            start,
            end,
            pretty: false,
        }
    }

    #[test]
    fn explicit_window_is_used() {
        let range = args(24, Some(100), Some(200)).range().unwrap();
        assert_eq!((range.start(), range.end()), (100, 200));
    }

    #[test]
    fn hours_window_ends_now() {
        let range = args(6, None, None).range().unwrap();
        assert_eq!(range.end() - range.start(), 6 * 3600);
    }

    #[test]
    fn inverted_window_is_rejected() {
        assert!(args(24, Some(200), Some(100)).range().is_err());
    }
}
