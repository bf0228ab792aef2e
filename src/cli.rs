//! Command-line interface definitions.
//!
//! Uses clap derive API for argument parsing.

use clap::{Parser, Subcommand};

use crate::client::{DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
use crate::filters::Choice;
use crate::models::{Id, PointType, Severity};
use crate::output::Format;

/// Emergency alerts, support points and ways to help during crises in Brazil.
#[derive(Parser, Debug)]
#[command(name = "sos-crise")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,

    /// Base URL of the SOS Crise API
    #[arg(long, global = true, env = "SOS_CRISE_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "SOS_CRISE_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Enable verbose debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    pub quiet: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List emergency alerts
    Alerts(AlertsArgs),

    /// List crisis news
    News(SearchArgs),

    /// List NGOs accepting monetary donations
    Organizations(FormatArgs),

    /// List supply donation needs
    Supplies(SearchArgs),

    /// List volunteer opportunities
    Volunteers(SearchArgs),

    /// List shelters, hospitals and other support points
    SupportPoints(SupportPointsArgs),

    /// List preparedness guides, or read one
    Guides(GuidesArgs),

    /// Start the web UI server
    Ui(UiArgs),
}

/// Output format and size shared by list commands.
#[derive(Parser, Debug)]
pub struct FormatArgs {
    /// Maximum number of records to show
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for commands with a free-text search only.
#[derive(Parser, Debug)]
pub struct SearchArgs {
    /// Case-insensitive text to look for
    #[arg(long, short = 's', default_value = "")]
    pub search: String,

    #[command(flatten)]
    pub output: FormatArgs,
}

/// Arguments for the `alerts` command.
#[derive(Parser, Debug)]
pub struct AlertsArgs {
    /// Text to look for in the title or location
    #[arg(long, short = 's', default_value = "")]
    pub search: String,

    /// Severity to show: all, critical, high, medium, low
    #[arg(long, default_value = "all", value_parser = parse_severity)]
    pub severity: Choice<Severity>,

    /// Show the recommendations of this alert
    #[arg(long)]
    pub selected: Option<Id>,

    #[command(flatten)]
    pub output: FormatArgs,
}

/// Arguments for the `support-points` command.
#[derive(Parser, Debug)]
pub struct SupportPointsArgs {
    /// Text to look for in the name or address
    #[arg(long, short = 's', default_value = "")]
    pub search: String,

    /// Kind of place: all, shelter, hospital, donation_collection, aid_distribution, health_clinic
    #[arg(long = "type", default_value = "all", value_parser = parse_point_type)]
    pub kind: Choice<PointType>,

    /// Only places with known coordinates
    #[arg(long)]
    pub mappable: bool,

    #[command(flatten)]
    pub output: FormatArgs,
}

/// Arguments for the `guides` command.
#[derive(Parser, Debug)]
pub struct GuidesArgs {
    /// Read the full guide with this id
    #[arg(long)]
    pub id: Option<Id>,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `ui` command.
#[derive(Parser, Debug)]
pub struct UiArgs {
    /// Port to listen on
    #[arg(long, short = 'p', default_value = "8080")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Open browser automatically
    #[arg(long)]
    pub open: bool,
}

/// Parse an output format from string.
fn parse_format(s: &str) -> Result<Format, String> {
    s.parse()
}

/// Parse a severity filter from string.
fn parse_severity(s: &str) -> Result<Choice<Severity>, String> {
    let choice: Choice<Severity> = s.parse().map_err(|e| format!("{e:?}"))?;
    match &choice {
        Choice::Only(Severity::Other(raw)) => Err(format!(
            "unknown severity: {raw} (expected: all, critical, high, medium, low)"
        )),
        _ => Ok(choice),
    }
}

/// Parse a support point type filter from string.
fn parse_point_type(s: &str) -> Result<Choice<PointType>, String> {
    let choice: Choice<PointType> = s.parse().map_err(|e| format!("{e:?}"))?;
    match &choice {
        Choice::Only(PointType::Other(raw)) => Err(format!("unknown support point type: {raw}")),
        _ => Ok(choice),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_alerts_filters() {
        let cli = Cli::parse_from([
            "sos-crise",
            "--api-url",
            "http://api.local",
            "alerts",
            "--search",
            "porto",
            "--severity",
            "Critical",
        ]);
        assert_eq!(cli.api_url, "http://api.local");
        match cli.command {
            Command::Alerts(args) => {
                assert_eq!(args.search, "porto");
                assert_eq!(args.severity, Choice::Only(Severity::Critical));
                assert_eq!(args.output.format, Format::Human);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_rejects_unknown_severity() {
        let result = Cli::try_parse_from(["sos-crise", "alerts", "--severity", "extreme"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_support_point_type_flag() {
        let cli = Cli::parse_from(["sos-crise", "support-points", "--type", "shelter", "--mappable"]);
        match cli.command {
            Command::SupportPoints(args) => {
                assert_eq!(args.kind, Choice::Only(PointType::Shelter));
                assert!(args.mappable);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
