//! SOS Crise - crisis information from your terminal or browser.
//!
//! Reads emergency alerts, news, support points, donation needs,
//! volunteer opportunities and preparedness guides from the SOS Crise API,
//! and serves them as a web dashboard.

use std::future::Future;
use std::io;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{debug, error, warn};

mod cache;
mod cli;
mod client;
mod errors;
mod filters;
mod lookup;
mod models;
mod output;
mod pages;
mod server;
mod view;

use cli::{Cli, Command, FormatArgs};
use client::ApiClient;
use filters::{AlertFilter, ItemFilter, SupportPointFilter, TextQuery, Unfiltered};
use output::{Format, HumanRecord};
use view::{DetailView, FetchState, ListView, Selector, Visible};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    let timeout = Duration::from_secs(cli.timeout);
    let api = || ApiClient::new(&cli.api_url, timeout).context("failed to create API client");

    match cli.command {
        Command::Alerts(args) => cmd_alerts(&api()?, args),
        Command::News(args) => {
            let mut view = ListView::new(TextQuery::new(&args.search));
            view.begin();
            view.finish(block_on(api()?.news())?);
            print_list(&view, &args.output)
        }
        Command::Organizations(args) => {
            let mut view = ListView::new(Unfiltered);
            view.begin();
            view.finish(block_on(api()?.organizations())?);
            print_list(&view, &args)
        }
        Command::Supplies(args) => {
            let mut view = ListView::new(TextQuery::new(&args.search));
            view.begin();
            view.finish(block_on(api()?.supply_needs())?);
            print_list(&view, &args.output)
        }
        Command::Volunteers(args) => {
            let mut view = ListView::new(TextQuery::new(&args.search));
            view.begin();
            view.finish(block_on(api()?.volunteer_opportunities())?);
            print_list(&view, &args.output)
        }
        Command::SupportPoints(args) => {
            let mut view = ListView::new(SupportPointFilter {
                query: TextQuery::new(&args.search),
                kind: args.kind,
                mappable_only: args.mappable,
            });
            view.begin();
            view.finish(block_on(api()?.support_points())?);
            print_list(&view, &args.output)
        }
        Command::Guides(args) => cmd_guides(&api()?, &args),
        Command::Ui(args) => cmd_ui(args, &cli.api_url, timeout),
    }
}

/// Initialize tracing subscriber.
///
/// `RUST_LOG` applies unless `--verbose` or `--quiet` is given.
fn init_tracing(verbose: bool, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Drive one request to completion on a single-threaded runtime.
fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;
    Ok(runtime.block_on(future))
}

/// Apply `--limit` to what a list view shows. A failed fetch becomes the error.
fn shown<T>(visible: Visible<'_, T>, limit: Option<usize>) -> Result<Visible<'_, T>> {
    match visible {
        Visible::Failed(message) => bail!(message),
        Visible::Items(mut items) => {
            if let Some(limit) = limit {
                items.truncate(limit);
            }
            Ok(Visible::Items(items))
        }
        other => Ok(other),
    }
}

fn print_list<T, F>(view: &ListView<T, F>, args: &FormatArgs) -> Result<()>
where
    T: HumanRecord,
    F: ItemFilter<T>,
{
    let visible = shown(view.visible(), args.limit)?;
    if let Visible::Items(items) = &visible {
        debug!("showing {} of {} records", items.len(), view.total());
    }

    let mut handle = io::stdout().lock();
    output::write_visible(&mut handle, &visible, args.format)?;
    Ok(())
}

/// Execute the `alerts` command.
fn cmd_alerts(api: &ApiClient, args: cli::AlertsArgs) -> Result<()> {
    let mut view = ListView::new(AlertFilter {
        query: TextQuery::new(&args.search),
        severity: args.severity,
    });
    view.begin();
    view.finish(block_on(api.alerts())?);

    let visible = shown(view.visible(), args.output.limit)?;
    let mut handle = io::stdout().lock();
    output::write_visible(&mut handle, &visible, args.output.format)?;

    // Recommendations belong to the human view of an expanded alert
    let selector = Selector::new(args.selected);
    if let (Some(id), Format::Human) = (selector.selected(), args.output.format) {
        let expanded = match &visible {
            Visible::Items(items) => items.iter().find(|alert| selector.is_selected(alert.id)),
            _ => None,
        };
        match expanded {
            Some(alert) => output::write_recommendations(&mut handle, alert)?,
            None => warn!("alert {id} is not among the listed alerts"),
        }
    }

    Ok(())
}

/// Execute the `guides` command: the list, or one guide in full.
fn cmd_guides(api: &ApiClient, args: &cli::GuidesArgs) -> Result<()> {
    let mut handle = io::stdout().lock();

    let Some(id) = args.id else {
        let mut view = ListView::new(Unfiltered);
        view.begin();
        view.finish(block_on(api.guides())?);
        let visible = shown(view.visible(), None)?;
        output::write_visible(&mut handle, &visible, args.format)?;
        return Ok(());
    };

    let mut detail = DetailView::default();
    if let Some(ticket) = detail.select(id) {
        let result = block_on(api.guide(ticket.id()))?;
        detail.resolve(ticket, result);
    }
    debug!(guide = ?detail.selected(), "guide request settled");

    match detail.state() {
        FetchState::Loaded(guide) => output::write_records(&mut handle, &[guide], args.format)?,
        FetchState::Failed(message) => bail!(*message),
        FetchState::Idle | FetchState::Loading => {}
    }
    Ok(())
}

/// Execute the `ui` command - start web server.
fn cmd_ui(args: cli::UiArgs, api_url: &str, timeout: Duration) -> Result<()> {
    // Build server config
    let config = server::ServerConfig {
        port: args.port,
        host: args.host.clone(),
        api_url: api_url.to_string(),
        timeout,
    };

    // Print startup message
    let url = format!("http://{}:{}", args.host, args.port);
    println!("\x1b[1m🆘 SOS Crise Web UI\x1b[0m");
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("  Local:   \x1b[96m{url}\x1b[0m");
    println!("  API:     {api_url}");
    println!("  Timeout: {}s", timeout.as_secs());
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("\x1b[2mPress Ctrl+C to stop\x1b[0m\n");

    // Open browser if requested (using xdg-open/open command)
    if args.open {
        #[cfg(target_os = "linux")]
        let _ = std::process::Command::new("xdg-open").arg(&url).spawn();
        #[cfg(target_os = "macos")]
        let _ = std::process::Command::new("open").arg(&url).spawn();
        #[cfg(target_os = "windows")]
        let _ = std::process::Command::new("cmd").args(["/c", "start", &url]).spawn();
    }

    // Run the async server on tokio runtime
    tokio::runtime::Runtime::new()
        .context("failed to create tokio runtime")?
        .block_on(server::run_server(config))
}
