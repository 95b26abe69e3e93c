use std::path::PathBuf;

use anyhow::{bail, Context as _, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use claimctl::api::ApiClient;
use claimctl::config::ConsoleConfig;
use claimctl::model::normalize_claims;
use claimctl::render::metrics::{chart, ChartView, EMPTY_CHART_MESSAGE};
use claimctl::render::results::{filter, table_rows, TableRow};
use claimctl::settings::{self, CapsEditor};
use claimctl::state::normalize_tenant;
use claimctl::tui::ConsoleUi;
use claimctl::upload::{self, UploadEvent, UploadSpec};

#[derive(Parser)]
#[command(
    name = "claimctl",
    about = "Claims validation console — terminal client for the RCM validation service",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Validation service base URL
    #[arg(long, env = "CLAIMCTL_API_URL", global = true)]
    api_url: Option<String>,

    /// Tenant id for non-interactive subcommands
    #[arg(long, env = "CLAIMCTL_TENANT", global = true)]
    tenant: Option<String>,

    /// Path to the TOML config file
    #[arg(long, env = "CLAIMCTL_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "CLAIMCTL_LOG", global = true)]
    log: Option<String>,

    /// Log output format ("pretty" | "json")
    #[arg(long, env = "CLAIMCTL_LOG_FORMAT", global = true)]
    log_format: Option<String>,

    /// Suppress progress and informational output.
    ///
    /// Errors are still printed to stderr. Use this flag when piping output
    /// to other tools.
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Open the interactive dashboard (default when no subcommand given).
    ///
    /// Starts at the sign-in screen; after login the dashboard, results,
    /// upload, reports, and settings pages are reachable with F1-F5.
    ///
    /// Examples:
    ///   claimctl
    ///   claimctl dashboard --api-url http://rcm.internal:8000
    Dashboard,
    /// Upload a claims batch and run validation.
    ///
    /// Reads the optional rule files first, streams the claims file with a
    /// byte progress bar, triggers validation, then prints the outcome
    /// summary. Exit code 0 when validation ran (even with failed checks),
    /// 1 when any step of the flow failed.
    ///
    /// Examples:
    ///   claimctl upload --claims batch.csv
    ///   claimctl upload --claims batch.csv --technical tech.json --medical med.json --tenant acme
    Upload {
        /// Claims CSV file (required)
        #[arg(long)]
        claims: PathBuf,
        /// Technical rules JSON file
        #[arg(long)]
        technical: Option<PathBuf>,
        /// Medical rules JSON file
        #[arg(long)]
        medical: Option<PathBuf>,
    },
    /// Print the results table for a tenant.
    ///
    /// Filters mirror the dashboard: --query matches claim id, error type,
    /// or status case-insensitively; --status and --error require an exact
    /// match.
    ///
    /// Examples:
    ///   claimctl results
    ///   claimctl results --tenant acme --status "Not validated"
    ///   claimctl results --query clm-00 --error "Medical error"
    Results {
        /// Substring match against id, error type, or status
        #[arg(long, default_value = "")]
        query: String,
        /// Exact status filter ("Validated" | "Not validated")
        #[arg(long, default_value = "")]
        status: String,
        /// Exact error-type filter
        #[arg(long, default_value = "")]
        error: String,
    },
    /// Print the metric bar charts for a tenant.
    ///
    /// Examples:
    ///   claimctl metrics
    ///   claimctl metrics --tenant acme
    Metrics,
    /// Show or update tenant settings.
    ///
    /// `set` loads current settings first, applies the edits, and saves the
    /// result — caps not mentioned are preserved in order.
    ///
    /// Examples:
    ///   claimctl settings show
    ///   claimctl settings set --threshold 250
    ///   claimctl settings set --add-cap 99213=150 --add-cap 83036=25.5
    ///   claimctl settings set --remove-cap 0
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Print the refined adjudication log for a tenant.
    ///
    /// Examples:
    ///   claimctl reports --tenant acme
    Reports,
    /// Delete all data for a tenant.
    ///
    /// Examples:
    ///   claimctl clear-tenant --tenant acme --yes
    ClearTenant {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Check that the validation service is reachable.
    ///
    /// Exit code 0 if healthy, 1 otherwise.
    ///
    /// Examples:
    ///   claimctl health
    Health,
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the threshold and caps table.
    Show,
    /// Apply edits and save.
    Set {
        /// New paid-amount approval threshold
        #[arg(long)]
        threshold: Option<f64>,
        /// Append a cap, formatted SERVICE=AMOUNT (repeatable)
        #[arg(long = "add-cap", value_name = "SERVICE=AMOUNT")]
        add_cap: Vec<String>,
        /// Remove the cap at this position (repeatable; applied high-to-low)
        #[arg(long = "remove-cap", value_name = "INDEX")]
        remove_cap: Vec<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = ConsoleConfig::new(
        args.config,
        args.api_url,
        args.tenant,
        args.log,
        args.log_format,
    );

    let command = args.command.unwrap_or(Command::Dashboard);

    // The dashboard owns the terminal — logging would corrupt it, so the
    // subscriber is only installed for non-interactive subcommands.
    if !matches!(command, Command::Dashboard) {
        init_tracing(&config);
    }

    match command {
        Command::Dashboard => ConsoleUi::new(config)?.run().await,
        Command::Upload {
            claims,
            technical,
            medical,
        } => cmd_upload(&config, claims, technical, medical, args.quiet).await,
        Command::Results {
            query,
            status,
            error,
        } => cmd_results(&config, &query, &status, &error).await,
        Command::Metrics => cmd_metrics(&config).await,
        Command::Settings { action } => cmd_settings(&config, action).await,
        Command::Reports => cmd_reports(&config).await,
        Command::ClearTenant { yes } => cmd_clear_tenant(&config, yes).await,
        Command::Health => cmd_health(&config).await,
    }
}

fn init_tracing(config: &ConsoleConfig) {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_new(&config.log).unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}

fn client(config: &ConsoleConfig) -> Result<ApiClient> {
    ApiClient::new(&config.api_url, config.timeout()).context("failed to build HTTP client")
}

// ─── upload ───────────────────────────────────────────────────────────────────

async fn cmd_upload(
    config: &ConsoleConfig,
    claims: PathBuf,
    technical: Option<PathBuf>,
    medical: Option<PathBuf>,
    quiet: bool,
) -> Result<()> {
    let api = client(config)?;
    let spec = UploadSpec {
        tenant: config.tenant.clone(),
        claims_path: Some(claims),
        technical_path: technical,
        medical_path: medical,
    };

    let bar = if quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{bar:40.cyan/blue} {percent:>3}%  {msg}")
                .unwrap(),
        );
        bar
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let flow = {
        let api = api.clone();
        tokio::spawn(async move { upload::run(&api, spec, tx).await })
    };

    let mut failure: Option<String> = None;
    while let Some(event) = rx.recv().await {
        match event {
            UploadEvent::Progress(snapshot) => {
                bar.set_length(snapshot.total);
                bar.set_position(snapshot.transferred);
                bar.set_message(format!(
                    "{} · {}",
                    snapshot.size_label(),
                    snapshot.speed_label()
                ));
            }
            UploadEvent::Uploaded => bar.set_message("validating…".to_string()),
            UploadEvent::Validated { outcome, .. } => {
                bar.finish_and_clear();
                if !quiet {
                    println!("{}", outcome.summary);
                }
            }
            UploadEvent::Failed { message } => {
                bar.abandon();
                failure = Some(message);
            }
            _ => {}
        }
    }

    // Surface panics from the flow task; its Result is reported via events.
    let _ = flow.await.context("upload task failed")?;

    if let Some(message) = failure {
        bail!("{message}");
    }
    Ok(())
}

// ─── results / metrics / reports ──────────────────────────────────────────────

async fn cmd_results(
    config: &ConsoleConfig,
    query: &str,
    status: &str,
    error: &str,
) -> Result<()> {
    let api = client(config)?;
    let tenant = normalize_tenant(&config.tenant);
    let resp = api.results(&tenant).await?;
    let claims = normalize_claims(&resp.claims);
    let filtered = filter(&claims, query, status, error);

    println!(
        "{:<8} {:<14} {:<16} {:<40} {}",
        "Status", "Claim ID", "Error type", "Explanation", "Recommended action"
    );
    for row in table_rows(&filtered) {
        match row {
            TableRow::Placeholder(message) => println!("{message}"),
            TableRow::Claim(r) => println!(
                "{:<8} {:<14} {:<16} {:<40} {}",
                r.pill_label,
                r.claim_id,
                r.error_type,
                r.explanation.join(" · "),
                r.actions.join(" · "),
            ),
        }
    }
    Ok(())
}

async fn cmd_metrics(config: &ConsoleConfig) -> Result<()> {
    let api = client(config)?;
    let tenant = normalize_tenant(&config.tenant);
    let resp = api.metrics(&tenant).await?;

    for (view, title) in [
        (ChartView::Counts, "Claims by category"),
        (ChartView::Amounts, "Paid amounts by category"),
    ] {
        println!("{title}");
        let bars = chart(&resp.metrics, view, &config.currency);
        if bars.is_empty() {
            println!("  {EMPTY_CHART_MESSAGE}");
        }
        for bar in bars {
            let fill = ((bar.percent / 100.0) * 40.0).round() as usize;
            println!(
                "  {:<16} {:<40} {:>6.1}%  {}",
                bar.category,
                "█".repeat(fill),
                bar.percent,
                bar.value_label
            );
        }
        println!();
    }
    Ok(())
}

async fn cmd_reports(config: &ConsoleConfig) -> Result<()> {
    let api = client(config)?;
    let tenant = normalize_tenant(&config.tenant);
    let resp = api.refined(&tenant).await?;

    if resp.refined.is_empty() {
        println!("No refined entries");
        return Ok(());
    }
    println!(
        "{:<14} {:<14} {:<16} {}",
        "Claim ID", "Status", "Error type", "Processed at"
    );
    for entry in resp.refined {
        println!(
            "{:<14} {:<14} {:<16} {}",
            entry.claim_id, entry.status, entry.error_type, entry.processed_at
        );
    }
    Ok(())
}

// ─── settings ─────────────────────────────────────────────────────────────────

async fn cmd_settings(config: &ConsoleConfig, action: SettingsAction) -> Result<()> {
    let api = client(config)?;
    let tenant = normalize_tenant(&config.tenant);
    let loaded = settings::load(&api, &tenant).await?;

    match action {
        SettingsAction::Show => {
            print_settings(&tenant, loaded.threshold, &loaded.caps);
        }
        SettingsAction::Set {
            threshold,
            add_cap,
            remove_cap,
        } => {
            let mut caps = loaded.caps;
            // High-to-low so earlier removals don't shift later indices.
            let mut removals = remove_cap;
            removals.sort_unstable_by(|a, b| b.cmp(a));
            for index in removals {
                if caps.remove(index).is_none() {
                    bail!("no cap at position {index} (have {})", caps.len());
                }
            }
            for spec in add_cap {
                let (service, amount) = spec
                    .split_once('=')
                    .with_context(|| format!("bad cap '{spec}', expected SERVICE=AMOUNT"))?;
                let amount: f64 = amount
                    .trim()
                    .parse()
                    .with_context(|| format!("bad cap amount in '{spec}'"))?;
                caps.add(service, amount);
            }
            let threshold = threshold.or(loaded.threshold).unwrap_or(0.0);

            settings::save(&api, &tenant, threshold, &caps).await?;
            print_settings(&tenant, Some(threshold), &caps);
        }
    }
    Ok(())
}

fn print_settings(tenant: &str, threshold: Option<f64>, caps: &CapsEditor) {
    println!("tenant: {tenant}");
    match threshold {
        Some(t) => println!("approval threshold: {t}"),
        None => println!("approval threshold: (unset)"),
    }
    if caps.is_empty() {
        println!("caps: {}", settings::EMPTY_CAPS_MESSAGE);
        return;
    }
    println!("caps:");
    for (i, entry) in caps.entries().iter().enumerate() {
        println!("  [{i}] {} = {:.2}", entry.service, entry.cap);
    }
}

// ─── maintenance ──────────────────────────────────────────────────────────────

async fn cmd_clear_tenant(config: &ConsoleConfig, yes: bool) -> Result<()> {
    let tenant = normalize_tenant(&config.tenant);
    if !yes {
        bail!("refusing to delete tenant '{tenant}' without --yes");
    }
    let api = client(config)?;
    let resp = api.clear_tenant(&tenant).await?;
    println!("tenant '{tenant}' cleared ({})", resp.status);
    Ok(())
}

async fn cmd_health(config: &ConsoleConfig) -> Result<()> {
    let api = client(config)?;
    match api.health().await {
        Ok(resp) if resp.status == "ok" => {
            println!("ok — {}", config.api_url);
            Ok(())
        }
        Ok(resp) => bail!("service reports status '{}'", resp.status),
        Err(e) => bail!("service unreachable at {}: {e}", config.api_url),
    }
}
