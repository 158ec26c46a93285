//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use burgerwatch_core::{
    BrandRunSummary, Confirmer, ProgressReporter, Scheduler, SweepSummary,
};
use burgerwatch_crawler::{AdapterRegistry, ChromeLauncher, CrawlContext};
use burgerwatch_shared::{
    AppConfig, CrawlConfig, DraftProduct, PersistMode, ScheduleConfig, SessionConfig,
    database_path, init_config, load_config, load_config_from,
};
use burgerwatch_storage::{ProductStore, Storage};
use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// BurgerWatch: track new burgers across fast-food brands.
#[derive(Parser)]
#[command(
    name = "burgerwatch",
    version,
    about = "Crawl burger menus, keep the new products, and run on a schedule.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.burgerwatch/burgerwatch.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file, overriding the configured path.
    #[arg(long, env = "BURGERWATCH_DB", global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Sweep every brand once, inserting new products without asking.
    Run,

    /// Sweep now, then at the configured times and interval until Ctrl-C.
    Schedule,

    /// Crawl a single brand.
    Crawl {
        /// Brand id (see `burgerwatch brands`).
        brand: String,

        /// Print the batch and which items are new without writing.
        #[arg(long)]
        dry_run: bool,

        /// Insert new products without confirmation.
        #[arg(short, long)]
        yes: bool,
    },

    /// List registered brand ids.
    Brands,

    /// Show recently stored products.
    Recent {
        /// Maximum number of products.
        #[arg(short, long, default_value = "20")]
        limit: u32,

        /// Only products of this brand (local name, e.g. 버거킹).
        #[arg(short, long)]
        brand: Option<String>,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Database maintenance.
    Db {
        #[command(subcommand)]
        action: DbAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum DbAction {
    /// Open the database, apply migrations, and report the product count.
    Check,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "burgerwatch=info",
        1 => "burgerwatch=debug",
        _ => "burgerwatch=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    let db = match &cli.db {
        Some(path) => path.clone(),
        None => database_path(&config)?,
    };

    match cli.command {
        Command::Run => cmd_run(&config, &db).await,
        Command::Schedule => cmd_schedule(&config, &db).await,
        Command::Crawl {
            brand,
            dry_run,
            yes,
        } => cmd_crawl(&config, &db, &brand, dry_run, yes).await,
        Command::Brands => cmd_brands(&config),
        Command::Recent { limit, brand, json } => {
            cmd_recent(&db, limit, brand.as_deref(), json).await
        }
        Command::Db { action } => match action {
            DbAction::Check => cmd_db_check(&db).await,
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(cli.config.as_deref()),
            ConfigAction::Show => cmd_config_show(&config, &db),
        },
    }
}

fn registry(config: &AppConfig) -> Result<AdapterRegistry> {
    let ctx = CrawlContext::new(
        Arc::new(ChromeLauncher),
        SessionConfig::from(config),
        CrawlConfig::from(config),
    )?;
    Ok(AdapterRegistry::with_builtin(ctx))
}

async fn scheduler(config: &AppConfig, db: &Path) -> Result<Scheduler> {
    let storage = Storage::open(db).await?;
    Ok(Scheduler::new(registry(config)?, Arc::new(storage)))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(config: &AppConfig, db: &Path) -> Result<()> {
    info!(db = %db.display(), "starting sweep");
    let progress = Arc::new(CliProgress::new());
    let scheduler = scheduler(config, db).await?.with_progress(progress);

    let summary = scheduler.run_all().await;
    print_sweep(&summary);
    Ok(())
}

async fn cmd_schedule(config: &AppConfig, db: &Path) -> Result<()> {
    let schedule = ScheduleConfig::try_from(config)?;
    let scheduler = scheduler(config, db).await?;

    info!(
        interval_secs = schedule.interval.as_secs(),
        daily_at = ?schedule.daily_at,
        "scheduler starting"
    );
    scheduler
        .start_until(&schedule, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await;
    Ok(())
}

async fn cmd_crawl(
    config: &AppConfig,
    db: &Path,
    brand: &str,
    dry_run: bool,
    yes: bool,
) -> Result<()> {
    let progress = Arc::new(CliProgress::new());
    let scheduler = scheduler(config, db)
        .await?
        .with_progress(progress.clone());

    if dry_run {
        progress.spinner.set_message(format!("Crawling {brand}"));
        let dry = scheduler.crawl_only(brand).await?;
        progress.spinner.finish_and_clear();

        println!();
        println!("  {} ({})", dry.batch.brand.name, brand);
        for item in &dry.batch.items {
            let new = dry.new_items.iter().any(|n| n.name == item.name);
            println!("  {} {}", if new { "+" } else { " " }, describe(item));
        }
        for failure in &dry.batch.failures {
            println!("  ! {failure}");
        }
        println!();
        println!(
            "  {} crawled, {} new (dry run, nothing written)",
            dry.batch.items.len(),
            dry.new_items.len()
        );
        println!();
        return Ok(());
    }

    let mode = if yes {
        PersistMode::Auto
    } else {
        config.persist.mode
    };
    let confirmer = PromptConfirmer {
        spinner: progress.spinner.clone(),
    };
    let summary = scheduler.run_once(brand, mode, &confirmer).await?;
    progress.spinner.finish_and_clear();

    println!();
    print_brand(&summary);
    println!();
    Ok(())
}

fn cmd_brands(config: &AppConfig) -> Result<()> {
    for id in registry(config)?.brands() {
        println!("{id}");
    }
    Ok(())
}

async fn cmd_recent(db: &Path, limit: u32, brand: Option<&str>, json: bool) -> Result<()> {
    let storage = Storage::open_readonly(db).await?;
    let products = storage.list_recent_products(limit, brand).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&products)?);
        return Ok(());
    }
    if products.is_empty() {
        println!("No products stored yet.");
        return Ok(());
    }

    for p in &products {
        let kcal = p
            .nutrition
            .and_then(|n| n.calories)
            .map(|c| format!("{c:.0} kcal"))
            .unwrap_or_default();
        println!(
            "{:<12} {:<28} {:>8} {:<8} {:<9} {}",
            p.brand_name,
            p.name,
            format_price(p.price),
            p.patty,
            kcal,
            p.created_at.format("%Y-%m-%d %H:%M"),
        );
    }
    Ok(())
}

async fn cmd_db_check(db: &Path) -> Result<()> {
    let storage = Storage::open(db).await?;
    let count = storage.count_products().await?;
    println!("Database: {}", db.display());
    println!("Products: {count}");
    Ok(())
}

fn cmd_config_init(path: Option<&Path>) -> Result<()> {
    let path = match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, toml::to_string_pretty(&AppConfig::default())?)?;
            path.to_path_buf()
        }
        None => init_config()?,
    };
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig, db: &Path) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("# database: {}", db.display());
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn format_price(price: u32) -> String {
    if price == 0 {
        return "-".into();
    }
    let digits = price.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out.push('원');
    out
}

fn describe(item: &DraftProduct) -> String {
    format!("{} {} [{}]", item.name, format_price(item.price), item.patty)
}

fn print_brand(summary: &BrandRunSummary) {
    let state = summary
        .final_state
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".into());
    println!(
        "  {}: {} crawled, {} new, {} declined, {} inserted ({state})",
        summary.brand,
        summary.crawled,
        summary.proposed,
        summary.declined,
        summary.report.inserted.len(),
    );
    for name in &summary.report.inserted {
        println!("    + {name}");
    }
    for failure in &summary.crawl_failures {
        println!("    ! {failure}");
    }
    for failure in &summary.report.failures {
        println!("    ! {failure}");
    }
}

fn print_sweep(summary: &SweepSummary) {
    println!();
    for brand in &summary.brands {
        print_brand(brand);
    }
    println!();
    println!(
        "  Inserted {} product(s) in {:.1}s",
        summary.inserted(),
        summary.elapsed.as_secs_f64()
    );
    let failed = summary.failed_brands();
    if !failed.is_empty() {
        println!("  Failed brands: {}", failed.join(", "));
    }
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter and confirmer
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn sweep_started(&self, total: usize) {
        self.spinner.set_message(format!("Sweeping {total} brands"));
    }

    fn brand_started(&self, brand: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Crawling [{current}/{total}] {brand}"));
    }

    fn brand_finished(&self, summary: &BrandRunSummary) {
        let mark = if summary.is_clean() { "✓" } else { "!" };
        self.spinner.println(format!(
            "{mark} {}: {} crawled, {} inserted",
            summary.brand,
            summary.crawled,
            summary.report.inserted.len()
        ));
    }

    fn sweep_finished(&self, _summary: &SweepSummary) {
        self.spinner.finish_and_clear();
    }
}

/// Asks on the terminal, pausing the spinner while the prompt is shown.
struct PromptConfirmer {
    spinner: ProgressBar,
}

impl Confirmer for PromptConfirmer {
    fn confirm(&self, item: &DraftProduct) -> bool {
        self.spinner.suspend(|| {
            dialoguer::Confirm::new()
                .with_prompt(format!("Save {} ({})?", describe(item), item.brand.name))
                .default(true)
                .interact()
                .unwrap_or(false)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_crawl_flags() {
        let cli = Cli::try_parse_from(["burgerwatch", "crawl", "kfc", "--dry-run", "-v"]).unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Command::Crawl {
                brand,
                dry_run,
                yes,
            } => {
                assert_eq!(brand, "kfc");
                assert!(dry_run);
                assert!(!yes);
            }
            _ => panic!("expected crawl"),
        }
    }

    #[test]
    fn parses_global_paths_and_recent() {
        let cli = Cli::try_parse_from([
            "burgerwatch",
            "--db",
            "/tmp/bw.db",
            "recent",
            "--limit",
            "5",
            "--brand",
            "버거킹",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.db.as_deref(), Some(Path::new("/tmp/bw.db")));
        assert!(matches!(
            cli.command,
            Command::Recent { limit: 5, json: true, ref brand } if brand.as_deref() == Some("버거킹")
        ));
    }

    #[test]
    fn rejects_unknown_log_format() {
        assert!(Cli::try_parse_from(["burgerwatch", "--log-format", "xml", "run"]).is_err());
    }

    #[test]
    fn price_formatting() {
        assert_eq!(format_price(0), "-");
        assert_eq!(format_price(900), "900원");
        assert_eq!(format_price(12000), "12,000원");
        assert_eq!(format_price(1234567), "1,234,567원");
    }
}
