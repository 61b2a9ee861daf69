use std::time::{Duration, SystemTime};

use clap::{Parser, Subcommand};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use model_intel_core::{
    api::{LearnClient, RetailPricesClient},
    availability::{extract_availability, AvailabilityRow, DeploymentType},
    cache::{self, CachedDocuments, CachedPricing, DiskCache},
    pricing::{discover_regions, fetch_pricing, filter_pricing, normalize_pricing, Price},
    retirement::{
        extract_retirements, filter_retirements, model_names, DateFilter, RetirementDateKind,
    },
    Config, Document, DocumentSource,
};

// ── Palette ──────────────────────────────────────────────────────────

fn s_header() -> Style { Style::new().color256(252).bold() }  // bright gray, bold
fn s_dim() -> Style    { Style::new().color256(248) }         // light gray
fn s_tree() -> Style   { Style::new().color256(245) }         // mid gray
fn s_hint() -> Style   { Style::new().color256(243) }         // soft gray
fn s_ok() -> Style     { Style::new().color256(114) }         // green
fn s_warn() -> Style   { Style::new().color256(214) }         // amber
fn s_err() -> Style    { Style::new().color256(167) }         // red
fn s_bold() -> Style   { Style::new().bold() }

fn sep(width: usize) -> String {
    s_tree().apply_to("\u{2500}".repeat(width)).to_string()
}

fn header_cells(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|n| Cell::new(n).fg(Color::AnsiValue(248)))
        .collect()
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn fmt_fetched(t: SystemTime) -> String {
    let dt: chrono::DateTime<chrono::Local> = t.into();
    dt.format("%Y-%m-%d %H:%M").to_string()
}

// ── CLI Args ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "model-intel",
    about = "Azure OpenAI model retirements, regional availability and pricing",
    version,
    after_help = "examples:\n  \
        model-intel retirements --dates tentative\n  \
        model-intel retirements --model gpt-4o\n  \
        model-intel availability --deployment global-standard --model o3-mini\n  \
        model-intel pricing eastus2 --search gpt-4o\n  \
        model-intel regions\n  \
        model-intel refresh                       (re-fetch cached pages)"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print JSON instead of tables.
    #[arg(long, short, global = true)]
    json: bool,

    /// Ignore cached pages and fetch fresh copies.
    #[arg(long, global = true)]
    no_cache: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Model deprecation and retirement schedule.
    Retirements {
        #[arg(long, short)]
        model: Option<String>,
        /// all, confirmed or tentative
        #[arg(long, default_value = "all")]
        dates: DateFilter,
    },
    /// Which regions offer which models, per deployment type.
    Availability {
        /// e.g. "Global Standard", global-standard, provisioned
        #[arg(long, short)]
        deployment: Option<DeploymentType>,
        #[arg(long, short)]
        model: Option<String>,
    },
    /// Retail prices for OpenAI meters in a region.
    Pricing {
        region: Option<String>,
        /// Case-insensitive match on meter or product name.
        #[arg(long, short)]
        search: Option<String>,
    },
    /// Regions that have OpenAI pricing.
    Regions,
    /// Model names from the retirement tables.
    Models,
    /// Latest Azure OpenAI announcements.
    WhatsNew,
    /// Clear cached data and fetch the Learn pages again.
    Refresh,
}

struct Sources {
    config: Config,
    docs: CachedDocuments<LearnClient>,
    prices: CachedPricing<RetailPricesClient>,
}

impl Sources {
    fn new(config: Config, no_cache: bool) -> anyhow::Result<Self> {
        let dir = cache::cache_dir().unwrap_or_else(|| std::env::temp_dir().join("model-intel"));
        let ttl = if no_cache {
            Duration::ZERO
        } else {
            Duration::from_secs(config.cache_ttl_secs)
        };
        let cache = DiskCache::new(dir, ttl);
        Ok(Self {
            docs: CachedDocuments::new(LearnClient::from_config(&config)?, cache.clone()),
            prices: CachedPricing::new(RetailPricesClient::from_config(&config)?, cache),
            config,
        })
    }

    /// Fetch a Learn page. A failed fetch is reported on stderr and gives
    /// `None`; only terminal errors are returned.
    async fn document(&self, doc: Document, what: &str) -> anyhow::Result<Option<String>> {
        let url = doc.url(&self.config);
        let term = Term::stderr();
        term.write_line(&format!("{}", s_dim().apply_to(format!("fetching {what}..."))))?;
        let result = self.docs.fetch_document(url).await;
        term.clear_last_lines(1)?;
        match result {
            Ok(text) => Ok(Some(text)),
            Err(e) => {
                eprintln!("{}", s_err().apply_to(format!("warning: could not fetch {what}: {e}")));
                Ok(None)
            }
        }
    }

    fn fetched_note(&self, doc: Document) -> Option<String> {
        self.docs
            .cache()
            .written_at(doc.url(&self.config))
            .map(|t| format!("fetched {}", fmt_fetched(t)))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let sources = Sources::new(config, cli.no_cache)?;

    match cli.command {
        Commands::Retirements { model, dates } => {
            cmd_retirements(&sources, model.as_deref(), dates, cli.json).await?;
        }
        Commands::Availability { deployment, model } => {
            cmd_availability(&sources, deployment, model.as_deref(), cli.json).await?;
        }
        Commands::Pricing { region, search } => {
            let region = region.unwrap_or_else(|| sources.config.default_region.clone());
            cmd_pricing(&sources, &region, search.as_deref(), cli.json).await?;
        }
        Commands::Regions => cmd_regions(&sources, cli.json).await?,
        Commands::Models => cmd_models(&sources, cli.json).await?,
        Commands::WhatsNew => cmd_whats_new(&sources).await?,
        Commands::Refresh => cmd_refresh(&sources).await?,
    }
    Ok(())
}

// ── Retirements ──────────────────────────────────────────────────────

async fn cmd_retirements(
    sources: &Sources,
    model: Option<&str>,
    dates: DateFilter,
    json: bool,
) -> anyhow::Result<()> {
    let Some(raw) = sources.document(Document::Retirements, "retirement data").await? else {
        println!("{}", s_dim().apply_to("  no retirement data"));
        return Ok(());
    };
    let rows = extract_retirements(&raw);

    if rows.is_empty() {
        eprintln!(
            "{}",
            s_warn().apply_to("could not parse retirement tables, showing the page as fetched")
        );
        println!("{raw}");
        return Ok(());
    }

    let shown = filter_retirements(&rows, model, dates);
    if json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    println!();
    println!("{}", s_header().apply_to("retirement alerts"));
    println!("{}", sep(72));

    if shown.is_empty() {
        println!("  {}", s_dim().apply_to("no retirement entries match the current filters"));
        println!("{}", sep(72));
        return Ok(());
    }

    let mut table = new_table();
    table.set_header(header_cells(&[
        "Category",
        "Model",
        "Version",
        "Status",
        "Deprecation",
        "Retirement",
        "Replacement",
    ]));
    for r in &shown {
        let retire_color = match RetirementDateKind::classify(&r.retirement_date) {
            RetirementDateKind::Confirmed => Color::AnsiValue(167),
            RetirementDateKind::Tentative => Color::AnsiValue(214),
            RetirementDateKind::Unspecified => Color::AnsiValue(245),
        };
        table.add_row(vec![
            Cell::new(r.category.map(|c| c.title()).unwrap_or("")).fg(Color::AnsiValue(146)),
            Cell::new(&r.model).fg(Color::AnsiValue(252)),
            Cell::new(&r.version).fg(Color::AnsiValue(248)),
            Cell::new(&r.status).fg(Color::AnsiValue(248)),
            Cell::new(&r.deprecation_date).fg(Color::AnsiValue(248)),
            Cell::new(&r.retirement_date).fg(retire_color),
            Cell::new(&r.replacement).fg(Color::AnsiValue(109)),
        ]);
    }
    println!("{table}");
    println!("{}", sep(72));

    let mut footer = format!("  {} models shown", shown.len());
    if let Some(note) = sources.fetched_note(Document::Retirements) {
        footer.push_str(&format!("   {note}"));
    }
    println!("{}", s_hint().apply_to(footer));
    println!();
    Ok(())
}

async fn cmd_models(sources: &Sources, json: bool) -> anyhow::Result<()> {
    let Some(raw) = sources.document(Document::Retirements, "retirement data").await? else {
        return Ok(());
    };
    let names = model_names(&extract_retirements(&raw));
    if json {
        println!("{}", serde_json::to_string_pretty(&names)?);
        return Ok(());
    }
    if names.is_empty() {
        println!("  {}", s_dim().apply_to("no models found"));
        return Ok(());
    }
    println!();
    println!("{}", s_header().apply_to("models"));
    println!("{}", sep(40));
    for n in &names {
        println!("  {}", s_bold().apply_to(n));
    }
    println!("{}", sep(40));
    println!(
        "{}",
        s_hint().apply_to(format!("  {} models   model-intel retirements --model <name>", names.len()))
    );
    println!();
    Ok(())
}

// ── Availability ─────────────────────────────────────────────────────

fn availability_table(columns: &[String], rows: &[AvailabilityRow]) -> Table {
    let mut table = new_table();
    let mut header = vec![Cell::new("Region").fg(Color::AnsiValue(248))];
    header.extend(columns.iter().map(|c| Cell::new(c).fg(Color::AnsiValue(248))));
    table.set_header(header);

    for row in rows {
        let mut cells = vec![Cell::new(&row.region).fg(Color::AnsiValue(252))];
        cells.extend(row.flags.iter().map(|&f| {
            if f {
                Cell::new("\u{2713}").fg(Color::AnsiValue(114))
            } else {
                Cell::new("\u{2500}").fg(Color::AnsiValue(245))
            }
        }));
        table.add_row(cells);
    }
    table
}

async fn cmd_availability(
    sources: &Sources,
    deployment: Option<DeploymentType>,
    model: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let Some(raw) = sources.document(Document::Availability, "availability data").await? else {
        println!("{}", s_dim().apply_to("  no availability data"));
        return Ok(());
    };
    let tables = extract_availability(&raw);

    if tables.is_empty() {
        eprintln!("{}", s_warn().apply_to("could not parse availability data, showing the page as fetched"));
        println!("{raw}");
        return Ok(());
    }

    let Some(dep) = deployment.or_else(|| tables.keys().next().copied()) else {
        return Ok(());
    };
    let Some(table) = tables.get(&dep) else {
        let found: Vec<&str> = tables.keys().map(|d| d.label()).collect();
        eprintln!(
            "{}",
            s_err().apply_to(format!("no {dep} table on the page (found: {})", found.join(", ")))
        );
        return Ok(());
    };

    match model {
        Some(m) => {
            let Some(split) = table.for_model(m) else {
                if json {
                    println!("null");
                } else {
                    println!();
                    println!(
                        "  {}",
                        s_warn().apply_to(format!("{m} is not available on {dep} deployment"))
                    );
                    println!();
                }
                return Ok(());
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&split)?);
                return Ok(());
            }

            println!();
            println!(
                "{}  {}",
                s_header().apply_to(format!("{m} on {dep}")),
                s_dim().apply_to(format!(
                    "available in {} regions, not available in {}",
                    split.available.len(),
                    split.unavailable.len()
                ))
            );
            println!("{}", sep(64));
            if split.available.is_empty() {
                println!("  {}", s_dim().apply_to("no regions"));
            } else {
                println!("{}", availability_table(&split.model_columns, &split.available));
            }
            println!("{}", sep(64));
            if split.unavailable.is_empty() {
                println!("{}", s_hint().apply_to("  available in all regions"));
            } else {
                let names: Vec<&str> = split.unavailable.iter().map(|r| r.region.as_str()).collect();
                println!(
                    "{}",
                    s_hint().apply_to(format!("  not available: {}", names.join(", ")))
                );
            }
            println!();
        }
        None => {
            if json {
                println!("{}", serde_json::to_string_pretty(table)?);
                return Ok(());
            }
            println!();
            println!("{}", s_header().apply_to(format!("{dep} model availability")));
            println!("{}", sep(64));
            println!("{}", availability_table(&table.model_columns, &table.rows));
            println!("{}", sep(64));
            let others: Vec<String> = tables
                .keys()
                .filter(|d| **d != dep)
                .map(|d| d.label().to_lowercase().replace(' ', "-"))
                .collect();
            if !others.is_empty() {
                println!(
                    "{}",
                    s_hint().apply_to(format!("  also parsed: {}   --deployment <type>", others.join(", ")))
                );
            }
            println!();
        }
    }
    Ok(())
}

// ── Pricing ──────────────────────────────────────────────────────────

fn fmt_price(p: Price) -> String {
    p.amount().map_or_else(|| "N/A".to_string(), |v| format!("${v:.6}"))
}

async fn cmd_pricing(
    sources: &Sources,
    region: &str,
    search: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let term = Term::stderr();
    term.write_line(&format!("{}", s_dim().apply_to("fetching pricing data...")))?;
    let fetched = fetch_pricing(&sources.prices, region, sources.config.max_pricing_pages).await;
    term.clear_last_lines(1)?;

    let items = match fetched {
        Ok(items) => items,
        Err(e) => {
            eprintln!("{}", s_err().apply_to(format!("warning: could not fetch pricing: {e}")));
            Vec::new()
        }
    };
    let rows = normalize_pricing(items);
    let shown = filter_pricing(&rows, search.unwrap_or(""));

    if json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    println!();
    println!("{}", s_header().apply_to(format!("pricing in {region}")));
    println!("{}", sep(72));
    if rows.is_empty() {
        println!("  {}", s_dim().apply_to(format!("no pricing data found for region: {region}")));
        println!("{}", sep(72));
        return Ok(());
    }

    let mut table = new_table();
    table.set_header(header_cells(&["Meter", "Price (USD)", "Unit", "Product"]));
    for r in &shown {
        table.add_row(vec![
            Cell::new(&r.meter).fg(Color::AnsiValue(252)),
            Cell::new(fmt_price(r.price)).fg(Color::AnsiValue(109)),
            Cell::new(&r.unit).fg(Color::AnsiValue(248)),
            Cell::new(&r.product).fg(Color::AnsiValue(146)),
        ]);
    }
    println!("{table}");
    println!("{}", sep(72));
    println!(
        "{}",
        s_hint().apply_to(format!("  {} pricing entries   of {}", shown.len(), rows.len()))
    );
    println!();
    Ok(())
}

async fn cmd_regions(sources: &Sources, json: bool) -> anyhow::Result<()> {
    let term = Term::stderr();
    term.write_line(&format!("{}", s_dim().apply_to("discovering regions...")))?;
    let regions = discover_regions(&sources.prices, sources.config.region_discovery_pages).await;
    term.clear_last_lines(1)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&regions)?);
        return Ok(());
    }
    println!();
    println!("{}", s_header().apply_to("regions with OpenAI pricing"));
    println!("{}", sep(40));
    if regions.is_empty() {
        println!("  {}", s_dim().apply_to("none discovered"));
    }
    for r in &regions {
        println!("  {}", s_bold().apply_to(r));
    }
    println!("{}", sep(40));
    println!(
        "{}",
        s_hint().apply_to(format!(
            "  {} regions   default: {}",
            regions.len(),
            sources.config.default_region
        ))
    );
    println!();
    Ok(())
}

// ── What's new / cache ───────────────────────────────────────────────

async fn cmd_whats_new(sources: &Sources) -> anyhow::Result<()> {
    match sources.document(Document::WhatsNew, "latest announcements").await? {
        Some(text) => println!("{text}"),
        None => println!("{}", s_dim().apply_to("  no announcements")),
    }
    Ok(())
}

async fn cmd_refresh(sources: &Sources) -> anyhow::Result<()> {
    let term = Term::stderr();
    term.write_line(&format!("{}", s_dim().apply_to("clearing cache and fetching pages...")))?;
    let result = cache::refresh_documents(&sources.docs, &sources.config).await?;
    term.clear_last_lines(1)?;

    println!();
    println!(
        "  {}  {}",
        s_ok().apply_to("cache refreshed"),
        s_dim().apply_to(format!(
            "{} entries removed from {}",
            result.cleared,
            sources.docs.cache().dir().display()
        ))
    );
    for doc in &result.fetched {
        println!("  {} {}", s_ok().apply_to("\u{2713}"), s_dim().apply_to(format!("{doc:?}")));
    }
    for (doc, err) in &result.failed {
        println!("  {} {}", s_err().apply_to(format!("{doc:?}")), s_dim().apply_to(err));
    }
    println!();
    Ok(())
}
