use std::env;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};
use sitelink_engine::{persist, EngineConfig, LinkEngine, LinkSources};
use sitelink_protocol::{serialize_json, LinkSet, Page, PageRef, RawSuggestion};
use sitelink_resolver::{PageCatalog, PageResolver};

use crate::flags::{LayoutFlag, SchemaTarget};
use crate::response::CommandResponse;
use crate::sources::{read_json_array, JsonFilePages, JsonFileSuggestions};
use crate::store::FileLinkStore;

mod flags;
mod response;
mod sources;
mod store;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "sitelink")]
#[command(about = "Select internal links for a generated site architecture", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,

    /// Pretty-print the JSON envelope
    #[arg(long, global = true)]
    pretty: bool,

    /// JSON or TOML file overlaid on the layout preset
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Layout preset used when the config file does not name one
    #[arg(long, global = true, value_enum, default_value = "clusters")]
    layout: LayoutFlag,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the selection pipeline for one architecture
    Select(SelectArgs),
    /// Resolve a single page reference against a catalog
    Resolve(ResolveArgs),
    /// Print the effective engine configuration
    Config,
    /// Print the JSON schema of an input or output document
    Schema(SchemaArgs),
}

#[derive(Args)]
struct SelectArgs {
    #[arg(long)]
    architecture_id: String,

    /// JSON array of pages (the catalog)
    #[arg(long)]
    pages: PathBuf,

    /// Hierarchy suggestions; omitted means none
    #[arg(long)]
    hierarchy: Option<PathBuf>,

    /// Bridge suggestions; omitted means none
    #[arg(long)]
    bridges: Option<PathBuf>,

    /// Funnel suggestions; omitted means none
    #[arg(long)]
    funnels: Option<PathBuf>,

    /// Link store directory. Without it the link set is only printed
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[derive(Args)]
struct ResolveArgs {
    #[arg(long)]
    pages: PathBuf,

    #[arg(long, required_unless_present = "path")]
    label: Option<String>,

    #[arg(long)]
    path: Option<String>,
}

#[derive(Args)]
struct SchemaArgs {
    #[arg(value_enum)]
    target: SchemaTarget,
}

pub async fn main_entry() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let pretty = cli.pretty;
    let response = match run(cli).await {
        Ok(data) => CommandResponse::ok(data),
        Err(err) => {
            log::error!("{err:#}");
            CommandResponse::error(&err)
        }
    };

    let text = if pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serialize_json(&response)?
    };
    print_stdout(&text)?;

    if response.is_error() {
        std::process::exit(1);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<Value> {
    let config = load_config(&cli)?;
    match cli.command {
        Commands::Select(args) => run_select(args, config).await,
        Commands::Resolve(args) => run_resolve(args, config).await,
        Commands::Config => Ok(serde_json::to_value(&config)?),
        Commands::Schema(args) => run_schema(args.target),
    }
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let layout = cli.layout.as_domain();
    let base = match &cli.config {
        Some(path) => EngineConfig::from_file(path, layout)?,
        None => EngineConfig::for_layout(layout),
    };
    let config = base.with_env_overrides(|name| env::var(name).ok())?;
    log::debug!(
        "[config] layout={} top_k={} quotas=bridge:{} funnel:{}",
        config.layout,
        config.selection.top_k,
        config.selection.min_per_type.bridge,
        config.selection.min_per_type.funnel
    );
    Ok(config)
}

async fn run_select(args: SelectArgs, config: EngineConfig) -> Result<Value> {
    let engine = LinkEngine::new(config);
    let sources = LinkSources {
        pages: Arc::new(JsonFilePages::new(args.pages)),
        hierarchy: Arc::new(JsonFileSuggestions::new(args.hierarchy)),
        bridges: Arc::new(JsonFileSuggestions::new(args.bridges)),
        funnels: Arc::new(JsonFileSuggestions::new(args.funnels)),
    };

    let link_set = engine.run(&args.architecture_id, &sources).await?;

    let stored_at = match args.out_dir {
        Some(dir) => {
            let store = FileLinkStore::new(dir);
            let path = store.path_for(&link_set.architecture_id)?;
            persist(&store, &link_set).await?;
            Some(path)
        }
        None => None,
    };

    let mut data = serde_json::to_value(&link_set)?;
    if let (Some(path), Some(object)) = (stored_at, data.as_object_mut()) {
        object.insert(
            "stored_at".to_string(),
            Value::String(path.display().to_string()),
        );
    }
    Ok(data)
}

async fn run_resolve(args: ResolveArgs, config: EngineConfig) -> Result<Value> {
    let pages: Vec<Page> = read_json_array(&args.pages).await?;
    let catalog = PageCatalog::new(pages)?;
    let resolver = PageResolver::new(catalog, config.matching);

    let reference = PageRef::new(args.label.as_deref(), args.path.as_deref());
    let resolution = resolver
        .resolve(&reference)
        .with_context(|| format!("Cannot resolve {reference}"))?;
    let page = resolver.catalog().get(&resolution.page_id).cloned();

    let strict_equivalent = match (reference.label_str(), &page) {
        (Some(label), Some(page)) => Some(config.matching.equivalent(label, &page.grouping_label)),
        _ => None,
    };

    Ok(json!({
        "page_id": resolution.page_id,
        "method": resolution.method,
        "similarity": resolution.similarity,
        "strict_equivalent": strict_equivalent,
        "page": page,
    }))
}

fn run_schema(target: SchemaTarget) -> Result<Value> {
    let schema = match target {
        SchemaTarget::Page => schemars::schema_for!(Page),
        SchemaTarget::Suggestion => schemars::schema_for!(RawSuggestion),
        SchemaTarget::LinkSet => schemars::schema_for!(LinkSet),
    };
    Ok(serde_json::to_value(schema)?)
}
