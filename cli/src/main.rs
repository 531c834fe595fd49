//! Helvetia CLI: seed the benchmark tables and build the derived ones
//!
//! Connects to MySQL/VTGate by default; `--embedded` runs every phase
//! against an in-process store instead.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use helvetia_seed::pipeline::MySqlSessions;
use helvetia_seed::schema::table_specs;
use helvetia_seed::{
    PipelineConfig, PopularityRanker, SeedPipeline, SeedReport, SessionFactory, StatsAggregator,
};
use helvetia_sql::EmbeddedClient;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "helvetia", version, about = "Helvetia benchmark seeder")]
struct Cli {
    /// YAML configuration file; flags override its values
    #[arg(long, global = true, env = "HELVETIA_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, global = true, env = "HELVETIA_HOST")]
    host: Option<String>,

    #[arg(long, global = true, env = "HELVETIA_PORT")]
    port: Option<u16>,

    #[arg(long, global = true, env = "HELVETIA_USER")]
    user: Option<String>,

    #[arg(long, global = true, env = "HELVETIA_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Use an in-process store instead of a server
    #[arg(long, global = true)]
    embedded: bool,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate and insert users, articles and reads
    Seed(SeedArgs),
    /// Recompute the per-article BeRead table
    Beread(BeReadArgs),
    /// Rebuild the PopularRank table
    Rank(RankArgs),
    /// Seed, then BeRead, then PopularRank
    All {
        #[command(flatten)]
        seed: SeedArgs,
        #[command(flatten)]
        beread: BeReadArgs,
        #[command(flatten)]
        rank: RankArgs,
    },
}

#[derive(Args)]
struct SeedArgs {
    #[arg(long)]
    users: Option<usize>,
    #[arg(long)]
    articles: Option<usize>,
    /// Accepted reads to produce
    #[arg(long)]
    reads: Option<usize>,
    #[arg(long)]
    user_batch_size: Option<usize>,
    #[arg(long)]
    article_batch_size: Option<usize>,
    #[arg(long)]
    read_batch_size: Option<usize>,
    /// Fixed RNG seed for reproducible data
    #[arg(long)]
    seed: Option<u64>,
    /// Read batches buffered ahead of insertion; 0 generates inline
    #[arg(long)]
    queue_depth: Option<usize>,
    /// Empty each table before loading it
    #[arg(long)]
    truncate: bool,
    /// Generate every batch without connecting
    #[arg(long)]
    dry_run: bool,
    /// Only generate reads, for users and articles already stored
    #[arg(long)]
    reads_only: bool,
}

#[derive(Args)]
struct BeReadArgs {
    /// Rows per BeRead upsert
    #[arg(long = "beread-batch-size")]
    batch_size: Option<usize>,
}

#[derive(Args)]
struct RankArgs {
    /// Articles kept per bucket
    #[arg(long)]
    top_n: Option<usize>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_yaml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    apply_connection(&cli, &mut config);

    match &cli.command {
        Commands::Seed(args) => apply_seed(args, &mut config),
        Commands::Beread(args) => apply_beread(args, &mut config),
        Commands::Rank(args) => apply_rank(args, &mut config),
        Commands::All { seed, beread, rank } => {
            apply_seed(seed, &mut config);
            apply_beread(beread, &mut config);
            apply_rank(rank, &mut config);
        }
    }
    config.validate()?;
    tracing::info!(
        embedded = cli.embedded,
        dry_run = config.seed.dry_run,
        "starting run against {}:{}",
        config.connection.host,
        config.connection.port
    );

    let factory: Box<dyn SessionFactory> = if cli.embedded {
        Box::new(EmbeddedClient::with_tables(table_specs()))
    } else {
        Box::new(MySqlSessions::new(config.connection.clone()))
    };
    let factory = factory.as_ref();

    let mut summary: Vec<(String, String)> = Vec::new();
    let run_seed = matches!(cli.command, Commands::Seed(_) | Commands::All { .. });
    let run_beread = matches!(cli.command, Commands::Beread(_) | Commands::All { .. });
    let run_rank = matches!(cli.command, Commands::Rank(_) | Commands::All { .. });

    if run_seed {
        let report = SeedPipeline::new(config.seed.clone(), config.retry.clone())
            .run(factory)
            .await
            .context("seeding failed")?;
        summary.extend(seed_rows(&report));
    }
    if run_beread && !config.seed.dry_run {
        let report = StatsAggregator::new(config.beread.clone())
            .run(factory)
            .await
            .context("BeRead aggregation failed")?;
        summary.push(("beread articles".into(), report.articles.to_string()));
        summary.push(("beread reads".into(), report.reads.to_string()));
        summary.push(("beread batches".into(), report.batches.to_string()));
    }
    if run_rank && !config.seed.dry_run {
        let rows = PopularityRanker::new(config.rank.clone())
            .run(factory)
            .await
            .context("PopularRank rebuild failed")?;
        summary.push(("popular_rank rows".into(), rows.to_string()));
    }

    print_summary(&summary, &cli.format)
}

fn apply_connection(cli: &Cli, config: &mut PipelineConfig) {
    let conn = &mut config.connection;
    if let Some(host) = &cli.host {
        conn.host = host.clone();
    }
    if let Some(port) = cli.port {
        conn.port = port;
    }
    if let Some(user) = &cli.user {
        conn.user = user.clone();
    }
    if let Some(password) = &cli.password {
        conn.password = password.clone();
    }
}

fn apply_seed(args: &SeedArgs, config: &mut PipelineConfig) {
    let seed = &mut config.seed;
    let overrides = [
        (args.users, &mut seed.users),
        (args.articles, &mut seed.articles),
        (args.reads, &mut seed.reads),
        (args.user_batch_size, &mut seed.user_batch_size),
        (args.article_batch_size, &mut seed.article_batch_size),
        (args.read_batch_size, &mut seed.read_batch_size),
        (args.queue_depth, &mut seed.read_queue_depth),
    ];
    for (value, field) in overrides {
        if let Some(value) = value {
            *field = value;
        }
    }
    if args.seed.is_some() {
        seed.rng_seed = args.seed;
    }
    seed.truncate |= args.truncate;
    seed.dry_run |= args.dry_run;
    seed.reads_only |= args.reads_only;
}

fn apply_beread(args: &BeReadArgs, config: &mut PipelineConfig) {
    if let Some(batch_size) = args.batch_size {
        config.beread.batch_size = batch_size;
    }
}

fn apply_rank(args: &RankArgs, config: &mut PipelineConfig) {
    if let Some(top_n) = args.top_n {
        config.rank.top_n = top_n;
    }
}

fn seed_rows(report: &SeedReport) -> Vec<(String, String)> {
    vec![
        ("users".into(), format!("{} in {} batches", report.users, report.user_batches)),
        ("articles".into(), format!("{} in {} batches", report.articles, report.article_batches)),
        ("reads".into(), format!("{} in {} batches", report.reads, report.read_batches)),
        ("read candidates".into(), report.read_candidates.to_string()),
        ("reads affected".into(), report.reads_affected.to_string()),
        ("rows truncated".into(), report.truncated.to_string()),
        ("referential fallbacks".into(), report.referential_fallbacks.to_string()),
    ]
}

fn print_summary(rows: &[(String, String)], format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let map: serde_json::Map<String, serde_json::Value> = rows
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect();
            println!("{}", serde_json::to_string_pretty(&map)?);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["phase", "result"]);
            for (k, v) in rows {
                table.add_row(vec![k, v]);
            }
            println!("{}", table);
        }
    }
    Ok(())
}
