mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "newsdigest-cli")]
#[command(about = "News digest command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Fetch, summarize, classify, and store articles
    Ingest {
        /// Section to ingest (slug such as `economy`, or the portal name)
        #[arg(long, required_unless_present = "all", conflicts_with = "all")]
        section: Option<String>,

        /// Ingest every section with the configured retry policy
        #[arg(long)]
        all: bool,

        /// Articles to fetch per section (1-200); defaults to the configured value
        #[arg(long, value_parser = parse_count)]
        count: Option<usize>,
    },
    /// Run one maintenance sweep: dedup, backfill, integrity check
    Maintain,
    /// Print article statistics
    Stats {
        /// Print JSON instead of a text summary
        #[arg(long)]
        json: bool,
    },
    /// Probe the database and report process memory
    Health,
}

fn parse_count(raw: &str) -> Result<usize, String> {
    let count: usize = raw
        .parse()
        .map_err(|e| format!("'{raw}' is not a number: {e}"))?;
    if (1..=200).contains(&count) {
        Ok(count)
    } else {
        Err(format!("count must be between 1 and 200, got {count}"))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("newsdigest-cli: no command given; see --help");
        return Ok(());
    };

    let config = newsdigest_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = newsdigest_db::PoolConfig::from_app_config(&config);
    let pool = newsdigest_db::connect_pool(&config.database_url, pool_config).await?;
    tracing::debug!(command = ?command, "running command");

    match command {
        Commands::Migrate => commands::run_migrate(&pool).await,
        Commands::Ingest {
            section,
            all,
            count,
        } => {
            newsdigest_db::run_migrations(&pool).await?;
            let count = count.unwrap_or(config.articles_per_section);
            let ctx = commands::pipeline_context(pool, &config)?;
            if all {
                commands::run_ingest_all(&ctx, &config, count).await
            } else {
                let section = section.unwrap_or_default();
                commands::run_ingest_section(&ctx, &section, count).await
            }
        }
        Commands::Maintain => {
            newsdigest_db::run_migrations(&pool).await?;
            let ctx = commands::pipeline_context(pool, &config)?;
            commands::run_maintain(&ctx).await
        }
        Commands::Stats { json } => {
            newsdigest_db::run_migrations(&pool).await?;
            commands::run_stats(&pool, json).await
        }
        Commands::Health => commands::run_health(&pool).await,
    }
}
