use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use comment_fetcher::{CommentFetcher, SortMode};
use harvest_common::{Config, OutputFormat};
use comment_harvest::discovery::{
    CommandDiscoverer, KeywordDiscovery, DEFAULT_MAX_RESULTS, DEFAULT_SCROLL_TIMES,
};
use comment_harvest::pipeline::{BatchOptions, Grouping, Harvester, RetrievalSettings, RunResult};
use comment_harvest::report::DiscoverySummary;
use comment_harvest::sources::{ItemListFile, ManualUrls};
use comment_harvest::store::{export_discovery, export_failed_items, OutputLayout};

#[derive(Parser)]
#[command(name = "comment-harvest")]
#[command(about = "Batch comment harvesting for video platform items")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    run: RunArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct RunArgs {
    /// Output root (overrides HARVEST_OUTPUT_DIR)
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Maximum comments per item
    #[arg(long, global = true, default_value_t = 1000)]
    limit: u32,

    /// Comment ordering
    #[arg(long, global = true, value_enum, default_value_t = SortArg::Recent)]
    sort: SortArg,

    /// Language code passed to the downloader
    #[arg(long, global = true)]
    language: Option<String>,

    /// Output file format
    #[arg(long, global = true, value_enum, default_value_t = FormatArg::Csv)]
    format: FormatArg,

    /// Seconds between items
    #[arg(long, global = true, default_value_t = 2)]
    delay: u64,

    /// Seconds between groups (defaults to --delay)
    #[arg(long, global = true)]
    group_delay: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest comments for the given URLs, one file per item
    Urls {
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Harvest comments for an item list (.json, .csv or .txt)
    File {
        path: PathBuf,

        /// One merged file per group label instead of one file per item
        #[arg(long)]
        grouped: bool,
    },

    /// Discover items by keyword, export them, then harvest per keyword
    Search {
        #[arg(required = true)]
        keywords: Vec<String>,

        #[arg(long, default_value_t = DEFAULT_MAX_RESULTS)]
        max_results: usize,

        #[arg(long, default_value_t = DEFAULT_SCROLL_TIMES)]
        scrolls: u32,

        /// One file per item instead of one per keyword
        #[arg(long)]
        flat: bool,

        /// Seconds between keyword searches
        #[arg(long, default_value_t = 5)]
        keyword_delay: u64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Popular,
    Recent,
}

impl From<SortArg> for SortMode {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Popular => SortMode::Popular,
            SortArg::Recent => SortMode::Recent,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => OutputFormat::Tabular,
            FormatArg::Json => OutputFormat::Structured,
        }
    }
}

impl RunArgs {
    fn batch_options(&self, grouping: Grouping) -> BatchOptions {
        let item_delay = Duration::from_secs(self.delay);
        BatchOptions {
            settings: RetrievalSettings {
                limit: self.limit,
                sort: self.sort.into(),
                locale: self.language.clone(),
            },
            format: self.format.into(),
            grouping,
            item_delay,
            group_delay: self.group_delay.map(Duration::from_secs).unwrap_or(item_delay),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("comment_harvest=info".parse()?))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(dir) = &cli.run.output_dir {
        config.output_dir = dir.clone();
    }
    config.log();

    let layout = OutputLayout::create(&config.output_dir)?;
    let fetcher = CommentFetcher::new(config.python_bin.as_str(), config.downloader_args())
        .with_timeout(config.retrieval_timeout);
    let harvester = Harvester::new(fetcher, layout.clone());

    let result = match cli.command {
        Commands::Urls { urls } => {
            let source = ManualUrls::new(urls);
            harvester
                .run(&source, &cli.run.batch_options(Grouping::Flat))
                .await?
        }
        Commands::File { path, grouped } => {
            let grouping = if grouped { Grouping::by_label() } else { Grouping::Flat };
            let source = ItemListFile::new(path);
            harvester.run(&source, &cli.run.batch_options(grouping)).await?
        }
        Commands::Search {
            keywords,
            max_results,
            scrolls,
            flat,
            keyword_delay,
        } => {
            let Some(command_line) = config.discovery_cmd.as_deref() else {
                bail!("HARVEST_DISCOVERY_CMD is not set; keyword search needs a discovery program");
            };
            let discovery = KeywordDiscovery::new(CommandDiscoverer::from_command_line(command_line)?, keywords)
                .with_max_results(max_results)
                .with_scroll_times(scrolls)
                .with_keyword_delay(Duration::from_secs(keyword_delay));

            let groups = discovery.discover_groups().await;
            println!("{}", DiscoverySummary(&groups));

            let exported = export_discovery(&groups, &layout.urls_dir)
                .context("Failed to export discovery results")?;
            info!(json = %exported.json.display(), txt = %exported.txt.display(), "Discovery exported");

            if flat {
                let items = groups.into_iter().flat_map(|g| g.items).collect();
                harvester
                    .run_items(items, &cli.run.batch_options(Grouping::Flat))
                    .await?
            } else {
                harvester
                    .run_groups(groups, &cli.run.batch_options(Grouping::by_label()))
                    .await?
            }
        }
    };

    finish(&result, &layout)
}

fn finish(result: &RunResult, layout: &OutputLayout) -> Result<()> {
    println!("{result}");

    if let Some(path) = export_failed_items(&result.failed_items, &layout.urls_dir)? {
        println!("Failed items saved to {} (rerun with `comment-harvest file`)", path.display());
    }
    Ok(())
}
