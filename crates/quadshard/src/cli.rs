use std::path::PathBuf;

use chrono::Local;
use clap::{ArgAction, Parser};

use crate::core::{ConfigLayer, ShardingConfig};
use crate::sharding::{self, RunOptions, RunSummary};
use crate::storage::AwsCliStore;
use crate::utils::{LogLevel, Logger, ShardingResult};

#[derive(Debug, Parser)]
#[command(
    author,
    version = crate::VERSION,
    about = "Split oversized shards in a quadtree sharding index",
    long_about = "Reads the sharding index and the sizes of all shards under an input prefix. \
                  Every shard larger than the limit is replaced by its four quadtree children, \
                  and the updated index is published under a date-stamped name."
)]
pub struct Cli {
    /// Prefix holding the sharding index and the shard files
    #[arg(long)]
    pub input: Option<String>,

    /// Name of the sharding index under the input prefix [default: sharding.txt]
    #[arg(long, alias = "shardingFileName")]
    pub sharding_file_name: Option<String>,

    /// Maximum size allowed for a shard, in MB [default: 5]
    #[arg(long)]
    pub max: Option<u64>,

    /// Prefix the updated index is published under [default: the input prefix]
    #[arg(long, alias = "s3Utils")]
    pub utils: Option<String>,

    /// TOML file with defaults for any of the options above
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Storage CLI executable [default: aws]
    #[arg(long)]
    pub aws_cli: Option<String>,

    /// Timeout for each storage command, in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Log and skip listed objects whose path names no shard instead of aborting
    #[arg(long)]
    pub skip_malformed: bool,

    /// Slash-delimited component of each object key that holds the shard name [default: 6]
    #[arg(long)]
    pub shard_component: Option<usize>,

    /// Print the updated index instead of publishing it
    #[arg(long)]
    pub dry_run: bool,

    /// Also write the updated index to this local file
    #[arg(long)]
    pub keep_local: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Settings given on the command line, as a config layer
    pub fn config_layer(&self) -> ConfigLayer {
        ConfigLayer {
            input: self.input.clone(),
            sharding_file_name: self.sharding_file_name.clone(),
            max: self.max,
            utils: self.utils.clone(),
            aws_cli: self.aws_cli.clone(),
            timeout: self.timeout,
            skip_malformed: self.skip_malformed.then_some(true),
            shard_component: self.shard_component,
        }
    }

    /// Merge the config file (if any) under the command line and resolve
    pub fn resolve_config(&self) -> ShardingResult<ShardingConfig> {
        let file = match &self.config {
            Some(path) => ConfigLayer::from_file(path)?,
            None => ConfigLayer::default(),
        };
        ShardingConfig::resolve(file.merge(self.config_layer()))
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            dry_run: self.dry_run,
            keep_local: self.keep_local.clone(),
        }
    }
}

pub fn run() -> ShardingResult<()> {
    let cli = Cli::parse();

    let mut logger = Logger::init(LogLevel::from_verbosity(cli.verbose));
    if cli.dry_run {
        // stdout carries the index itself
        logger = logger.echo_to_stderr();
    }

    execute(&cli, &logger).map_err(|e| {
        logger.error(&e.to_string());
        e
    })
}

fn execute(cli: &Cli, logger: &Logger) -> ShardingResult<()> {
    let config = cli.resolve_config()?;
    logger.debug(&format!("Resolved configuration: {:?}", config));

    let store = AwsCliStore::from_config(&config)?;
    let today = Local::now().date_naive();

    let summary = sharding::run(&store, &config, &cli.run_options(), today, logger)?;
    report(&summary, cli.dry_run, logger);
    Ok(())
}

fn report(summary: &RunSummary, dry_run: bool, logger: &Logger) {
    logger.step(&summary_line(summary));

    if dry_run {
        print!("{}", summary.index.to_text());
    }
}

fn summary_line(summary: &RunSummary) -> String {
    let report = &summary.report;
    let mut line = format!(
        "{} oversized, {} split, {} already subdivided or absent, {} malformed skipped",
        report.oversized,
        report.split.len(),
        report.unmatched.len(),
        report.malformed.len()
    );
    if let Some(destination) = &summary.published {
        line.push_str(&format!("; published to {}", destination));
    }
    line
}
