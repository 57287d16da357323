//! abtext - Text-length A/B simulation runner
//!
//! Loads a project export, runs the minimum-essay-length experiment and
//! prints the report.

use std::path::{Path, PathBuf};

use abtext_core::{run_file, AssignmentStrategy, ExperimentConfig};
use abtext_io::{open_file, DataReader};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "abtext", version, about = "Simulate minimum essay length rules on project data")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the experiment and print the report
    Run {
        /// Project export (.csv or .tsv)
        data: PathBuf,

        /// Experiment configuration (.toml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the assignment seed
        #[arg(long)]
        seed: Option<u64>,

        /// Override the assignment strategy
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,

        /// Report format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Include text charts in the report
        #[arg(long)]
        charts: bool,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the inferred schema of a data file
    Describe {
        /// Project export (.csv or .tsv)
        data: PathBuf,

        /// Experiment configuration used to mark mapped columns
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the default configuration
    InitConfig {
        #[arg(short, long, value_enum, default_value_t = ConfigFormat::Toml)]
        format: ConfigFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum ConfigFormat {
    Toml,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Balanced,
    Random,
}

impl From<StrategyArg> for AssignmentStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Balanced => AssignmentStrategy::Balanced,
            StrategyArg::Random => AssignmentStrategy::Random,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            data,
            config,
            seed,
            strategy,
            format,
            charts,
            output,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(seed) = seed {
                config.assignment.seed = seed;
            }
            if let Some(strategy) = strategy {
                config.assignment.strategy = strategy.into();
            }

            let mut report = run_file(&data, &config)?;
            if !charts {
                report.charts = None;
            }

            let rendered = match format {
                OutputFormat::Text => report.render_text(),
                OutputFormat::Json => report.to_json()?,
            };

            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)?;
                    tracing::info!(path = %path.display(), "report written");
                }
                None => println!("{}", rendered),
            }
        }

        Commands::Describe { data, config } => {
            let config = load_config(config.as_deref())?;
            describe(&data, &config)?;
        }

        Commands::InitConfig { format } => {
            let config = ExperimentConfig::default();
            let rendered = match format {
                ConfigFormat::Toml => config.to_toml()?,
                ConfigFormat::Json => config.to_json()?,
            };
            println!("{}", rendered);
        }
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` wins over the verbosity flag
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ExperimentConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading configuration");
            Ok(ExperimentConfig::load(path)?)
        }
        None => Ok(ExperimentConfig::default()),
    }
}

fn describe(data: &Path, config: &ExperimentConfig) -> Result<(), Box<dyn std::error::Error>> {
    let reader = open_file(data)?;
    let schema = reader.read_schema()?;
    let columns = &config.columns;

    let role = |name: &str| -> &'static str {
        if name == columns.title {
            "title"
        } else if name == columns.essay {
            "essay"
        } else if name == columns.summary {
            "summary"
        } else if name == columns.approval {
            "approval"
        } else if columns.id.as_deref() == Some(name) {
            "id"
        } else if columns.funding.as_deref() == Some(name) {
            "funding"
        } else if columns.categories.iter().any(|c| c == name) {
            "category"
        } else {
            ""
        }
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Column", "Type", "Nullable", "Role"]);
    for column in &schema.columns {
        table.add_row(vec![
            column.name.clone(),
            column.dtype.name().to_string(),
            if column.nullable { "yes" } else { "no" }.to_string(),
            role(&column.name).to_string(),
        ]);
    }

    println!("{} ({} format)", data.display(), reader.format_name());
    println!("Records: {}", schema.num_records);
    println!("{}", table);

    let missing: Vec<&str> = columns
        .required()
        .into_iter()
        .filter(|name| !schema.has_column(name))
        .collect();
    if !missing.is_empty() {
        tracing::warn!(columns = ?missing, "required columns missing");
    }

    Ok(())
}
