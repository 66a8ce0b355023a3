//! # hl7-cli
//!
//! Command-line interface for HL7 v2 messages: decode wire text to JSON, check it
//! against the schema of its message type, and generate wire text from JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use hl7_codec::SegmentOrder;
use hl7_ir::Message;
use hl7_pipeline::{Pipeline, PipelineConfig};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hl7")]
#[command(about = "HL7 v2 message codec and structural validator")]
#[command(version)]
struct Cli {
    /// Pipeline configuration file (YAML, or JSON by extension)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory searched for message schemas before the built-in ones (repeatable)
    #[arg(long = "schema-dir", global = true)]
    schema_dirs: Vec<PathBuf>,

    /// Increase log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode an HL7 message and print it as JSON
    Parse {
        /// Input file path, or `-` for stdin
        input: PathBuf,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,

        /// Print only the value at a path such as `PID/PatientName[0]/FamilyName`
        #[arg(long)]
        select: Option<String>,
    },

    /// Check an HL7 message against the schema of its message type
    Validate {
        /// Input file path, or `-` for stdin
        input: PathBuf,
    },

    /// Generate HL7 wire text from the JSON form of a message
    Generate {
        /// JSON input file path, or `-` for stdin
        input: PathBuf,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Segment order of the generated text
        #[arg(long, value_enum)]
        order: Option<OrderArg>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OrderArg {
    AsReceived,
    Grouped,
}

impl From<OrderArg> for SegmentOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::AsReceived => SegmentOrder::AsReceived,
            OrderArg::Grouped => SegmentOrder::Grouped,
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if !cli.schema_dirs.is_empty() {
        let mut dirs = cli.schema_dirs.clone();
        dirs.append(&mut config.schema_paths);
        config.schema_paths = dirs;
    }

    match cli.command {
        Commands::Parse {
            input,
            pretty,
            select,
        } => {
            let pipeline = Pipeline::new(config)?;
            let message = pipeline.parse_message(&read_input(&input)?)?;
            let json = match &select {
                Some(path) => serde_json::to_value(message.lookup(path)?)?,
                None => serde_json::to_value(&message)?,
            };
            let text = if pretty {
                serde_json::to_string_pretty(&json)?
            } else {
                serde_json::to_string(&json)?
            };
            println!("{text}");
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate { input } => {
            let pipeline = Pipeline::new(config)?;
            let message = pipeline.parse_message(&read_input(&input)?)?;
            let report = pipeline.validate_message(&message)?;
            println!("{report}");
            if report.is_valid() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::Generate {
            input,
            output,
            order,
        } => {
            if let Some(order) = order {
                config.encode.order = order.into();
            }
            let pipeline = Pipeline::new(config)?;
            let json: serde_json::Value = serde_json::from_str(&read_input(&input)?)
                .with_context(|| format!("{} is not valid JSON", input.display()))?;
            let message: Message = pipeline.message_from_json(&json)?;

            let text = match pipeline.generate_message(&message) {
                Ok(text) => text,
                Err(hl7_pipeline::Error::ValidationFailed {
                    message_type,
                    issues,
                }) => {
                    eprintln!("Cannot generate {message_type} message:");
                    for issue in issues {
                        eprintln!("  - {issue}");
                    }
                    return Ok(ExitCode::FAILURE);
                }
                Err(e) => return Err(e.into()),
            };

            match output {
                Some(path) => {
                    std::fs::write(&path, &text)
                        .with_context(|| format!("cannot write {}", path.display()))?;
                    tracing::info!("Wrote {} bytes to {}", text.len(), path.display());
                }
                None => println!("{text}"),
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("cannot read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}
