//! Command-line interface.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use crate::pipeline::batch::{run_batch, BatchOptions};
use crate::pipeline::context::{NegexSource, TermsetPreset};
use crate::pipeline::ingest::{read_notes_file, IngestError};
use crate::pipeline::prevalence::pattern_prevalence;
use crate::pipeline::serialize::{parse_terms, query_terms};
use crate::pipeline::{ConfigError, NotePipeline, QueryCase, RuleTables, TargetMode};
use crate::pipeline_config::PipelineConfig;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Red-flag symptom extraction for ED provider notes
#[derive(Parser, Debug)]
#[command(name = "redflag", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Annotate a JSON-lines note export, one result line per note
    #[command(visible_alias = "a")]
    Annotate(AnnotateArgs),

    /// Annotate a single note given on the command line
    #[command(visible_alias = "t")]
    Text(TextArgs),

    /// Per-year share of notes matching a pattern
    Prevalence(PrevalenceArgs),

    /// Print the built-in rule tables as JSON
    Rules,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    /// Rule tables JSON (missing tables use built-in defaults)
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Pipeline settings JSON
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Append the clinical NegEx termset to the context rules
    #[arg(long)]
    pub clinical_negex: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Comma-separated terms; keep entities whose text contains any of them
    #[arg(short, long)]
    pub query: Option<String>,

    /// Match query terms regardless of case
    #[arg(short = 'i', long)]
    pub ignore_case: bool,
}

impl QueryArgs {
    fn options(&self) -> BatchOptions {
        BatchOptions {
            terms: self.query.as_deref().map(parse_terms).unwrap_or_default(),
            case: if self.ignore_case {
                QueryCase::Insensitive
            } else {
                QueryCase::Sensitive
            },
        }
    }
}

#[derive(Args, Debug)]
pub struct AnnotateArgs {
    /// Input JSONL file, or "-" for stdin
    #[arg(short = 'f', long, default_value = "-")]
    pub input: String,

    /// Output JSONL file, or "-" for stdout
    #[arg(short, long, default_value = "-")]
    pub output: String,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    #[command(flatten)]
    pub query: QueryArgs,
}

#[derive(Args, Debug)]
pub struct TextArgs {
    /// Note text
    #[arg(required = true, trailing_var_arg = true)]
    pub text: Vec<String>,

    /// Pretty-print the records
    #[arg(long)]
    pub pretty: bool,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    #[command(flatten)]
    pub query: QueryArgs,
}

#[derive(Args, Debug)]
pub struct PrevalenceArgs {
    /// Input JSONL file
    #[arg(short = 'f', long)]
    pub input: PathBuf,

    /// Case-insensitive regex to count
    #[arg(short, long)]
    pub pattern: String,

    /// Pipeline settings JSON (ingestion column names)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

// ═══════════════════════════════════════════════════════════
// Execution
// ═══════════════════════════════════════════════════════════

fn load_config(path: Option<&Path>) -> Result<PipelineConfig, ConfigError> {
    match path {
        Some(p) => PipelineConfig::from_json_file(p),
        None => Ok(PipelineConfig::from_env()),
    }
}

fn build_pipeline(args: &PipelineArgs) -> Result<(PipelineConfig, NotePipeline), ConfigError> {
    let config = load_config(args.config.as_deref())?;
    let mut tables = match &args.rules {
        Some(path) => RuleTables::from_json_file(path)?,
        None => RuleTables::builtin(),
    };
    if args.clinical_negex {
        tables.negex = Some(NegexSource::Preset(TermsetPreset::EnClinical));
    }
    let pipeline = NotePipeline::new(&config, &tables, TargetMode::Rules)?;
    Ok((config, pipeline))
}

/// Run a parsed command, writing results to `out` unless the command
/// names its own output file.
pub fn execute<W: Write>(cli: Cli, mut out: W) -> Result<(), CliError> {
    match cli.command {
        Command::Annotate(args) => {
            let (config, pipeline) = build_pipeline(&args.pipeline)?;
            let options = args.query.options();
            let reader: Box<dyn io::BufRead> = if args.input == "-" {
                Box::new(io::stdin().lock())
            } else {
                Box::new(BufReader::new(File::open(&args.input)?))
            };
            if args.output == "-" {
                run_batch(&pipeline, reader, &mut out, &config.ingest, &options)?;
            } else {
                let file = BufWriter::new(File::create(&args.output)?);
                run_batch(&pipeline, reader, file, &config.ingest, &options)?;
            }
        }
        Command::Text(args) => {
            let (_, pipeline) = build_pipeline(&args.pipeline)?;
            let options = args.query.options();
            let records = pipeline.annotate_text(&args.text.join(" "));
            let kept = query_terms(&options.terms, &records, options.case);
            if args.pretty {
                serde_json::to_writer_pretty(&mut out, &kept)?;
            } else {
                serde_json::to_writer(&mut out, &kept)?;
            }
            writeln!(out)?;
        }
        Command::Prevalence(args) => {
            let config = load_config(args.config.as_deref())?;
            let notes = read_notes_file(&args.input, &config.ingest)?;
            let report = pattern_prevalence(&args.pattern, &notes)?;
            serde_json::to_writer_pretty(&mut out, &report)?;
            writeln!(out)?;
        }
        Command::Rules => {
            writeln!(out, "{}", RuleTables::builtin().to_json_pretty()?)?;
        }
    }
    Ok(())
}
