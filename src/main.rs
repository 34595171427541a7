use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::level_filters::LevelFilter;

use seqmark::sequence::LineWarning;
use seqmark::{
    BlockId, CachedValidator, ComplexityAnalyzer, DiagramBlock, DiagramMetrics, DiagramSource,
    PipelineConfig, RenderError, ThemeName, extract_blocks,
};

/// Check sequence diagram blocks in Markdown notes
#[derive(Parser, Debug)]
#[command(name = "seqmark")]
#[command(version)]
#[command(about = "Validate sequence diagram blocks and report line-addressed diagnostics", long_about = None)]
struct Args {
    /// Pipeline config file (TOML or YAML)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate every diagram block of a document
    Check {
        /// Markdown document, raw diagram file, or "-" for stdin
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// List built-in themes
    Themes,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Debug, Serialize)]
struct BlockReport {
    block: BlockId,
    start_line: usize,
    empty: bool,
    valid: bool,
    title: Option<String>,
    participants: Vec<String>,
    metrics: DiagramMetrics,
    errors: Vec<RenderError>,
    warnings: Vec<LineWarning>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("seqmark: {err}");
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> Result<ExitCode, String> {
    let config = match &args.config {
        Some(path) => PipelineConfig::load(path).map_err(|e| e.to_string())?,
        None => PipelineConfig::default(),
    };

    match args.command {
        Command::Themes => {
            for name in ThemeName::list_builtins() {
                let marker = if name == config.theme.id() { " (active)" } else { "" };
                println!("{name}{marker}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { input, format } => {
            let document = read_input(&input)?;
            let doc_id = if input.to_str() == Some("-") {
                "stdin".to_string()
            } else {
                input.display().to_string()
            };

            let blocks = if is_markdown(&input) {
                extract_blocks(&document, &doc_id)
            } else {
                vec![DiagramBlock {
                    source: DiagramSource::new(document, BlockId::for_block(&doc_id, 0)),
                    start_line: 1,
                }]
            };
            tracing::debug!(blocks = blocks.len(), document = %doc_id, "checking document");

            let analyzer = ComplexityAnalyzer::new(config.thresholds);
            let validator = CachedValidator::new(config.validation_cache);
            let reports: Vec<BlockReport> = blocks
                .iter()
                .map(|block| check_block(block, &analyzer, &validator))
                .collect();

            match format {
                Format::Text => print_text(&doc_id, &reports),
                Format::Json => {
                    let json = serde_json::to_string_pretty(&reports)
                        .map_err(|e| format!("Failed to serialize report: {}", e))?;
                    println!("{json}");
                }
            }

            if reports.iter().all(|r| r.valid) {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(1))
            }
        }
    }
}

fn read_input(input: &Path) -> Result<String, String> {
    if input.to_str() == Some("-") {
        let mut buffer = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut buffer)
            .map_err(|e| format!("Failed to read from stdin: {}", e))?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(input).map_err(|e| format!("Failed to read input file: {}", e))
    }
}

fn is_markdown(input: &Path) -> bool {
    input
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| matches!(ext.to_ascii_lowercase().as_str(), "md" | "markdown"))
}

/// Diagnostics are shifted into document coordinates.
fn check_block(
    block: &DiagramBlock,
    analyzer: &ComplexityAnalyzer,
    validator: &CachedValidator,
) -> BlockReport {
    let metrics = analyzer.analyze(&block.source);
    let report = validator.validate(&block.source);

    let errors = report
        .errors
        .iter()
        .cloned()
        .map(|mut error| {
            error.line_number = error.line_number.map(|line| block.document_line(line));
            error
        })
        .collect();
    let warnings = report
        .warnings
        .iter()
        .map(|warning| LineWarning {
            message: warning.message.clone(),
            line_number: block.document_line(warning.line_number),
        })
        .collect();

    BlockReport {
        block: block.source.block.clone(),
        start_line: block.start_line,
        empty: report.is_empty(),
        valid: report.is_valid(),
        title: report.declarations.title.title.clone(),
        participants: report
            .declarations
            .participant_order()
            .map(str::to_string)
            .collect(),
        metrics,
        errors,
        warnings,
    }
}

fn print_text(doc_id: &str, reports: &[BlockReport]) {
    if reports.is_empty() {
        println!("{doc_id}: no sequence diagram blocks");
        return;
    }

    for report in reports {
        let status = if report.empty {
            "empty"
        } else if report.valid {
            "ok"
        } else {
            "invalid"
        };
        let title = report.title.as_deref().unwrap_or("untitled");
        println!(
            "{} (line {}): {status} - {title}, {} participants, {} messages",
            report.block,
            report.start_line,
            report.metrics.participant_count,
            report.metrics.message_count,
        );

        for error in &report.errors {
            println!("  {error}");
        }
        for warning in &report.warnings {
            println!("  warning on line {}: {}", warning.line_number, warning.message);
        }
        if report.metrics.exceeds_threshold {
            println!("  warning: diagram is large and may render slowly");
        }
    }
}
