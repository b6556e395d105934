//! structchunk CLI - chunk a directory of PDFs for retrieval

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use structchunk::{
    BatchReport, BatchRunner, ChunkerOptions, DocumentChunker, FileSelector, JsonFormat,
    TiktokenTokenizer, Tokenizer, WhitespaceTokenizer,
};

#[derive(Parser)]
#[command(name = "structchunk")]
#[command(version)]
#[command(about = "Split PDFs into heading-aware, token-budgeted chunks", long_about = None)]
struct Cli {
    /// Directory containing input PDFs or page dumps
    #[arg(value_name = "INPUT_DIR")]
    input_dir: PathBuf,

    /// File selection: exact name, wildcard, or `re:<regex>`
    #[arg(long, value_name = "PATTERN")]
    files: Option<String>,

    /// Output directory
    #[arg(short, long, value_name = "DIR", default_value = "output")]
    output: PathBuf,

    /// Maximum tokens per chunk
    #[arg(long, value_name = "N")]
    max_tokens: Option<usize>,

    /// Advisory minimum tokens per chunk
    #[arg(long, value_name = "N")]
    min_tokens: Option<usize>,

    /// Numbered headings at or above this depth start a new chunk
    #[arg(long, value_name = "N")]
    heading_break_level: Option<u8>,

    /// Keep table-of-contents pages
    #[arg(long)]
    include_toc: bool,

    /// Keep repeated page headers
    #[arg(long)]
    keep_headers: bool,

    /// Keep repeated page footers
    #[arg(long)]
    keep_footers: bool,

    /// Skip image extraction
    #[arg(long)]
    no_images: bool,

    /// Write <doc>_spans.json
    #[arg(long)]
    export_spans: bool,

    /// Write <doc>_blocks.json
    #[arg(long)]
    export_blocks: bool,

    /// Process documents one at a time
    #[arg(long)]
    sequential: bool,

    /// Count whitespace-separated words instead of BPE tokens
    #[arg(long, conflicts_with = "model")]
    whitespace_tokens: bool,

    /// Use the tokenizer of an OpenAI model (default: cl100k_base)
    #[arg(long, value_name = "NAME")]
    model: Option<String>,

    /// Write compact JSON
    #[arg(long)]
    compact: bool,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(report) if report.is_success() => {}
        Ok(_) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn build_options(cli: &Cli) -> ChunkerOptions {
    let mut options = ChunkerOptions::new()
        .with_toc(cli.include_toc)
        .with_header_removal(!cli.keep_headers)
        .with_footer_removal(!cli.keep_footers)
        .with_images(!cli.no_images)
        .with_span_export(cli.export_spans)
        .with_block_export(cli.export_blocks)
        .with_parallel(!cli.sequential);

    if let Some(max) = cli.max_tokens {
        options = options.with_max_tokens(max);
    }
    if let Some(min) = cli.min_tokens {
        options.min_tokens = min;
    }
    if let Some(level) = cli.heading_break_level {
        options = options.with_heading_break_level(level);
    }
    options
}

fn build_tokenizer(cli: &Cli) -> Result<Arc<dyn Tokenizer>, Box<dyn std::error::Error>> {
    if cli.whitespace_tokens {
        return Ok(Arc::new(WhitespaceTokenizer));
    }
    let tokenizer = match &cli.model {
        Some(model) => TiktokenTokenizer::for_model(model)?,
        None => TiktokenTokenizer::cl100k()?,
    };
    log::debug!("Using tokenizer {}", tokenizer.name());
    Ok(Arc::new(tokenizer))
}

fn run(cli: &Cli) -> Result<BatchReport, Box<dyn std::error::Error>> {
    let selector = match &cli.files {
        Some(pattern) => FileSelector::parse(pattern)?,
        None => FileSelector::parse("*.pdf")?,
    };
    let inputs = selector.resolve(&cli.input_dir)?;

    let format = if cli.compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    let chunker = DocumentChunker::with_tokenizer(build_options(cli), build_tokenizer(cli)?)?
        .with_json_format(format);
    let runner = BatchRunner::new(chunker);

    let pb = ProgressBar::new(inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb.set_message("Chunking...");

    let report = runner.run_files_with(&inputs, &cli.output, |path| {
        pb.set_message(file_name(path));
        pb.inc(1);
    });
    pb.finish_and_clear();

    print_report(&report, &cli.output);
    Ok(report)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}

fn print_report(report: &BatchReport, output: &Path) {
    println!("{}", "Documents".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    for doc in &report.documents {
        let stats = &doc.stats;
        println!(
            "  {} {}: {} pages, {} blocks, {} chunks, {} tokens",
            "✓".green(),
            doc.document_name.bold(),
            stats.pages,
            stats.blocks,
            stats.chunks,
            stats.total_tokens
        );
        if !stats.toc_pages.is_empty() {
            println!(
                "    {} TOC pages {:?}",
                "├─".dimmed(),
                stats.toc_pages
            );
        }
        if stats.spans_dropped_margins > 0 {
            println!(
                "    {} {} header/footer spans removed",
                "├─".dimmed(),
                stats.spans_dropped_margins
            );
        }
        if stats.image_failures > 0 {
            println!(
                "    {} {} images could not be saved",
                "├─".dimmed(),
                stats.image_failures.to_string().yellow()
            );
        }
        println!("    {} {}", "└─".dimmed(), doc.chunks_path.display());
    }

    for failure in &report.failures {
        println!(
            "  {} {}: {}",
            "✗".red(),
            file_name(&failure.input).bold(),
            failure.error
        );
    }

    println!();
    println!(
        "{} {} chunks ({} tokens) from {} documents in {}",
        "Done:".green().bold(),
        report.total_chunks(),
        report.total_tokens(),
        report.documents.len(),
        output.display()
    );
    if !report.failures.is_empty() {
        println!(
            "{} {} documents failed",
            "Warning:".yellow().bold(),
            report.failures.len()
        );
    }
}
