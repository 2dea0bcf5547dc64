use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pdf_to_knowledge::{logging, KnowledgeError};
use pdf_to_knowledge::schemas::{
    validate_json, ChunkMetadata, KnowledgeChunk, SchemaValidationError, StoreKnowledgeRequest,
    StoreKnowledgeResponse, VisualDescription, SCHEMA_VERSION,
};
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "pdf2kg")]
#[command(about = "Inspect and validate pdf_to_knowledge agent messages")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a JSON payload against the message contract
    Validate {
        /// Message type the payload should be
        #[arg(short, long, value_enum, default_value_t = PayloadKind::Request)]
        kind: PayloadKind,

        /// JSON file to validate, `-` for stdin
        path: PathBuf,
    },
    /// Print a valid sample StoreKnowledgeRequest
    Sample,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PayloadKind {
    Request,
    Response,
}

fn main() -> Result<()> {
    logging::init("info");

    let cli = Cli::parse();

    match cli.command {
        Command::Validate { kind, path } => {
            let text = read_payload(&path)?;
            log::info!("Validating {} as {:?} (schema v{})", path.display(), kind, SCHEMA_VERSION);
            match kind {
                PayloadKind::Request => validate_request_payload(&text)?,
                PayloadKind::Response => validate_response_payload(&text)?,
            }
        }
        Command::Sample => {
            let request = sample_request()?;
            println!("{}", serde_json::to_string_pretty(&request)?);
        }
    }

    Ok(())
}

fn read_payload(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read payload from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read payload file: {}", path.display()))
}

fn validate_request_payload(text: &str) -> pdf_to_knowledge::Result<()> {
    let request: StoreKnowledgeRequest = validate_json(text).map_err(report)?;

    log::info!("✓ Valid StoreKnowledgeRequest");
    log::info!("  request_id: {}", request.request_id());
    log::info!("  job_id: {}", request.job_id());
    log::info!("  chunks: {}", request.chunk_count());
    log::info!("  final batch: {}", request.is_final_batch());
    for issue in request.consistency_issues() {
        log::warn!("{}", issue);
    }
    Ok(())
}

fn validate_response_payload(text: &str) -> pdf_to_knowledge::Result<()> {
    let response: StoreKnowledgeResponse = validate_json(text).map_err(report)?;

    log::info!("✓ Valid StoreKnowledgeResponse");
    log::info!("  request_id: {}", response.request_id());
    log::info!("  job_id: {}", response.job_id());
    log::info!("  status: {}", response.status());
    log::info!(
        "  stored: {}/{} ({:.1}%)",
        response.chunks_stored(),
        response.chunks_received(),
        response.success_rate() * 100.0
    );
    if let Some(message) = response.error_message() {
        log::warn!("  error: {}", message);
    }
    Ok(())
}

/// Log every violation, then hand the aggregate error back for the exit status
fn report(err: SchemaValidationError) -> KnowledgeError {
    for field in err.errors() {
        log::error!("✗ {} ({})", field, field.error_type);
    }
    KnowledgeError::Validation(err)
}

fn sample_request() -> Result<StoreKnowledgeRequest> {
    let metadata = ChunkMetadata::builder("deep_learning_book.pdf", 0)
        .chapter("Chapter 3: Probability")
        .section("3.2 Conditional Probability")
        .page_start(56)
        .page_end(57)
        .keywords(["conditional probability", "bayes rule"])
        .tone("technical")
        .build()?;

    let visual = VisualDescription::new(
        "fig-3.1",
        "diagram",
        "Venn diagram showing the intersection of events A and B",
        Some(57),
    )?;

    let chunk = KnowledgeChunk::builder(
        "The conditional probability of A given B is P(A and B) divided by P(B).",
        "An introduction to deep learning, starting from probability and linear algebra.",
        metadata,
    )
    .context_injection("Follows the definition of joint probability in 3.1.")
    .visual(visual)
    .build()?;

    Ok(StoreKnowledgeRequest::builder(
        "job-2025-01-02-abc123",
        "An introduction to deep learning, starting from probability and linear algebra.",
    )
    .chunk(chunk)
    .final_batch(true)
    .build()?)
}
