//! Wordtally CLI: local helpers around the upload and analysis pipeline.
//!
//! Computes the identity a client would presign with, runs the streaming analyzer
//! over local files and generates test corpora with known statistics.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tokio_util::io::ReaderStream;
use wordtally_cli::{fingerprint, generator, init_tracing};
use wordtally_processing::analyze_stream;

const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Parser)]
#[command(name = "wordtally", about = "Wordtally command-line tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the fingerprint of a local file (name, size and modification time)
    Fingerprint {
        /// Path to the file
        file: PathBuf,
        /// Also derive the file id and storage key for this owner
        #[arg(long)]
        owner: Option<String>,
    },
    /// Run the word-frequency analyzer over a local file
    Analyze {
        /// Path to the file
        file: PathBuf,
        /// Read size in bytes for each chunk fed to the analyzer
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
    },
    /// Generate a random text file and a sidecar with its expected statistics
    Generate {
        /// Number of words to write
        #[arg(long)]
        total_words: u64,
        /// Output path (defaults to generated-{n}-words-{timestamp}.txt)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fingerprint { file, owner } => {
            let report = fingerprint::inspect_file(&file, owner.as_deref()).await?;
            print_json(&report)?;
        }
        Commands::Analyze { file, chunk_size } => {
            anyhow::ensure!(chunk_size > 0, "chunk size must be greater than 0");
            let handle = tokio::fs::File::open(&file)
                .await
                .with_context(|| format!("Open {}", file.display()))?;
            let result = analyze_stream(ReaderStream::with_capacity(handle, chunk_size))
                .await
                .with_context(|| format!("Analyze {}", file.display()))?;
            print_json(&result)?;
        }
        Commands::Generate {
            total_words,
            output,
        } => {
            let output = output.unwrap_or_else(|| {
                generator::default_output_name(total_words, chrono::Utc::now().timestamp_millis())
            });
            let mut rng = rand::rng();
            let files = generator::write_corpus(&mut rng, total_words, &output).await?;
            tracing::info!(
                output = %files.output.display(),
                meta = %files.meta.display(),
                "Generated test file"
            );
            print_json(&files.stats)?;
        }
    }

    Ok(())
}
