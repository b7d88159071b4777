use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use api_shared::ParseNoteRes;
use clap::{Parser, Subcommand};
use harmoniface_core::{
    constants::{DEFAULT_EXTRACTION_TIMEOUT_MS, DEFAULT_RETRIEVAL_TIMEOUT_MS, DEFAULT_TOP_K},
    config::index_source_from_env_values,
    ContextRetriever, CoreConfig, ExtractorKind, NoteStructurer,
};

#[derive(Parser)]
#[command(name = "harmoniface")]
#[command(about = "HarmoniFace clinical note structuring and context retrieval CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Structure a clinical note and print the /parse JSON body
    Parse {
        /// Note text (reads stdin when neither this nor --file is given)
        text: Option<String>,
        /// Read the note from a file
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
        /// Skip extraction and only echo the raw text
        #[arg(long)]
        null_extractor: bool,
    },
    /// Retrieve ranked context chunks for a query
    Retrieve {
        /// Query text
        query: String,
        /// Directory of .md/.txt knowledge documents
        #[arg(long)]
        knowledge_dir: Option<PathBuf>,
        /// Base URL of a remote context index (takes precedence over --knowledge-dir)
        #[arg(long)]
        index_url: Option<String>,
        /// Number of chunks to return
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,
        /// Drop chunks scoring below this value
        #[arg(long)]
        min_score: Option<f32>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Parse {
            text,
            file,
            null_extractor,
        }) => {
            let note = read_note(text, file)?;
            let extractor = if null_extractor {
                ExtractorKind::Null
            } else {
                ExtractorKind::RuleBased
            };
            let cfg = CoreConfig::default().with_extractor(extractor);
            match NoteStructurer::from_config(&cfg).structure(&note).await {
                Ok(record) => println!(
                    "{}",
                    serde_json::to_string_pretty(&ParseNoteRes::from(record))?
                ),
                Err(e) => eprintln!("Error structuring note: {}", e),
            }
        }
        Some(Commands::Retrieve {
            query,
            knowledge_dir,
            index_url,
            top_k,
            min_score,
        }) => {
            let index_source = index_source_from_env_values(
                index_url,
                knowledge_dir.map(|d| d.to_string_lossy().into_owned()),
            );
            let cfg = CoreConfig::new(
                ExtractorKind::default(),
                index_source,
                top_k,
                min_score,
                Duration::from_millis(DEFAULT_EXTRACTION_TIMEOUT_MS),
                Duration::from_millis(DEFAULT_RETRIEVAL_TIMEOUT_MS),
            )?;
            let retriever = ContextRetriever::from_config(&cfg)?;
            match retriever.retrieve(&query).await {
                Ok(result) => println!("{}", serde_json::to_string_pretty(&result)?),
                Err(e) => eprintln!("Error retrieving context: {}", e),
            }
        }
        None => {
            println!("Use 'harmoniface --help' for commands");
        }
    }

    Ok(())
}

/// Resolves the note text from the positional argument, a file, or stdin, in that order.
fn read_note(text: Option<String>, file: Option<PathBuf>) -> std::io::Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(path);
    }
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}
