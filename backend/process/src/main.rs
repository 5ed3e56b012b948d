use anyhow::Result;
use bank::MEALS_PATH;
use clap::Parser;
use process::{error::UploadError, models::BATCH_SIZE};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON array of meals to upload
    #[arg(default_value = MEALS_PATH)]
    dataset: String,

    /// Overrides FIRESTORE_COLLECTION
    #[arg(long)]
    collection: Option<String>,

    #[arg(long, default_value_t = BATCH_SIZE)]
    batch_size: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    match process::upload_meals(&args.dataset, args.collection, args.batch_size).await {
        Ok(summary) => {
            info!("Upload complete: {summary}");
            Ok(())
        }
        Err(e) => {
            if let UploadError::BatchCommitFailure { summary, .. } = &e {
                error!("Upload stopped: {summary}");
            }
            Err(e.into())
        }
    }
}
