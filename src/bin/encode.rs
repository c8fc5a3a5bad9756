//! Encoder binary
//!
//! Thin CLI over the client encoder: encode a file onto a set of disk
//! paths, or restore it from the surviving shards.

use clap::{Parser, Subcommand};
use shardfs::client::{restore, FileEncoder};
use shardfs::CodecParams;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "shardfs-encode")]
#[command(about = "Encode a file into erasure-coded shards, or restore it")]
struct Cli {
    /// Bytes per interleaving block
    #[arg(long, default_value = "4")]
    block_size: usize,

    /// Number of data shards
    #[arg(long, default_value = "4")]
    data_shards: usize,

    /// Number of parity shards
    #[arg(long, default_value = "2")]
    parity_shards: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a file and store one shard per disk path
    Encode {
        /// Source file
        #[arg(long)]
        file: PathBuf,

        /// Target shard paths, one per shard (comma-separated)
        #[arg(long, value_delimiter = ',')]
        disks: Vec<PathBuf>,
    },
    /// Rebuild a file from its shard paths
    Restore {
        /// Output file
        #[arg(long)]
        output: PathBuf,

        /// Original (unpadded) file size in bytes
        #[arg(long)]
        size: u64,

        /// Shard paths, one per shard (comma-separated)
        #[arg(long, value_delimiter = ',')]
        disks: Vec<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let params = CodecParams::new(cli.block_size, cli.data_shards, cli.parity_shards)?;

    match cli.command {
        Commands::Encode { file, disks } => {
            let encoder = FileEncoder::from_file(&file, params)?;
            encoder.store(&disks)?;
            println!(
                "stored {} ({} bytes, blake3 {}) across {} disks",
                file.display(),
                encoder.file_size(),
                encoder.file_hash(),
                disks.len()
            );
        }
        Commands::Restore {
            output,
            size,
            disks,
        } => {
            let data = restore(&disks, size, params)?;
            std::fs::write(&output, &data)?;
            println!("restored {} bytes to {}", data.len(), output.display());
        }
    }

    Ok(())
}
