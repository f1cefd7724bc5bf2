use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "mfrdev CLI: read many files as one stream", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Stream the concatenation (or a range of it) to stdout
    Cat {
        /// directory the entries are relative to
        root: PathBuf,
        /// entries in concatenation order; walks `root` when omitted
        entries: Vec<String>,
        /// virtual offset to start from
        #[arg(long, default_value_t = 0)]
        offset: u64,
        /// stop after this many bytes
        #[arg(long)]
        len: Option<u64>,
        #[arg(long = "buf-size", default_value_t = 64 * 1024)]
        buf_size: usize,
        /// stat entries one by one instead of on the thread pool
        #[arg(long)]
        sequential_stat: bool,
    },

    /// Print the blake3 digest of the concatenation
    Sum {
        root: PathBuf,
        entries: Vec<String>,
        /// 32-byte hex digest to compare against; mismatch is an error
        #[arg(long)]
        expect: Option<String>,
        #[arg(long)]
        sequential_stat: bool,
    },

    /// Show entry sizes and where each one starts in the stream
    Stat {
        root: PathBuf,
        entries: Vec<String>,
        /// print a JSON report instead of text
        #[arg(long)]
        json: bool,
        #[arg(long)]
        sequential_stat: bool,
    },

    /// Map a virtual offset to (entry, offset within entry)
    Locate {
        root: PathBuf,
        offset: u64,
        entries: Vec<String>,
        #[arg(long)]
        json: bool,
    },
}
