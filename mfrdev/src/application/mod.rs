pub mod handlers;

use crate::presentation::cli::{Cli, Commands};
use clap::Parser;
use mfr_core::error::Result;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Cat {
            root,
            entries,
            offset,
            len,
            buf_size,
            sequential_stat,
        } => handlers::handle_cat(root, entries, offset, len, buf_size, sequential_stat),
        Commands::Sum {
            root,
            entries,
            expect,
            sequential_stat,
        } => handlers::handle_sum(root, entries, expect, sequential_stat),
        Commands::Stat {
            root,
            entries,
            json,
            sequential_stat,
        } => handlers::handle_stat(root, entries, json, sequential_stat),
        Commands::Locate {
            root,
            offset,
            entries,
            json,
        } => handlers::handle_locate(root, offset, entries, json),
    }
}
