use std::path::PathBuf;

use chessrules::chess::types::Square;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[clap(author, version, about)]
pub struct Cli {
    /// Log progress at info level (overridden by RUST_LOG)
    #[clap(short, long)]
    pub verbose: bool,
    #[clap(subcommand)]
    pub subcommand: Subcommands,
}

#[derive(Subcommand)]
pub enum Subcommands {
    /// Count the move paths of a given depth
    Perft {
        depth: usize,
        /// Starting position, defaults to the standard one
        #[clap(long)]
        fen: Option<String>,
    },
    /// Perft split by root move
    Divide {
        depth: usize,
        #[clap(long)]
        fen: Option<String>,
    },
    /// Perft with capture, castle, promotion and check tallies for the last ply
    Stats {
        depth: usize,
        #[clap(long)]
        fen: Option<String>,
    },
    /// Run an EPD perft suite
    Suite {
        #[clap(value_name = "PATH")]
        path: PathBuf,
        /// Skip every depth whose expected count is over this
        #[clap(long, value_name = "NODES", default_value = "10000000")]
        node_limit: u64,
    },
    /// Resolve a SAN move for the side to move
    Resolve {
        san: String,
        #[clap(long)]
        fen: Option<String>,
    },
    /// Print the legal targets of the piece on a square
    Targets {
        square: Square,
        #[clap(long)]
        fen: Option<String>,
    },
    /// Apply SAN moves in order and print the resulting FEN
    Fen {
        #[clap(long)]
        fen: Option<String>,
        #[clap(long, num_args = 1.., value_name = "SAN")]
        moves: Vec<String>,
    },
}
