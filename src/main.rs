#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

//! Command line tooling for the chessrules library.

mod cli;

use anyhow::Context;
use chessrules::{chess::board::Board, perft};

fn load(fen: Option<&str>) -> anyhow::Result<Board> {
    fen.map_or_else(
        || Ok(Board::default()),
        |fen| Board::from_fen(fen).with_context(|| format!("failed to parse FEN {fen:?}")),
    )
}

fn main() -> anyhow::Result<()> {
    let cli = <cli::Cli as clap::Parser>::parse();

    let level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, level),
    )
    .init();

    match cli.subcommand {
        cli::Subcommands::Perft { depth, fen } => {
            let mut board = load(fen.as_deref())?;
            println!("{}", perft::perft(&mut board, depth));
        }
        cli::Subcommands::Divide { depth, fen } => {
            let mut board = load(fen.as_deref())?;
            let split = perft::divide(&mut board, depth);
            for (m, nodes) in &split {
                println!("{m}: {nodes}");
            }
            println!("\ntotal: {}", split.iter().map(|&(_, n)| n).sum::<u64>());
        }
        cli::Subcommands::Stats { depth, fen } => {
            let mut board = load(fen.as_deref())?;
            println!("{}", perft::perft_stats(&mut board, depth));
        }
        cli::Subcommands::Suite { path, node_limit } => {
            let checked = perft::run_suite(&path, node_limit)?;
            println!("{checked} depths passed");
        }
        cli::Subcommands::Resolve { san, fen } => {
            let mut board = load(fen.as_deref())?;
            let m = board.parse_san(&san).with_context(|| format!("in position {board}"))?;
            println!("{m}");
        }
        cli::Subcommands::Targets { square, fen } => {
            let mut board = load(fen.as_deref())?;
            println!("{}", board.targets(square, true));
        }
        cli::Subcommands::Fen { fen, moves } => {
            let mut board = load(fen.as_deref())?;
            for san in &moves {
                let m = board.parse_san(san).with_context(|| format!("in position {board}"))?;
                board.make_move(m);
            }
            println!("{board}");
        }
    }

    Ok(())
}
