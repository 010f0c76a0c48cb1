#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc, clippy::must_use_candidate)]

//! A chess rules engine: board positions, legal move generation, move
//! application, FEN and SAN notation, and perft move-path enumeration.

#[macro_use]
mod macros;

pub mod chess;
pub mod errors;
pub mod perft;
