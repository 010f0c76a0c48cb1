use thiserror::Error;

use crate::chess::{piece::Colour, types::Square};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveParseError {
    #[error("invalid move length {0}")]
    InvalidLength(usize),
    #[error("invalid from-square file {0}")]
    InvalidFromSquareFile(char),
    #[error("invalid from-square rank {0}")]
    InvalidFromSquareRank(char),
    #[error("invalid to-square file {0}")]
    InvalidToSquareFile(char),
    #[error("invalid to-square rank {0}")]
    InvalidToSquareRank(char),
    #[error("invalid promotion piece {0}")]
    InvalidPromotionPiece(char),
    #[error("illegal move {0}")]
    IllegalMove(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenParseError {
    #[error("FEN string is missing the piece placement field")]
    MissingBoard,
    #[error("expected 8 ranks in board part, got {0}")]
    BoardSegments(usize),
    #[error("two adjacent digits in board part")]
    AdjacentDigits,
    #[error("rank {rank} describes {count} squares, expected 8")]
    BadSquaresInSegment { rank: usize, count: usize },
    #[error("unexpected character {0:?} in board part")]
    UnexpectedCharacter(char),
    #[error("{colour} has more than one king")]
    DuplicateKings { colour: Colour },
    #[error("{colour} has {count} pieces, more than a side can have")]
    TooManyPieces { colour: Colour, count: usize },
    #[error("pawn on back rank square {0}")]
    PawnOnBackRank(Square),
    #[error("FEN string is missing the side to move")]
    MissingSide,
    #[error("FEN string is missing the castling field")]
    MissingCastling,
    #[error("FEN string is missing the en passant field")]
    MissingEnPassant,
    #[error("FEN string is missing the halfmove clock")]
    MissingHalfmoveClock,
    #[error("FEN string is missing the fullmove number")]
    MissingFullmoveNumber,
    #[error("invalid side to move {0:?}, expected \"w\" or \"b\"")]
    InvalidSide(String),
    #[error("invalid castling field {0:?}")]
    InvalidCastling(String),
    #[error("invalid en passant square {0:?}")]
    InvalidEnPassant(String),
    #[error("en passant square {square} is on the wrong rank: expected {expected}, got {got}")]
    InvalidEnPassantRank { square: Square, expected: char, got: char },
    #[error("invalid halfmove clock {0:?}")]
    InvalidHalfmoveClock(String),
    #[error("invalid fullmove number {0:?}")]
    InvalidFullmoveNumber(String),
    #[error("fullmove number must be at least 1")]
    FullmoveNumberZero,
    #[error("fullmove number {0} is too large")]
    FullmoveNumberTooLarge(usize),
    #[error("unexpected trailing tokens {0:?}")]
    ExtraTokens(String),
}

/// Reasons a SAN string fails to name a legal move.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SanError {
    #[error("empty move string")]
    Empty,
    #[error("unexpected character {0:?} in move")]
    UnexpectedCharacter(char),
    #[error("move {0:?} has no destination square")]
    MissingDestination(String),
    #[error("invalid promotion piece {0:?}")]
    InvalidPromotionPiece(char),
    #[error("{0} cannot promote")]
    InvalidPromotion(String),
    #[error("no piece can make the move {0}")]
    NoMatchingPiece(String),
    #[error("move {san} is ambiguous between {count} pieces")]
    Ambiguous { san: String, count: usize },
    #[error("castling {0} is not legal here")]
    IllegalCastle(String),
}

/// Why a board fails its internal consistency check.
pub type PositionValidityError = String;
