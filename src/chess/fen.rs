use std::{num::NonZeroUsize, str::SplitWhitespace};

use arrayvec::ArrayVec;

use crate::{
    chess::{
        piece::{Colour, Piece, PieceType},
        types::{CastlingRights, File, Rank, Square},
    },
    errors::FenParseError,
};

/// Most pieces a side can have.
pub const MAX_PIECES: usize = 16;

/// A parsed FEN representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fen {
    pub(crate) board: [Option<Piece>; 64],
    pub(crate) turn: Colour,
    pub(crate) castling: CastlingRights,
    pub(crate) ep: Option<Square>,
    pub(crate) halfmove: u64,
    pub(crate) fullmove: NonZeroUsize,
}

impl Fen {
    const DEFAULT_FULL_MOVE: NonZeroUsize = NonZeroUsize::MIN;
    /// Largest accepted fullmove number, so that the ply count always fits a `usize`.
    pub const MAX_FULL_MOVE: usize = usize::MAX / 4;

    /// Parse a FEN string in strict mode.
    /// All 6 fields must be present, and no extra tokens are allowed.
    pub fn parse(fen: &str) -> Result<Self, FenParseError> {
        let mut tokens = fen.split_whitespace();
        let result = Self::parse_inner(&mut tokens, true)?;
        let rest = tokens.collect::<Vec<_>>();
        if !rest.is_empty() {
            return Err(FenParseError::ExtraTokens(rest.join(" ")));
        }
        Ok(result)
    }

    /// Parse a FEN string in relaxed mode.
    /// Missing or unreadable fields after the board are defaulted to: w, -, -, 0, 1
    /// Extra tokens after the fullmove counter are permitted but ignored.
    pub fn parse_relaxed(fen: &str) -> Result<Self, FenParseError> {
        let mut tokens = fen.split_whitespace();
        Self::parse_inner(&mut tokens, false)
    }

    fn parse_inner(tokens: &mut SplitWhitespace<'_>, strict: bool) -> Result<Self, FenParseError> {
        // Field #1: Piece placement
        let board_str = tokens.next().ok_or(FenParseError::MissingBoard)?;
        let board = Self::parse_board(board_str)?;

        // Field #2: Active colour
        let turn = match tokens.next() {
            Some(s) if strict => Self::parse_turn(s)?,
            Some(s) => Self::parse_turn(s).unwrap_or_else(|e| defaulted(&e, Colour::White)),
            None if strict => return Err(FenParseError::MissingSide),
            None => defaulted(&FenParseError::MissingSide, Colour::White),
        };

        // Field #3: Castling availability
        let castling = match tokens.next() {
            Some(s) if strict => Self::parse_castling(s)?,
            Some(s) => Self::parse_castling(s).unwrap_or_else(|e| defaulted(&e, CastlingRights::NONE)),
            None if strict => return Err(FenParseError::MissingCastling),
            None => defaulted(&FenParseError::MissingCastling, CastlingRights::NONE),
        };

        // Field #4: En passant target square
        let ep = match tokens.next() {
            Some(s) if strict => Self::parse_ep(s, turn)?,
            Some(s) => Self::parse_ep(s, turn).unwrap_or_else(|e| defaulted(&e, None)),
            None if strict => return Err(FenParseError::MissingEnPassant),
            None => defaulted(&FenParseError::MissingEnPassant, None),
        };

        // Field #5: Halfmove clock
        let halfmove = match tokens.next() {
            Some(s) if strict => Self::parse_halfmove(s)?,
            Some(s) => Self::parse_halfmove(s).unwrap_or_else(|e| defaulted(&e, 0)),
            None if strict => return Err(FenParseError::MissingHalfmoveClock),
            None => defaulted(&FenParseError::MissingHalfmoveClock, 0),
        };

        // Field #6: Fullmove number
        let fullmove = match tokens.next() {
            Some(s) if strict => Self::parse_fullmove(s)?,
            Some(s) => {
                Self::parse_fullmove(s).unwrap_or_else(|e| defaulted(&e, Self::DEFAULT_FULL_MOVE))
            }
            None if strict => return Err(FenParseError::MissingFullmoveNumber),
            None => defaulted(&FenParseError::MissingFullmoveNumber, Self::DEFAULT_FULL_MOVE),
        };

        Ok(Self {
            board,
            turn,
            castling,
            ep,
            halfmove,
            fullmove,
        })
    }

    fn parse_board(board_str: &str) -> Result<[Option<Piece>; 64], FenParseError> {
        let mut mailbox = [None; 64];

        let mut ranks = ArrayVec::<&str, 8>::new();

        let mut board_parts = board_str.split('/');

        while let Some(rank) = board_parts.next() {
            if ranks.try_push(rank).is_err() {
                // 8 successfully parse, plus one now, plus the rest.
                return Err(FenParseError::BoardSegments(8 + 1 + board_parts.count()));
            }
        }

        if ranks.len() != 8 {
            return Err(FenParseError::BoardSegments(ranks.len()));
        }

        for (rank, rank_str) in Rank::all().rev().zip(ranks) {
            let mut squares_in_rank = 0;
            let mut prev_was_digit = false;
            let bad_count = |count| FenParseError::BadSquaresInSegment {
                rank: rank as usize + 1,
                count,
            };

            for c in rank_str.chars() {
                match c {
                    '1'..='8' => {
                        if prev_was_digit {
                            return Err(FenParseError::AdjacentDigits);
                        }
                        prev_was_digit = true;
                        squares_in_rank += c as usize - '0' as usize;
                        if squares_in_rank > 8 {
                            return Err(bad_count(squares_in_rank));
                        }
                    }
                    _ => {
                        let piece =
                            Piece::from_char(c).ok_or(FenParseError::UnexpectedCharacter(c))?;
                        prev_was_digit = false;
                        let file = File::from_index(u8::try_from(squares_in_rank).unwrap_or(8))
                            .ok_or_else(|| bad_count(squares_in_rank + 1))?;
                        mailbox[Square::from_rank_file(rank, file)] = Some(piece);
                        squares_in_rank += 1;
                    }
                }
            }

            if squares_in_rank != 8 {
                return Err(bad_count(squares_in_rank));
            }
        }

        // a position may lack a king, but never has two of one colour.
        for colour in Colour::all() {
            let king = Some(Piece::new(colour, PieceType::King));
            if mailbox.iter().filter(|&&p| p == king).count() > 1 {
                return Err(FenParseError::DuplicateKings { colour });
            }
            let count = mailbox.iter().flatten().filter(|p| p.colour() == colour).count();
            if count > MAX_PIECES {
                return Err(FenParseError::TooManyPieces { colour, count });
            }
        }

        for sq in Square::all() {
            if mailbox[sq].is_some_and(|p| p.piece_type() == PieceType::Pawn)
                && matches!(sq.rank(), Rank::One | Rank::Eight)
            {
                return Err(FenParseError::PawnOnBackRank(sq));
            }
        }

        Ok(mailbox)
    }

    fn parse_turn(s: &str) -> Result<Colour, FenParseError> {
        match s {
            "w" => Ok(Colour::White),
            "b" => Ok(Colour::Black),
            _ => Err(FenParseError::InvalidSide(s.to_string())),
        }
    }

    fn parse_castling(s: &str) -> Result<CastlingRights, FenParseError> {
        if s == "-" {
            return Ok(CastlingRights::NONE);
        }

        let mut rights = CastlingRights::NONE;
        for c in s.chars() {
            match c {
                'K' => rights.set_kingside(Colour::White),
                'Q' => rights.set_queenside(Colour::White),
                'k' => rights.set_kingside(Colour::Black),
                'q' => rights.set_queenside(Colour::Black),
                _ => return Err(FenParseError::InvalidCastling(s.to_string())),
            }
        }

        Ok(rights)
    }

    fn parse_ep(s: &str, turn: Colour) -> Result<Option<Square>, FenParseError> {
        if s == "-" {
            return Ok(None);
        }

        let square: Square = s.parse().map_err(|_| FenParseError::InvalidEnPassant(s.to_string()))?;

        // white to move means black just pushed, so the passed square is on rank 6.
        let expected_rank = match turn {
            Colour::White => Rank::Six,
            Colour::Black => Rank::Three,
        };

        if square.rank() != expected_rank {
            return Err(FenParseError::InvalidEnPassantRank {
                square,
                expected: expected_rank.char(),
                got: square.rank().char(),
            });
        }

        Ok(Some(square))
    }

    fn parse_halfmove(s: &str) -> Result<u64, FenParseError> {
        s.parse().map_err(|_| FenParseError::InvalidHalfmoveClock(s.to_string()))
    }

    fn parse_fullmove(s: &str) -> Result<NonZeroUsize, FenParseError> {
        let value: usize =
            s.parse().map_err(|_| FenParseError::InvalidFullmoveNumber(s.to_string()))?;

        if value > Self::MAX_FULL_MOVE {
            return Err(FenParseError::FullmoveNumberTooLarge(value));
        }
        NonZeroUsize::new(value).ok_or(FenParseError::FullmoveNumberZero)
    }
}

fn defaulted<T: std::fmt::Debug>(reason: &FenParseError, value: T) -> T {
    log::debug!("relaxed FEN: {reason}, defaulting to {value:?}");
    value
}
