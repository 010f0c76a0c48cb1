use std::fmt::Display;

use crate::{
    chess::{
        board::Board,
        chessmove::Move,
        piece::{Colour, Piece, PieceType},
        types::{CheckState, File, Rank, Square},
    },
    errors::SanError,
};

/// A legal move ready to be written in Standard Algebraic Notation.
#[derive(Clone, Copy, Debug)]
pub struct SanThunk {
    m: Move,
    piece_type: PieceType,
    /// `Some(true)` for a short castle, `Some(false)` for a long one.
    castle: Option<bool>,
    capture: bool,
    file_hint: bool,
    rank_hint: bool,
    check: CheckState,
}

impl Display for SanThunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self { m, piece_type, castle, capture, file_hint, rank_hint, check } = *self;
        let check_char = match check {
            CheckState::None => "",
            CheckState::Check => "+",
            CheckState::Checkmate => "#",
        };
        match castle {
            Some(true) => return write!(f, "O-O{check_char}"),
            Some(false) => return write!(f, "O-O-O{check_char}"),
            None => (),
        }
        let from = m.from();
        if piece_type == PieceType::Pawn {
            if capture {
                write!(f, "{}", from.file().char())?;
            }
        } else {
            write!(f, "{}", piece_type.symbol())?;
        }
        if file_hint {
            write!(f, "{}", from.file().char())?;
        }
        if rank_hint {
            write!(f, "{}", from.rank().char())?;
        }
        if capture {
            write!(f, "x")?;
        }
        write!(f, "{}", m.to())?;
        if let Some(promo) = m.promotion_type() {
            write!(f, "={}", promo.symbol())?;
        }
        write!(f, "{check_char}")
    }
}

/// The pieces of a SAN token, collected by scanning it from the end.
#[derive(Debug, Default)]
struct SanParts {
    piece_type: Option<PieceType>,
    promotion: Option<PieceType>,
    to_file: Option<File>,
    to_rank: Option<Rank>,
    from_file: Option<File>,
    from_rank: Option<Rank>,
}

impl SanParts {
    const fn nothing_collected(&self) -> bool {
        self.to_file.is_none() && self.to_rank.is_none() && self.promotion.is_none()
    }

    fn scan(token: &str) -> Result<Self, SanError> {
        let bytes = token.as_bytes();
        let mut parts = Self::default();
        let mut i = bytes.len();
        while i > 0 {
            i -= 1;
            let c = bytes[i];
            let after_eq = i > 0 && bytes[i - 1] == b'=';

            // "=Q", or the terse "e8Q" form, at the very end of the token.
            if after_eq || (i > 0 && c.is_ascii_uppercase() && parts.nothing_collected()) {
                if !parts.nothing_collected() {
                    return Err(SanError::UnexpectedCharacter(if after_eq { '=' } else { c as char }));
                }
                let promo = PieceType::from_symbol(c.to_ascii_uppercase())
                    .filter(|pt| pt.legal_promo())
                    .ok_or(SanError::InvalidPromotionPiece(c as char))?;
                parts.promotion = Some(promo);
                if after_eq {
                    i -= 1;
                }
                continue;
            }

            match c {
                b'x' => (),
                b'a'..=b'h' => {
                    let file = File::from_char(c);
                    if parts.to_file.is_none() {
                        parts.to_file = file;
                    } else if parts.from_file.is_none() {
                        parts.from_file = file;
                    } else {
                        return Err(SanError::UnexpectedCharacter(c as char));
                    }
                }
                b'1'..=b'8' => {
                    let rank = Rank::from_char(c);
                    if parts.to_rank.is_none() {
                        parts.to_rank = rank;
                    } else if parts.from_rank.is_none() {
                        parts.from_rank = rank;
                    } else {
                        return Err(SanError::UnexpectedCharacter(c as char));
                    }
                }
                _ if i == 0 => {
                    parts.piece_type = Some(
                        PieceType::from_symbol(c)
                            .ok_or(SanError::UnexpectedCharacter(c as char))?,
                    );
                }
                _ => return Err(SanError::UnexpectedCharacter(c as char)),
            }
        }
        Ok(parts)
    }
}

impl Board {
    /// Renders a legal move for the side to move in SAN, or `None` if the move is not legal.
    pub fn san(&mut self, m: Move) -> Option<SanThunk> {
        let piece = self.state.mailbox[m.from()].filter(|p| p.colour() == self.side)?;
        let legal = self.legal_moves();
        if !legal.contains(&m) {
            return None;
        }

        let castle = self.is_castle(m).then(|| m.to() > m.from());
        let capture = self.is_capture(m);

        let (mut file_hint, mut rank_hint) = (false, false);
        if piece.piece_type() != PieceType::Pawn {
            let rivals = legal
                .iter()
                .filter(|o| {
                    o.to() == m.to()
                        && o.from() != m.from()
                        && self.state.mailbox[o.from()] == Some(piece)
                })
                .map(|o| o.from())
                .collect::<Vec<_>>();
            if !rivals.is_empty() {
                if rivals.iter().all(|sq| sq.file() != m.from().file()) {
                    file_hint = true;
                } else if rivals.iter().all(|sq| sq.rank() != m.from().rank()) {
                    rank_hint = true;
                } else {
                    file_hint = true;
                    rank_hint = true;
                }
            }
        }

        let check = self.gives(m);

        Some(SanThunk {
            m,
            piece_type: piece.piece_type(),
            castle,
            capture,
            file_hint,
            rank_hint,
            check,
        })
    }

    /// Resolves a SAN move for the side to move.
    pub fn parse_san(&mut self, san: &str) -> Result<Move, SanError> {
        self.resolve_san(san, self.side)
    }

    /// Resolves a SAN move for `colour`, returning [`Move::INVALID`] if it names no
    /// single legal move.
    pub fn resolve_san_or_invalid(&mut self, san: &str, colour: Colour) -> Move {
        self.resolve_san(san, colour).unwrap_or(Move::INVALID)
    }

    /// Resolves a move in Standard Algebraic Notation for `colour`.
    ///
    /// Check and mate markers and the capture marker are ignored. A pawn moving onto the
    /// back rank without a promotion suffix promotes to a queen. The returned move is legal.
    pub fn resolve_san(&mut self, san: &str, colour: Colour) -> Result<Move, SanError> {
        let result = self.resolve_san_inner(san.trim(), colour);
        match &result {
            Ok(m) => log::trace!("resolved {san:?} for {colour} to {m}"),
            Err(e) => log::trace!("could not resolve {san:?} for {colour}: {e}"),
        }
        result
    }

    fn resolve_san_inner(&mut self, san: &str, colour: Colour) -> Result<Move, SanError> {
        if san.is_empty() {
            return Err(SanError::Empty);
        }

        let token = san.trim_end_matches(['+', '#']);
        match token {
            "O-O" | "0-0" => return self.resolve_castle(san, colour, true),
            "O-O-O" | "0-0-0" => return self.resolve_castle(san, colour, false),
            _ => (),
        }

        let parts = SanParts::scan(token)?;
        let (Some(to_file), Some(to_rank)) = (parts.to_file, parts.to_rank) else {
            return Err(SanError::MissingDestination(san.to_string()));
        };
        let to = Square::from_rank_file(to_rank, to_file);
        let piece_type = parts.piece_type.unwrap_or(PieceType::Pawn);

        let back_rank = Rank::back_rank(colour);
        if parts.promotion.is_some() && (piece_type != PieceType::Pawn || to_rank != back_rank) {
            return Err(SanError::InvalidPromotion(san.to_string()));
        }
        let promotion = (piece_type == PieceType::Pawn && to_rank == back_rank)
            .then(|| parts.promotion.unwrap_or(PieceType::Queen));

        // a pawn without a file hint is pushing, so it stands on the destination file.
        let from_file = match parts.from_file {
            None if piece_type == PieceType::Pawn => Some(to_file),
            hint => hint,
        };

        let wanted = Some(Piece::new(colour, piece_type));
        let mut from = None;
        let mut matches = 0;
        for rank in Rank::all().filter(|&r| parts.from_rank.is_none_or(|hint| hint == r)) {
            for file in File::all().filter(|&f| from_file.is_none_or(|hint| hint == f)) {
                let sq = Square::from_rank_file(rank, file);
                if self.state.mailbox[sq] == wanted && self.targets(sq, true).contains_square(to) {
                    matches += 1;
                    from.get_or_insert(sq);
                }
            }
        }

        match (from, matches) {
            (Some(from), 1) => Ok(promotion
                .and_then(|promo| Move::new_with_promo(from, to, promo))
                .unwrap_or_else(|| Move::new(from, to))),
            (Some(_), count) => Err(SanError::Ambiguous { san: san.to_string(), count }),
            (None, _) => Err(SanError::NoMatchingPiece(san.to_string())),
        }
    }

    fn resolve_castle(&mut self, san: &str, colour: Colour, kingside: bool) -> Result<Move, SanError> {
        let home = Square::E1.relative_to(colour);
        let dest = if kingside { Square::G1 } else { Square::C1 }.relative_to(colour);
        if self.state.mailbox[home] == Some(Piece::new(colour, PieceType::King))
            && self.targets(home, true).contains_square(dest)
        {
            Ok(Move::new(home, dest))
        } else {
            Err(SanError::IllegalCastle(san.to_string()))
        }
    }
}
