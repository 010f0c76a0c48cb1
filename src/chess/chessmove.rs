use std::fmt::{Debug, Display, Formatter};

use crate::chess::{piece::PieceType, types::Square};

/// A move from one square to another, with an optional promotion piece.
///
/// Packed into 16 bits: bits 0-5 hold the source square, bits 6-11 the
/// destination, and bits 12-15 are a one-hot promotion flag
/// (12 rook, 13 knight, 14 bishop, 15 queen). Castling and en passant are
/// not flagged; they are recognised from the board when the move is made.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Move {
    data: u16,
}

impl Move {
    const FROM_MASK: u16 = 0b0000_0000_0011_1111;
    const TO_MASK: u16 = 0b0000_1111_1100_0000;
    const PROMO_MASK: u16 = 0b1111_0000_0000_0000;
    const ROOK_FLAG: u16 = 1 << 12;
    const KNIGHT_FLAG: u16 = 1 << 13;
    const BISHOP_FLAG: u16 = 1 << 14;
    const QUEEN_FLAG: u16 = 1 << 15;

    /// Sentinel for "no move", returned when notation cannot be resolved.
    pub const INVALID: Self = Self { data: 0xFFFF };

    pub const fn new(from: Square, to: Square) -> Self {
        Self { data: from.inner() as u16 | (to.inner() as u16) << 6 }
    }

    /// Returns `None` if `promotion` is not a piece a pawn can become.
    pub const fn new_with_promo(from: Square, to: Square, promotion: PieceType) -> Option<Self> {
        let flag = match promotion {
            PieceType::Rook => Self::ROOK_FLAG,
            PieceType::Knight => Self::KNIGHT_FLAG,
            PieceType::Bishop => Self::BISHOP_FLAG,
            PieceType::Queen => Self::QUEEN_FLAG,
            _ => return None,
        };
        Some(Self { data: Self::new(from, to).data | flag })
    }

    /// Interprets raw bits as a move, rejecting the sentinel and any word
    /// with more than one promotion bit set.
    pub const fn from_raw(data: u16) -> Option<Self> {
        if data == Self::INVALID.data || (data & Self::PROMO_MASK).count_ones() > 1 {
            None
        } else {
            Some(Self { data })
        }
    }

    pub const fn inner(self) -> u16 {
        self.data
    }

    pub const fn is_invalid(self) -> bool {
        self.data == Self::INVALID.data
    }

    #[allow(clippy::cast_possible_truncation)]
    pub const fn from(self) -> Square {
        // SAFETY: the mask keeps the value within `0..64`.
        unsafe { Square::new_unchecked((self.data & Self::FROM_MASK) as u8) }
    }

    #[allow(clippy::cast_possible_truncation)]
    pub const fn to(self) -> Square {
        // SAFETY: the mask and shift keep the value within `0..64`.
        unsafe { Square::new_unchecked(((self.data & Self::TO_MASK) >> 6) as u8) }
    }

    pub const fn promotion_type(self) -> Option<PieceType> {
        match self.data & Self::PROMO_MASK {
            Self::ROOK_FLAG => Some(PieceType::Rook),
            Self::KNIGHT_FLAG => Some(PieceType::Knight),
            Self::BISHOP_FLAG => Some(PieceType::Bishop),
            Self::QUEEN_FLAG => Some(PieceType::Queen),
            _ => None,
        }
    }

    pub const fn is_promo(self) -> bool {
        self.data & Self::PROMO_MASK != 0
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.is_invalid() {
            return write!(f, "0000");
        }

        if let Some(pchar) = self.promotion_type().and_then(PieceType::promo_char) {
            write!(f, "{}{}{pchar}", self.from(), self.to())
        } else {
            write!(f, "{}{}", self.from(), self.to())
        }
    }
}

impl Debug for Move {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        if self.is_invalid() {
            return write!(f, "invalid move");
        }
        write!(
            f,
            "move from {} ({:?}) to {} ({:?}), promo {}",
            self.from(),
            self.from(),
            self.to(),
            self.to(),
            self.promotion_type().and_then(PieceType::promo_char).unwrap_or('X'),
        )
    }
}
