use std::{
    fmt::{self, Display},
    mem::size_of,
    ops::{Index, IndexMut},
    str::FromStr,
};

use crate::chess::{
    piece::{Colour, Piece},
    squareset::SquareSet,
};

#[derive(PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Hash, Debug)]
#[repr(u8)]
pub enum File {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
}

const _FILE_ASSERT: () = assert!(size_of::<File>() == size_of::<Option<File>>());

impl File {
    pub const fn abs_diff(self, other: Self) -> u8 {
        (self as u8).abs_diff(other as u8)
    }

    pub const fn from_index(index: u8) -> Option<Self> {
        if index < 8 {
            // SAFETY: inner is less than 8, so it corresponds to a valid enum variant.
            Some(unsafe { std::mem::transmute::<u8, Self>(index) })
        } else {
            None
        }
    }

    pub fn all() -> impl DoubleEndedIterator<Item = Self> {
        (0..8u8).filter_map(Self::from_index)
    }

    pub const fn char(self) -> char {
        (b'a' + self as u8) as char
    }

    pub const fn from_char(c: u8) -> Option<Self> {
        if c.is_ascii_lowercase() { Self::from_index(c - b'a') } else { None }
    }
}

#[derive(PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Hash, Debug)]
#[repr(u8)]
pub enum Rank {
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
}

const _RANK_ASSERT: () = assert!(size_of::<Rank>() == size_of::<Option<Rank>>());

impl Rank {
    pub const fn abs_diff(self, other: Self) -> u8 {
        (self as u8).abs_diff(other as u8)
    }

    pub const fn from_index(index: u8) -> Option<Self> {
        if index < 8 {
            // SAFETY: inner is less than 8, so it corresponds to a valid enum variant.
            Some(unsafe { std::mem::transmute::<u8, Self>(index) })
        } else {
            None
        }
    }

    pub fn all() -> impl DoubleEndedIterator<Item = Self> {
        (0..8u8).filter_map(Self::from_index)
    }

    pub const fn char(self) -> char {
        (b'1' + self as u8) as char
    }

    pub const fn from_char(c: u8) -> Option<Self> {
        if c.is_ascii_digit() && c != b'0' { Self::from_index(c - b'1') } else { None }
    }

    /// The rank a pawn of the given colour promotes on.
    pub const fn back_rank(colour: Colour) -> Self {
        match colour {
            Colour::White => Self::Eight,
            Colour::Black => Self::One,
        }
    }

    /// The rank pawns of the given colour start on.
    pub const fn pawn_rank(colour: Colour) -> Self {
        match colour {
            Colour::White => Self::Two,
            Colour::Black => Self::Seven,
        }
    }
}

#[rustfmt::skip]
#[derive(PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Hash, Debug, Default)]
#[repr(u8)]
pub enum Square {
    #[default]
    A1, B1, C1, D1, E1, F1, G1, H1,
    A2, B2, C2, D2, E2, F2, G2, H2,
    A3, B3, C3, D3, E3, F3, G3, H3,
    A4, B4, C4, D4, E4, F4, G4, H4,
    A5, B5, C5, D5, E5, F5, G5, H5,
    A6, B6, C6, D6, E6, F6, G6, H6,
    A7, B7, C7, D7, E7, F7, G7, H7,
    A8, B8, C8, D8, E8, F8, G8, H8,
}

const _SQUARE_ASSERT: () = assert!(size_of::<Square>() == size_of::<Option<Square>>());

impl<T> Index<Square> for [T; 64] {
    type Output = T;

    fn index(&self, index: Square) -> &Self::Output {
        &self[index as usize]
    }
}

impl<T> IndexMut<Square> for [T; 64] {
    fn index_mut(&mut self, index: Square) -> &mut Self::Output {
        &mut self[index as usize]
    }
}

static SQUARE_NAMES: [&str; 64] = [
    "a1", "b1", "c1", "d1", "e1", "f1", "g1", "h1", "a2", "b2", "c2", "d2", "e2", "f2", "g2", "h2",
    "a3", "b3", "c3", "d3", "e3", "f3", "g3", "h3", "a4", "b4", "c4", "d4", "e4", "f4", "g4", "h4",
    "a5", "b5", "c5", "d5", "e5", "f5", "g5", "h5", "a6", "b6", "c6", "d6", "e6", "f6", "g6", "h6",
    "a7", "b7", "c7", "d7", "e7", "f7", "g7", "h7", "a8", "b8", "c8", "d8", "e8", "f8", "g8", "h8",
];

impl Square {
    pub const fn from_rank_file(rank: Rank, file: File) -> Self {
        let inner = rank as u8 * 8 + file as u8;
        // SAFETY: Rank and File are constrained such that inner is always < 64.
        unsafe { std::mem::transmute(inner) }
    }

    pub const fn new(inner: u8) -> Option<Self> {
        if inner < 64 {
            // SAFETY: inner is less than 64, so it corresponds to a valid enum variant.
            Some(unsafe { std::mem::transmute::<u8, Self>(inner) })
        } else {
            None
        }
    }

    /// SAFETY: you may not call this function with a value of `inner` that is
    /// greater than 63.
    pub const unsafe fn new_unchecked(inner: u8) -> Self {
        debug_assert!(inner < 64);
        // SAFETY: the caller guarantees that inner is less than 64.
        unsafe { std::mem::transmute(inner) }
    }

    /// Builds a square from zero-based coordinates, or `None` if either is off the board.
    pub const fn from_coords(file: u8, rank: u8) -> Option<Self> {
        if file < 8 && rank < 8 { Self::new(rank * 8 + file) } else { None }
    }

    pub const fn flip_rank(self) -> Self {
        // SAFETY: given the precondition that `self as u8` is less than 64,
        // this operation cannot construct a value >= 64.
        unsafe { std::mem::transmute(self as u8 ^ 0b111_000) }
    }

    pub const fn relative_to(self, side: Colour) -> Self {
        if matches!(side, Colour::White) { self } else { self.flip_rank() }
    }

    /// The file that this square is on.
    pub const fn file(self) -> File {
        // SAFETY: `self as u8` is less than 64, and this operation can only
        // decrease the value, so cannot construct a value >= 64.
        unsafe { std::mem::transmute(self as u8 % 8) }
    }

    /// The rank that this square is on.
    pub const fn rank(self) -> Rank {
        // SAFETY: `self as u8` is less than 64, and this operation can only
        // decrease the value, so cannot construct a value >= 64.
        unsafe { std::mem::transmute(self as u8 / 8) }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn inner(self) -> u8 {
        self as u8
    }

    /// Steps `d_file` files and `d_rank` ranks away, or `None` if that leaves the board.
    pub const fn offset(self, d_file: i8, d_rank: i8) -> Option<Self> {
        #![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
        let file = self.file() as i8 + d_file;
        let rank = self.rank() as i8 + d_rank;
        if file < 0 || rank < 0 {
            return None;
        }
        Self::from_coords(file as u8, rank as u8)
    }

    pub const fn add(self, offset: u8) -> Option<Self> {
        Self::new(self as u8 + offset)
    }

    pub const fn sub(self, offset: u8) -> Option<Self> {
        match (self as u8).checked_sub(offset) {
            Some(inner) => Self::new(inner),
            None => None,
        }
    }

    pub const fn as_set(self) -> SquareSet {
        SquareSet::from_inner(1 << self as u8)
    }

    /// The square directly in front of this one from `side`'s point of view.
    pub const fn pawn_push(self, side: Colour) -> Option<Self> {
        match side {
            Colour::White => self.add(8),
            Colour::Black => self.sub(8),
        }
    }

    pub fn all() -> impl DoubleEndedIterator<Item = Self> {
        (0..64u8).filter_map(Self::new)
    }

    pub fn name(self) -> &'static str {
        SQUARE_NAMES[self]
    }
}

impl Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Square {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SQUARE_NAMES
            .iter()
            .position(|&name| name == s)
            .and_then(|index| -> Option<u8> { index.try_into().ok() })
            .and_then(Self::new)
            .ok_or("Invalid square name")
    }
}

/// Copyable state for a chess position.
///
/// This is everything a move can change apart from the side to move, so
/// restoring a saved `State` exactly undoes a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct State {
    /// The piece on each square, indexed `rank * 8 + file`.
    pub mailbox: [Option<Piece>; 64],
    /// Which sides can still castle.
    pub castle_perm: CastlingRights,
    /// The square a pawn passed over on the previous ply, if it advanced two ranks.
    pub ep_square: Option<Square>,
    /// The number of half moves made since the last capture or pawn advance.
    pub fifty_move_counter: u64,
}

impl Default for State {
    fn default() -> Self {
        Self {
            mailbox: [None; 64],
            castle_perm: CastlingRights::default(),
            ep_square: None,
            fifty_move_counter: 0,
        }
    }
}

/// Castling availability, one flag per side and colour.
///
/// A flag is cleared for good once the king or the rook it depends on has
/// moved, or when the rook's corner is captured on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct CastlingRights {
    data: u8,
}

impl CastlingRights {
    pub const WKCA: u8 = 0b0001;
    pub const WQCA: u8 = 0b0010;
    pub const BKCA: u8 = 0b0100;
    pub const BQCA: u8 = 0b1000;
    pub const NONE: Self = Self { data: 0 };
    pub const ALL: Self = Self { data: 0b1111 };

    pub const fn new(wk: bool, wq: bool, bk: bool, bq: bool) -> Self {
        let mut data = 0;
        if wk {
            data |= Self::WKCA;
        }
        if wq {
            data |= Self::WQCA;
        }
        if bk {
            data |= Self::BKCA;
        }
        if bq {
            data |= Self::BQCA;
        }
        Self { data }
    }

    pub const fn is_empty(self) -> bool {
        self.data == 0
    }

    const fn kingside_flag(side: Colour) -> u8 {
        match side {
            Colour::White => Self::WKCA,
            Colour::Black => Self::BKCA,
        }
    }

    const fn queenside_flag(side: Colour) -> u8 {
        match side {
            Colour::White => Self::WQCA,
            Colour::Black => Self::BQCA,
        }
    }

    pub const fn kingside(self, side: Colour) -> bool {
        self.data & Self::kingside_flag(side) != 0
    }

    pub const fn queenside(self, side: Colour) -> bool {
        self.data & Self::queenside_flag(side) != 0
    }

    pub fn set_kingside(&mut self, side: Colour) {
        self.data |= Self::kingside_flag(side);
    }

    pub fn set_queenside(&mut self, side: Colour) {
        self.data |= Self::queenside_flag(side);
    }

    /// Removes both rights of one side, as when its king moves.
    pub fn clear(&mut self, side: Colour) {
        self.data &= !(Self::kingside_flag(side) | Self::queenside_flag(side));
    }

    /// Removes the right tied to a rook's starting corner, if `sq` is one.
    pub fn remove_corner(&mut self, sq: Square) {
        match sq {
            Square::H1 => self.data &= !Self::WKCA,
            Square::A1 => self.data &= !Self::WQCA,
            Square::H8 => self.data &= !Self::BKCA,
            Square::A8 => self.data &= !Self::BQCA,
            _ => (),
        }
    }
}

impl Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "-");
        }
        for (present, ch) in [
            self.kingside(Colour::White),
            self.queenside(Colour::White),
            self.kingside(Colour::Black),
            self.queenside(Colour::Black),
        ]
        .into_iter()
        .zip("KQkq".chars())
        {
            if present {
                write!(f, "{ch}")?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    None,
    Check,
    Checkmate,
}
