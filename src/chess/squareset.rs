use std::{
    fmt::Display,
    ops::{BitOr, BitOrAssign, Sub},
};

use crate::chess::types::Square;

/// A set of squares, one bit per square in `rank * 8 + file` order.
/// Used as the attack map: a bit is set when a side attacks that square.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct SquareSet {
    inner: u64,
}

impl SquareSet {
    pub const EMPTY: Self = Self { inner: 0 };

    pub const fn from_inner(inner: u64) -> Self {
        Self { inner }
    }

    pub const fn count(self) -> u32 {
        self.inner.count_ones()
    }

    pub const fn is_empty(self) -> bool {
        self.inner == 0
    }

    pub const fn contains_square(self, square: Square) -> bool {
        (self.inner & (1 << square.index())) != 0
    }

    pub const fn add_square(self, square: Square) -> Self {
        Self {
            inner: self.inner | (1 << square.index()),
        }
    }

    /// Looks a square up by zero-based coordinates. Off-board coordinates read as unset.
    pub const fn get(self, file: u8, rank: u8) -> bool {
        match Square::from_coords(file, rank) {
            Some(sq) => self.contains_square(sq),
            None => false,
        }
    }

    pub fn set(&mut self, square: Square) {
        *self = self.add_square(square);
    }

    #[allow(clippy::missing_const_for_fn)]
    pub fn iter(self) -> SquareIter {
        SquareIter::new(self.inner)
    }
}

/// Iterator over the squares of a square-set.
/// The squares are returned in increasing order.
pub struct SquareIter {
    value: u64,
}

impl SquareIter {
    pub const fn new(value: u64) -> Self {
        Self { value }
    }
}

impl Iterator for SquareIter {
    type Item = Square;

    fn next(&mut self) -> Option<Self::Item> {
        if self.value == 0 {
            None
        } else {
            #[allow(clippy::cast_possible_truncation)]
            let lsb: u8 = self.value.trailing_zeros() as u8;
            self.value &= self.value - 1;
            // SAFETY: u64::trailing_zeros can only return values within `0..64`,
            // all of which correspond to valid enum variants of Square.
            Some(unsafe { Square::new_unchecked(lsb) })
        }
    }
}

impl IntoIterator for SquareSet {
    type Item = Square;
    type IntoIter = SquareIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Square> for SquareSet {
    fn from_iter<I: IntoIterator<Item = Square>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::add_square)
    }
}

impl BitOr for SquareSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self {
            inner: self.inner | rhs.inner,
        }
    }
}

impl BitOrAssign for SquareSet {
    fn bitor_assign(&mut self, rhs: Self) {
        self.inner |= rhs.inner;
    }
}

impl Sub for SquareSet {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            inner: self.inner & !rhs.inner,
        }
    }
}

impl Display for SquareSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for rank in (0..8).rev() {
            for file in 0..8 {
                write!(f, "{}", if self.get(file, rank) { '1' } else { '0' })?;
            }
            if rank > 0 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::chess::{squareset::SquareSet, types::Square};

    #[test]
    fn counters() {
        let empty = SquareSet::EMPTY;
        assert!(empty.is_empty());
        assert_eq!(empty.count(), 0);

        let one = Square::E4.as_set();
        assert!(!one.is_empty());
        assert_eq!(one.count(), 1);

        let two = one.add_square(Square::E5);
        assert_eq!(two.count(), 2);
        assert_eq!(two - one, Square::E5.as_set());
        assert_eq!(one | Square::E5.as_set(), two);
    }

    #[test]
    fn coordinate_lookup() {
        let mut set = SquareSet::EMPTY;
        set.set(Square::C6);
        assert!(set.get(2, 5));
        assert!(set.contains_square(Square::C6));
        assert!(!set.get(5, 2));
        assert!(!set.get(8, 5));
        assert!(!set.get(2, 255));
    }

    #[test]
    fn iteration_is_ordered() {
        let set: SquareSet = [Square::H8, Square::A1, Square::E4].into_iter().collect();
        let squares: Vec<_> = set.iter().collect();
        assert_eq!(squares, [Square::A1, Square::E4, Square::H8]);
    }

    #[test]
    fn display_dumps_rank_eight_first() {
        let set: SquareSet = [Square::A1, Square::A8].into_iter().collect();
        let text = set.to_string();
        let rows: Vec<_> = text.lines().collect();
        assert_eq!(rows.len(), 8);
        assert_eq!(rows[0], "10000000");
        assert_eq!(rows[3], "00000000");
        assert_eq!(rows[7], "10000000");
    }
}
