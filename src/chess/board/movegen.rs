use std::{
    fmt::{Display, Formatter},
    ops::Deref,
};

use arrayvec::ArrayVec;

use crate::chess::{
    board::Board,
    chessmove::Move,
    piece::{Colour, Piece, PieceType},
    squareset::SquareSet,
    types::{Rank, Square},
};

/// Most moves a side with sixteen pieces can have: fifteen queens with 27 moves each, and a
/// king with eight steps and two castles. The record for positions reachable in play is 218.
pub const MAX_POSITION_MOVES: usize = 15 * 27 + 10;

/// (file, rank) steps of a knight.
pub const KNIGHT_OFFSETS: [(i8, i8); 8] =
    [(-1, 2), (1, 2), (2, 1), (2, -1), (1, -2), (-1, -2), (-2, -1), (-2, 1)];

/// (file, rank) steps to the eight neighbouring squares.
pub const DIRECTIONS: [(i8, i8); 8] =
    [(-1, -1), (0, -1), (1, -1), (-1, 0), (1, 0), (-1, 1), (0, 1), (1, 1)];

pub const BISHOP_DIRECTIONS: [(i8, i8); 4] =
    [DIRECTIONS[0], DIRECTIONS[2], DIRECTIONS[5], DIRECTIONS[7]];

pub const ROOK_DIRECTIONS: [(i8, i8); 4] =
    [DIRECTIONS[1], DIRECTIONS[3], DIRECTIONS[4], DIRECTIONS[6]];

pub const QUEEN_DIRECTIONS: [(i8, i8); 8] = DIRECTIONS;

const fn init_jumping_attacks(offsets: &[(i8, i8); 8]) -> [SquareSet; 64] {
    let mut attacks = [SquareSet::EMPTY; 64];
    cfor!(let mut sq = 0; sq < 64; sq += 1; {
        if let Some(square) = Square::new(sq) {
            let mut set = SquareSet::EMPTY;
            cfor!(let mut i = 0; i < offsets.len(); i += 1; {
                let (d_file, d_rank) = offsets[i];
                if let Some(target) = square.offset(d_file, d_rank) {
                    set = set.add_square(target);
                }
            });
            attacks[sq as usize] = set;
        }
    });
    attacks
}

pub static KNIGHT_ATTACKS: [SquareSet; 64] = init_jumping_attacks(&KNIGHT_OFFSETS);
pub static KING_ATTACKS: [SquareSet; 64] = init_jumping_attacks(&DIRECTIONS);

/// The squares a pawn of `side` standing on `sq` attacks.
pub fn pawn_attacks(sq: Square, side: Colour) -> SquareSet {
    let d_rank = match side {
        Colour::White => 1,
        Colour::Black => -1,
    };
    [-1, 1].into_iter().filter_map(|d_file| sq.offset(d_file, d_rank)).collect()
}

/// Rank of the en passant square that `side` may capture onto.
const fn ep_rank(side: Colour) -> Rank {
    match side {
        Colour::White => Rank::Six,
        Colour::Black => Rank::Three,
    }
}

#[derive(Clone, Debug, Default)]
pub struct MoveList {
    inner: ArrayVec<Move, MAX_POSITION_MOVES>,
}

impl MoveList {
    pub fn new() -> Self {
        Self { inner: ArrayVec::new() }
    }

    fn push(&mut self, m: Move) {
        self.inner.push(m);
    }

}

impl Deref for MoveList {
    type Target = [Move];

    fn deref(&self) -> &[Move] {
        &self.inner
    }
}

impl IntoIterator for MoveList {
    type Item = Move;
    type IntoIter = arrayvec::IntoIter<Move, MAX_POSITION_MOVES>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl Display for MoveList {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        write!(f, "MoveList: ({}) [", self.inner.len())?;
        for (i, m) in self.inner.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{m}")?;
        }
        write!(f, "]")
    }
}

impl Board {
    fn is_colour(&self, sq: Square, colour: Colour) -> bool {
        self.state.mailbox[sq].is_some_and(|p| p.colour() == colour)
    }

    /// Walks from `sq` in a direction and returns the first occupied square, if any.
    fn first_blocker(&self, sq: Square, (d_file, d_rank): (i8, i8)) -> Option<Square> {
        let mut cursor = sq.offset(d_file, d_rank)?;
        while self.state.mailbox[cursor].is_none() {
            cursor = cursor.offset(d_file, d_rank)?;
        }
        Some(cursor)
    }

    /// Squares reached by casting rays from `sq`, each ray including the first occupied square.
    fn ray_attacks(&self, sq: Square, directions: &[(i8, i8)]) -> SquareSet {
        let mut attacks = SquareSet::EMPTY;
        for &(d_file, d_rank) in directions {
            let mut cursor = sq;
            while let Some(next) = cursor.offset(d_file, d_rank) {
                attacks.set(next);
                if self.state.mailbox[next].is_some() {
                    break;
                }
                cursor = next;
            }
        }
        attacks
    }

    /// The squares `piece` attacks from `sq`, whatever occupies them.
    pub fn piece_attacks(&self, sq: Square, piece: Piece) -> SquareSet {
        match piece.piece_type() {
            PieceType::Pawn => pawn_attacks(sq, piece.colour()),
            PieceType::Knight => KNIGHT_ATTACKS[sq],
            PieceType::Bishop => self.ray_attacks(sq, &BISHOP_DIRECTIONS),
            PieceType::Rook => self.ray_attacks(sq, &ROOK_DIRECTIONS),
            PieceType::Queen => self.ray_attacks(sq, &QUEEN_DIRECTIONS),
            PieceType::King => KING_ATTACKS[sq],
        }
    }

    /// Every square attacked by a piece of colour `by`.
    pub fn attacked_squares(&self, by: Colour) -> SquareSet {
        Square::all()
            .filter_map(|sq| self.state.mailbox[sq].filter(|p| p.colour() == by).map(|p| (sq, p)))
            .fold(SquareSet::EMPTY, |acc, (sq, piece)| acc | self.piece_attacks(sq, piece))
    }

    /// Determines whether `sq` is attacked by a piece of colour `by`, by looking outward
    /// from `sq` for each kind of attacker.
    pub fn sq_attacked(&self, sq: Square, by: Colour) -> bool {
        let holds = |s: Square, piece_type: PieceType| {
            self.state.mailbox[s] == Some(Piece::new(by, piece_type))
        };

        // a pawn attacks `sq` from the squares a defending pawn would attack.
        if pawn_attacks(sq, !by).into_iter().any(|s| holds(s, PieceType::Pawn)) {
            return true;
        }
        if KNIGHT_ATTACKS[sq].into_iter().any(|s| holds(s, PieceType::Knight)) {
            return true;
        }
        if KING_ATTACKS[sq].into_iter().any(|s| holds(s, PieceType::King)) {
            return true;
        }

        let slider_hit = |directions: &[(i8, i8)], piece_type: PieceType| {
            directions.iter().any(|&dir| {
                self.first_blocker(sq, dir)
                    .is_some_and(|s| holds(s, piece_type) || holds(s, PieceType::Queen))
            })
        };
        slider_hit(&BISHOP_DIRECTIONS, PieceType::Bishop)
            || slider_hit(&ROOK_DIRECTIONS, PieceType::Rook)
    }

    /// The squares of every piece of colour `by` that attacks `sq`.
    pub fn attackers(&self, sq: Square, by: Colour) -> SquareSet {
        let holding = |set: SquareSet, piece_types: &[PieceType]| -> SquareSet {
            set.into_iter()
                .filter(|&s| {
                    self.state.mailbox[s]
                        .is_some_and(|p| p.colour() == by && piece_types.contains(&p.piece_type()))
                })
                .collect()
        };
        let blockers = |directions: &[(i8, i8)]| -> SquareSet {
            directions.iter().filter_map(|&dir| self.first_blocker(sq, dir)).collect()
        };

        holding(pawn_attacks(sq, !by), &[PieceType::Pawn])
            | holding(KNIGHT_ATTACKS[sq], &[PieceType::Knight])
            | holding(KING_ATTACKS[sq], &[PieceType::King])
            | holding(blockers(&BISHOP_DIRECTIONS), &[PieceType::Bishop, PieceType::Queen])
            | holding(blockers(&ROOK_DIRECTIONS), &[PieceType::Rook, PieceType::Queen])
    }

    /// Squares the piece on `sq` can move to by its movement rules alone, ignoring king
    /// safety and castling.
    fn pseudo_targets(&self, sq: Square, piece: Piece) -> SquareSet {
        let us = piece.colour();
        let ours: SquareSet = Square::all().filter(|&s| self.is_colour(s, us)).collect();
        let not_ours = |set: SquareSet| set - ours;
        match piece.piece_type() {
            PieceType::Pawn => self.pawn_targets(sq, us),
            PieceType::Knight => not_ours(KNIGHT_ATTACKS[sq]),
            PieceType::Bishop => not_ours(self.ray_attacks(sq, &BISHOP_DIRECTIONS)),
            PieceType::Rook => not_ours(self.ray_attacks(sq, &ROOK_DIRECTIONS)),
            PieceType::Queen => not_ours(self.ray_attacks(sq, &QUEEN_DIRECTIONS)),
            PieceType::King => not_ours(KING_ATTACKS[sq]),
        }
    }

    fn pawn_targets(&self, sq: Square, us: Colour) -> SquareSet {
        if sq.rank() == Rank::back_rank(us) {
            return SquareSet::EMPTY;
        }

        let mut targets = SquareSet::EMPTY;
        if let Some(one) = sq.pawn_push(us)
            && self.state.mailbox[one].is_none()
        {
            targets = targets.add_square(one);
            if sq.rank() == Rank::pawn_rank(us)
                && let Some(two) = one.pawn_push(us)
                && self.state.mailbox[two].is_none()
            {
                targets = targets.add_square(two);
            }
        }

        for capture in pawn_attacks(sq, us) {
            match self.state.mailbox[capture] {
                Some(victim) if victim.colour() != us => targets = targets.add_square(capture),
                None if Some(capture) == self.state.ep_square && capture.rank() == ep_rank(us) => {
                    targets = targets.add_square(capture);
                }
                _ => (),
            }
        }

        targets
    }

    /// The castling destinations open to a king of colour `us` on `sq`.
    ///
    /// Requires the right, the king on its home square with the rook on its corner,
    /// empty squares between them, and no attack on the king or the squares it crosses.
    fn castling_targets(&self, sq: Square, us: Colour) -> SquareSet {
        let home = Square::E1.relative_to(us);
        if sq != home || self.state.mailbox[sq] != Some(Piece::new(us, PieceType::King)) {
            return SquareSet::EMPTY;
        }
        let them = !us;
        if self.sq_attacked(home, them) {
            return SquareSet::EMPTY;
        }

        let rook = Some(Piece::new(us, PieceType::Rook));
        let empty = |s: Square| self.state.mailbox[s.relative_to(us)].is_none();
        let safe = |s: Square| !self.sq_attacked(s.relative_to(us), them);
        let rights = self.state.castle_perm;

        let mut targets = SquareSet::EMPTY;
        if rights.kingside(us)
            && self.state.mailbox[Square::H1.relative_to(us)] == rook
            && [Square::F1, Square::G1].into_iter().all(|s| empty(s) && safe(s))
        {
            targets = targets.add_square(Square::G1.relative_to(us));
        }
        if rights.queenside(us)
            && self.state.mailbox[Square::A1.relative_to(us)] == rook
            && [Square::B1, Square::C1, Square::D1].into_iter().all(empty)
            && [Square::C1, Square::D1].into_iter().all(safe)
        {
            targets = targets.add_square(Square::C1.relative_to(us));
        }
        targets
    }

    /// The squares the piece on `sq` can move to.
    ///
    /// With `filter_checks` unset these are the pseudo-legal targets. With it set,
    /// castling destinations are included and every target that would leave the
    /// mover's king attacked is removed.
    pub fn targets(&mut self, sq: Square, filter_checks: bool) -> SquareSet {
        let Some(piece) = self.state.mailbox[sq] else {
            return SquareSet::EMPTY;
        };
        let pseudo = self.pseudo_targets(sq, piece);
        if !filter_checks {
            return pseudo;
        }
        let mut candidates = pseudo;
        if piece.piece_type() == PieceType::King {
            candidates |= self.castling_targets(sq, piece.colour());
        }
        candidates.into_iter().filter(|&to| self.verify_move(Move::new(sq, to))).collect()
    }

    /// Pushes every legal move for `colour`'s pieces, expanding promotions into
    /// one move per promotion piece.
    pub fn generate_moves_for(&mut self, colour: Colour, move_list: &mut MoveList) {
        for sq in Square::all() {
            let Some(piece) = self.state.mailbox[sq].filter(|p| p.colour() == colour) else {
                continue;
            };
            let promotes = piece.piece_type() == PieceType::Pawn;
            for to in self.targets(sq, true) {
                if promotes && to.rank() == Rank::back_rank(colour) {
                    for promo in PieceType::PROMOTIONS {
                        if let Some(m) = Move::new_with_promo(sq, to, promo) {
                            move_list.push(m);
                        }
                    }
                } else {
                    move_list.push(Move::new(sq, to));
                }
            }
        }
    }

    pub fn generate_moves(&mut self, move_list: &mut MoveList) {
        self.generate_moves_for(self.side, move_list);
    }

    pub fn legal_moves(&mut self) -> MoveList {
        let mut move_list = MoveList::new();
        self.generate_moves(&mut move_list);
        move_list
    }

    /// Whether the side to move has any legal move at all.
    pub fn has_legal_moves(&mut self) -> bool {
        self.has_legal_moves_for(self.side)
    }

    pub fn has_legal_moves_for(&mut self, side: Colour) -> bool {
        Square::all()
            .filter(|&sq| self.is_colour(sq, side))
            .collect::<SquareSet>()
            .into_iter()
            .any(|sq| !self.targets(sq, true).is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jumping_tables() {
        assert_eq!(KNIGHT_ATTACKS[Square::A1].count(), 2);
        assert!(KNIGHT_ATTACKS[Square::A1].contains_square(Square::B3));
        assert!(KNIGHT_ATTACKS[Square::A1].contains_square(Square::C2));
        assert_eq!(KNIGHT_ATTACKS[Square::E4].count(), 8);
        assert_eq!(KING_ATTACKS[Square::H8].count(), 3);
        assert_eq!(KING_ATTACKS[Square::D5].count(), 8);
    }

    #[test]
    fn direction_subsets() {
        for (d_file, d_rank) in BISHOP_DIRECTIONS {
            assert!(d_file != 0 && d_rank != 0);
        }
        for (d_file, d_rank) in ROOK_DIRECTIONS {
            assert!(d_file == 0 || d_rank == 0);
        }
    }

    #[test]
    fn startpos_targets() {
        let mut board = Board::default();
        let e2 = board.targets(Square::E2, true);
        assert_eq!(e2, Square::E3.as_set().add_square(Square::E4));
        let g1 = board.targets(Square::G1, true);
        assert_eq!(g1, Square::F3.as_set().add_square(Square::H3));
        assert!(board.targets(Square::A1, true).is_empty());
        assert!(board.targets(Square::E4, true).is_empty());
        assert_eq!(board.legal_moves().len(), 20);
    }

    #[test]
    fn sliders_stop_at_blockers() {
        let mut board = Board::from_fen("4k3/8/8/8/1p1R2P1/8/8/4K3 w - - 0 1").unwrap();
        let rook = board.targets(Square::D4, false);
        // captures b4, stops before g4
        assert!(rook.contains_square(Square::B4));
        assert!(!rook.contains_square(Square::A4));
        assert!(rook.contains_square(Square::F4));
        assert!(!rook.contains_square(Square::G4));
        assert!(rook.contains_square(Square::D8));
        assert!(rook.contains_square(Square::D1));
        assert_eq!(rook.count(), 11);
    }

    #[test]
    fn sixteen_pieces_can_pass_218_moves() {
        let mut board =
            Board::from_fen("Q4QQ1/3Q4/1Q5Q/4Q2Q/1Q5Q/3Q4/Q5QK/2Q2Q2 w - - 0 1").unwrap();
        assert_eq!(board.legal_moves().len(), 244);
    }

    #[test]
    fn pawns_on_back_rank_have_no_targets() {
        // FEN rejects such pawns, so place them directly
        let mut board = Board::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        board.state.mailbox[Square::A8] = Some(Piece::WP);
        board.state.mailbox[Square::H1] = Some(Piece::BP);
        assert!(board.targets(Square::A8, false).is_empty());
        assert!(board.targets(Square::H1, false).is_empty());
    }

    #[test]
    fn en_passant_target() {
        let mut board =
            Board::from_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3")
                .unwrap();
        let e5 = board.targets(Square::E5, true);
        assert_eq!(e5, Square::E6.as_set().add_square(Square::F6));
    }

    #[test]
    fn sq_attacked_matches_attack_map() {
        let fens = [
            Board::STARTING_FEN,
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
        ];
        for fen in fens {
            let board = Board::from_fen(fen).unwrap();
            for colour in Colour::all() {
                let map = board.attacked_squares(colour);
                for sq in Square::all() {
                    assert_eq!(
                        map.contains_square(sq),
                        board.sq_attacked(sq, colour),
                        "{fen}: {colour} attack on {sq}"
                    );
                    let attackers = board.attackers(sq, colour);
                    assert_eq!(attackers.is_empty(), !board.sq_attacked(sq, colour));
                    for from in attackers {
                        let piece = board.piece_at(from).unwrap();
                        assert!(board.piece_attacks(from, piece).contains_square(sq));
                    }
                }
            }
        }
    }

    #[test]
    fn attackers_of_a_double_check() {
        let board = Board::from_fen("4k3/8/3N4/8/8/8/4Q3/4R1K1 b - - 0 1").unwrap();
        let checkers = board.attackers(Square::E8, Colour::White);
        assert_eq!(checkers, Square::D6.as_set() | Square::E2.as_set());
        // the rook is screened by the queen
        assert!(!checkers.contains_square(Square::E1));
        assert!(board.attackers(Square::E1, Colour::Black).is_empty());
    }

    #[test]
    fn filtered_targets_never_leave_king_in_check() {
        let fens = [
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
            "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
        ];
        for fen in fens {
            let mut board = Board::from_fen(fen).unwrap();
            let us = board.turn();
            for sq in Square::all() {
                for to in board.targets(sq, true) {
                    board.make_move(Move::new(sq, to));
                    assert!(!board.in_check(us), "{fen}: {sq}{to} leaves the king in check");
                    board.unmake_move();
                }
            }
        }
    }

    #[test]
    fn castling_gating() {
        let mut board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let king = board.targets(Square::E1, true);
        assert!(king.contains_square(Square::G1));
        assert!(king.contains_square(Square::C1));

        // rights gone although nothing stands in the way
        let mut board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w kq - 0 1").unwrap();
        let king = board.targets(Square::E1, true);
        assert!(!king.contains_square(Square::G1));
        assert!(!king.contains_square(Square::C1));

        // a king that left and returned cannot castle
        let mut board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        for (from, to) in [
            (Square::E1, Square::E2),
            (Square::E8, Square::E7),
            (Square::E2, Square::E1),
            (Square::E7, Square::E8),
        ] {
            board.make_move(Move::new(from, to));
        }
        assert!(!board.targets(Square::E1, true).contains_square(Square::G1));
        assert!(!board.targets(Square::E8, true).contains_square(Square::C8));

        // f1 is attacked by the rook on f8
        let mut board = Board::from_fen("4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        let king = board.targets(Square::E1, true);
        assert!(!king.contains_square(Square::G1));
        assert!(king.contains_square(Square::C1));

        // b1 may be attacked on the long side, but not d1
        let mut board = Board::from_fen("1r2k3/8/8/8/8/8/8/R3K3 w Q - 0 1").unwrap();
        assert!(board.targets(Square::E1, true).contains_square(Square::C1));
        let mut board = Board::from_fen("3rk3/8/8/8/8/8/8/R3K3 w Q - 0 1").unwrap();
        assert!(!board.targets(Square::E1, true).contains_square(Square::C1));

        // no castling out of check
        let mut board = Board::from_fen("4r1k1/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        let king = board.targets(Square::E1, true);
        assert!(!king.contains_square(Square::G1));
        assert!(!king.contains_square(Square::C1));
    }

    #[test]
    fn promotions_expand() {
        let mut board = Board::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let moves = board.legal_moves();
        let promos = moves.iter().filter(|m| m.is_promo()).count();
        assert_eq!(promos, 4);
        // three king moves plus four promotions
        assert_eq!(moves.len(), 7);
    }

    #[test]
    fn mate_and_stalemate_have_no_moves() {
        let mut mated =
            Board::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
                .unwrap();
        assert!(mated.in_check(Colour::White));
        assert!(!mated.has_legal_moves());
        let mut stalemate = Board::from_fen("7k/8/6Q1/8/8/8/8/K7 b - - 0 1").unwrap();
        assert!(!stalemate.in_check(Colour::Black));
        assert!(!stalemate.has_legal_moves());
        assert!(Board::default().has_legal_moves());
    }
}
