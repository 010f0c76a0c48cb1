pub mod movegen;
mod san;
pub mod validation;

use std::fmt::{self, Debug, Display, Formatter};

pub use san::SanThunk;

use crate::{
    chess::{
        chessmove::Move,
        fen::Fen,
        piece::{Colour, Piece, PieceType},
        types::{CastlingRights, CheckState, File, Rank, Square, State},
    },
    errors::{FenParseError, MoveParseError},
};

#[derive(PartialEq, Eq, Clone)]
pub struct Board {
    /// Copyable state for the board.
    pub(crate) state: State,
    /// The side to move.
    side: Colour,
    /// The number of half moves made since the start of the game.
    ply: usize,

    history: Vec<State>,
}

impl Debug for Board {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Board")
            .field("piece_array", &self.state.mailbox)
            .field("side", &self.side)
            .field("ep_sq", &self.state.ep_square)
            .field("fifty_move_counter", &self.state.fifty_move_counter)
            .field("ply", &self.ply)
            .field("castle_perm", &self.state.castle_perm)
            .finish_non_exhaustive()
    }
}

impl Board {
    pub const STARTING_FEN: &'static str =
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    pub fn empty() -> Self {
        Self {
            state: State::default(),
            side: Colour::White,
            ply: 0,
            history: Vec::new(),
        }
    }

    pub const fn ep_sq(&self) -> Option<Square> {
        self.state.ep_square
    }

    pub const fn ply(&self) -> usize {
        self.ply
    }

    pub const fn turn(&self) -> Colour {
        self.side
    }

    pub const fn castling_rights(&self) -> CastlingRights {
        self.state.castle_perm
    }

    pub const fn halfmove_clock(&self) -> u64 {
        self.state.fifty_move_counter
    }

    pub const fn full_move_number(&self) -> usize {
        self.ply / 2 + 1
    }

    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.state.mailbox[sq]
    }

    /// The piece on the given zero-based coordinates, or `None` for an empty
    /// square or coordinates off the board.
    pub fn piece_at_coords(&self, file: u8, rank: u8) -> Option<Piece> {
        Square::from_coords(file, rank).and_then(|sq| self.piece_at(sq))
    }

    /// The square of `colour`'s king, if it has one.
    pub fn king_sq(&self, colour: Colour) -> Option<Square> {
        let king = Some(Piece::new(colour, PieceType::King));
        Square::all().find(|&sq| self.state.mailbox[sq] == king)
    }

    pub fn set_from_fen(&mut self, fen: &Fen) {
        self.history.clear();

        self.state = State {
            mailbox: fen.board,
            castle_perm: fen.castling,
            ep_square: fen.ep,
            fifty_move_counter: fen.halfmove,
        };
        self.side = fen.turn;
        self.ply = (fen.fullmove.get() - 1) * 2;
        if self.side == Colour::Black {
            self.ply += 1;
        }
    }

    pub fn set_startpos(&mut self) {
        let fen = Fen::parse(Self::STARTING_FEN).expect("STARTING_FEN is broken");
        self.set_from_fen(&fen);
    }

    /// Builds a board from a FEN string, defaulting any field after the piece placement
    /// that is absent or unreadable.
    pub fn from_fen(fen: &str) -> Result<Self, FenParseError> {
        let parsed = Fen::parse_relaxed(fen)?;
        let mut out = Self::empty();
        out.set_from_fen(&parsed);
        Ok(out)
    }

    /// Encodes the position as FEN.
    pub fn fen(&self) -> String {
        self.to_string()
    }

    /// Determines whether `colour`'s king is attacked. A side without a king is never in check.
    pub fn in_check(&self, colour: Colour) -> bool {
        self.king_sq(colour).is_some_and(|sq| self.sq_attacked(sq, !colour))
    }

    /// Determines whether `m` can be made without leaving the mover's king attacked.
    ///
    /// The source square must hold a piece and the destination must not hold one of the
    /// same colour; beyond that, movement rules are not checked here.
    pub fn verify_move(&mut self, m: Move) -> bool {
        let Some(piece) = self.state.mailbox[m.from()] else {
            return false;
        };
        if self.state.mailbox[m.to()].is_some_and(|p| p.colour() == piece.colour()) {
            return false;
        }
        self.make_move(m);
        let legal = !self.in_check(piece.colour());
        self.unmake_move();
        legal
    }

    /// Gets the piece that will be captured by the given move.
    pub fn captured_piece(&self, m: Move) -> Option<Piece> {
        if self.is_ep(m)
            && let Some(pawn) = self.state.mailbox[m.from()]
        {
            return m.to().pawn_push(!pawn.colour()).and_then(|sq| self.state.mailbox[sq]);
        }
        self.state.mailbox[m.to()]
    }

    /// Determines whether this move would be a capture in the current position.
    pub fn is_capture(&self, m: Move) -> bool {
        self.captured_piece(m).is_some()
    }

    /// Determines whether this move is a pawn taking en passant in the current position.
    pub fn is_ep(&self, m: Move) -> bool {
        self.state.mailbox[m.from()].is_some_and(|p| p.piece_type() == PieceType::Pawn)
            && Some(m.to()) == self.state.ep_square
            && m.from().file() != m.to().file()
            && self.state.mailbox[m.to()].is_none()
    }

    /// Determines whether this move is a king castling in the current position.
    pub fn is_castle(&self, m: Move) -> bool {
        self.state.mailbox[m.from()].is_some_and(|p| p.piece_type() == PieceType::King)
            && m.from().file().abs_diff(m.to().file()) == 2
    }

    /// Applies a move to the board.
    ///
    /// No legality checks are made; the move must come from the legal move generator,
    /// or have passed [`Board::verify_move`]. Castling is recognised as a king moving
    /// two files, and en passant as a pawn moving onto the en passant square. The
    /// mover is the colour of the piece on the source square, whichever side is to move.
    pub fn make_move(&mut self, m: Move) {
        debug_assert!(self.state.mailbox[m.from()].is_some(), "no piece to move for {m}");

        self.history.push(self.state);

        let from = m.from();
        let to = m.to();
        let captured = self.state.mailbox[to];

        if let Some(piece) = self.state.mailbox[from].take() {
            let side = piece.colour();
            let is_pawn = piece.piece_type() == PieceType::Pawn;
            let placed = m.promotion_type().map_or(piece, |promo| Piece::new(side, promo));
            self.state.mailbox[to] = Some(placed);

            if piece.piece_type() == PieceType::King && from.file().abs_diff(to.file()) == 2 {
                let (corner, step) = if to.file() > from.file() { (File::H, -1) } else { (File::A, 1) };
                let rook_from = Square::from_rank_file(from.rank(), corner);
                if let Some(rook_to) = to.offset(step, 0)
                    && let Some(rook) = self.state.mailbox[rook_from].take()
                {
                    self.state.mailbox[rook_to] = Some(rook);
                }
            }

            if is_pawn
                && captured.is_none()
                && Some(to) == self.state.ep_square
                && from.file() != to.file()
                && let Some(victim) = to.pawn_push(!side)
            {
                self.state.mailbox[victim] = None;
            }

            self.state.ep_square = None;
            if is_pawn && from.rank().abs_diff(to.rank()) == 2 {
                self.state.ep_square = from.pawn_push(side);
            }

            let rights = &mut self.state.castle_perm;
            if piece.piece_type() == PieceType::King {
                rights.clear(side);
            }
            rights.remove_corner(from);
            rights.remove_corner(to);

            if is_pawn || captured.is_some() {
                self.state.fifty_move_counter = 0;
            } else {
                self.state.fifty_move_counter = self.state.fifty_move_counter.saturating_add(1);
            }
        }

        self.side = !self.side;
        self.ply += 1;
    }

    /// Restores the position from before the last [`Board::make_move`].
    pub fn unmake_move(&mut self) {
        debug_assert!(!self.history.is_empty(), "No move to unmake!");
        let Some(state) = self.history.pop() else {
            return;
        };
        self.state = state;
        self.side = !self.side;
        self.ply -= 1;
    }

    /// Parses a move in the UCI format and returns a move or a reason why it couldn't be parsed.
    /// Only legal moves are accepted.
    pub fn parse_uci(&mut self, uci: &str) -> Result<Move, MoveParseError> {
        use MoveParseError::{
            IllegalMove, InvalidFromSquareFile, InvalidFromSquareRank, InvalidLength,
            InvalidPromotionPiece, InvalidToSquareFile, InvalidToSquareRank,
        };
        let bytes = uci.as_bytes();
        if !(4..=5).contains(&bytes.len()) {
            return Err(InvalidLength(bytes.len()));
        }
        let from_file = File::from_char(bytes[0]).ok_or(InvalidFromSquareFile(bytes[0] as char))?;
        let from_rank = Rank::from_char(bytes[1]).ok_or(InvalidFromSquareRank(bytes[1] as char))?;
        let to_file = File::from_char(bytes[2]).ok_or(InvalidToSquareFile(bytes[2] as char))?;
        let to_rank = Rank::from_char(bytes[3]).ok_or(InvalidToSquareRank(bytes[3] as char))?;
        let promo = match bytes.get(4) {
            None => None,
            Some(&c) => Some(
                PieceType::PROMOTIONS
                    .into_iter()
                    .find(|pt| pt.promo_char() == Some(c as char))
                    .ok_or(InvalidPromotionPiece(c as char))?,
            ),
        };

        let from = Square::from_rank_file(from_rank, from_file);
        let to = Square::from_rank_file(to_rank, to_file);

        self.legal_moves()
            .iter()
            .copied()
            .find(|m| m.from() == from && m.to() == to && m.promotion_type() == promo)
            .ok_or_else(|| IllegalMove(uci.to_string()))
    }

    /// Whether making `m` checks or mates the opponent of the moving piece.
    pub fn gives(&mut self, m: Move) -> CheckState {
        let Some(mover) = self.state.mailbox[m.from()] else {
            return CheckState::None;
        };
        let them = !mover.colour();
        self.make_move(m);
        let state = if !self.in_check(them) {
            CheckState::None
        } else if self.has_legal_moves_for(them) {
            CheckState::Check
        } else {
            CheckState::Checkmate
        };
        self.unmake_move();
        state
    }
}

impl Default for Board {
    fn default() -> Self {
        let mut out = Self::empty();
        out.set_startpos();
        out
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        let mut counter = 0;
        for rank in Rank::all().rev() {
            for file in File::all() {
                let sq = Square::from_rank_file(rank, file);
                let piece = self.state.mailbox[sq];
                if let Some(piece) = piece {
                    if counter != 0 {
                        write!(f, "{counter}")?;
                    }
                    counter = 0;
                    write!(f, "{piece}")?;
                } else {
                    counter += 1;
                }
            }
            if counter != 0 {
                write!(f, "{counter}")?;
            }
            counter = 0;
            if rank != Rank::One {
                write!(f, "/")?;
            }
        }

        match self.side {
            Colour::White => write!(f, " w")?,
            Colour::Black => write!(f, " b")?,
        }
        write!(f, " {}", self.state.castle_perm)?;
        if let Some(ep_sq) = self.state.ep_square {
            write!(f, " {ep_sq}")?;
        } else {
            write!(f, " -")?;
        }
        write!(f, " {}", self.state.fifty_move_counter)?;
        write!(f, " {}", self.full_move_number())?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fen_round_trip() {
        use std::{
            fs::File,
            io::{BufRead, BufReader},
        };

        let fens = BufReader::new(File::open("epds/perftsuite.epd").unwrap())
            .lines()
            .map(|l| l.unwrap().split_once(';').unwrap().0.trim().to_owned())
            .collect::<Vec<_>>();
        assert!(!fens.is_empty());
        for fen in fens {
            let board = Board::from_fen(&fen).expect("from_fen failed.");
            let fen_2 = board.to_string();
            assert_eq!(fen, fen_2);
            let again = Board::from_fen(&fen_2).unwrap();
            assert_eq!(board, again);
        }
    }

    #[test]
    fn truncated_fen_defaults() {
        let board = Board::from_fen("4k3/8/8/8/8/8/8/4K3").unwrap();
        assert_eq!(board.turn(), Colour::White);
        assert_eq!(board.castling_rights(), CastlingRights::NONE);
        assert_eq!(board.ep_sq(), None);
        assert_eq!(board.halfmove_clock(), 0);
        assert_eq!(board.full_move_number(), 1);
        assert_eq!(board.fen(), "4k3/8/8/8/8/8/8/4K3 w - - 0 1");

        let board = Board::from_fen("4k3/8/8/8/8/8/8/4K3 b").unwrap();
        assert_eq!(board.turn(), Colour::Black);
        assert_eq!(board.fen(), "4k3/8/8/8/8/8/8/4K3 b - - 0 1");
    }

    #[test]
    fn accessors() {
        let board = Board::default();
        assert_eq!(board.piece_at(Square::E1), Some(Piece::WK));
        assert_eq!(board.piece_at_coords(3, 7), Some(Piece::BQ));
        assert_eq!(board.piece_at_coords(4, 4), None);
        assert_eq!(board.piece_at_coords(8, 0), None);
        assert_eq!(board.piece_at_coords(0, 200), None);
        assert_eq!(board.king_sq(Colour::White), Some(Square::E1));
        assert_eq!(board.king_sq(Colour::Black), Some(Square::E8));
        assert_eq!(board.castling_rights(), CastlingRights::ALL);
        assert_eq!(board.fen(), Board::STARTING_FEN);
    }

    #[test]
    fn make_unmake_restores_exactly() {
        let mut board = Board::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        let original = board.clone();
        for m in board.legal_moves() {
            board.make_move(m);
            board.unmake_move();
            assert_eq!(board, original, "make/unmake of {m} did not restore the board");
        }
    }

    #[test]
    fn ep_lifecycle() {
        let mut board = Board::default();
        board.make_move(Move::new(Square::E2, Square::E4));
        assert_eq!(board.ep_sq(), Some(Square::E3));
        assert_eq!(board.halfmove_clock(), 0);
        board.make_move(Move::new(Square::G8, Square::F6));
        assert_eq!(board.ep_sq(), None);
        assert_eq!(board.halfmove_clock(), 1);
        board.make_move(Move::new(Square::E4, Square::E5));
        assert_eq!(board.ep_sq(), None);
        board.make_move(Move::new(Square::D7, Square::D5));
        assert_eq!(board.ep_sq(), Some(Square::D6));
        assert_eq!(board.full_move_number(), 3);

        // take en passant: the d5 pawn disappears.
        board.make_move(Move::new(Square::E5, Square::D6));
        assert_eq!(board.piece_at(Square::D6), Some(Piece::WP));
        assert_eq!(board.piece_at(Square::D5), None);
        assert_eq!(board.ep_sq(), None);
        assert_eq!(board.fen(), "rnbqkb1r/ppp1pppp/3P1n2/8/8/8/PPPP1PPP/RNBQKBNR b KQkq - 0 3");
    }

    #[test]
    fn castling_moves_the_rook() {
        let mut board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        board.make_move(Move::new(Square::E1, Square::G1));
        assert_eq!(board.piece_at(Square::G1), Some(Piece::WK));
        assert_eq!(board.piece_at(Square::F1), Some(Piece::WR));
        assert_eq!(board.piece_at(Square::H1), None);
        assert_eq!(board.castling_rights(), CastlingRights::new(false, false, true, true));
        board.make_move(Move::new(Square::E8, Square::C8));
        assert_eq!(board.piece_at(Square::C8), Some(Piece::BK));
        assert_eq!(board.piece_at(Square::D8), Some(Piece::BR));
        assert_eq!(board.piece_at(Square::A8), None);
        assert_eq!(board.fen(), "2kr3r/8/8/8/8/8/8/R4RK1 w - - 2 2");
    }

    #[test]
    fn castling_rights_are_cleared_for_good() {
        let mut board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        // rook leaves and comes back
        board.make_move(Move::new(Square::H1, Square::H2));
        board.make_move(Move::new(Square::A8, Square::A7));
        board.make_move(Move::new(Square::H2, Square::H1));
        board.make_move(Move::new(Square::A7, Square::A8));
        assert_eq!(board.castling_rights(), CastlingRights::new(false, true, true, false));

        // king steps out and back
        board.make_move(Move::new(Square::E1, Square::D1));
        board.make_move(Move::new(Square::E8, Square::E7));
        board.make_move(Move::new(Square::D1, Square::E1));
        board.make_move(Move::new(Square::E7, Square::E8));
        assert!(board.castling_rights().is_empty());
    }

    #[test]
    fn rook_capture_clears_right() {
        let mut board = Board::from_fen("r3k2r/8/8/8/8/8/6b1/R3K2R b KQkq - 0 1").unwrap();
        board.make_move(Move::new(Square::G2, Square::H1));
        assert_eq!(board.castling_rights(), CastlingRights::new(false, true, true, true));
        assert_eq!(board.halfmove_clock(), 0);
    }

    #[test]
    fn promotion_substitutes_piece() {
        let mut board = Board::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let m = Move::new_with_promo(Square::A7, Square::A8, PieceType::Knight).unwrap();
        board.make_move(m);
        assert_eq!(board.piece_at(Square::A8), Some(Piece::WN));
        assert_eq!(board.piece_at(Square::A7), None);
        board.unmake_move();
        assert_eq!(board.piece_at(Square::A7), Some(Piece::WP));
    }

    #[test]
    fn off_turn_moves_use_the_piece_colour() {
        // white to move, but black pieces are moved
        let mut board = Board::from_fen("r3k3/8/8/8/8/8/p7/4K3 w q - 0 1").unwrap();
        let m = Move::new_with_promo(Square::A2, Square::A1, PieceType::Queen).unwrap();
        board.make_move(m);
        assert_eq!(board.piece_at(Square::A1), Some(Piece::BQ));
        board.unmake_move();
        board.make_move(Move::new(Square::E8, Square::D8));
        assert_eq!(board.castling_rights(), CastlingRights::NONE);
        board.unmake_move();

        let mut board = Board::from_fen("4k3/3p4/8/4P3/8/8/8/4K3 w - - 0 1").unwrap();
        board.make_move(Move::new(Square::D7, Square::D5));
        assert_eq!(board.ep_sq(), Some(Square::D6));
        let ep = Move::new(Square::E5, Square::D6);
        assert!(board.is_ep(ep));
        assert_eq!(board.captured_piece(ep), Some(Piece::BP));
        board.make_move(ep);
        assert_eq!(board.piece_at(Square::D5), None);
        assert_eq!(board.piece_at(Square::D6), Some(Piece::WP));
    }

    #[test]
    fn off_turn_check_states() {
        // black to move, but the white rook mates
        let mut board = Board::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 b - - 0 1").unwrap();
        assert_eq!(board.gives(Move::new(Square::A1, Square::A8)), CheckState::Checkmate);
        assert_eq!(board.gives(Move::new(Square::G1, Square::G2)), CheckState::None);
    }

    #[test]
    fn huge_clocks_do_not_panic() {
        let board = Board::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 18446744073709551615").unwrap();
        assert_eq!(board.full_move_number(), 1);
        let fen = format!("4k3/8/8/8/8/8/8/4K3 b - - 70000 {}", Fen::MAX_FULL_MOVE);
        let mut board = Board::from_fen(&fen).unwrap();
        assert_eq!(board.full_move_number(), Fen::MAX_FULL_MOVE);
        assert_eq!(board.halfmove_clock(), 70_000);
        assert_eq!(board.fen(), fen);
        board.make_move(Move::new(Square::E8, Square::D8));
        assert_eq!(board.full_move_number(), Fen::MAX_FULL_MOVE + 1);
        assert_eq!(board.halfmove_clock(), 70_001);
    }

    #[test]
    fn check_detection() {
        let board = Board::from_fen("4k3/8/8/8/8/8/8/4K2r w - - 0 1").unwrap();
        assert!(board.in_check(Colour::White));
        assert!(!board.in_check(Colour::Black));
        // a side with no king is never in check
        let kingless = Board::from_fen("4k3/8/8/8/8/8/8/7r w - - 0 1").unwrap();
        assert!(!kingless.in_check(Colour::White));
    }

    #[test]
    fn verify_move_rejects_self_check() {
        // the e2 knight is pinned against the king
        let mut board = Board::from_fen("4r1k1/8/8/8/8/8/4N3/4K3 w - - 0 1").unwrap();
        assert!(!board.verify_move(Move::new(Square::E2, Square::C3)));
        assert!(board.verify_move(Move::new(Square::E1, Square::D1)));
        // friendly destination or empty source
        assert!(!board.verify_move(Move::new(Square::E1, Square::E2)));
        assert!(!board.verify_move(Move::new(Square::A1, Square::A2)));
    }

    #[test]
    fn uci_parsing() {
        let mut board = Board::default();
        assert_eq!(board.parse_uci("e2e4"), Ok(Move::new(Square::E2, Square::E4)));
        assert_eq!(board.parse_uci("e2e5"), Err(MoveParseError::IllegalMove("e2e5".into())));
        assert_eq!(board.parse_uci("e2"), Err(MoveParseError::InvalidLength(2)));
        assert_eq!(board.parse_uci("z2e4"), Err(MoveParseError::InvalidFromSquareFile('z')));
        let mut board = Board::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
        assert_eq!(
            board.parse_uci("a7a8r"),
            Ok(Move::new_with_promo(Square::A7, Square::A8, PieceType::Rook).unwrap())
        );
        assert_eq!(board.parse_uci("a7a8k"), Err(MoveParseError::InvalidPromotionPiece('k')));
        assert_eq!(board.parse_uci("a7a8"), Err(MoveParseError::IllegalMove("a7a8".into())));
    }

    #[test]
    fn check_states() {
        // fool's mate
        let mut board =
            Board::from_fen("rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2")
                .unwrap();
        assert_eq!(board.gives(Move::new(Square::D8, Square::H4)), CheckState::Checkmate);
        assert_eq!(board.gives(Move::new(Square::B8, Square::C6)), CheckState::None);
        let mut board = Board::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        assert_eq!(board.gives(Move::new(Square::A1, Square::A8)), CheckState::Check);
    }
}
