use crate::{
    chess::{
        board::Board,
        piece::{Colour, Piece, PieceType},
        types::{Rank, Square},
    },
    errors::PositionValidityError,
};

impl Board {
    /// Checks the board's internal consistency.
    pub fn check_validity(&self) -> Result<(), PositionValidityError> {
        for colour in Colour::all() {
            let king = Some(Piece::new(colour, PieceType::King));
            let kings = Square::all().filter(|&sq| self.state.mailbox[sq] == king).count();
            if kings > 1 {
                return Err(format!("{colour} king count is corrupt: expected at most 1, got {kings}"));
            }
        }

        if let Some(ep_sq) = self.state.ep_square {
            let expected = match self.side {
                Colour::White => Rank::Six,
                Colour::Black => Rank::Three,
            };
            if ep_sq.rank() != expected {
                return Err(format!(
                    "en passant square is corrupt: expected a square on rank {} with {} to move, got {ep_sq}",
                    expected.char(),
                    self.side,
                ));
            }
        }

        let ply_parity = if self.ply % 2 == 0 { Colour::White } else { Colour::Black };
        if ply_parity != self.side {
            return Err(format!("side is corrupt: ply {} but {} to move", self.ply, self.side));
        }

        Ok(())
    }
}
