use std::{
    fs::File,
    io::{BufRead, BufReader},
    ops::AddAssign,
    path::Path,
};

use anyhow::{Context, bail};

use crate::chess::{
    board::{Board, movegen::MoveList},
    chessmove::Move,
    piece::Colour,
    squareset::SquareSet,
};

/// Counts the move paths of length `depth` from `pos`, with `colour` moving first.
pub fn count_positions(pos: &mut Board, colour: Colour, depth: usize) -> u64 {
    debug_assert!(
        colour != pos.turn() || pos.check_validity().is_ok(),
        "invalid board: {pos:?}"
    );

    if depth == 0 {
        return 1;
    }

    let mut ml = MoveList::new();
    pos.generate_moves_for(colour, &mut ml);

    if depth == 1 {
        return ml.len() as u64;
    }

    let mut count = 0;
    for &m in ml.iter() {
        pos.make_move(m);
        count += count_positions(pos, !colour, depth - 1);
        pos.unmake_move();
    }

    count
}

pub fn perft(pos: &mut Board, depth: usize) -> u64 {
    count_positions(pos, pos.turn(), depth)
}

/// Perft split by root move.
pub fn divide(pos: &mut Board, depth: usize) -> Vec<(Move, u64)> {
    if depth == 0 {
        return Vec::new();
    }
    pos.legal_moves()
        .into_iter()
        .map(|m| {
            pos.make_move(m);
            let nodes = perft(pos, depth - 1);
            pos.unmake_move();
            (m, nodes)
        })
        .collect()
}

/// Tallies of the moves made at the last ply of a perft.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerftStats {
    pub nodes: u64,
    pub captures: u64,
    pub en_passants: u64,
    pub castles: u64,
    pub promotions: u64,
    pub checks: u64,
    /// Checks given by a piece other than the one that moved.
    pub discovery_checks: u64,
    pub double_checks: u64,
    pub checkmates: u64,
}

impl AddAssign for PerftStats {
    fn add_assign(&mut self, rhs: Self) {
        self.nodes += rhs.nodes;
        self.captures += rhs.captures;
        self.en_passants += rhs.en_passants;
        self.castles += rhs.castles;
        self.promotions += rhs.promotions;
        self.checks += rhs.checks;
        self.discovery_checks += rhs.discovery_checks;
        self.double_checks += rhs.double_checks;
        self.checkmates += rhs.checkmates;
    }
}

impl std::fmt::Display for PerftStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "nodes:       {}", self.nodes)?;
        writeln!(f, "captures:    {}", self.captures)?;
        writeln!(f, "en passants: {}", self.en_passants)?;
        writeln!(f, "castles:     {}", self.castles)?;
        writeln!(f, "promotions:  {}", self.promotions)?;
        writeln!(f, "checks:      {}", self.checks)?;
        writeln!(f, "discoveries: {}", self.discovery_checks)?;
        writeln!(f, "doubles:     {}", self.double_checks)?;
        write!(f, "checkmates:  {}", self.checkmates)
    }
}

pub fn perft_stats(pos: &mut Board, depth: usize) -> PerftStats {
    if depth == 0 {
        return PerftStats { nodes: 1, ..PerftStats::default() };
    }

    let mut stats = PerftStats::default();
    for m in pos.legal_moves() {
        if depth > 1 {
            pos.make_move(m);
            stats += perft_stats(pos, depth - 1);
            pos.unmake_move();
            continue;
        }

        stats.nodes += 1;
        stats.captures += u64::from(pos.is_capture(m));
        stats.en_passants += u64::from(pos.is_ep(m));
        stats.castles += u64::from(pos.is_castle(m));
        stats.promotions += u64::from(m.is_promo());
        tally_checks(pos, m, &mut stats);
    }

    stats
}

fn tally_checks(pos: &mut Board, m: Move, stats: &mut PerftStats) {
    let Some(mover) = pos.piece_at(m.from()).map(|p| p.colour()) else {
        return;
    };
    // a castling rook counts as moved
    let mut moved = m.to().as_set();
    if pos.is_castle(m)
        && let Some(rook_to) = m.to().offset(if m.to() > m.from() { -1 } else { 1 }, 0)
    {
        moved |= rook_to.as_set();
    }

    pos.make_move(m);
    let them = !mover;
    let checkers = pos.king_sq(them).map_or(SquareSet::EMPTY, |king| pos.attackers(king, mover));
    if !checkers.is_empty() {
        stats.checks += 1;
        stats.discovery_checks += u64::from(!(checkers - moved).is_empty());
        stats.double_checks += u64::from(checkers.count() > 1);
        stats.checkmates += u64::from(!pos.has_legal_moves_for(them));
    }
    pos.unmake_move();
}

/// Runs every `<fen> ;D<depth> <nodes> ...` line of an EPD file, skipping the
/// remaining depths of a line once the expected count exceeds `node_limit`.
///
/// Returns the number of depths checked.
pub fn run_suite(path: &Path, node_limit: u64) -> anyhow::Result<usize> {
    log::info!("running perft on {}", path.display());
    let f = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut checked = 0;
    for (line_no, line) in BufReader::new(f).lines().enumerate() {
        let line = line.with_context(|| format!("failed to read {}", path.display()))?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split(';');
        let fen = parts.next().unwrap_or_default().trim();
        let mut pos = Board::from_fen(fen)
            .with_context(|| format!("line {}: bad FEN {fen:?}", line_no + 1))?;
        for depth_part in parts {
            let depth_part = depth_part.trim();
            let (d, nodes) = depth_part
                .split_once(' ')
                .with_context(|| format!("line {}: malformed entry {depth_part:?}", line_no + 1))?;
            let depth: usize = d
                .strip_prefix('D')
                .and_then(|d| d.parse().ok())
                .with_context(|| format!("line {}: malformed depth {d:?}", line_no + 1))?;
            let nodes: u64 = nodes
                .trim()
                .parse()
                .with_context(|| format!("line {}: malformed count {nodes:?}", line_no + 1))?;
            if nodes > node_limit {
                log::info!("skipping {fen} from depth {depth}: {nodes} nodes is over the limit");
                break;
            }
            let perft_nodes = perft(&mut pos, depth);
            if perft_nodes != nodes {
                bail!("perft failed for {fen} at depth {depth}: expected {nodes}, got {perft_nodes}");
            }
            log::info!("PASS: fen {fen}, depth {depth}");
            checked += 1;
        }
    }
    Ok(checked)
}
