use crate::board::Position;

// Make/unmake perft over the board abstraction
pub fn perft<P: Position>(pos: &mut P, depth: u32) -> u64 {
    if depth == 0 { return 1; }
    let mut moves = Vec::with_capacity(64);
    pos.legal_moves(&mut moves);
    if depth == 1 { return moves.len() as u64; }
    let mut nodes = 0u64;
    for mv in moves {
        if !pos.apply_move(mv) { continue; }
        nodes += perft(pos, depth - 1);
        pos.undo_move();
    }
    nodes
}
