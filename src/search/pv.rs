use crate::eval::MAX_PLY;

/// Triangular principal-variation table.
///
/// Row `ply` holds the best line found from that ply; writing a new best move
/// at `ply` copies the child's row behind it, which truncates any stale tail.
pub struct PvTable<M> {
    lines: Vec<Vec<M>>,
}

impl<M: Copy> Default for PvTable<M> {
    fn default() -> Self {
        Self { lines: (0..=MAX_PLY).map(|_| Vec::with_capacity(MAX_PLY)).collect() }
    }
}

impl<M: Copy> PvTable<M> {
    pub fn clear(&mut self, ply: usize) {
        if let Some(line) = self.lines.get_mut(ply) { line.clear(); }
    }

    pub fn update(&mut self, ply: usize, mv: M) {
        if ply >= MAX_PLY { return; }
        let (head, tail) = self.lines.split_at_mut(ply + 1);
        let line = &mut head[ply];
        line.clear();
        line.push(mv);
        line.extend_from_slice(&tail[0]);
    }

    pub fn line(&self, ply: usize) -> &[M] {
        self.lines.get(ply).map(Vec::as_slice).unwrap_or(&[])
    }
}
