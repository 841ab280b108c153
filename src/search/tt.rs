use crate::eval::{is_mate_score, MATE_SCORE};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    Exact,
    Lower,
    Upper,
}

#[derive(Clone, Copy, Debug)]
pub struct Entry<M> {
    pub key: u64,
    pub depth: u32,
    pub score: i32,
    pub best: Option<M>,
    pub bound: Bound,
    pub gen: u32,
}

const DEFAULT_WAYS: usize = 4;
const DEFAULT_ENTRIES: usize = 1 << 20;

#[derive(Clone, Copy)]
struct Bucket<M> {
    slots: [Option<Entry<M>>; DEFAULT_WAYS],
}

impl<M> Default for Bucket<M> {
    fn default() -> Self { Self { slots: std::array::from_fn(|_| None) } }
}

/// Fixed-capacity, 4-way bucketed cache keyed by position hash.
///
/// Owned by a single alpha-beta searcher; no internal synchronisation.
pub struct TranspositionTable<M> {
    buckets: Vec<Bucket<M>>,
    gen: u32,
}

impl<M: Copy> Default for TranspositionTable<M> {
    fn default() -> Self { Self::with_entries(DEFAULT_ENTRIES) }
}

impl<M: Copy> TranspositionTable<M> {
    pub fn with_entries(cap: usize) -> Self {
        let mut tt = Self { buckets: Vec::new(), gen: 0 };
        tt.set_capacity_entries(cap);
        tt
    }

    pub fn clear(&mut self) {
        for b in &mut self.buckets { *b = Bucket::default(); }
    }

    fn bucket_index(&self, key: u64) -> usize {
        let mixed = key ^ (key >> 32);
        (mixed as usize) % self.buckets.len().max(1)
    }

    pub fn get(&self, key: u64) -> Option<Entry<M>> {
        if self.buckets.is_empty() { return None; }
        let b = &self.buckets[self.bucket_index(key)];
        b.slots.iter().flatten().find(|e| e.key == key).copied()
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(|b| b.slots.iter().filter(|s| s.is_some()).count()).sum()
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn capacity(&self) -> usize { self.buckets.len() * DEFAULT_WAYS }

    pub fn set_capacity_entries(&mut self, cap: usize) {
        let entries = cap.max(DEFAULT_WAYS);
        let buckets = (entries + DEFAULT_WAYS - 1) / DEFAULT_WAYS;
        self.buckets.clear();
        self.buckets.resize_with(buckets, Bucket::default);
    }

    pub fn set_capacity_mb(&mut self, mb: usize) {
        let entry = std::mem::size_of::<Option<Entry<M>>>().max(1);
        self.set_capacity_entries((mb.saturating_mul(1024 * 1024) / entry).max(DEFAULT_WAYS));
    }

    pub fn generation(&self) -> u32 { self.gen }

    pub fn bump_generation(&mut self) { self.gen = self.gen.wrapping_add(1); }

    pub fn put(&mut self, key: u64, depth: u32, score: i32, best: Option<M>, bound: Bound) {
        if self.buckets.is_empty() { return; }
        let gen = self.gen;
        let idx = self.bucket_index(key);
        let bucket = &mut self.buckets[idx];
        let mut e = Entry { key, depth, score, best, bound, gen };
        // Same key: prefer deeper or fresher results, keep an older hint move
        for slot in bucket.slots.iter_mut() {
            if let Some(cur) = slot {
                if cur.key == key {
                    if depth >= cur.depth || cur.gen != gen || bound == Bound::Exact {
                        if e.best.is_none() { e.best = cur.best; }
                        *slot = Some(e);
                    }
                    return;
                }
            }
        }
        if let Some(slot) = bucket.slots.iter_mut().find(|s| s.is_none()) {
            *slot = Some(e);
            return;
        }
        // Evict stale generations first, then the shallowest
        let victim = bucket.slots.iter().enumerate()
            .min_by_key(|(_, s)| s.as_ref().map(|c| (c.gen == gen, c.depth)))
            .map(|(i, _)| i)
            .unwrap_or(0);
        bucket.slots[victim] = Some(e);
    }
}

/// Converts a search score to its stored form: mate distances relative to the node, not the root.
pub fn score_to_tt(score: i32, ply: usize) -> i32 {
    if !is_mate_score(score) { return score; }
    if score > 0 { score + ply as i32 } else { score - ply as i32 }
}

pub fn score_from_tt(score: i32, ply: usize) -> i32 {
    if !is_mate_score(score) { return score; }
    let s = if score > 0 { score - ply as i32 } else { score + ply as i32 };
    s.clamp(-MATE_SCORE, MATE_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mate_scores_roundtrip_through_ply() {
        let at_root = MATE_SCORE - 7;
        let stored = score_to_tt(at_root, 4);
        assert_eq!(stored, MATE_SCORE - 3);
        assert_eq!(score_from_tt(stored, 4), at_root);
        assert_eq!(score_to_tt(42, 9), 42);
    }

    #[test]
    fn shallower_same_generation_does_not_replace() {
        let mut tt: TranspositionTable<u16> = TranspositionTable::with_entries(16);
        tt.put(7, 5, 10, Some(1), Bound::Lower);
        tt.put(7, 2, 20, None, Bound::Upper);
        let e = tt.get(7).unwrap();
        assert_eq!((e.depth, e.score, e.best), (5, 10, Some(1)));
        tt.bump_generation();
        tt.put(7, 2, 30, None, Bound::Upper);
        let e = tt.get(7).unwrap();
        assert_eq!((e.depth, e.score, e.best), (2, 30, Some(1)));
    }
}
