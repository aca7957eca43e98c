use std::cmp::Ordering;

/// A score attached to an index position.
///
/// Ordering is "better first": higher score wins, and on equal scores the
/// lower position wins. A max-heap of `ScoredItem` therefore pops the best
/// candidate; wrap in `Reverse` to keep the worst of the current top-k on
/// top for eviction.
#[derive(Debug, Clone, Copy)]
pub struct ScoredItem {
    pub score: f32,
    pub position: u32,
}

impl PartialEq for ScoredItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScoredItem {}

impl PartialOrd for ScoredItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // Scores are finite since inputs are normalized and checked. NaN
        // would compare Equal and fall through to the position tie-break.
        self.score
            .partial_cmp(&other.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.position.cmp(&self.position))
    }
}
