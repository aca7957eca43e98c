pub mod distance;
pub mod pqueue;
pub mod flat;

pub use flat::{SearchResult, VectorIndex};
