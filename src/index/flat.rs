//! Flat Vector Index - exact nearest neighbor search by inner product
//!
//! Every stored row is L2-normalized at build time, so the inner product
//! against a normalized query is the cosine similarity.
//!
//! # Layout
//! Rows live in one contiguous `Vec<f32>` (row-major, `dimension` floats per
//! row). Row `i` belongs to the document with id `i`.
//!
//! # Performance Characteristics
//! - Build: O(N * D)
//! - Search: O(N * D + N log k)
//! - Memory: O(N * D)

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use super::distance::{clamp_score, dot, normalize};
use super::pqueue::ScoredItem;
use crate::error::{Result, RetrievalError};

/// A single ranked hit. `document_id` equals the row position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub document_id: u32,
    pub score: f32,
}

/// Brute-force index over normalized embeddings.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    dimension: Option<usize>,
    data: Vec<f32>,
    len: usize,
}

impl VectorIndex {
    /// Build from raw (unnormalized) embeddings, in insertion order.
    ///
    /// All rows must share one length. Any zero-norm or non-finite row
    /// rejects the whole build.
    pub fn build(vectors: Vec<Vec<f32>>) -> Result<Self> {
        let mut index = VectorIndex::default();
        index.append(vectors)?;
        Ok(index)
    }

    /// Build from rows that are already unit length (e.g. copied out of
    /// another index). Rows are still dimension-checked.
    pub(crate) fn from_normalized_rows<'a, I>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a [f32]>,
    {
        let mut index = VectorIndex::default();
        for row in rows {
            index.push_row(row)?;
        }
        Ok(index)
    }

    /// Normalize and append raw rows. On error `self` may hold a prefix of
    /// the input, so callers only ever append to an index they own and
    /// discard on failure.
    pub(crate) fn append(&mut self, vectors: Vec<Vec<f32>>) -> Result<()> {
        let base = self.len;
        let expected = match (self.dimension, vectors.first()) {
            (Some(dim), _) => dim,
            (None, Some(first)) => first.len(),
            (None, None) => return Ok(()),
        };

        // Shape first, so a ragged batch reports the mismatch even when an
        // earlier row is also degenerate.
        if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
            return Err(RetrievalError::DimensionMismatch {
                expected,
                got: bad.len(),
            });
        }
        self.data.reserve(vectors.len() * expected);

        for (offset, raw) in vectors.into_iter().enumerate() {
            let position = base + offset;
            let unit = normalize(&raw).map_err(|_| RetrievalError::DegenerateVector {
                position: Some(position),
            })?;
            self.push_row(&unit)?;
        }
        Ok(())
    }

    fn push_row(&mut self, row: &[f32]) -> Result<()> {
        match self.dimension {
            Some(dim) if row.len() != dim => {
                return Err(RetrievalError::DimensionMismatch {
                    expected: dim,
                    got: row.len(),
                });
            }
            Some(_) => {}
            None => {
                if row.is_empty() {
                    return Err(RetrievalError::DegenerateVector {
                        position: Some(self.len),
                    });
                }
                self.dimension = Some(row.len());
            }
        }
        self.data.extend_from_slice(row);
        self.len += 1;
        Ok(())
    }

    /// Top-k by cosine similarity. `query` must already be normalized.
    ///
    /// Results are sorted by descending score, ties by ascending id. An
    /// empty index yields an empty list rather than an error.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        let dim = match self.dimension {
            Some(dim) => dim,
            None => return Ok(Vec::new()),
        };
        if query.len() != dim {
            return Err(RetrievalError::DimensionMismatch {
                expected: dim,
                got: query.len(),
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let k = k.min(self.len);
        // Min-heap of the current best k; its top is the next to evict.
        let mut heap: BinaryHeap<Reverse<ScoredItem>> = BinaryHeap::with_capacity(k + 1);

        for (position, row) in self.data.chunks_exact(dim).enumerate() {
            let candidate = ScoredItem {
                score: clamp_score(dot(query, row)),
                position: position as u32,
            };

            if heap.len() < k {
                heap.push(Reverse(candidate));
            } else if let Some(Reverse(worst)) = heap.peek() {
                if candidate > *worst {
                    heap.pop();
                    heap.push(Reverse(candidate));
                }
            }
        }

        // into_sorted_vec is ascending in Reverse order, i.e. best first.
        Ok(heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(item)| SearchResult {
                document_id: item.position,
                score: item.score,
            })
            .collect())
    }

    /// Number of stored vectors.
    pub fn size(&self) -> usize {
        self.len
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Fixed dimension, `None` until the first row is stored.
    pub fn dimensions(&self) -> Option<usize> {
        self.dimension
    }

    /// Stored (normalized) row for `position`.
    pub fn vector(&self, position: u32) -> Option<&[f32]> {
        let dim = self.dimension?;
        let start = (position as usize).checked_mul(dim)?;
        self.data.get(start..start + dim)
    }

    /// Iterate stored rows in position order.
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> + '_ {
        let dim = self.dimension.unwrap_or(1);
        self.data.chunks_exact(dim)
    }

    /// Approximate heap bytes held by the row buffer.
    pub fn memory_usage(&self) -> usize {
        self.data.capacity() * std::mem::size_of::<f32>()
    }
}
