use serde::{Deserialize, Serialize};

/// Readiness of the active corpus slot.
///
/// `Uninitialized -> Building -> Ready`. A failed first build falls back to
/// `Uninitialized`. Once `Ready`, rebuilds happen off to the side and the
/// state stays `Ready` throughout; there is no path back to `Building`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IndexState {
    #[default]
    Uninitialized,
    Building,
    Ready,
}

impl IndexState {
    /// State while a build is in flight.
    pub fn begin_build(self) -> IndexState {
        match self {
            IndexState::Ready => IndexState::Ready,
            _ => IndexState::Building,
        }
    }

    /// State after a build, given whether it succeeded and whether a
    /// previously published corpus is still held.
    pub fn finish_build(self, succeeded: bool, has_previous: bool) -> IndexState {
        if succeeded || has_previous {
            IndexState::Ready
        } else {
            IndexState::Uninitialized
        }
    }

    pub fn accepts_queries(self) -> bool {
        self == IndexState::Ready
    }
}
