//! Offset pagination shared by the list endpoints.

use serde::Serialize;

/// Fixed page size of every list endpoint.
pub const PAGE_SIZE: usize = 10;

/// One page of a filtered listing plus the total number of matches.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub count: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, count: u64) -> Self {
        Self { items, count }
    }

    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            count: 0,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            count: self.count,
        }
    }
}

/// Clamp a caller-supplied offset into a slice start.
///
/// Offsets are forwarded unvalidated from the HTTP layer; negatives read as 0.
pub fn offset_start(offset: i64) -> usize {
    usize::try_from(offset.max(0)).unwrap_or(usize::MAX)
}
