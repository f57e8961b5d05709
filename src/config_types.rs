//! Strong types for block ranges and range limits
//!
//! These types keep configuration values (range widths) apart from
//! blockchain values (block numbers), and carry the sub-range carving
//! rules used when a request is wider than a node will serve at once.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::BlockNumber;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::RangeError;

/// Maximum width of a single `eth_getLogs` request
///
/// The width of a range is `to - from`. A request whose width is within the
/// limit is issued as one call; wider requests are carved into sub-ranges.
///
/// # Examples
///
/// ```
/// use eventharvest::MaxBlockRange;
///
/// assert_eq!(MaxBlockRange::DEFAULT.as_u64(), 5000);
/// assert_eq!(MaxBlockRange::new(0).as_u64(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaxBlockRange(u64);

impl MaxBlockRange {
    /// Default threshold, matching what most hosted providers accept
    pub const DEFAULT: Self = Self(5000);

    /// Create a new max block range. Zero is treated as one.
    pub const fn new(blocks: u64) -> Self {
        if blocks == 0 {
            Self(1)
        } else {
            Self(blocks)
        }
    }

    /// Get the inner u64 value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Number of sub-ranges needed to cover `[from, to]`
    ///
    /// Equals `ceil((to - from) / max)` when the width exceeds the limit and
    /// one otherwise.
    ///
    /// # Examples
    ///
    /// ```
    /// use eventharvest::MaxBlockRange;
    ///
    /// let range = MaxBlockRange::new(1000);
    /// assert_eq!(range.sub_ranges_needed(0, 2500), 3);
    /// assert_eq!(range.sub_ranges_needed(0, 1000), 1);
    /// assert_eq!(range.sub_ranges_needed(7, 7), 1);
    /// ```
    pub fn sub_ranges_needed(&self, from: BlockNumber, to: BlockNumber) -> usize {
        if to < from {
            return 0;
        }
        let width = to - from;
        if width <= self.0 {
            1
        } else {
            width.div_ceil(self.0) as usize
        }
    }

    /// Split `[from, to]` into contiguous, ascending sub-ranges
    ///
    /// Cut points fall at `from + k * max`: the first sub-range is
    /// `[from, from + max]`, each following one starts right after the
    /// previous end and spans `max` blocks, and the last one is clipped to
    /// `to`.
    ///
    /// # Examples
    ///
    /// ```
    /// use eventharvest::MaxBlockRange;
    ///
    /// let parts: Vec<_> = MaxBlockRange::new(1000).sub_ranges(0, 2500).collect();
    /// assert_eq!(parts, vec![(0, 1000), (1001, 2000), (2001, 2500)]);
    /// ```
    pub fn sub_ranges(&self, from: BlockNumber, to: BlockNumber) -> SubRanges {
        SubRanges {
            next_from: from,
            to,
            max: self.0,
            first: true,
            done: to < from,
        }
    }
}

impl Default for MaxBlockRange {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u64> for MaxBlockRange {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for MaxBlockRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} blocks", self.0)
    }
}

/// Iterator over `(from, to)` sub-ranges
///
/// Created by [`MaxBlockRange::sub_ranges`].
#[derive(Debug, Clone)]
pub struct SubRanges {
    next_from: BlockNumber,
    to: BlockNumber,
    max: u64,
    first: bool,
    done: bool,
}

impl Iterator for SubRanges {
    type Item = (BlockNumber, BlockNumber);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let start = self.next_from;
        let span = if self.first { self.max } else { self.max - 1 };
        self.first = false;

        let end = start.saturating_add(span);
        if end >= self.to {
            self.done = true;
            return Some((start, self.to));
        }

        self.next_from = end + 1;
        Some((start, end))
    }
}

/// Upper bound of a requested range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockTarget {
    /// A concrete block number
    Number(BlockNumber),
    /// The chain head, resolved once per harvest call
    #[default]
    Latest,
}

impl From<BlockNumber> for BlockTarget {
    fn from(value: BlockNumber) -> Self {
        Self::Number(value)
    }
}

impl FromStr for BlockTarget {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("latest") {
            return Ok(Self::Latest);
        }
        s.parse().map(Self::Number)
    }
}

impl fmt::Display for BlockTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Latest => f.write_str("latest"),
        }
    }
}

/// Inclusive block interval with `"latest"` already resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRange {
    pub from: BlockNumber,
    pub to: BlockNumber,
}

impl ResolvedRange {
    /// Resolve and validate a requested range against the chain head
    ///
    /// # Errors
    ///
    /// - [`RangeError::FromBeyondHead`] when `from > head`
    /// - [`RangeError::FromAfterTo`] when `from > to` after resolution
    ///
    /// # Examples
    ///
    /// ```
    /// use eventharvest::{BlockTarget, ResolvedRange};
    ///
    /// let range = ResolvedRange::resolve(10, BlockTarget::Latest, 99).unwrap();
    /// assert_eq!((range.from, range.to), (10, 99));
    /// assert!(ResolvedRange::resolve(100, BlockTarget::Latest, 99).is_err());
    /// ```
    pub fn resolve(
        from: BlockNumber,
        to: BlockTarget,
        head: BlockNumber,
    ) -> Result<Self, RangeError> {
        if from > head {
            return Err(RangeError::FromBeyondHead { from, head });
        }
        let to = match to {
            BlockTarget::Latest => head,
            BlockTarget::Number(to) if to > head => {
                debug!(to_block = to, head, "Clamping to block to the chain head");
                head
            }
            BlockTarget::Number(to) => to,
        };
        if from > to {
            return Err(RangeError::FromAfterTo { from, to });
        }
        Ok(Self { from, to })
    }

    /// Width of the range, `to - from`
    pub fn width(&self) -> u64 {
        self.to - self.from
    }

    pub fn contains(&self, block: BlockNumber) -> bool {
        (self.from..=self.to).contains(&block)
    }
}

impl fmt::Display for ResolvedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}
