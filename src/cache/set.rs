//! LRU-ordered cache set

use std::collections::TryReserveError;

use super::Outcome;

/// One block-sized slot. No data is modeled, only the tag.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct CacheLine {
    pub tag: u64,
    pub valid: bool,
}

/// A fixed number of lines ordered by recency:
/// index 0 is the most recently used, the last index the least.
#[derive(Clone, Debug)]
pub struct Set {
    lines: Box<[CacheLine]>,
}

impl Set {
    /// Fails instead of aborting when the lines cannot be allocated
    pub fn make(associativity: usize) -> Result<Self, TryReserveError> {
        assert!(associativity > 0);
        let mut lines = Vec::new();
        lines.try_reserve_exact(associativity)?;
        lines.resize(associativity, CacheLine::default());
        Ok(Self {
            lines: lines.into_boxed_slice(),
        })
    }

    pub fn associativity(&self) -> usize {
        self.lines.len()
    }

    /// Lines from most to least recently used
    pub fn lines(&self) -> &[CacheLine] {
        &self.lines
    }

    /// Position of the valid line holding `tag`, if any
    pub fn lookup(&self, tag: u64) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| line.valid && line.tag == tag)
    }

    /// Look `tag` up and make it the most recently used line.
    ///
    /// A hit takes priority; otherwise the first invalid line in recency
    /// order is filled, and only a full set evicts its last line.
    pub fn touch(&mut self, tag: u64) -> Outcome {
        let mut first_invalid = None;
        let mut hit = None;
        for (i, line) in self.lines.iter().enumerate() {
            if line.valid && line.tag == tag {
                hit = Some(i);
                break;
            }
            if !line.valid && first_invalid.is_none() {
                first_invalid = Some(i);
            }
        }

        let (target, outcome) = match (hit, first_invalid) {
            (Some(i), _) => (i, Outcome::Hit),
            (None, Some(i)) => (i, Outcome::Miss),
            (None, None) => (self.lines.len() - 1, Outcome::MissWithEviction),
        };

        // Shift everything above the target down by one,
        // dropping the target's old content
        self.lines[..=target].rotate_right(1);
        self.lines[0] = CacheLine { tag, valid: true };

        outcome
    }
}
