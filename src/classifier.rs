//! Hit/miss/eviction accounting

use std::fmt;
use std::ops::Add;
use std::ops::AddAssign;

use crate::cache::AccessKind;
use crate::cache::Outcome;

/// Running totals of one simulation run
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct Counters {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl Counters {
    pub fn new(hits: u64, misses: u64, evictions: u64) -> Self {
        Self {
            hits,
            misses,
            evictions,
        }
    }

    /// Number of sub-accesses counted, a Modify counts twice
    pub fn accesses(&self) -> u64 {
        self.hits + self.misses
    }

    /// Computes the current miss rate, 0 when nothing was accessed
    pub fn get_miss_rate(&self) -> f64 {
        match self.accesses() {
            0 => 0.,
            total => self.misses as f64 / total as f64,
        }
    }

    pub fn classify(&mut self, kind: AccessKind, outcome: Outcome) {
        *self += delta(kind, outcome);
    }
}

impl Add for Counters {
    type Output = Counters;

    fn add(self, other: Counters) -> Counters {
        Counters {
            hits: self.hits + other.hits,
            misses: self.misses + other.misses,
            evictions: self.evictions + other.evictions,
        }
    }
}

impl AddAssign for Counters {
    fn add_assign(&mut self, other: Counters) {
        *self = *self + other;
    }
}

impl fmt::Display for Counters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hits:{} misses:{} evictions:{}",
            self.hits, self.misses, self.evictions
        )
    }
}

/// Counter increments for one access.
///
/// A Modify is a load then a store to the same block. Only the load is
/// looked up; the store always hits the block the load just promoted.
pub fn delta(kind: AccessKind, outcome: Outcome) -> Counters {
    let load_or_store = match outcome {
        Outcome::Hit => Counters::new(1, 0, 0),
        Outcome::Miss => Counters::new(0, 1, 0),
        Outcome::MissWithEviction => Counters::new(0, 1, 1),
    };
    match kind {
        AccessKind::Load | AccessKind::Store => load_or_store,
        AccessKind::Modify => load_or_store + Counters::new(1, 0, 0),
    }
}

pub fn classify(kind: AccessKind, outcome: Outcome, counters: &mut Counters) {
    counters.classify(kind, outcome);
}

/// Words printed for an access in verbose mode, e.g. `miss eviction hit`
pub fn describe(kind: AccessKind, outcome: Outcome) -> &'static str {
    match (kind, outcome) {
        (AccessKind::Modify, Outcome::Hit) => "hit hit",
        (AccessKind::Modify, Outcome::Miss) => "miss hit",
        (AccessKind::Modify, Outcome::MissWithEviction) => "miss eviction hit",
        (_, Outcome::Hit) => "hit",
        (_, Outcome::Miss) => "miss",
        (_, Outcome::MissWithEviction) => "miss eviction",
    }
}
