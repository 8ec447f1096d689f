//! A simulator wrapper

use std::io::Write;
use std::path::Path;

use crate::cache::Cache;
use crate::cache::Geometry;
use crate::cache::Outcome;
use crate::classifier;
use crate::classifier::Counters;
use crate::error::SimulatorResult;
use crate::trace::Access;
use crate::trace::TraceReader;

/// Simulation policy
#[derive(Clone, Copy, Debug, Default)]
pub struct SimPolicy {
    pub geometry: Geometry,
    /// Print every access with its outcome
    pub verbose: bool,
}

/// One simulation run: a cache and the counters it feeds
#[derive(Debug)]
pub struct Simulator {
    cache: Cache,
    counters: Counters,
}

impl Simulator {
    pub fn new(geometry: Geometry) -> SimulatorResult<Self> {
        Ok(Self {
            cache: Cache::new(geometry)?,
            counters: Counters::default(),
        })
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    /// Decode, look up and count a single access
    pub fn step(&mut self, access: &Access) -> SimulatorResult<Outcome> {
        let outcome = self.cache.access(access.address, access.kind)?;
        self.counters.classify(access.kind, outcome);
        Ok(outcome)
    }

    /// Feed accesses in order, writing one line per access to `log` if given
    pub fn replay<I>(
        &mut self,
        accesses: I,
        mut log: Option<&mut dyn Write>,
    ) -> SimulatorResult<Counters>
    where
        I: IntoIterator<Item = SimulatorResult<Access>>,
    {
        for access in accesses {
            let access = access?;
            let outcome = self.step(&access)?;
            if let Some(log) = log.as_mut() {
                writeln!(
                    log,
                    "{} {:x},{} {}",
                    access.kind,
                    access.address,
                    access.size,
                    classifier::describe(access.kind, outcome)
                )?;
            }
        }
        Ok(self.counters)
    }
}

/// Run simulation on the given trace file
/// and return the final counters
pub fn run(
    trace_path: impl AsRef<Path>,
    policy: SimPolicy,
) -> SimulatorResult<Counters> {
    let trace_path = trace_path.as_ref();
    tracing::info!(
        trace = %trace_path.display(),
        geometry = %policy.geometry,
        "starting simulation"
    );

    let mut sim = Simulator::new(policy.geometry)?;
    let accesses = TraceReader::open(trace_path)?;
    let counters = if policy.verbose {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        sim.replay(accesses, Some(&mut out))?
    } else {
        sim.replay(accesses, None)?
    };

    tracing::info!(
        hits = counters.hits,
        misses = counters.misses,
        evictions = counters.evictions,
        "simulation finished"
    );
    Ok(counters)
}

/// Run simulation on already fetched accesses
pub fn run_trace(
    geometry: Geometry,
    accesses: &[Access],
) -> SimulatorResult<Counters> {
    let mut sim = Simulator::new(geometry)?;
    sim.replay(accesses.iter().copied().map(Ok), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::AccessKind;
    use crate::error::SimulatorError;
    use crate::trace::fetch_accesses;
    use proptest::prelude::*;
    use std::io::Write;

    fn load(address: u64) -> Access {
        Access {
            kind: AccessKind::Load,
            address,
            size: 1,
        }
    }

    fn trace_file(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_separate_sets() {
        let geometry = Geometry::from_bits(2, 1, 4).unwrap();
        let trace = [load(0x10), load(0x120), load(0x10)];
        let counters = run_trace(geometry, &trace).unwrap();
        assert_eq!(counters, Counters::new(1, 2, 0));

        // 0x10 and 0x110 share set 1
        let trace = [load(0x10), load(0x110), load(0x10)];
        let counters = run_trace(geometry, &trace).unwrap();
        assert_eq!(counters, Counters::new(0, 3, 2));
    }

    #[test]
    fn test_conflicting_tags() {
        let geometry = Geometry::from_bits(0, 1, 4).unwrap();
        let trace = [load(0x0), load(0x20), load(0x0)];
        let counters = run_trace(geometry, &trace).unwrap();
        assert_eq!(counters, Counters::new(0, 3, 2));
    }

    #[test]
    fn test_lru_eviction_order() {
        let geometry = Geometry::from_bits(0, 2, 4).unwrap();
        let mut sim = Simulator::new(geometry).unwrap();
        let outcomes: Vec<_> = [0x00, 0x10, 0x00, 0x20, 0x10]
            .into_iter()
            .map(|address| sim.step(&load(address)).unwrap())
            .collect();
        // 0x10 is least recently used when 0x20 comes in
        assert_eq!(
            outcomes,
            vec![
                Outcome::Miss,
                Outcome::Miss,
                Outcome::Hit,
                Outcome::MissWithEviction,
                Outcome::MissWithEviction,
            ]
        );
        assert!(sim.cache().is_in_cache(0x20));
        assert!(!sim.cache().is_in_cache(0x00));
        assert_eq!(sim.counters(), Counters::new(1, 4, 2));
    }

    #[test]
    fn test_verbose_log() {
        let trace = " L 10,1\n M 20,1\n L 22,1\n S 18,1\n\
                     L 110,1\n L 210,1\n M 12,1\n";
        let geometry = Geometry::from_bits(4, 1, 4).unwrap();
        let mut sim = Simulator::new(geometry).unwrap();
        let mut log = Vec::new();
        let accesses = TraceReader::new(std::io::Cursor::new(trace));
        let counters = sim.replay(accesses, Some(&mut log)).unwrap();
        assert_eq!(
            String::from_utf8(log).unwrap(),
            "L 10,1 miss\n\
             M 20,1 miss hit\n\
             L 22,1 hit\n\
             S 18,1 hit\n\
             L 110,1 miss eviction\n\
             L 210,1 miss eviction\n\
             M 12,1 miss eviction hit\n"
        );
        assert_eq!(counters, Counters::new(4, 5, 3));
    }

    #[test]
    fn test_run_from_file() {
        let file =
            trace_file("I 0400d7d4,8\n L 10,1\n M 20,1\n L 22,1\n S 18,1\n");
        let policy = SimPolicy {
            geometry: Geometry::from_bits(1, 1, 1).unwrap(),
            verbose: false,
        };
        let counters = run(file.path(), policy).unwrap();
        assert_eq!(counters.accesses(), 5);
    }

    #[test]
    fn test_runs_are_independent() {
        let file = trace_file(" L 0,1\n L 0,1\n S 40,1\n M 0,1\n");
        let accesses = fetch_accesses(file.path()).unwrap();
        let geometry = Geometry::from_bits(2, 2, 4).unwrap();
        let first = run_trace(geometry, &accesses).unwrap();
        let second = run_trace(geometry, &accesses).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, Counters::new(3, 2, 0));
    }

    #[test]
    fn test_invalid_geometry_aborts() {
        let result = run_trace(Geometry::make(4, 0, 16), &[load(0)]);
        assert!(matches!(result, Err(SimulatorError::GeometryError(_))));
    }

    proptest! {
        #[test]
        fn hits_and_misses_cover_every_access(
            set_bits in 0u32..4,
            associativity in 1usize..5,
            block_bits in 0u32..6,
            trace in prop::collection::vec((0usize..3, 0u64..4096), 0..300),
        ) {
            let kinds =
                [AccessKind::Load, AccessKind::Store, AccessKind::Modify];
            let accesses: Vec<_> = trace
                .into_iter()
                .map(|(k, address)| Access { kind: kinds[k], address, size: 1 })
                .collect();
            let expected: u64 = accesses
                .iter()
                .map(|a| if a.kind == AccessKind::Modify { 2 } else { 1 })
                .sum();
            let geometry =
                Geometry::from_bits(set_bits, associativity, block_bits)
                    .unwrap();
            let counters = run_trace(geometry, &accesses).unwrap();
            prop_assert_eq!(counters.hits + counters.misses, expected);
            prop_assert!(counters.evictions <= counters.misses);
        }
    }
}
