//! Set-associative cache model

pub mod address;
pub mod set;

use std::fmt;
use std::mem;

use address::is_pow_2;
use address::AddressDecoder;
use set::CacheLine;
use set::Set;

use crate::error::CacheError;
use crate::error::GeometryError;
use crate::error::SimulatorResult;

/// Kind of a traced memory access
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessKind {
    Load,
    Store,
    /// A load immediately followed by a store to the same block
    Modify,
}

impl AccessKind {
    /// The operation letter used in trace files
    pub fn letter(self) -> char {
        match self {
            AccessKind::Load => 'L',
            AccessKind::Store => 'S',
            AccessKind::Modify => 'M',
        }
    }
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Result of touching a set
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    Hit,
    Miss,
    MissWithEviction,
}

/// Cache geometry: number of sets, lines per set and bytes per line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    pub num_sets: u64,
    pub associativity: usize,
    pub block_size: u64,
}

impl Default for Geometry {
    /// 16 direct-mapped sets of 16-byte blocks
    fn default() -> Self {
        Self::make(16, 1, 16)
    }
}

impl Geometry {
    pub fn make(num_sets: u64, associativity: usize, block_size: u64) -> Self {
        Self {
            num_sets,
            associativity,
            block_size,
        }
    }

    /// Build from the command-line style parameters:
    /// `2^set_bits` sets, `associativity` lines, `2^block_bits` bytes
    pub fn from_bits(
        set_bits: u32,
        associativity: usize,
        block_bits: u32,
    ) -> Result<Self, GeometryError> {
        if set_bits >= 64 {
            return Err(GeometryError::TooManyBits {
                name: "set index",
                bits: set_bits,
            });
        }
        if block_bits >= 64 {
            return Err(GeometryError::TooManyBits {
                name: "block offset",
                bits: block_bits,
            });
        }
        let geometry =
            Self::make(1 << set_bits, associativity, 1 << block_bits);
        geometry.validate()?;
        Ok(geometry)
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        if !is_pow_2(self.num_sets) {
            return Err(GeometryError::SetsNotPowerOfTwo(self.num_sets));
        }
        if !is_pow_2(self.block_size) {
            return Err(GeometryError::BlockSizeNotPowerOfTwo(self.block_size));
        }
        if self.associativity == 0 {
            return Err(GeometryError::ZeroAssociativity);
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} sets x {} lines x {} bytes",
            self.num_sets, self.associativity, self.block_size
        )
    }
}

/// Cache implementation
#[derive(Debug)]
pub struct Cache {
    geometry: Geometry,
    decoder: AddressDecoder,
    sets: Vec<Set>,
}

impl Cache {
    pub fn new(geometry: Geometry) -> SimulatorResult<Self> {
        geometry.validate()?;
        let decoder =
            AddressDecoder::new(geometry.num_sets, geometry.block_size)?;
        let too_large = || GeometryError::TooLarge {
            num_sets: geometry.num_sets,
            associativity: geometry.associativity,
        };

        // Refuse anything whose total size cannot even be expressed
        let num_sets =
            usize::try_from(geometry.num_sets).map_err(|_| too_large())?;
        let line_size = mem::size_of::<CacheLine>();
        let total_bytes = num_sets
            .checked_mul(geometry.associativity)
            .and_then(|lines| lines.checked_mul(line_size))
            .and_then(|lines| {
                lines.checked_add(num_sets.checked_mul(mem::size_of::<Set>())?)
            });
        if !total_bytes.is_some_and(|total| total <= isize::MAX as usize) {
            return Err(too_large().into());
        }

        let mut sets = Vec::new();
        sets.try_reserve_exact(num_sets).map_err(|_| too_large())?;
        for _ in 0..num_sets {
            sets.push(
                Set::make(geometry.associativity).map_err(|_| too_large())?,
            );
        }
        Ok(Self {
            geometry,
            decoder,
            sets,
        })
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn sets(&self) -> &[Set] {
        &self.sets
    }

    pub fn is_in_cache(&self, address: u64) -> bool {
        let (index, tag) = self.decoder.decode(address);
        self.sets
            .get(index)
            .is_some_and(|set| set.lookup(tag).is_some())
    }

    /// Access the block holding `address` and update its set's recency
    pub fn access(
        &mut self,
        address: u64,
        kind: AccessKind,
    ) -> SimulatorResult<Outcome> {
        let (index, tag) = self.decoder.decode(address);
        let num_sets = self.sets.len();
        let set = self
            .sets
            .get_mut(index)
            .ok_or(CacheError::IndexOutOfRange { index, num_sets })?;
        let outcome = set.touch(tag);
        tracing::debug!(
            kind = %kind,
            address,
            set = index,
            tag,
            ?outcome,
            "cache access"
        );
        Ok(outcome)
    }
}
