use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the simulator
#[derive(Error, Debug)]
pub enum SimulatorError {
    #[error("Invalid cache geometry: {0}")]
    GeometryError(#[from] GeometryError),

    #[error("Cache error: {0}")]
    CacheError(#[from] CacheError),

    #[error("Trace error: {0}")]
    TraceError(#[from] TraceError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

/// Errors raised while validating a cache geometry
#[derive(Error, Debug, PartialEq, Eq)]
pub enum GeometryError {
    #[error("number of sets must be a power of two, got {0}")]
    SetsNotPowerOfTwo(u64),

    #[error("block size must be a power of two, got {0}")]
    BlockSizeNotPowerOfTwo(u64),

    #[error("associativity must be at least 1")]
    ZeroAssociativity,

    #[error("{name} bits must be below 64, got {bits}")]
    TooManyBits { name: &'static str, bits: u32 },

    #[error("{num_sets} sets of {associativity} lines do not fit in memory")]
    TooLarge { num_sets: u64, associativity: usize },
}

/// Errors related to cache lookups
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CacheError {
    #[error("set index {index} out of range for {num_sets} sets")]
    IndexOutOfRange { index: usize, num_sets: usize },
}

/// Errors related to trace files
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Failed to open trace file '{0}': {1}")]
    OpenError(PathBuf, #[source] std::io::Error),

    #[error("Failed to read trace line {0}: {1}")]
    ReadError(usize, #[source] std::io::Error),
}

/// Reasons a single trace line is rejected.
/// Rejected lines are skipped, never fatal.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TraceLineError {
    #[error("empty line")]
    Empty,

    #[error("unknown operation '{0}'")]
    UnknownOperation(String),

    #[error("missing ',' between address and size")]
    MissingSize,

    #[error("invalid hexadecimal address '{0}'")]
    InvalidAddress(String),

    #[error("invalid access size '{0}'")]
    InvalidSize(String),
}

/// Type alias for Result with SimulatorError
pub type SimulatorResult<T> = Result<T, SimulatorError>;
