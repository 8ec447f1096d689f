pub mod cache;
pub mod classifier;
pub mod flags;
pub mod run_wrapper;
pub mod trace;

pub mod error;
