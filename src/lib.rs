//! Re-solves the dispatch of an optimized energy-system network after its
//! onshore wind resource has been damaged, with load shedding keeping the
//! problem feasible.

pub mod cli;
pub mod config;
pub mod error;
pub mod harness;
pub mod logging;
pub mod memory;
pub mod network;
pub mod profile;
pub mod reporting;
pub mod runner;
pub mod shedding;
/// Network preparation, the dispatch LP and the solve drivers.
pub mod solve;

pub mod io {
    pub mod export;
}
