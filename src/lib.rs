/* -------- Shared substrate -------- */
pub mod common;

/* -------- Hashmap variants -------- */
mod linear_probing;
pub use linear_probing::LinearProbingMap;

mod robin_hood;
pub use robin_hood::RobinHoodMap;

mod chaining;
pub use chaining::ChainingMap;

mod cuckoo;
pub use cuckoo::{CuckooMap, MAX_DISPLACEMENTS};

/* -------- Re-exports -------- */
pub use common::{mix64, OpResult, SlotIndexer, DEFAULT_CAPACITY};

/* -------- Error type -------- */
#[derive(Debug, Clone, PartialEq)]
pub enum MapError {
    ZeroCapacity,
    CapacityNotPowerOfTwo(usize),
}

impl std::fmt::Display for MapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapError::ZeroCapacity => write!(f, "Capacity must be nonzero"),
            MapError::CapacityNotPowerOfTwo(cap) => {
                write!(f, "Capacity must be a power of two, got {}", cap)
            }
        }
    }
}

impl std::error::Error for MapError {}
