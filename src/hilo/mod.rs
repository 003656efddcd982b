//! HiLo unique-key generation: batch range allocation per key tag

pub mod generator;
pub mod range;

pub use generator::{HiLoIdGenerator, MultiTagHiLoGenerator};
pub use range::HiLoRange;
