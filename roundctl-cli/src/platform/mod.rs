//! Native platform implementations of the core traits.

pub mod native_clock;

pub use native_clock::NativeClock;
