//! Platform abstraction traits so the round logic runs against any clock,
//! backend and key-value store.

pub mod clock;
pub mod storage;
pub mod transport;
