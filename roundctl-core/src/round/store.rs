//! The round counter survives restarts as a decimal string under [`KEY_ROUND`].
//!
//! It is a display label only: no locking, the last writer wins.

use tracing::{debug, warn};

use crate::constants::{INITIAL_ROUND, KEY_ROUND};
use crate::error::Result;
use crate::traits::storage::PersistentStorage;

/// Read the stored round, falling back to [`INITIAL_ROUND`] when absent or invalid.
pub async fn load_round<S: PersistentStorage + ?Sized>(storage: &S) -> Result<u64> {
    let Some(bytes) = storage.get(KEY_ROUND).await? else {
        debug!("no stored round, starting at {INITIAL_ROUND}");
        return Ok(INITIAL_ROUND);
    };

    let parsed = std::str::from_utf8(&bytes)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|&n| n >= INITIAL_ROUND);

    match parsed {
        Some(round) => Ok(round),
        None => {
            warn!(
                stored = %String::from_utf8_lossy(&bytes),
                "ignoring invalid stored round"
            );
            Ok(INITIAL_ROUND)
        }
    }
}

pub async fn save_round<S: PersistentStorage + ?Sized>(storage: &S, round: u64) -> Result<()> {
    storage.set(KEY_ROUND, round.to_string().as_bytes()).await
}

pub async fn clear_round<S: PersistentStorage + ?Sized>(storage: &S) -> Result<()> {
    storage.delete(KEY_ROUND).await
}
