use tracing::info;

use roundctl_core::constants::INITIAL_ROUND;
use roundctl_core::round::store::{clear_round, load_round, save_round};

use crate::config::Config;
use crate::storage::SqliteMeta;

/// Inspect or overwrite the persisted round counter.
pub async fn run_round(
    config: &Config,
    set: Option<u64>,
    reset: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let storage = SqliteMeta::open(&config.state_db)?;

    if reset {
        clear_round(&storage).await?;
        info!("round counter reset");
    } else if let Some(round) = set {
        if round < INITIAL_ROUND {
            return Err(format!("round must be at least {INITIAL_ROUND}").into());
        }
        save_round(&storage, round).await?;
        info!(round, "round counter overwritten");
    }

    println!("Round: {}", load_round(&storage).await?);
    Ok(())
}
