use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info};
use crate::state::AppState;

const SWEEP_INTERVAL_SECS: u64 = 60;

/// Periodically flips lapsed holds to `expired` so they stop counting
/// against slot capacity. `place_hold` also sweeps opportunistically; this
/// task only bounds how long a stale hold can linger without traffic.
pub async fn start_expiry_sweeper(state: Arc<AppState>) {
    info!("Starting hold expiry sweeper...");

    loop {
        match state.booking_repo.expire_stale_holds().await {
            Ok(0) => {}
            Ok(count) => info!("Expired {} stale holds", count),
            Err(e) => error!("Hold expiry sweep failed: {:?}", e),
        }
        sleep(Duration::from_secs(SWEEP_INTERVAL_SECS)).await;
    }
}
