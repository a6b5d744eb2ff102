//! Background abandonment sweep (§5): every tick, evicts expired context
//! entries and marks idle conversations `abandoned`, persisting the ones
//! that actually transitioned.

use std::time::Duration;

use chrono::Duration as ChronoDuration;

use crate::state::AppState;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub async fn run(state: AppState) {
    let mut interval = tokio::time::interval(SWEEP_INTERVAL);
    let abandon_after = ChronoDuration::minutes(30);
    loop {
        interval.tick().await;
        state.context.sweep_expired();

        for (key, mut conversation) in state.context.list_all() {
            if state.reservation_flow.apply_timeout(&mut conversation, abandon_after) {
                if let Err(e) = state.reservation_flow.persist(&conversation).await {
                    tracing::warn!(error = %e, company_id = %key.company_id, "failed to persist abandoned conversation");
                    continue;
                }
                state.context.put(key, conversation);
            }
        }
    }
}
