//! Background purge of expired ledger entries

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use super::ledger::TokenLedger;

/// Periodically drop expired sessions and revocations from the ledger.
///
/// Runs until the task is aborted.
pub async fn ledger_sweeper(ledger: Arc<dyn TokenLedger>, interval: Duration) {
    tracing::info!(interval_secs = interval.as_secs(), "Starting ledger sweeper");

    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let stats = ledger.purge_expired(Utc::now()).await;
        if stats.sessions > 0 || stats.revocations > 0 {
            tracing::info!(
                sessions = stats.sessions,
                revocations = stats.revocations,
                "Purged expired ledger entries"
            );
        } else {
            tracing::debug!("Ledger sweep found nothing to purge");
        }
    }
}
