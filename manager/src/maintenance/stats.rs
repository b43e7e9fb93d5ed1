//! Stats collection across accounts

use chrono::{DateTime, NaiveTime, Utc};
use futures::future::join_all;
use tracing::warn;

use crate::http::client::HttpClient;
use crate::models::account::Account;
use crate::models::stats::StatsSnapshot;

/// Start of the current accounting window: UTC midnight of today.
pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Collect one usage snapshot per account for `[UTC-midnight-today, now)`.
///
/// All accounts are queried concurrently. One account's failure yields an
/// error descriptor in its own snapshot and never affects the others.
pub async fn collect_stats(
    http: &HttpClient,
    accounts: &[Account],
    detailed: bool,
) -> Vec<StatsSnapshot> {
    let now = Utc::now();
    let start = window_start(now);

    let queries = accounts.iter().map(|account| async move {
        match http
            .fetch_account_usage(account, start, now, detailed)
            .await
        {
            Ok(usage) => {
                StatsSnapshot::collected(account.alias.clone(), usage.total, usage.breakdown)
            }
            Err(e) => {
                warn!("Usage query for account {} failed: {}", account.alias, e);
                StatsSnapshot::failed(account.alias.clone(), e.to_string())
            }
        }
    });

    join_all(queries).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_window_start_is_utc_midnight() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 13, 45, 59).unwrap();
        let start = window_start(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap());
    }
}
