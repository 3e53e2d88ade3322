//! Date-window scheduling over the synchronization history.

use std::collections::HashSet;

use chrono::{Days, NaiveDate};

use purerdm_core::traits::SyncStore;
use purerdm_core::Result;

/// Every date in the lookback window, newest first.
pub fn dates_in_window(today: NaiveDate, lookback_days: u32) -> Vec<NaiveDate> {
    (0..lookback_days)
        .filter_map(|offset| today.checked_sub_days(Days::new(offset as u64)))
        .collect()
}

/// Dates in the lookback window not yet marked as synchronized.
pub fn missing_dates<S: SyncStore + ?Sized>(
    store: &S,
    today: NaiveDate,
    lookback_days: u32,
) -> Result<Vec<NaiveDate>> {
    let synced: HashSet<NaiveDate> = store.synced_dates()?.into_iter().collect();
    Ok(dates_in_window(today, lookback_days)
        .into_iter()
        .filter(|date| !synced.contains(date))
        .collect())
}
