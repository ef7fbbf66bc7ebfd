//! Usage-recency tracking. Needs the platform's usage-access grant.

use crate::catalog::AppCatalog;
use crate::errors::Result;
use chrono::{DateTime, Days, Local, TimeDelta, Utc};
use log::{info, trace, warn};

/// `[now - days, now]` in epoch millis, stepping back whole calendar days.
/// A start before the representable range saturates to the earliest instant.
pub fn lookback_window(days: u32, now: DateTime<Local>) -> (i64, i64) {
    let start = now
        .checked_sub_days(Days::new(u64::from(days)))
        .or_else(|| {
            TimeDelta::try_days(i64::from(days)).and_then(|d| now.checked_sub_signed(d))
        })
        .map_or(DateTime::<Utc>::MIN_UTC.timestamp_millis(), |s| {
            s.timestamp_millis()
        });
    (start, now.timestamp_millis())
}

impl AppCatalog {
    /// Platform failures read as "no access".
    pub fn has_usage_access(&self) -> bool {
        match self.platform().has_usage_access() {
            Ok(granted) => granted,
            Err(e) => {
                warn!("usage access check failed: {e}");
                false
            }
        }
    }

    /// Opens the usage-access settings screen. The grant shows up later in `has_usage_access`.
    pub fn request_usage_access(&self) -> Result<()> {
        info!("opening usage access settings");
        Ok(self.platform().open_usage_access_settings()?)
    }

    /// Back-fill `last_used` for every tracked package in the usage report for
    /// the trailing `days`. Returns how many records were updated.
    pub fn refresh_last_used(&mut self, days: u32) -> Result<usize> {
        self.refresh_last_used_at(days, Local::now())
    }

    pub fn refresh_last_used_at(&mut self, days: u32, now: DateTime<Local>) -> Result<usize> {
        if !self.has_usage_access() {
            info!("refresh_last_used: no usage access, skipping");
            return Ok(0);
        }

        let (start, end) = lookback_window(days, now);
        let stats = self.platform().last_used_between(start, end)?;

        let mut updated = 0;
        for app in self.apps.iter_mut() {
            if let Some(&ts) = stats.get(app.package_name()) {
                app.last_used = Some(ts);
                trace!("{} last used {ts}", app.package_name());
                updated += 1;
            }
        }
        info!(
            "refresh_last_used: {updated}/{} apps in a {days}-day window",
            self.apps.len()
        );
        Ok(updated)
    }
}
