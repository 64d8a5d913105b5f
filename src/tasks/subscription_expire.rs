use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, Months, Utc};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::cache::{CacheError, SiteCache};
use crate::notify::{AlertKind, Announcer};
use crate::storage::models::{SubscriptionRecord, SubscriptionStatus, SubscriptionType};
use crate::storage::{Database, DatabaseError};

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
    #[error("Unknown subscription type: {0}")]
    UnknownType(String),
    #[error("Renewed end date out of range")]
    DateOverflow,
}

#[derive(Debug, Default)]
pub struct SweepStats {
    pub renewed: u64,
    pub expired: u64,
    pub purged: u64,
}

/// Periodic subscription lifecycle sweep: rolls recurring subscriptions
/// forward, expires past-due ones, signals affected users to the auth
/// layer, and drops abandoned checkout rows.
pub struct SubscriptionExpiry {
    db: Database,
    cache: Arc<dyn SiteCache>,
    announcer: Arc<dyn Announcer>,
}

impl SubscriptionExpiry {
    pub fn new(db: Database, cache: Arc<dyn SiteCache>, announcer: Arc<dyn Announcer>) -> Self {
        Self {
            db,
            cache,
            announcer,
        }
    }

    /// Run the sweep on an interval until the process exits. A failed pass
    /// is logged and the loop waits for the next tick.
    pub async fn run(self, interval: Duration) {
        let mut interval = tokio::time::interval(interval);
        loop {
            interval.tick().await;
            match self.execute(Utc::now()).await {
                Ok(stats) => {
                    if stats.renewed > 0 || stats.expired > 0 || stats.purged > 0 {
                        info!(
                            renewed = stats.renewed,
                            expired = stats.expired,
                            purged = stats.purged,
                            "subscription sweep finished"
                        );
                    }
                }
                Err(e) => error!(error = %e, "subscription sweep failed"),
            }
        }
    }

    /// One sweep pass. Storage errors on the batch queries abort the pass;
    /// a bad individual record is logged and skipped.
    pub async fn execute(&self, now: DateTime<Utc>) -> Result<SweepStats, SweepError> {
        let mut stats = SweepStats::default();
        let mut affected: BTreeSet<String> = BTreeSet::new();

        // Roll forward everything with an active payment profile.
        for sub in self.db.get_subscriptions_to_renew(now)? {
            match self.renew(&sub, now) {
                Ok(()) => {
                    stats.renewed += 1;
                    affected.insert(sub.user_id.clone());
                    self.send_resubscribe_broadcast(&sub).await;
                }
                Err(e) => {
                    error!(subscription_id = %sub.id, error = %e, "could not roll over subscription");
                }
            }
        }

        // Expire whatever is still past due.
        for sub in self.db.get_subscriptions_to_expire(now)? {
            affected.insert(sub.user_id.clone());
            match self
                .db
                .update_subscription_status(&sub.id, SubscriptionStatus::Expired, None)
            {
                Ok(_) => stats.expired += 1,
                Err(e) => {
                    error!(subscription_id = %sub.id, error = %e, "could not expire subscription");
                }
            }
        }

        // One stale-user signal per affected account.
        for user_id in &affected {
            self.cache.flag_user_for_update(user_id).await?;
        }

        // Drop checkout rows abandoned over an hour ago.
        stats.purged = self
            .db
            .delete_stale_new_subscriptions(now - chrono::Duration::hours(1))?;

        Ok(stats)
    }

    fn renew(&self, sub: &SubscriptionRecord, now: DateTime<Utc>) -> Result<(), SweepError> {
        let sub_type = SubscriptionType::find(&sub.subscription_type)
            .ok_or_else(|| SweepError::UnknownType(sub.subscription_type.clone()))?;

        let end = next_end_date(sub.end_date, now, sub_type).ok_or(SweepError::DateOverflow)?;

        self.db
            .update_subscription_status(&sub.id, SubscriptionStatus::Active, Some(end))?;
        Ok(())
    }

    /// Announce a successful renewal in chat and on stream. Best-effort:
    /// failures are logged and never affect the renewed record. The months
    /// figure derives from the record as it stood before the roll-forward.
    async fn send_resubscribe_broadcast(&self, sub: &SubscriptionRecord) {
        let user = match self.db.get_user(&sub.user_id) {
            Ok(Some(user)) => user,
            Ok(None) => return,
            Err(e) => {
                warn!(user_id = %sub.user_id, error = %e, "could not load user for broadcast");
                return;
            }
        };

        let months = whole_months_between(sub.created_at, sub.end_date).max(1);
        let span = if months > 1 {
            format!("{months} months")
        } else {
            format!("{months} month")
        };
        let message = format!("{} has resubscribed! active for {}", user.username, span);

        if let Err(e) = self.announcer.send_broadcast(&message).await {
            warn!(subscription_id = %sub.id, error = %e, "could not send resubscribe broadcast");
        }
        if let Err(e) = self
            .announcer
            .send_alert(&message, AlertKind::Subscription)
            .await
        {
            warn!(subscription_id = %sub.id, error = %e, "could not send resubscribe alert");
        }
    }
}

/// New end date for a renewal: catch up the whole months the old end date
/// is behind, then add one full billing period. Subscriptions can be
/// revived after months of skipped payments, so the end date may be behind
/// by more than one period; the result always lands strictly past `now`.
pub fn next_end_date(
    end: DateTime<Utc>,
    now: DateTime<Utc>,
    sub_type: &SubscriptionType,
) -> Option<DateTime<Utc>> {
    let behind = whole_months_between(end, now);
    end.checked_add_months(Months::new(behind))?
        .checked_add_months(Months::new(sub_type.billing_months()))
}

/// Whole calendar months from `from` to `to`; zero when `from` is not in
/// the past of `to`.
pub fn whole_months_between(from: DateTime<Utc>, to: DateTime<Utc>) -> u32 {
    if from >= to {
        return 0;
    }

    let mut months =
        (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    // Month-end clamping means the naive difference can overshoot; walk it
    // back until `from + months` no longer passes `to`.
    while months > 0
        && from
            .checked_add_months(Months::new(months as u32))
            .map(|d| d > to)
            .unwrap_or(true)
    {
        months -= 1;
    }

    months.max(0) as u32
}
