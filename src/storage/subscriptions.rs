use chrono::{DateTime, Utc};
use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::{SubscriptionRecord, SubscriptionStatus};
use super::tables::*;

impl Database {
    // ========================================================================
    // Subscription operations
    // ========================================================================

    /// Store a subscription record and update the per-user index
    pub fn put_subscription(&self, sub: &SubscriptionRecord) -> Result<(), DatabaseError> {
        debug_assert!(!sub.id.is_empty(), "subscription id must not be empty");
        debug_assert!(!sub.user_id.is_empty(), "subscription user id must not be empty");

        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(SUBSCRIPTIONS)?;
            let data = rmp_serde::to_vec_named(sub)?;
            table.insert(sub.id.as_str(), data.as_slice())?;

            let mut user_table = write_txn.open_table(USER_SUBSCRIPTIONS)?;
            let mut sub_ids: Vec<String> = user_table
                .get(sub.user_id.as_str())?
                .map(|v| rmp_serde::from_slice(v.value()).unwrap_or_default())
                .unwrap_or_default();

            if !sub_ids.contains(&sub.id) {
                sub_ids.push(sub.id.clone());
                let index_data = rmp_serde::to_vec_named(&sub_ids)?;
                user_table.insert(sub.user_id.as_str(), index_data.as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn find_subscription_by_id(
        &self,
        id: &str,
    ) -> Result<Option<SubscriptionRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(SUBSCRIPTIONS)?;

        match table.get(id)? {
            Some(data) => {
                let sub: SubscriptionRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(sub))
            }
            None => Ok(None),
        }
    }

    /// Update a subscription's status, and optionally its end date, in place
    pub fn update_subscription_status(
        &self,
        id: &str,
        status: SubscriptionStatus,
        end_date: Option<DateTime<Utc>>,
    ) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;

        let existing = {
            let table = write_txn.open_table(SUBSCRIPTIONS)?;
            let result = match table.get(id)? {
                Some(data) => {
                    let sub: SubscriptionRecord = rmp_serde::from_slice(data.value())?;
                    Some(sub)
                }
                None => None,
            };
            result
        };

        let updated = match existing {
            Some(mut sub) => {
                sub.status = status;
                if let Some(end_date) = end_date {
                    sub.end_date = end_date;
                }
                sub.updated_at = Utc::now();

                let serialized = rmp_serde::to_vec_named(&sub)?;
                let mut table = write_txn.open_table(SUBSCRIPTIONS)?;
                table.insert(id, serialized.as_slice())?;
                true
            }
            None => false,
        };

        write_txn.commit()?;
        Ok(updated)
    }

    /// All subscriptions for a user
    pub fn get_subscriptions_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<SubscriptionRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let user_table = read_txn.open_table(USER_SUBSCRIPTIONS)?;
        let subs_table = read_txn.open_table(SUBSCRIPTIONS)?;

        let sub_ids: Vec<String> = match user_table.get(user_id)? {
            Some(data) => rmp_serde::from_slice(data.value())?,
            None => return Ok(Vec::new()),
        };

        let mut subs = Vec::new();
        for sub_id in sub_ids {
            if let Some(data) = subs_table.get(sub_id.as_str())? {
                let sub: SubscriptionRecord = rmp_serde::from_slice(data.value())?;
                subs.push(sub);
            }
        }

        Ok(subs)
    }

    /// The user's current active subscription, if any
    pub fn find_active_subscription(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<SubscriptionRecord>, DatabaseError> {
        let subs = self.get_subscriptions_for_user(user_id)?;
        Ok(subs.into_iter().find(|s| s.is_active_at(now)))
    }

    /// Recurring subscriptions whose end date has passed: candidates for
    /// the renewal phase of the expiry sweep.
    pub fn get_subscriptions_to_renew(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<SubscriptionRecord>, DatabaseError> {
        self.scan_subscriptions(|sub| {
            sub.recurring && sub.status == SubscriptionStatus::Active && sub.end_date <= now
        })
    }

    /// Past-due active subscriptions. Run after renewal so rolled-forward
    /// records no longer match.
    pub fn get_subscriptions_to_expire(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<SubscriptionRecord>, DatabaseError> {
        self.scan_subscriptions(|sub| {
            sub.status == SubscriptionStatus::Active && sub.end_date <= now
        })
    }

    pub fn get_all_subscriptions(&self) -> Result<Vec<SubscriptionRecord>, DatabaseError> {
        self.scan_subscriptions(|_| true)
    }

    /// Delete NEW subscriptions created before the cutoff (abandoned
    /// checkouts). Returns how many rows were removed.
    pub fn delete_stale_new_subscriptions(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, DatabaseError> {
        let stale: Vec<SubscriptionRecord> = self.scan_subscriptions(|sub| {
            sub.status == SubscriptionStatus::New && sub.created_at <= cutoff
        })?;

        if stale.is_empty() {
            return Ok(0);
        }

        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(SUBSCRIPTIONS)?;
            for sub in &stale {
                table.remove(sub.id.as_str())?;
            }

            let mut user_table = write_txn.open_table(USER_SUBSCRIPTIONS)?;
            for sub in &stale {
                let sub_ids: Option<Vec<String>> = match user_table.get(sub.user_id.as_str())? {
                    Some(data) => Some(rmp_serde::from_slice(data.value())?),
                    None => None,
                };

                if let Some(mut ids) = sub_ids {
                    ids.retain(|sid| sid != &sub.id);
                    if ids.is_empty() {
                        user_table.remove(sub.user_id.as_str())?;
                    } else {
                        let data = rmp_serde::to_vec_named(&ids)?;
                        user_table.insert(sub.user_id.as_str(), data.as_slice())?;
                    }
                }
            }
        }
        write_txn.commit()?;

        Ok(stale.len() as u64)
    }

    fn scan_subscriptions<F>(&self, keep: F) -> Result<Vec<SubscriptionRecord>, DatabaseError>
    where
        F: Fn(&SubscriptionRecord) -> bool,
    {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(SUBSCRIPTIONS)?;

        let mut subs = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let sub: SubscriptionRecord = rmp_serde::from_slice(value.value())?;
            if keep(&sub) {
                subs.push(sub);
            }
        }

        Ok(subs)
    }
}
