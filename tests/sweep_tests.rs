use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Months, TimeZone, Utc};
use streamsite::cache::{MemoryCache, SiteCache};
use streamsite::images::store::ImageDir;
use streamsite::notify::{AlertKind, Announcer, NotifyError};
use streamsite::storage::models::{
    EmoteRecord, ImageRecord, SubscriptionRecord, SubscriptionStatus, SubscriptionType, UserRecord,
};
use streamsite::storage::Database;
use streamsite::tasks::subscription_expire::{next_end_date, whole_months_between};
use streamsite::tasks::{ImagePurge, SubscriptionExpiry};

fn test_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("data")).unwrap();
    (dir, db)
}

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
}

#[derive(Default)]
struct RecordingAnnouncer {
    broadcasts: tokio::sync::Mutex<Vec<String>>,
    alerts: tokio::sync::Mutex<Vec<String>>,
}

#[async_trait]
impl Announcer for RecordingAnnouncer {
    async fn send_broadcast(&self, message: &str) -> Result<(), NotifyError> {
        self.broadcasts.lock().await.push(message.to_string());
        Ok(())
    }

    async fn send_alert(&self, message: &str, _kind: AlertKind) -> Result<(), NotifyError> {
        self.alerts.lock().await.push(message.to_string());
        Ok(())
    }
}

struct FailingAnnouncer;

#[async_trait]
impl Announcer for FailingAnnouncer {
    async fn send_broadcast(&self, _message: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Rejected("chat is down".to_string()))
    }

    async fn send_alert(&self, _message: &str, _kind: AlertKind) -> Result<(), NotifyError> {
        Err(NotifyError::Rejected("alerts are down".to_string()))
    }
}

fn sweeper(db: &Database) -> (SubscriptionExpiry, Arc<MemoryCache>, Arc<RecordingAnnouncer>) {
    let cache = Arc::new(MemoryCache::new());
    let announcer = Arc::new(RecordingAnnouncer::default());
    let expiry = SubscriptionExpiry::new(
        db.clone(),
        Arc::clone(&cache) as Arc<dyn SiteCache>,
        Arc::clone(&announcer) as Arc<dyn Announcer>,
    );
    (expiry, cache, announcer)
}

fn user(db: &Database, id: &str, username: &str) {
    let now = fixed_now();
    db.put_user(&UserRecord {
        id: id.to_string(),
        username: username.to_string(),
        email: String::new(),
        country: String::new(),
        name_changed_count: 0,
        created_at: now - Duration::days(365),
        updated_at: now - Duration::days(365),
    })
    .unwrap();
}

fn subscription(
    id: &str,
    user_id: &str,
    status: SubscriptionStatus,
    recurring: bool,
    end_date: DateTime<Utc>,
    created_at: DateTime<Utc>,
) -> SubscriptionRecord {
    SubscriptionRecord {
        id: id.to_string(),
        user_id: user_id.to_string(),
        subscription_type: "monthly".to_string(),
        status,
        recurring,
        end_date,
        created_at,
        updated_at: created_at,
    }
}

// ============================================================================
// Date arithmetic
// ============================================================================

#[test]
fn test_whole_months_between() {
    let now = fixed_now();

    assert_eq!(whole_months_between(now, now), 0);
    assert_eq!(whole_months_between(now + Duration::days(10), now), 0);
    assert_eq!(whole_months_between(now - Duration::days(10), now), 0);
    assert_eq!(
        whole_months_between(now.checked_sub_months(Months::new(3)).unwrap(), now),
        3
    );
    assert_eq!(
        whole_months_between(
            now.checked_sub_months(Months::new(3)).unwrap() - Duration::days(5),
            now
        ),
        3
    );
    assert_eq!(
        whole_months_between(now.checked_sub_months(Months::new(26)).unwrap(), now),
        26
    );
}

#[test]
fn test_whole_months_between_month_end_clamping() {
    // Jan 31 -> Mar 1 is one whole month (Jan 31 + 1mo clamps to Feb 29)
    let from = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    assert_eq!(whole_months_between(from, to), 1);
}

#[test]
fn test_next_end_date_catches_up_missed_periods() {
    let now = fixed_now();
    let monthly = SubscriptionType::find("monthly").unwrap();

    // Three whole periods behind: catch up 3, advance 1, land a month out
    let end = now.checked_sub_months(Months::new(3)).unwrap();
    let next = next_end_date(end, now, monthly).unwrap();
    assert_eq!(next, now.checked_add_months(Months::new(1)).unwrap());
    assert!(next > now);
}

#[test]
fn test_next_end_date_on_time_renewal() {
    let now = fixed_now();
    let monthly = SubscriptionType::find("monthly").unwrap();

    // Due right now: a single period forward
    let next = next_end_date(now, now, monthly).unwrap();
    assert_eq!(next, now.checked_add_months(Months::new(1)).unwrap());
}

#[test]
fn test_next_end_date_annual_period() {
    let now = fixed_now();
    let annual = SubscriptionType::find("annual").unwrap();

    let end = now.checked_sub_months(Months::new(2)).unwrap();
    let next = next_end_date(end, now, annual).unwrap();
    // Catch up 2 months, then a full year
    assert_eq!(next, now.checked_add_months(Months::new(12)).unwrap());
}

// ============================================================================
// Sweep passes
// ============================================================================

#[tokio::test]
async fn test_sweep_renews_recurring_subscription() {
    let (_dir, db) = test_db();
    let (expiry, cache, announcer) = sweeper(&db);
    let now = fixed_now();

    user(&db, "u1", "alice");
    let end = now.checked_sub_months(Months::new(3)).unwrap();
    let created = now.checked_sub_months(Months::new(9)).unwrap();
    db.put_subscription(&subscription(
        "s1",
        "u1",
        SubscriptionStatus::Active,
        true,
        end,
        created,
    ))
    .unwrap();

    let stats = expiry.execute(now).await.unwrap();
    assert_eq!(stats.renewed, 1);
    assert_eq!(stats.expired, 0);

    let sub = db.find_subscription_by_id("s1").unwrap().unwrap();
    assert_eq!(sub.status, SubscriptionStatus::Active);
    assert_eq!(sub.end_date, now.checked_add_months(Months::new(1)).unwrap());
    assert!(sub.end_date > now);

    assert_eq!(cache.flagged_users().await, vec!["u1".to_string()]);

    let broadcasts = announcer.broadcasts.lock().await;
    assert_eq!(broadcasts.len(), 1);
    assert!(broadcasts[0].contains("alice has resubscribed"));
    assert!(broadcasts[0].contains("6 months"));
    assert_eq!(announcer.alerts.lock().await.len(), 1);
}

#[tokio::test]
async fn test_sweep_expires_past_due_subscription() {
    let (_dir, db) = test_db();
    let (expiry, cache, announcer) = sweeper(&db);
    let now = fixed_now();

    user(&db, "u2", "bob");
    db.put_subscription(&subscription(
        "s2",
        "u2",
        SubscriptionStatus::Active,
        false,
        now - Duration::days(1),
        now - Duration::days(31),
    ))
    .unwrap();

    let stats = expiry.execute(now).await.unwrap();
    assert_eq!(stats.renewed, 0);
    assert_eq!(stats.expired, 1);

    let sub = db.find_subscription_by_id("s2").unwrap().unwrap();
    assert_eq!(sub.status, SubscriptionStatus::Expired);

    assert_eq!(cache.flagged_users().await, vec!["u2".to_string()]);
    assert!(announcer.broadcasts.lock().await.is_empty());
}

#[tokio::test]
async fn test_sweep_skips_and_expires_unrenewable_record() {
    let (_dir, db) = test_db();
    let (expiry, _cache, _announcer) = sweeper(&db);
    let now = fixed_now();

    user(&db, "u3", "carol");
    let mut sub = subscription(
        "s3",
        "u3",
        SubscriptionStatus::Active,
        true,
        now - Duration::days(1),
        now - Duration::days(31),
    );
    sub.subscription_type = "lifetime".to_string();
    db.put_subscription(&sub).unwrap();

    // The bad record cannot roll over, so the expiration phase claims it;
    // the pass itself still succeeds.
    let stats = expiry.execute(now).await.unwrap();
    assert_eq!(stats.renewed, 0);
    assert_eq!(stats.expired, 1);

    let sub = db.find_subscription_by_id("s3").unwrap().unwrap();
    assert_eq!(sub.status, SubscriptionStatus::Expired);
}

#[tokio::test]
async fn test_sweep_purges_stale_new_rows() {
    let (_dir, db) = test_db();
    let (expiry, cache, _announcer) = sweeper(&db);
    let now = fixed_now();

    db.put_subscription(&subscription(
        "stale",
        "u1",
        SubscriptionStatus::New,
        false,
        now,
        now - Duration::hours(2),
    ))
    .unwrap();
    db.put_subscription(&subscription(
        "fresh",
        "u1",
        SubscriptionStatus::New,
        false,
        now,
        now - Duration::minutes(10),
    ))
    .unwrap();

    let stats = expiry.execute(now).await.unwrap();
    assert_eq!(stats.purged, 1);

    assert!(db.find_subscription_by_id("stale").unwrap().is_none());
    assert!(db.find_subscription_by_id("fresh").unwrap().is_some());

    // Abandoned checkouts never granted anything, so nobody is flagged
    assert!(cache.flagged_users().await.is_empty());
}

#[tokio::test]
async fn test_sweep_flags_each_user_once() {
    let (_dir, db) = test_db();
    let (expiry, cache, _announcer) = sweeper(&db);
    let now = fixed_now();

    user(&db, "u4", "dave");
    db.put_subscription(&subscription(
        "renew-me",
        "u4",
        SubscriptionStatus::Active,
        true,
        now - Duration::days(2),
        now.checked_sub_months(Months::new(1)).unwrap(),
    ))
    .unwrap();
    db.put_subscription(&subscription(
        "expire-me",
        "u4",
        SubscriptionStatus::Active,
        false,
        now - Duration::days(2),
        now.checked_sub_months(Months::new(2)).unwrap(),
    ))
    .unwrap();

    expiry.execute(now).await.unwrap();

    assert_eq!(cache.flagged_users().await, vec!["u4".to_string()]);
}

#[tokio::test]
async fn test_sweep_renewal_survives_broadcast_failure() {
    let (_dir, db) = test_db();
    let cache = Arc::new(MemoryCache::new());
    let expiry = SubscriptionExpiry::new(
        db.clone(),
        Arc::clone(&cache) as Arc<dyn SiteCache>,
        Arc::new(FailingAnnouncer) as Arc<dyn Announcer>,
    );
    let now = fixed_now();

    user(&db, "u5", "erin");
    db.put_subscription(&subscription(
        "s5",
        "u5",
        SubscriptionStatus::Active,
        true,
        now - Duration::days(1),
        now.checked_sub_months(Months::new(1)).unwrap(),
    ))
    .unwrap();

    let stats = expiry.execute(now).await.unwrap();
    assert_eq!(stats.renewed, 1);

    let sub = db.find_subscription_by_id("s5").unwrap().unwrap();
    assert_eq!(sub.status, SubscriptionStatus::Active);
    assert!(sub.end_date > now);
    assert_eq!(cache.flagged_users().await, vec!["u5".to_string()]);
}

#[tokio::test]
async fn test_sweep_renewal_without_user_row_sends_nothing() {
    let (_dir, db) = test_db();
    let (expiry, _cache, announcer) = sweeper(&db);
    let now = fixed_now();

    db.put_subscription(&subscription(
        "s6",
        "ghost",
        SubscriptionStatus::Active,
        true,
        now - Duration::days(1),
        now.checked_sub_months(Months::new(1)).unwrap(),
    ))
    .unwrap();

    let stats = expiry.execute(now).await.unwrap();
    assert_eq!(stats.renewed, 1);
    assert!(announcer.broadcasts.lock().await.is_empty());
    assert!(announcer.alerts.lock().await.is_empty());
}

// ============================================================================
// Image purge
// ============================================================================

fn image(id: &str, name: &str, created_at: DateTime<Utc>) -> ImageRecord {
    ImageRecord {
        id: id.to_string(),
        label: "upload.png".to_string(),
        name: name.to_string(),
        hash: "00".repeat(16),
        byte_size: 4,
        mime_type: "image/png".to_string(),
        width: 2,
        height: 2,
        tag: String::new(),
        created_at,
        updated_at: created_at,
    }
}

#[tokio::test]
async fn test_image_purge_removes_only_old_orphans() {
    let (_dir, db) = test_db();
    let files_dir = tempfile::tempdir().unwrap();
    let images = ImageDir::new(files_dir.path()).unwrap();
    let now = fixed_now();

    db.add_image(&image("orphan", "orphan.png", now - Duration::hours(2)))
        .unwrap();
    db.add_image(&image("used", "used.png", now - Duration::hours(2)))
        .unwrap();
    db.add_image(&image("fresh", "fresh.png", now - Duration::minutes(5)))
        .unwrap();
    db.put_emote(&EmoteRecord {
        id: "e1".to_string(),
        prefix: "Kappa".to_string(),
        image_id: "used".to_string(),
        created_at: now,
    })
    .unwrap();

    for name in ["orphan.png", "used.png", "fresh.png"] {
        images.save(name, b"data").await.unwrap();
    }

    let purge = ImagePurge::new(db.clone(), images.clone());
    let removed = purge.execute(now).await.unwrap();
    assert_eq!(removed, 1);

    assert!(db.find_image_by_id("orphan").unwrap().is_none());
    assert!(!images.exists("orphan.png").await.unwrap());

    assert!(db.find_image_by_id("used").unwrap().is_some());
    assert!(images.exists("used.png").await.unwrap());
    assert!(db.find_image_by_id("fresh").unwrap().is_some());
    assert!(images.exists("fresh.png").await.unwrap());
}

#[tokio::test]
async fn test_image_purge_tolerates_missing_file() {
    let (_dir, db) = test_db();
    let files_dir = tempfile::tempdir().unwrap();
    let images = ImageDir::new(files_dir.path()).unwrap();
    let now = fixed_now();

    // Row without a backing file (crashed upload)
    db.add_image(&image("rowonly", "rowonly.png", now - Duration::hours(2)))
        .unwrap();

    let purge = ImagePurge::new(db.clone(), images);
    let removed = purge.execute(now).await.unwrap();
    assert_eq!(removed, 1);
    assert!(db.find_image_by_id("rowonly").unwrap().is_none());
}
