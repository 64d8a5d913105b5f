use chrono::{TimeZone, Utc};
use streamsite::api::session::{Session, UserRole};
use streamsite::storage::models::{SubscriptionRecord, SubscriptionStatus, UserRecord};
use streamsite::views::{
    admin_nav, bigscreen_page, esc, profile_page, ProfileFlash,
};

fn sample_user(name_changed_count: u32) -> UserRecord {
    let now = Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap();
    UserRecord {
        id: "u1".to_string(),
        username: "alice".to_string(),
        email: "alice@example.com".to_string(),
        country: "GB".to_string(),
        name_changed_count,
        created_at: now,
        updated_at: now,
    }
}

// ============================================================================
// Escaping
// ============================================================================

#[test]
fn test_esc_neutralises_markup() {
    assert_eq!(
        esc("<script>alert('x')</script>"),
        "&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"
    );
    assert_eq!(esc("a & \"b\""), "a &amp; &quot;b&quot;");
    assert_eq!(esc("plain"), "plain");
}

#[test]
fn test_profile_page_escapes_username() {
    let mut user = sample_user(0);
    user.username = "<b>alice</b>".to_string();

    let html = profile_page(&user, true, 1, &ProfileFlash::None);
    assert!(!html.contains("<b>alice</b>"));
    assert!(html.contains("&lt;b&gt;alice&lt;/b&gt;"));
}

// ============================================================================
// Profile page conditionals
// ============================================================================

#[test]
fn test_profile_page_shows_remaining_name_changes() {
    let html = profile_page(&sample_user(0), true, 2, &ProfileFlash::None);

    assert!(html.contains("You have 2 name changes left"));
    assert!(!html.contains("disabled=\"disabled\""));
    assert!(html.contains("value=\"alice\""));
}

#[test]
fn test_profile_page_disables_username_when_quota_spent() {
    let html = profile_page(&sample_user(1), true, 1, &ProfileFlash::None);

    assert!(html.contains("You have no more name changes available"));
    assert!(html.contains("disabled=\"disabled\""));
}

#[test]
fn test_profile_page_subscription_banner() {
    let with_sub = profile_page(&sample_user(0), true, 1, &ProfileFlash::None);
    assert!(!with_sub.contains("You have no active subscriptions"));

    let without_sub = profile_page(&sample_user(0), false, 1, &ProfileFlash::None);
    assert!(without_sub.contains("You have no active subscriptions"));
}

#[test]
fn test_profile_page_country_selection() {
    let html = profile_page(&sample_user(0), true, 1, &ProfileFlash::None);
    assert!(html.contains("<option value=\"GB\" selected=\"selected\">United Kingdom</option>"));
    assert!(html.contains("<option value=\"US\">United States</option>"));
}

#[test]
fn test_profile_page_flash_blocks() {
    let updated = profile_page(&sample_user(0), true, 1, &ProfileFlash::Updated);
    assert!(updated.contains("Your profile has been updated"));

    let error = profile_page(
        &sample_user(0),
        true,
        1,
        &ProfileFlash::Error("Username is already taken".to_string()),
    );
    assert!(error.contains("alert-error"));
    assert!(error.contains("Username is already taken"));

    let plain = profile_page(&sample_user(0), true, 1, &ProfileFlash::None);
    assert!(!plain.contains("alert-info"));
    assert!(!plain.contains("alert-error"));
}

// ============================================================================
// Admin nav
// ============================================================================

#[test]
fn test_admin_nav_renders_items_per_role() {
    let nav = admin_nav(&Session::with_roles("u1", &[UserRole::Moderator]));
    assert!(nav.contains("/admin/users"));
    assert!(!nav.contains("/admin/subscriptions"));
    assert!(!nav.contains("/admin/emotes"));

    let nav = admin_nav(&Session::with_roles(
        "u1",
        &[UserRole::Finance, UserRole::Emotes],
    ));
    assert!(!nav.contains("/admin/users"));
    assert!(nav.contains("/admin/subscriptions"));
    assert!(nav.contains("/admin/emotes"));
    assert!(!nav.contains("/admin/features"));
}

#[test]
fn test_admin_nav_empty_for_anonymous() {
    let nav = admin_nav(&Session::anonymous());
    assert!(!nav.contains("breadcrumb-item"));
}

// ============================================================================
// Bigscreen
// ============================================================================

#[test]
fn test_bigscreen_offline_without_stream_info() {
    let html = bigscreen_page(None);
    assert!(html.contains("Stream is offline."));
}

#[test]
fn test_bigscreen_offline_when_not_live() {
    let info = serde_json::json!({ "live": false, "title": "later", "viewers": 0 });
    let html = bigscreen_page(Some(&info));
    assert!(html.contains("Stream is offline."));
}

#[test]
fn test_bigscreen_live_stream_info() {
    let info = serde_json::json!({ "live": true, "title": "speedrun <3", "viewers": 1234 });
    let html = bigscreen_page(Some(&info));
    assert!(html.contains("Live: speedrun &lt;3"));
    assert!(html.contains("1234 viewers"));
}

// ============================================================================
// Admin tables
// ============================================================================

#[test]
fn test_admin_subscriptions_page_lists_rows() {
    let now = Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap();
    let sub = SubscriptionRecord {
        id: "s1".to_string(),
        user_id: "u1".to_string(),
        subscription_type: "monthly".to_string(),
        status: SubscriptionStatus::Active,
        recurring: true,
        end_date: now,
        created_at: now,
        updated_at: now,
    };
    let session = Session::with_roles("admin", &[UserRole::Finance]);

    let html = streamsite::views::admin_subscriptions_page(&session, &[sub]);
    assert!(html.contains("ACTIVE"));
    assert!(html.contains("monthly"));
    assert!(html.contains("2024-05-15"));
}
