use super::{esc, layout};
use crate::api::session::{Session, UserRole};
use crate::storage::models::{EmoteRecord, FeatureRecord, SubscriptionRecord, UserRecord};

/// Role-gated admin breadcrumb. Each item renders only for sessions
/// holding the matching role.
pub fn admin_nav(session: &Session) -> String {
    let mut items = String::new();

    if session.has_role(UserRole::Moderator) {
        items.push_str("<li class=\"breadcrumb-item\"><a href=\"/admin/users\">Users</a></li>\n");
    }
    if session.has_role(UserRole::Finance) {
        items.push_str(
            "<li class=\"breadcrumb-item\"><a href=\"/admin/subscriptions\">Subscriptions</a></li>\n",
        );
    }
    if session.has_role(UserRole::Emotes) {
        items.push_str("<li class=\"breadcrumb-item\"><a href=\"/admin/emotes\">Emotes</a></li>\n");
    }
    if session.has_role(UserRole::Features) {
        items.push_str(
            "<li class=\"breadcrumb-item\"><a href=\"/admin/features\">Features</a></li>\n",
        );
    }

    format!("<section class=\"container\">\n<ol class=\"breadcrumb\">\n{items}</ol>\n</section>\n")
}

pub fn admin_index_page(session: &Session) -> String {
    layout("Admin", &admin_nav(session))
}

pub fn admin_users_page(session: &Session, users: &[UserRecord]) -> String {
    let mut body = admin_nav(session);
    body.push_str(
        "<section class=\"container\">\n<h3>Users</h3>\n<table class=\"table\">\n\
         <tr><th>Username</th><th>Email</th><th>Country</th><th>Name changes</th></tr>\n",
    );
    for user in users {
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            esc(&user.username),
            esc(&user.email),
            esc(&user.country),
            user.name_changed_count,
        ));
    }
    body.push_str("</table>\n</section>\n");
    layout("Admin - Users", &body)
}

pub fn admin_subscriptions_page(session: &Session, subs: &[SubscriptionRecord]) -> String {
    let mut body = admin_nav(session);
    body.push_str(
        "<section class=\"container\">\n<h3>Subscriptions</h3>\n<table class=\"table\">\n\
         <tr><th>User</th><th>Type</th><th>Status</th><th>Recurring</th><th>End date</th></tr>\n",
    );
    for sub in subs {
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            esc(&sub.user_id),
            esc(&sub.subscription_type),
            sub.status,
            if sub.recurring { "yes" } else { "no" },
            sub.end_date.format("%Y-%m-%d %H:%M"),
        ));
    }
    body.push_str("</table>\n</section>\n");
    layout("Admin - Subscriptions", &body)
}

pub fn admin_emotes_page(session: &Session, emotes: &[EmoteRecord]) -> String {
    let mut body = admin_nav(session);
    body.push_str(
        "<section class=\"container\">\n<h3>Emotes</h3>\n<table class=\"table\">\n\
         <tr><th>Prefix</th><th>Image</th><th>Created</th></tr>\n",
    );
    for emote in emotes {
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            esc(&emote.prefix),
            esc(&emote.image_id),
            emote.created_at.format("%Y-%m-%d"),
        ));
    }
    body.push_str("</table>\n</section>\n");
    layout("Admin - Emotes", &body)
}

pub fn admin_features_page(session: &Session, features: &[FeatureRecord]) -> String {
    let mut body = admin_nav(session);
    body.push_str(
        "<section class=\"container\">\n<h3>Features</h3>\n<table class=\"table\">\n\
         <tr><th>Label</th><th>Image</th><th>Created</th></tr>\n",
    );
    for feature in features {
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            esc(&feature.label),
            esc(&feature.image_id),
            feature.created_at.format("%Y-%m-%d"),
        ));
    }
    body.push_str("</table>\n</section>\n");
    layout("Admin - Features", &body)
}
