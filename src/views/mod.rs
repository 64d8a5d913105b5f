//! Server-rendered pages. Small enough that plain string building beats a
//! template engine; everything user-controlled goes through [`esc`].

mod admin;
mod bigscreen;
mod profile;

pub use admin::{
    admin_emotes_page, admin_features_page, admin_index_page, admin_nav,
    admin_subscriptions_page, admin_users_page,
};
pub use bigscreen::bigscreen_page;
pub use profile::{profile_page, ProfileFlash};

/// HTML-escape text interpolated into a page.
pub fn esc(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Shared page shell.
pub fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<title>{title}</title>\n\
         <meta charset=\"utf-8\">\n</head>\n<body>\n{body}</body>\n</html>\n",
        title = esc(title),
        body = body,
    )
}
