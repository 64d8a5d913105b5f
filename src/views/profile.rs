use super::{esc, layout};
use crate::storage::models::UserRecord;

/// One-shot notice rendered at the top of the profile form
#[derive(Debug, Default)]
pub enum ProfileFlash {
    #[default]
    None,
    Updated,
    Error(String),
}

const COUNTRIES: &[(&str, &str)] = &[
    ("US", "United States"),
    ("GB", "United Kingdom"),
    ("AU", "Australia"),
    ("CA", "Canada"),
    ("DE", "Germany"),
    ("NL", "Netherlands"),
    ("SE", "Sweden"),
];

pub fn profile_page(
    user: &UserRecord,
    has_active_subscription: bool,
    name_change_limit: u32,
    flash: &ProfileFlash,
) -> String {
    let mut body = String::new();

    body.push_str(&format!(
        "<section class=\"container\">\n<h1 class=\"page-title\">Profile \
         <small>{}</small></h1>\n</section>\n",
        esc(&user.username)
    ));

    if !has_active_subscription {
        body.push_str(
            "<section class=\"container\">\n<p><span class=\"label\">Subscription</span> \
             You have no active subscriptions. Click <a href=\"/subscribe\">here</a> to \
             get one!</p>\n</section>\n",
        );
    }

    body.push_str("<section class=\"container\">\n<h3>Account</h3>\n");

    match flash {
        ProfileFlash::Updated => {
            body.push_str(
                "<div class=\"alert alert-info\"><strong>Success!</strong> \
                 Your profile has been updated</div>\n",
            );
        }
        ProfileFlash::Error(message) => {
            body.push_str(&format!(
                "<div class=\"alert alert-error\"><strong>Error!</strong> {}</div>\n",
                esc(message)
            ));
        }
        ProfileFlash::None => {}
    }

    body.push_str("<form id=\"profileSaveForm\" action=\"/profile\" method=\"post\">\n");

    if user.name_changed_count < name_change_limit {
        let left = name_change_limit - user.name_changed_count;
        body.push_str(&format!(
            "<div class=\"control-group\">\n<label>Username: \
             <small>(You have {left} name changes left)</small></label>\n\
             <input type=\"text\" name=\"username\" value=\"{}\" placeholder=\"Username\">\n\
             <span class=\"help-block\">A-z 0-9 and underscores. Must contain at least 4 \
             and at most 20 characters</span>\n</div>\n",
            esc(&user.username)
        ));
    } else {
        body.push_str(&format!(
            "<div class=\"control-group\">\n<label>Username: \
             <small>(You have no more name changes available)</small></label>\n\
             <input type=\"text\" disabled=\"disabled\" name=\"username\" value=\"{}\" \
             placeholder=\"Username\">\n</div>\n",
            esc(&user.username)
        ));
    }

    body.push_str(&format!(
        "<div class=\"control-group\">\n<label>Email:</label>\n\
         <input type=\"text\" name=\"email\" value=\"{}\" placeholder=\"Email\">\n\
         <span class=\"help-block\">Be it valid or not, it will be safe with us.</span>\n\
         </div>\n",
        esc(&user.email)
    ));

    body.push_str("<div class=\"control-group\">\n<label>Country:</label>\n<select name=\"country\">\n<option value=\"\">Select your country</option>\n");
    for (code, name) in COUNTRIES {
        let selected = if user.country == *code {
            " selected=\"selected\""
        } else {
            ""
        };
        body.push_str(&format!(
            "<option value=\"{code}\"{selected}>{name}</option>\n"
        ));
    }
    body.push_str("</select>\n</div>\n");

    body.push_str(
        "<div class=\"form-actions\">\n<button class=\"btn\" type=\"submit\">Save \
         changes</button>\n</div>\n</form>\n</section>\n",
    );

    layout("Profile", &body)
}
