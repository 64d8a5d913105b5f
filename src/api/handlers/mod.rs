mod admin;
mod emotes;
mod features;
mod images;
mod pages;
mod profile;
mod subscriptions;

pub use admin::{admin_purge, create_user, health, put_streaminfo};
pub use emotes::{create_emote, delete_emote, list_emotes};
pub use features::{create_feature, delete_feature, list_features};
pub use images::{delete_image, get_image, list_images, serve_image, upload_image};
pub use pages::{
    admin_emotes, admin_features, admin_index, admin_subscriptions, admin_users, bigscreen,
};
pub use profile::{show_profile, update_profile};
pub use subscriptions::{confirm_subscription, start_subscription};
