pub mod image_purge;
pub mod subscription_expire;

pub use image_purge::ImagePurge;
pub use subscription_expire::{SubscriptionExpiry, SweepError, SweepStats};
