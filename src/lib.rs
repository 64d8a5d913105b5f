//! streamsite - Community site services for a livestream
//!
//! This crate provides the site's self-hosted backend pieces:
//! - Image uploads for emotes and flair icons (validation, hashing, storage)
//! - Subscription lifecycle sweeps (renewal, expiration, checkout cleanup)
//! - Server-rendered pages (bigscreen, profile, admin)
//! - redb embedded database for site records (ACID, MVCC, crash-safe)
//!
//! Authentication lives upstream; requests arrive with identity headers
//! from the auth proxy. Chat and the alert service are reached over Redis
//! and HTTP respectively.

pub mod api;
pub mod cache;
pub mod config;
pub mod images;
pub mod notify;
pub mod storage;
pub mod tasks;
pub mod views;

use std::sync::Arc;

use cache::SiteCache;
use config::Config;
use images::store::ImageDir;
use storage::Database;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub images: ImageDir,
    pub cache: Arc<dyn SiteCache>,
}
