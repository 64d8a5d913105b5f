pub mod db;
mod emotes;
mod features;
mod images;
pub mod models;
mod subscriptions;
mod tables;
mod users;

pub use db::{Database, DatabaseError, PurgeStats};
pub use tables::*;
