use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::images::store::ImageDir;
use crate::storage::{Database, DatabaseError};

/// Periodic sweep deleting images nothing references anymore: the backing
/// file first (best-effort), then the row. Uploads get an hour of grace
/// before they are considered orphaned.
pub struct ImagePurge {
    db: Database,
    images: ImageDir,
}

impl ImagePurge {
    pub fn new(db: Database, images: ImageDir) -> Self {
        Self { db, images }
    }

    pub async fn run(self, interval: Duration) {
        let mut interval = tokio::time::interval(interval);
        loop {
            interval.tick().await;
            match self.execute(Utc::now()).await {
                Ok(removed) => {
                    if removed > 0 {
                        info!(removed, "image purge finished");
                    }
                }
                Err(e) => error!(error = %e, "image purge failed"),
            }
        }
    }

    pub async fn execute(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError> {
        let orphans = self
            .db
            .get_orphaned_images(now - chrono::Duration::hours(1))?;

        let mut removed = 0;
        for image in orphans {
            if let Err(e) = self.images.remove(&image.name).await {
                warn!(image_id = %image.id, error = %e, "could not remove orphaned image file");
            }
            match self.db.remove_image_by_id(&image.id) {
                Ok(_) => removed += 1,
                Err(e) => {
                    error!(image_id = %image.id, error = %e, "could not remove orphaned image row");
                }
            }
        }

        Ok(removed)
    }
}
