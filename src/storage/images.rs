use std::collections::HashSet;

use chrono::{DateTime, Utc};
use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::{EmoteRecord, FeatureRecord, ImageRecord};
use super::tables::*;

impl Database {
    // ========================================================================
    // Image operations
    // ========================================================================

    /// Store an image record and update the stored-name index
    pub fn add_image(&self, image: &ImageRecord) -> Result<(), DatabaseError> {
        debug_assert!(!image.id.is_empty(), "image id must not be empty");
        debug_assert!(!image.name.is_empty(), "image name must not be empty");

        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(IMAGES)?;
            let data = rmp_serde::to_vec_named(image)?;
            table.insert(image.id.as_str(), data.as_slice())?;

            let mut name_table = write_txn.open_table(IMAGE_NAMES)?;
            name_table.insert(image.name.as_str(), image.id.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get an image by its UUID
    pub fn find_image_by_id(&self, id: &str) -> Result<Option<ImageRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(IMAGES)?;

        match table.get(id)? {
            Some(data) => {
                let image: ImageRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(image))
            }
            None => Ok(None),
        }
    }

    /// Get an image by its stored filename (resolves name -> uuid -> image)
    pub fn find_image_by_name(&self, name: &str) -> Result<Option<ImageRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let name_table = read_txn.open_table(IMAGE_NAMES)?;

        let id = match name_table.get(name)? {
            Some(data) => data.value().to_string(),
            None => return Ok(None),
        };

        let images_table = read_txn.open_table(IMAGES)?;
        match images_table.get(id.as_str())? {
            Some(data) => {
                let image: ImageRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(image))
            }
            None => Ok(None),
        }
    }

    /// Delete an image row by its UUID and clean up the name index.
    /// The backing file is the caller's concern.
    pub fn remove_image_by_id(&self, id: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;

        let name: Option<String> = {
            let table = write_txn.open_table(IMAGES)?;
            let result = match table.get(id)? {
                Some(data) => {
                    let image: ImageRecord = rmp_serde::from_slice(data.value())?;
                    Some(image.name)
                }
                None => None,
            };
            result
        };

        let deleted = match name {
            Some(name) => {
                {
                    let mut table = write_txn.open_table(IMAGES)?;
                    table.remove(id)?;
                }
                {
                    let mut name_table = write_txn.open_table(IMAGE_NAMES)?;
                    name_table.remove(name.as_str())?;
                }
                true
            }
            None => false,
        };

        write_txn.commit()?;
        Ok(deleted)
    }

    /// List images, optionally filtered by tag
    pub fn list_images(&self, tag: Option<&str>) -> Result<Vec<ImageRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(IMAGES)?;

        let mut images = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let image: ImageRecord = rmp_serde::from_slice(value.value())?;
            if tag.map_or(true, |t| image.tag == t) {
                images.push(image);
            }
        }

        Ok(images)
    }

    /// Images referenced by no emote and no feature, created before the
    /// cutoff. The age guard keeps just-uploaded images that have not been
    /// attached to anything yet from being treated as garbage.
    pub fn get_orphaned_images(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<ImageRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;

        let mut referenced: HashSet<String> = HashSet::new();
        {
            let emotes = read_txn.open_table(EMOTES)?;
            for result in emotes.iter()? {
                let (_, value) = result?;
                let emote: EmoteRecord = rmp_serde::from_slice(value.value())?;
                referenced.insert(emote.image_id);
            }
        }
        {
            let features = read_txn.open_table(FEATURES)?;
            for result in features.iter()? {
                let (_, value) = result?;
                let feature: FeatureRecord = rmp_serde::from_slice(value.value())?;
                referenced.insert(feature.image_id);
            }
        }

        let images_table = read_txn.open_table(IMAGES)?;
        let mut orphans = Vec::new();
        for result in images_table.iter()? {
            let (_, value) = result?;
            let image: ImageRecord = rmp_serde::from_slice(value.value())?;
            if image.created_at <= cutoff && !referenced.contains(&image.id) {
                orphans.push(image);
            }
        }

        Ok(orphans)
    }
}
