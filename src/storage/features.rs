use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::FeatureRecord;
use super::tables::*;

impl Database {
    // ========================================================================
    // Flair feature operations
    // ========================================================================

    pub fn put_feature(&self, feature: &FeatureRecord) -> Result<(), DatabaseError> {
        debug_assert!(!feature.id.is_empty(), "feature id must not be empty");

        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(FEATURES)?;
            let data = rmp_serde::to_vec_named(feature)?;
            table.insert(feature.id.as_str(), data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get_feature(&self, id: &str) -> Result<Option<FeatureRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(FEATURES)?;

        match table.get(id)? {
            Some(data) => {
                let feature: FeatureRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(feature))
            }
            None => Ok(None),
        }
    }

    pub fn delete_feature(&self, id: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;
        let deleted = {
            let mut table = write_txn.open_table(FEATURES)?;
            let existed = table.remove(id)?.is_some();
            existed
        };
        write_txn.commit()?;
        Ok(deleted)
    }

    pub fn get_all_features(&self) -> Result<Vec<FeatureRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(FEATURES)?;

        let mut features = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let feature: FeatureRecord = rmp_serde::from_slice(value.value())?;
            features.push(feature);
        }

        Ok(features)
    }
}
