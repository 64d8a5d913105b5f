use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::EmoteRecord;
use super::tables::*;

impl Database {
    // ========================================================================
    // Emote operations
    // ========================================================================

    pub fn put_emote(&self, emote: &EmoteRecord) -> Result<(), DatabaseError> {
        debug_assert!(!emote.id.is_empty(), "emote id must not be empty");

        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(EMOTES)?;
            let data = rmp_serde::to_vec_named(emote)?;
            table.insert(emote.id.as_str(), data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get_emote(&self, id: &str) -> Result<Option<EmoteRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(EMOTES)?;

        match table.get(id)? {
            Some(data) => {
                let emote: EmoteRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(emote))
            }
            None => Ok(None),
        }
    }

    pub fn delete_emote(&self, id: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;
        let deleted = {
            let mut table = write_txn.open_table(EMOTES)?;
            let existed = table.remove(id)?.is_some();
            existed
        };
        write_txn.commit()?;
        Ok(deleted)
    }

    pub fn get_all_emotes(&self) -> Result<Vec<EmoteRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(EMOTES)?;

        let mut emotes = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let emote: EmoteRecord = rmp_serde::from_slice(value.value())?;
            emotes.push(emote);
        }

        Ok(emotes)
    }
}
