use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::UserRecord;
use super::tables::*;

impl Database {
    // ========================================================================
    // User operations
    // ========================================================================

    /// Store a user record and update the username index
    pub fn put_user(&self, user: &UserRecord) -> Result<(), DatabaseError> {
        debug_assert!(!user.id.is_empty(), "user id must not be empty");
        debug_assert!(!user.username.is_empty(), "username must not be empty");

        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(USERS)?;
            let data = rmp_serde::to_vec_named(user)?;
            table.insert(user.id.as_str(), data.as_slice())?;

            let mut username_table = write_txn.open_table(USERNAMES)?;
            username_table.insert(user.username.as_str(), user.id.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get_user(&self, id: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(USERS)?;

        match table.get(id)? {
            Some(data) => {
                let user: UserRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    /// Check if a username is already taken
    pub fn username_exists(&self, username: &str) -> Result<bool, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(USERNAMES)?;
        Ok(table.get(username)?.is_some())
    }

    /// Update a user's profile fields. A username change swaps the index
    /// entry and bumps `name_changed_count`; quota enforcement is the
    /// caller's concern.
    pub fn update_user_profile(
        &self,
        id: &str,
        username: Option<&str>,
        email: Option<&str>,
        country: Option<&str>,
    ) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;

        let existing = {
            let table = write_txn.open_table(USERS)?;
            let result = match table.get(id)? {
                Some(data) => {
                    let user: UserRecord = rmp_serde::from_slice(data.value())?;
                    Some(user)
                }
                None => None,
            };
            result
        };

        let updated = match existing {
            Some(mut user) => {
                if let Some(new_username) = username {
                    if new_username != user.username {
                        {
                            let mut username_table = write_txn.open_table(USERNAMES)?;
                            username_table.remove(user.username.as_str())?;
                            username_table.insert(new_username, id)?;
                        }
                        user.username = new_username.to_string();
                        user.name_changed_count += 1;
                    }
                }
                if let Some(email) = email {
                    user.email = email.to_string();
                }
                if let Some(country) = country {
                    user.country = country.to_string();
                }

                user.updated_at = chrono::Utc::now();

                let serialized = rmp_serde::to_vec_named(&user)?;
                let mut table = write_txn.open_table(USERS)?;
                table.insert(id, serialized.as_slice())?;
                true
            }
            None => false,
        };

        write_txn.commit()?;
        Ok(updated)
    }

    pub fn get_all_users(&self) -> Result<Vec<UserRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(USERS)?;

        let mut users = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let user: UserRecord = rmp_serde::from_slice(value.value())?;
            users.push(user);
        }

        Ok(users)
    }
}
