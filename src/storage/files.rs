use redb::{ReadableTable, ReadableTableMetadata};

use super::db::{Database, DatabaseError};
use super::models::{FileRecord, NewFileRecord};
use super::tables::*;

impl Database {
    // ========================================================================
    // File operations
    // ========================================================================

    /// Assign the next id, store the record and append it to its category index.
    pub fn create_file(&self, new: NewFileRecord) -> Result<FileRecord, DatabaseError> {
        debug_assert!(!new.location.is_empty(), "file location must not be empty");

        let write_txn = self.begin_write()?;
        let file = {
            let mut counters = write_txn.open_table(COUNTERS)?;
            let last = counters
                .get(FILE_ID_COUNTER)?
                .map(|v| v.value())
                .unwrap_or(0);
            let id = last + 1;
            counters.insert(FILE_ID_COUNTER, id)?;

            let file = new.into_record(id);

            let mut table = write_txn.open_table(FILES)?;
            let data = rmp_serde::to_vec_named(&file)?;
            table.insert(id, data.as_slice())?;

            let mut category_table = write_txn.open_table(CATEGORY_FILES)?;
            let mut file_ids: Vec<u64> = match category_table.get(file.category.as_str())? {
                Some(data) => rmp_serde::from_slice(data.value())?,
                None => Vec::new(),
            };
            file_ids.push(id);
            let index_data = rmp_serde::to_vec_named(&file_ids)?;
            category_table.insert(file.category.as_str(), index_data.as_slice())?;

            file
        };
        write_txn.commit()?;
        Ok(file)
    }

    /// Get a file by id
    pub fn get_file(&self, id: u64) -> Result<Option<FileRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(FILES)?;

        match table.get(id)? {
            Some(data) => {
                let file: FileRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(file))
            }
            None => Ok(None),
        }
    }

    /// Delete a file by id and drop it from the category index.
    /// Returns false when no such record exists.
    pub fn delete_file(&self, id: u64) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;

        let category: Option<String> = {
            let table = write_txn.open_table(FILES)?;
            let result = match table.get(id)? {
                Some(data) => {
                    let file: FileRecord = rmp_serde::from_slice(data.value())?;
                    Some(file.category)
                }
                None => None,
            };
            result
        };

        let deleted = match category {
            Some(category) => {
                {
                    let mut table = write_txn.open_table(FILES)?;
                    table.remove(id)?;
                }

                let file_ids: Option<Vec<u64>> = {
                    let category_table = write_txn.open_table(CATEGORY_FILES)?;
                    let result = match category_table.get(category.as_str())? {
                        Some(data) => Some(rmp_serde::from_slice(data.value())?),
                        None => None,
                    };
                    result
                };

                if let Some(mut ids) = file_ids {
                    ids.retain(|fid| *fid != id);
                    let mut category_table = write_txn.open_table(CATEGORY_FILES)?;
                    if ids.is_empty() {
                        category_table.remove(category.as_str())?;
                    } else {
                        let new_data = rmp_serde::to_vec_named(&ids)?;
                        category_table.insert(category.as_str(), new_data.as_slice())?;
                    }
                }
                true
            }
            None => false,
        };

        write_txn.commit()?;
        Ok(deleted)
    }

    /// All files in insertion order
    pub fn list_files(&self) -> Result<Vec<FileRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(FILES)?;

        let mut files = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let file: FileRecord = rmp_serde::from_slice(value.value())?;
            files.push(file);
        }

        Ok(files)
    }

    /// Files tagged with `category`, in insertion order
    pub fn list_by_category(&self, category: &str) -> Result<Vec<FileRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let category_table = read_txn.open_table(CATEGORY_FILES)?;
        let files_table = read_txn.open_table(FILES)?;

        let file_ids: Vec<u64> = match category_table.get(category)? {
            Some(data) => rmp_serde::from_slice(data.value())?,
            None => return Ok(Vec::new()),
        };

        let mut files = Vec::with_capacity(file_ids.len());
        for file_id in file_ids {
            if let Some(data) = files_table.get(file_id)? {
                let file: FileRecord = rmp_serde::from_slice(data.value())?;
                files.push(file);
            }
        }

        Ok(files)
    }

    /// Files whose name or description contains `term`. An empty term
    /// matches nothing.
    pub fn search(&self, term: &str) -> Result<Vec<FileRecord>, DatabaseError> {
        if term.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .list_files()?
            .into_iter()
            .filter(|f| f.matches(term))
            .collect())
    }

    /// Records whose stored object lives at `location`
    pub fn find_by_location(&self, location: &str) -> Result<Vec<FileRecord>, DatabaseError> {
        Ok(self
            .list_files()?
            .into_iter()
            .filter(|f| f.location == location)
            .collect())
    }

    /// Number of stored records
    pub fn count_files(&self) -> Result<u64, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(FILES)?;
        Ok(table.len()?)
    }

    /// Number of records in one category
    pub fn count_by_category(&self, category: &str) -> Result<u64, DatabaseError> {
        let read_txn = self.begin_read()?;
        let category_table = read_txn.open_table(CATEGORY_FILES)?;

        let file_ids: Vec<u64> = match category_table.get(category)? {
            Some(data) => rmp_serde::from_slice(data.value())?,
            None => Vec::new(),
        };
        Ok(file_ids.len() as u64)
    }
}
