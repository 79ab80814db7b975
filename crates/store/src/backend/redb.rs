//! Redb-backed call store.
//!
//! `call_records` maps the vendor token to a bincode-encoded [`CallRecord`];
//! `call_summaries` holds the matching [`CallSummary`] so history listings
//! never decode image blobs. Create and update each write both tables in a
//! single write transaction, so the duplicate check and the insert cannot
//! interleave with another writer.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use super::apply_result_url;
use crate::{
    decode_record, decode_summary, encode_record, encode_summary, CallRecord, CallStore,
    CallSummary, StoreError, UrlUpdate,
};

const CALL_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("call_records");
const SUMMARY_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("call_summaries");

pub struct RedbCallStore {
    db: Arc<Database>,
}

impl RedbCallStore {
    /// Open or create the database at `path`, creating parent directories.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(StoreError::backend)?;
        }
        let db = Database::create(path).map_err(StoreError::backend)?;

        let write_txn = db.begin_write().map_err(StoreError::backend)?;
        {
            // Opening a table creates it.
            write_txn
                .open_table(CALL_TABLE)
                .map_err(StoreError::backend)?;
            write_txn
                .open_table(SUMMARY_TABLE)
                .map_err(StoreError::backend)?;
        }
        write_txn.commit().map_err(StoreError::backend)?;

        debug!(path = %path.display(), "opened redb call store");
        Ok(Self { db: Arc::new(db) })
    }
}

impl CallStore for RedbCallStore {
    fn create(&self, record: CallRecord) -> Result<(), StoreError> {
        let encoded = encode_record(&record)?;
        let summary = encode_summary(&record.summary())?;
        let write_txn = self.db.begin_write().map_err(StoreError::backend)?;
        {
            let mut table = write_txn
                .open_table(CALL_TABLE)
                .map_err(StoreError::backend)?;
            let exists = table
                .get(record.token.as_str())
                .map_err(StoreError::backend)?
                .is_some();
            if exists {
                return Err(StoreError::DuplicateToken(record.token));
            }
            table
                .insert(record.token.as_str(), encoded.as_slice())
                .map_err(StoreError::backend)?;
            let mut summaries = write_txn
                .open_table(SUMMARY_TABLE)
                .map_err(StoreError::backend)?;
            summaries
                .insert(record.token.as_str(), summary.as_slice())
                .map_err(StoreError::backend)?;
        }
        write_txn.commit().map_err(StoreError::backend)?;
        Ok(())
    }

    fn update_result_url(&self, token: &str, url: &str) -> Result<UrlUpdate, StoreError> {
        let write_txn = self.db.begin_write().map_err(StoreError::backend)?;
        let outcome = {
            let mut table = write_txn
                .open_table(CALL_TABLE)
                .map_err(StoreError::backend)?;
            let mut record = match table.get(token).map_err(StoreError::backend)? {
                Some(value) => decode_record(value.value())?,
                None => return Err(StoreError::UnknownToken(token.to_string())),
            };
            let outcome = apply_result_url(&mut record, url);
            if outcome == UrlUpdate::Updated {
                let encoded = encode_record(&record)?;
                let summary = encode_summary(&record.summary())?;
                table
                    .insert(token, encoded.as_slice())
                    .map_err(StoreError::backend)?;
                let mut summaries = write_txn
                    .open_table(SUMMARY_TABLE)
                    .map_err(StoreError::backend)?;
                summaries
                    .insert(token, summary.as_slice())
                    .map_err(StoreError::backend)?;
            }
            outcome
        };
        match outcome {
            UrlUpdate::Updated => write_txn.commit().map_err(StoreError::backend)?,
            UrlUpdate::Unchanged => write_txn.abort().map_err(StoreError::backend)?,
        }
        Ok(outcome)
    }

    fn get(&self, token: &str) -> Result<Option<CallRecord>, StoreError> {
        let read_txn = self.db.begin_read().map_err(StoreError::backend)?;
        let table = read_txn
            .open_table(CALL_TABLE)
            .map_err(StoreError::backend)?;
        match table.get(token).map_err(StoreError::backend)? {
            Some(value) => Ok(Some(decode_record(value.value())?)),
            None => Ok(None),
        }
    }

    fn exists(&self, token: &str) -> Result<bool, StoreError> {
        let read_txn = self.db.begin_read().map_err(StoreError::backend)?;
        let table = read_txn
            .open_table(CALL_TABLE)
            .map_err(StoreError::backend)?;
        Ok(table.get(token).map_err(StoreError::backend)?.is_some())
    }

    fn scan(
        &self,
        visitor: &mut dyn FnMut(&CallRecord) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let read_txn = self.db.begin_read().map_err(StoreError::backend)?;
        let table = read_txn
            .open_table(CALL_TABLE)
            .map_err(StoreError::backend)?;
        for item in table.iter().map_err(StoreError::backend)? {
            let (_, value) = item.map_err(StoreError::backend)?;
            visitor(&decode_record(value.value())?)?;
        }
        Ok(())
    }

    fn scan_summaries(
        &self,
        visitor: &mut dyn FnMut(CallSummary) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let read_txn = self.db.begin_read().map_err(StoreError::backend)?;
        let table = read_txn
            .open_table(SUMMARY_TABLE)
            .map_err(StoreError::backend)?;
        for item in table.iter().map_err(StoreError::backend)? {
            let (_, value) = item.map_err(StoreError::backend)?;
            visitor(decode_summary(value.value())?)?;
        }
        Ok(())
    }
}
