//! Sharded JSON file store.
//!
//! Each referral is one JSON document at
//! `<data_dir>/referrals/<s1>/<s2>/<32hex-id>/referral.json`, where `s1`/`s2`
//! are the first four hex characters of the id. Replacement writes the whole
//! document to a temporary file and renames it into place, so readers never
//! observe a half-written document.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::CoreConfig;
use crate::query::QuerySpec;
use crate::referral::{Referral, ReferralId};
use crate::store::{ReferralStore, StoreError};

const DOCUMENT_FILE_NAME: &str = "referral.json";

/// A referral store backed by sharded JSON documents on disk.
pub struct FileStore {
    referrals_dir: PathBuf,
}

impl FileStore {
    /// Open (creating if necessary) the store under the configured data
    /// directory.
    pub fn open(cfg: &CoreConfig) -> Result<Self, StoreError> {
        let referrals_dir = cfg.referrals_dir();
        fs::create_dir_all(&referrals_dir).map_err(StoreError::StorageDirCreation)?;
        Ok(Self { referrals_dir })
    }

    fn document_dir(&self, id: ReferralId) -> PathBuf {
        let hex = id.simple().to_string();
        self.referrals_dir
            .join(&hex[0..2])
            .join(&hex[2..4])
            .join(&hex)
    }

    fn document_path(&self, id: ReferralId) -> PathBuf {
        self.document_dir(id).join(DOCUMENT_FILE_NAME)
    }

    fn read_document(path: &Path) -> Result<Referral, StoreError> {
        let contents = fs::read_to_string(path).map_err(StoreError::DocumentRead)?;
        serde_json::from_str(&contents).map_err(StoreError::Deserialization)
    }

    fn write_document(&self, referral: &Referral) -> Result<(), StoreError> {
        let dir = self.document_dir(referral.id);
        fs::create_dir_all(&dir).map_err(StoreError::StorageDirCreation)?;

        let contents =
            serde_json::to_string_pretty(referral).map_err(StoreError::Serialization)?;

        let tmp_path = dir.join(format!("{DOCUMENT_FILE_NAME}.tmp"));
        let final_path = dir.join(DOCUMENT_FILE_NAME);
        fs::write(&tmp_path, contents).map_err(StoreError::DocumentWrite)?;
        fs::rename(&tmp_path, &final_path).map_err(StoreError::DocumentWrite)?;
        Ok(())
    }

    /// Walk every document in the shard tree.
    ///
    /// Unreadable or unparsable documents are logged and skipped rather than
    /// failing the whole listing.
    fn walk_documents(&self) -> Vec<Referral> {
        let mut referrals = Vec::new();

        let s1_iter = match fs::read_dir(&self.referrals_dir) {
            Ok(it) => it,
            Err(_) => return referrals,
        };
        for s1 in s1_iter.flatten() {
            let s1_path = s1.path();
            if !s1_path.is_dir() {
                continue;
            }

            let s2_iter = match fs::read_dir(&s1_path) {
                Ok(it) => it,
                Err(_) => continue,
            };
            for s2 in s2_iter.flatten() {
                let s2_path = s2.path();
                if !s2_path.is_dir() {
                    continue;
                }

                let id_iter = match fs::read_dir(&s2_path) {
                    Ok(it) => it,
                    Err(_) => continue,
                };
                for id_entry in id_iter.flatten() {
                    let document_path = id_entry.path().join(DOCUMENT_FILE_NAME);
                    if !document_path.is_file() {
                        continue;
                    }

                    match Self::read_document(&document_path) {
                        Ok(referral) => referrals.push(referral),
                        Err(e) => {
                            tracing::warn!(
                                "skipping unreadable referral document {}: {e}",
                                document_path.display()
                            );
                        }
                    }
                }
            }
        }

        referrals
    }
}

impl ReferralStore for FileStore {
    fn find(&self, query: &QuerySpec) -> Result<Vec<Referral>, StoreError> {
        let mut results: Vec<Referral> = self
            .walk_documents()
            .into_iter()
            .filter(|referral| query.matches(referral))
            .collect();
        query.sort(&mut results);
        Ok(results)
    }

    fn find_by_id(&self, id: ReferralId) -> Result<Option<Referral>, StoreError> {
        let path = self.document_path(id);
        if !path.is_file() {
            return Ok(None);
        }
        Self::read_document(&path).map(Some)
    }

    fn insert(&self, referral: &Referral) -> Result<(), StoreError> {
        // History-number uniqueness spans the whole population, so insert
        // scans every document.
        let history_number = referral.patient.history_number.as_str();
        if self
            .walk_documents()
            .iter()
            .any(|existing| existing.patient.history_number.as_str() == history_number)
        {
            return Err(StoreError::DuplicateHistoryNumber(history_number.to_owned()));
        }

        self.write_document(referral)
    }

    fn replace(&self, referral: &Referral) -> Result<(), StoreError> {
        if !self.document_path(referral.id).is_file() {
            return Err(StoreError::NotFound);
        }
        self.write_document(referral)
    }
}
