//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in multi-threaded runtimes
//! and test harnesses.

use crate::{ReferralError, ReferralResult};
use std::path::{Path, PathBuf};

/// Default location for referral document storage.
pub const DEFAULT_DATA_DIR: &str = "/referral_data";

/// Name of the subdirectory holding referral documents.
pub const REFERRALS_DIR_NAME: &str = "referrals";

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(data_dir: PathBuf) -> ReferralResult<Self> {
        if data_dir.as_os_str().is_empty() {
            return Err(ReferralError::validation(
                "data_dir",
                "data directory cannot be empty",
            ));
        }

        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn referrals_dir(&self) -> PathBuf {
        self.data_dir.join(REFERRALS_DIR_NAME)
    }
}
