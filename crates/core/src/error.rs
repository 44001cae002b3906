use crate::store::StoreError;

/// Error taxonomy for referral operations.
///
/// Every operation reports failures synchronously through this enum so that
/// callers (REST handlers, CLI) can map each case to a stable, distinguishable
/// response. In particular `Forbidden` (membership/role check failed) and
/// `NotModifiable` (state gate failed for an otherwise authorised actor) must
/// never collapse into one message.
#[derive(Debug, thiserror::Error)]
pub enum ReferralError {
    #[error("invalid {field}: {reason}")]
    Validation {
        field: &'static str,
        reason: String,
    },
    #[error("not permitted to perform this operation on the referral")]
    Forbidden,
    #[error("referral cannot be modified in its current state")]
    NotModifiable,
    #[error("referral not found")]
    NotFound,
    #[error("a referral with history number {0} already exists")]
    DuplicateHistoryNumber(String),
    #[error("store operation failed: {0}")]
    Store(StoreError),
}

impl ReferralError {
    /// Shorthand for a validation failure naming the offending field.
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        ReferralError::Validation {
            field,
            reason: reason.into(),
        }
    }
}

impl From<StoreError> for ReferralError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateHistoryNumber(number) => {
                ReferralError::DuplicateHistoryNumber(number)
            }
            StoreError::NotFound => ReferralError::NotFound,
            other => ReferralError::Store(other),
        }
    }
}

pub type ReferralResult<T> = std::result::Result<T, ReferralError>;
