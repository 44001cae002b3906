//! Notification ledger.
//!
//! Each referral carries an append-only notification trail with per-entry
//! read tracking. Adding a clinical note is a single operation that also
//! writes exactly one ledger entry, so every note addition is an observable
//! event.

use chrono::{DateTime, Utc};
use referral_types::NonEmptyText;

use crate::error::{ReferralError, ReferralResult};
use crate::referral::{DepartmentId, Note, Notification, Referral};

impl Referral {
    /// Append a ledger entry, unread.
    pub(crate) fn push_notification(&mut self, message: impl Into<String>, now: DateTime<Utc>) {
        self.notifications.push(Notification {
            message: message.into(),
            created_at: now,
            read: false,
        });
    }

    /// Flip every ledger entry to read. Idempotent.
    pub fn mark_all_notifications_read(&mut self) {
        for notification in &mut self.notifications {
            notification.read = true;
        }
    }

    /// Count of ledger entries still unread.
    pub fn pending_notifications(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    /// Append a clinical note and its ledger entry in one step.
    ///
    /// The note and the notification are written together: callers cannot add
    /// a note without leaving an observable event behind. The referral must
    /// still be mutable; `updated_at` is stamped with `now`.
    ///
    /// # Errors
    ///
    /// Returns `ReferralError::NotModifiable` if the referral is in a
    /// terminal status.
    pub fn append_note(
        &mut self,
        content: NonEmptyText,
        department: DepartmentId,
        author: NonEmptyText,
        now: DateTime<Utc>,
    ) -> ReferralResult<()> {
        if !self.is_mutable() {
            return Err(ReferralError::NotModifiable);
        }

        let message = format!("New note added by {author}");
        self.notes.push(Note {
            content,
            department,
            author,
            created_at: now,
        });
        self.push_notification(message, now);
        self.touch(now);
        Ok(())
    }
}
