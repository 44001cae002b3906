//! Referral service and operation orchestration.
//!
//! Every exposed operation flows through [`ReferralService`]: the
//! authorization policy gates the action, the status machine gates writes,
//! the query builder composes data selection for lists, and the store
//! persists whole documents. Each call takes an explicitly passed principal;
//! nothing here reads ambient state.
//!
//! Derived attributes are projected with the clock taken once per call, at
//! the read boundary. All failures are synchronous; nothing is retried.

use std::sync::Arc;

use chrono::Utc;
use referral_types::{HistoryNumber, NonEmptyText};

use crate::auth::Principal;
use crate::error::{ReferralError, ReferralResult};
use crate::query::{ListFilter, QuerySpec};
use crate::referral::{DepartmentId, Referral, ReferralDraft, ReferralId, ReferralView};
use crate::status::Status;
use crate::store::ReferralStore;

/// Pure referral operations - no API concerns
#[derive(Clone)]
pub struct ReferralService {
    store: Arc<dyn ReferralStore>,
}

impl ReferralService {
    /// Creates a new service over the given store.
    pub fn new(store: Arc<dyn ReferralStore>) -> Self {
        Self { store }
    }

    /// List referrals matching the caller's filter, inside the caller's
    /// authorization scope.
    ///
    /// # Errors
    ///
    /// Returns a `ReferralError::Store` if the store cannot be queried.
    pub fn list(
        &self,
        principal: &Principal,
        filter: &ListFilter,
    ) -> ReferralResult<Vec<ReferralView>> {
        let spec = QuerySpec::build(filter, principal);
        let referrals = self.store.find(&spec)?;

        let now = Utc::now();
        let views = referrals.iter().map(|r| r.project(now)).collect();
        tracing::debug!(actor = %principal.id, "listed referrals");
        Ok(views)
    }

    /// Fetch a single referral by id.
    ///
    /// # Errors
    ///
    /// Returns `ReferralError::NotFound` for an unknown id, and
    /// `ReferralError::Forbidden` when the referral exists but the caller
    /// belongs to neither endpoint department.
    pub fn get(&self, principal: &Principal, id: ReferralId) -> ReferralResult<ReferralView> {
        let referral = self.fetch(id)?;
        if !principal.can_view(&referral) {
            return Err(ReferralError::Forbidden);
        }
        Ok(referral.project(Utc::now()))
    }

    /// Create a referral from a draft.
    ///
    /// The draft is validated structurally, the creation gate is applied
    /// (non-admins may only originate referrals from their own department),
    /// and the department guard is re-checked immediately before the insert.
    ///
    /// # Errors
    ///
    /// Returns `ReferralError::Validation` for a malformed draft,
    /// `ReferralError::Forbidden` for a foreign requesting department, and
    /// `ReferralError::DuplicateHistoryNumber` when the store already holds
    /// the patient's history number.
    pub fn create(
        &self,
        principal: &Principal,
        draft: ReferralDraft,
    ) -> ReferralResult<ReferralView> {
        let now = Utc::now();
        let referral = draft.validate(now)?;

        if !principal.can_create(referral.requesting_department) {
            return Err(ReferralError::Forbidden);
        }

        referral.ensure_departments_differ()?;
        self.store.insert(&referral)?;

        tracing::info!(referral = %referral.id, actor = %principal.id, "referral created");
        Ok(referral.project(now))
    }

    /// Move a referral to a new status.
    ///
    /// # Errors
    ///
    /// Returns `ReferralError::NotFound`, `ReferralError::Forbidden` for a
    /// non-member, or `ReferralError::NotModifiable` when the referral is in
    /// a terminal status.
    pub fn update_status(
        &self,
        principal: &Principal,
        id: ReferralId,
        new_status: Status,
    ) -> ReferralResult<ReferralView> {
        let mut referral = self.fetch(id)?;
        principal.ensure_can_mutate(&referral)?;

        let now = Utc::now();
        referral.transition_to(new_status, now)?;
        self.save(&referral)?;

        tracing::info!(referral = %id, status = %new_status, actor = %principal.id, "status updated");
        Ok(referral.project(now))
    }

    /// Add a clinical note to a referral.
    ///
    /// The note's department is the caller's own affiliation;
    /// administrators, having none, must name the department explicitly. The
    /// note and its ledger entry are appended together.
    ///
    /// # Errors
    ///
    /// Same set as [`Self::update_status`], plus `ReferralError::Validation`
    /// for empty content/author or a missing department.
    pub fn add_note(
        &self,
        principal: &Principal,
        id: ReferralId,
        content: &str,
        author: &str,
        department: Option<DepartmentId>,
    ) -> ReferralResult<ReferralView> {
        let content = NonEmptyText::new(content)
            .map_err(|_| ReferralError::validation("content", "is required"))?;
        let author = NonEmptyText::new(author)
            .map_err(|_| ReferralError::validation("author", "is required"))?;

        let mut referral = self.fetch(id)?;
        principal.ensure_can_annotate(&referral)?;

        // Non-admins annotate as their own department; administrators name
        // the department explicitly (or fall back to their affiliation).
        let department = if principal.is_admin() {
            department.or(principal.department)
        } else {
            principal.department
        }
        .ok_or_else(|| ReferralError::validation("department", "is required"))?;

        let now = Utc::now();
        referral.append_note(content, department, author, now)?;
        self.save(&referral)?;

        tracing::info!(referral = %id, actor = %principal.id, "note added");
        Ok(referral.project(now))
    }

    /// Flip every notification on a referral to read.
    ///
    /// This is the single mutation allowed on terminal referrals, so the
    /// gate is membership only.
    ///
    /// # Errors
    ///
    /// Returns `ReferralError::NotFound` or `ReferralError::Forbidden`.
    pub fn mark_notifications_read(
        &self,
        principal: &Principal,
        id: ReferralId,
    ) -> ReferralResult<ReferralView> {
        let mut referral = self.fetch(id)?;
        if !principal.can_view(&referral) {
            return Err(ReferralError::Forbidden);
        }

        let now = Utc::now();
        referral.mark_all_notifications_read();
        referral.touch(now);
        self.save(&referral)?;

        tracing::debug!(referral = %id, actor = %principal.id, "notifications read");
        Ok(referral.project(now))
    }

    /// All referrals carrying the given history number, inside the caller's
    /// scope, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ReferralError::Validation` for an empty history number.
    pub fn search_by_history(
        &self,
        principal: &Principal,
        history_number: &str,
    ) -> ReferralResult<Vec<ReferralView>> {
        let history_number = HistoryNumber::new(history_number)
            .map_err(|_| ReferralError::validation("history_number", "is required"))?;
        let spec = QuerySpec::for_history_number(history_number, principal);
        let referrals = self.store.find(&spec)?;

        let now = Utc::now();
        Ok(referrals.iter().map(|r| r.project(now)).collect())
    }

    fn fetch(&self, id: ReferralId) -> ReferralResult<Referral> {
        self.store.find_by_id(id)?.ok_or(ReferralError::NotFound)
    }

    fn save(&self, referral: &Referral) -> ReferralResult<()> {
        referral.ensure_departments_differ()?;
        self.store.replace(referral)?;
        Ok(())
    }
}
