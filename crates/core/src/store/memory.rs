//! In-memory referral store.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::query::QuerySpec;
use crate::referral::{Referral, ReferralId};
use crate::store::{ReferralStore, StoreError};

#[derive(Default)]
struct Inner {
    referrals: HashMap<ReferralId, Referral>,
    /// History number -> owning referral, the uniqueness index.
    history_numbers: HashMap<String, ReferralId>,
}

/// A process-local store backed by a `RwLock`ed map.
///
/// Used by the test suite and available as a development backend. Documents
/// are cloned in and out, so callers never observe partial mutation.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReferralStore for MemoryStore {
    fn find(&self, query: &QuerySpec) -> Result<Vec<Referral>, StoreError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut results: Vec<Referral> = inner
            .referrals
            .values()
            .filter(|referral| query.matches(referral))
            .cloned()
            .collect();
        query.sort(&mut results);
        Ok(results)
    }

    fn find_by_id(&self, id: ReferralId) -> Result<Option<Referral>, StoreError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.referrals.get(&id).cloned())
    }

    fn insert(&self, referral: &Referral) -> Result<(), StoreError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let history_number = referral.patient.history_number.as_str().to_owned();

        if inner.history_numbers.contains_key(&history_number) {
            return Err(StoreError::DuplicateHistoryNumber(history_number));
        }

        inner.history_numbers.insert(history_number, referral.id);
        inner.referrals.insert(referral.id, referral.clone());
        Ok(())
    }

    fn replace(&self, referral: &Referral) -> Result<(), StoreError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        let previous = match inner.referrals.get(&referral.id) {
            Some(existing) => existing.patient.history_number.clone(),
            None => return Err(StoreError::NotFound),
        };

        // Uniqueness is enforced at insert time only; a replace re-keys the
        // index when the history number changed.
        if previous != referral.patient.history_number {
            inner.history_numbers.remove(previous.as_str());
            inner.history_numbers.insert(
                referral.patient.history_number.as_str().to_owned(),
                referral.id,
            );
        }

        inner.referrals.insert(referral.id, referral.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::DepartmentScope;
    use crate::query::ListFilter;
    use crate::testing::{physician, sample_draft, sample_referral};
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn insert_then_find_by_id_round_trips() {
        let store = MemoryStore::new();
        let referral = sample_referral(Uuid::new_v4(), Uuid::new_v4());

        store.insert(&referral).expect("insert");
        let found = store
            .find_by_id(referral.id)
            .expect("lookup")
            .expect("present");
        assert_eq!(found, referral);
    }

    #[test]
    fn duplicate_history_numbers_are_rejected() {
        let store = MemoryStore::new();
        let first = sample_referral(Uuid::new_v4(), Uuid::new_v4());
        let second = sample_referral(Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(
            first.patient.history_number,
            second.patient.history_number
        );

        store.insert(&first).expect("first insert");
        let err = store.insert(&second).expect_err("duplicate");
        assert!(matches!(err, StoreError::DuplicateHistoryNumber(_)));
    }

    #[test]
    fn replace_requires_an_existing_document() {
        let store = MemoryStore::new();
        let referral = sample_referral(Uuid::new_v4(), Uuid::new_v4());

        let err = store.replace(&referral).expect_err("missing document");
        assert!(matches!(err, StoreError::NotFound));

        store.insert(&referral).expect("insert");
        let mut updated = referral.clone();
        updated.allergies = "Penicillin".into();
        store.replace(&updated).expect("replace");

        let found = store
            .find_by_id(referral.id)
            .expect("lookup")
            .expect("present");
        assert_eq!(found.allergies, "Penicillin");
    }

    #[test]
    fn find_applies_scope_and_order() {
        let store = MemoryStore::new();
        let department = Uuid::new_v4();
        let now = Utc::now();

        let mut mine_old = sample_draft(department, Uuid::new_v4());
        mine_old.patient.history_number = "HC-0001".into();
        let mut mine_old = mine_old.validate(now).expect("valid draft");
        mine_old.created_at = now - chrono::Duration::days(3);

        let mut mine_new = sample_draft(department, Uuid::new_v4());
        mine_new.patient.history_number = "HC-0002".into();
        let mine_new = mine_new.validate(now).expect("valid draft");

        let mut other = sample_draft(Uuid::new_v4(), Uuid::new_v4());
        other.patient.history_number = "HC-0003".into();
        let other = other.validate(now).expect("valid draft");

        for referral in [&mine_old, &mine_new, &other] {
            store.insert(referral).expect("insert");
        }

        let spec = QuerySpec::build(&ListFilter::default(), &physician(department));
        assert_eq!(spec.scope(), &DepartmentScope::Either(department));

        let results = store.find(&spec).expect("query");
        assert_eq!(results.len(), 2);
        // Newest first.
        assert_eq!(results[0].id, mine_new.id);
        assert_eq!(results[1].id, mine_old.id);
    }
}
