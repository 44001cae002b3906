//! # Referral Core
//!
//! Core business logic for the inter-department referral system.
//!
//! This crate contains the referral lifecycle and authorization engine:
//! - The referral aggregate, its structural invariants, and the derived
//!   attributes projected at read time
//! - The authorization policy gating every operation on an explicitly
//!   passed principal
//! - The permissive, mutability-gated status machine
//! - The query builder combining caller filters with the caller's
//!   authorization scope
//! - The append-only note and notification trails
//! - The store boundary with in-memory and sharded-JSON-file backends
//!
//! **No API concerns**: authentication transport, HTTP servers, and wire
//! formats belong in `api-rest` and the CLI.

pub mod auth;
pub mod config;
pub mod error;
pub mod notifications;
pub mod query;
pub mod referral;
pub mod service;
pub mod status;
pub mod store;

pub use auth::{DepartmentScope, Principal, Role};
pub use config::{CoreConfig, DEFAULT_DATA_DIR};
pub use error::{ReferralError, ReferralResult};
pub use query::{ListFilter, QuerySpec, SortOrder, TrafficKind};
pub use referral::{
    DepartmentId, Note, Notification, PatientDetails, Referral, ReferralDraft, ReferralId,
    ReferralView,
};
pub use service::ReferralService;
pub use status::{Priority, Status};
pub use store::{FileStore, MemoryStore, ReferralStore, StoreError};

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for the unit tests.

    use crate::auth::{Principal, Role};
    use crate::referral::{
        ClinicalStateDraft, DepartmentId, ImagingReportDraft, LabReportDraft, PatientDraft,
        Referral, ReferralDraft,
    };
    use chrono::Utc;

    pub fn admin() -> Principal {
        Principal {
            id: "admin-1".into(),
            role: Role::Admin,
            department: None,
        }
    }

    pub fn physician(department: DepartmentId) -> Principal {
        Principal {
            id: "phys-1".into(),
            role: Role::Physician,
            department: Some(department),
        }
    }

    pub fn sample_draft(requesting: DepartmentId, target: DepartmentId) -> ReferralDraft {
        ReferralDraft {
            patient: PatientDraft {
                name: "Maria Lopez".into(),
                age: Some(62),
                history_number: "HC-1001".into(),
            },
            requesting_department: Some(requesting),
            target_department: Some(target),
            consultation_objective: "Evaluate progressive dyspnoea".into(),
            clinical_history: "Hypertensive, poorly controlled for ten years".into(),
            clinical_state: ClinicalStateDraft {
                subjective: "Short of breath on minimal exertion".into(),
                ..ClinicalStateDraft::default()
            },
            labs: LabReportDraft {
                results: "Hb 10.2, creatinine 1.4".into(),
                ..LabReportDraft::default()
            },
            imaging: ImagingReportDraft {
                description: "Chest radiograph, PA view".into(),
                relevant_findings: "Cardiomegaly, no consolidation".into(),
                ..ImagingReportDraft::default()
            },
            personal_history: "Former smoker".into(),
            family_history: "Father with ischaemic heart disease".into(),
            ..ReferralDraft::default()
        }
    }

    pub fn sample_referral(requesting: DepartmentId, target: DepartmentId) -> Referral {
        sample_draft(requesting, target)
            .validate(Utc::now())
            .expect("sample draft is structurally valid")
    }
}
