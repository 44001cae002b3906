//! Referral aggregate model.
//!
//! This module defines the referral document shape, the structural validation
//! that turns an inbound draft into a sound aggregate, and the pure projection
//! that attaches derived elapsed-time attributes at read time.
//!
//! Responsibilities:
//! - Define the aggregate root and its nested clinical sections
//! - Validate drafts with a stable, deterministic ordering of checks
//!   (patient fields, then department fields, then narrative fields),
//!   reporting the first offending field
//! - Compute derived attributes as a pure function of the aggregate and the
//!   current clock; derived values are never stored
//!
//! Notes:
//! - History-number uniqueness spans the whole referral population and is
//!   enforced by the store, not here
//! - Notes and notifications are append-only; see the notifications module

use chrono::{DateTime, Utc};
use referral_types::{Age, HistoryNumber, NonEmptyText};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ReferralError, ReferralResult};
use crate::status::{Priority, Status};

/// Unique identifier of a referral document.
pub type ReferralId = Uuid;

/// Opaque identifier of a department. Department administration lives
/// outside this system.
pub type DepartmentId = Uuid;

/// Default allergies narrative when none is supplied.
pub const DEFAULT_ALLERGIES: &str = "None known";

/// Default medications narrative when none is supplied.
pub const DEFAULT_MEDICATIONS: &str = "None";

/// Patient identification carried on a referral.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientDetails {
    pub name: NonEmptyText,
    pub age: Age,
    /// Uniqueness key across the whole referral population.
    pub history_number: HistoryNumber,
}

/// Vital signs snapshot. All fields are free-text measurements and optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct VitalSigns {
    pub blood_pressure: Option<String>,
    pub heart_rate: Option<String>,
    pub respiratory_rate: Option<String>,
    pub temperature: Option<String>,
    pub oxygen_saturation: Option<String>,
}

/// Current clinical state of the patient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicalState {
    pub subjective: NonEmptyText,
    pub vital_signs: VitalSigns,
}

/// Most recent laboratory results.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabReport {
    pub last_date: Option<DateTime<Utc>>,
    pub results: NonEmptyText,
    pub observations: Option<String>,
}

/// Most recent imaging studies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagingReport {
    pub date: Option<DateTime<Utc>>,
    pub kind: Option<String>,
    pub description: NonEmptyText,
    pub relevant_findings: NonEmptyText,
}

/// Medication narrative, split by setting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medications {
    pub pre_hospital: String,
    pub in_hospital: String,
}

/// A clinical note on a referral. Notes are append-only: entries are never
/// edited or removed once written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub content: NonEmptyText,
    pub department: DepartmentId,
    pub author: NonEmptyText,
    pub created_at: DateTime<Utc>,
}

/// A notification ledger entry. Append-only; only the `read` flag may flip.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

/// The referral aggregate root.
///
/// `status`, `notes` and `notifications` are kept crate-private so that every
/// status change goes through the mutability gate and the note/notification
/// trails stay append-only. Read access goes through the accessor methods.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Referral {
    pub id: ReferralId,
    pub patient: PatientDetails,
    pub requesting_department: DepartmentId,
    pub target_department: DepartmentId,
    pub consultation_objective: NonEmptyText,
    pub clinical_history: NonEmptyText,
    pub clinical_state: ClinicalState,
    pub labs: LabReport,
    pub imaging: ImagingReport,
    pub personal_history: NonEmptyText,
    pub family_history: NonEmptyText,
    pub allergies: String,
    pub medications: Medications,
    pub(crate) status: Status,
    pub priority: Priority,
    pub(crate) notes: Vec<Note>,
    pub(crate) notifications: Vec<Notification>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Referral {
    pub fn status(&self) -> Status {
        self.status
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Whether the referral still awaits or is undergoing attention.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Whether the referral sits in the triage queue.
    pub fn is_urgent(&self) -> bool {
        self.priority.is_urgent()
    }

    /// Stamp `updated_at`. Called on every mutating save.
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    /// Save-time guard: the requesting and target departments must differ.
    ///
    /// Structural validation already rejects equal departments; this guard is
    /// re-checked before any insert or replace so a referral with equal
    /// endpoints can never persist.
    pub fn ensure_departments_differ(&self) -> ReferralResult<()> {
        if self.requesting_department == self.target_department {
            return Err(ReferralError::validation(
                "target_department",
                "must differ from the requesting department",
            ));
        }
        Ok(())
    }

    /// Attach the derived attributes, computed against `now`.
    ///
    /// This is a pure projection taken at the read boundary. Derived values
    /// are never cached or persisted, so concurrent reads always reflect true
    /// elapsed time.
    pub fn project(&self, now: DateTime<Utc>) -> ReferralView {
        let since_creation = now.signed_duration_since(self.created_at);
        let since_update = now.signed_duration_since(self.updated_at);

        ReferralView {
            days_since_creation: since_creation.num_days(),
            hours_since_last_update: since_update.num_hours(),
            days_in_current_state: since_update.num_days(),
            pending_notifications: self.pending_notifications(),
            referral: self.clone(),
        }
    }
}

/// A referral together with its derived attributes.
///
/// The derived fields are flattened next to the document fields on the wire.
#[derive(Clone, Debug, Serialize)]
pub struct ReferralView {
    #[serde(flatten)]
    pub referral: Referral,
    pub days_since_creation: i64,
    pub hours_since_last_update: i64,
    pub days_in_current_state: i64,
    pub pending_notifications: usize,
}

/// Inbound patient section of a referral draft.
#[derive(Clone, Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(default)]
pub struct PatientDraft {
    pub name: String,
    pub age: Option<i64>,
    pub history_number: String,
}

/// Inbound clinical-state section of a referral draft.
#[derive(Clone, Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(default)]
pub struct ClinicalStateDraft {
    pub subjective: String,
    pub vital_signs: VitalSigns,
}

/// Inbound laboratory section of a referral draft.
#[derive(Clone, Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(default)]
pub struct LabReportDraft {
    #[schema(value_type = Option<String>)]
    pub last_date: Option<DateTime<Utc>>,
    pub results: String,
    pub observations: Option<String>,
}

/// Inbound imaging section of a referral draft.
#[derive(Clone, Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(default)]
pub struct ImagingReportDraft {
    #[schema(value_type = Option<String>)]
    pub date: Option<DateTime<Utc>>,
    pub kind: Option<String>,
    pub description: String,
    pub relevant_findings: String,
}

/// Inbound medications section of a referral draft.
#[derive(Clone, Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(default)]
pub struct MedicationsDraft {
    pub pre_hospital: Option<String>,
    pub in_hospital: Option<String>,
}

/// A candidate referral payload, as submitted by a caller.
///
/// Every field is optional at the serde level so that missing input surfaces
/// as a `ReferralError::Validation` naming the offending field, rather than
/// as a deserialisation failure with unstable ordering.
#[derive(Clone, Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(default)]
pub struct ReferralDraft {
    pub patient: PatientDraft,
    #[schema(value_type = Option<String>)]
    pub requesting_department: Option<DepartmentId>,
    #[schema(value_type = Option<String>)]
    pub target_department: Option<DepartmentId>,
    pub consultation_objective: String,
    pub clinical_history: String,
    pub clinical_state: ClinicalStateDraft,
    pub labs: LabReportDraft,
    pub imaging: ImagingReportDraft,
    pub personal_history: String,
    pub family_history: String,
    pub allergies: Option<String>,
    pub medications: MedicationsDraft,
    pub priority: Option<Priority>,
}

impl ReferralDraft {
    /// Validate the draft into a structurally sound referral.
    ///
    /// Checks run in a stable order — patient fields, then department fields,
    /// then narrative fields — and the first failure is reported with the
    /// offending field name. History-number uniqueness cannot be seen from a
    /// single draft and is enforced by the store at insert time.
    ///
    /// On success the referral carries a fresh id, `Pending` status, the
    /// drafted priority (defaulting to `Medium`), empty note and notification
    /// trails, and `created_at = updated_at = now`.
    ///
    /// # Errors
    ///
    /// Returns `ReferralError::Validation` naming the first offending field.
    pub fn validate(self, now: DateTime<Utc>) -> ReferralResult<Referral> {
        // Patient fields.
        let name = require_text("patient.name", &self.patient.name)?;
        let age = match self.patient.age {
            Some(years) => Age::new(years)
                .map_err(|e| ReferralError::validation("patient.age", e.to_string()))?,
            None => return Err(ReferralError::validation("patient.age", "is required")),
        };
        let history_number = HistoryNumber::new(&self.patient.history_number)
            .map_err(|_| ReferralError::validation("patient.history_number", "is required"))?;

        // Department fields.
        let requesting_department = self
            .requesting_department
            .ok_or_else(|| ReferralError::validation("requesting_department", "is required"))?;
        let target_department = self
            .target_department
            .ok_or_else(|| ReferralError::validation("target_department", "is required"))?;
        if requesting_department == target_department {
            return Err(ReferralError::validation(
                "target_department",
                "must differ from the requesting department",
            ));
        }

        // Narrative fields.
        let consultation_objective =
            require_text("consultation_objective", &self.consultation_objective)?;
        let clinical_history = require_text("clinical_history", &self.clinical_history)?;
        let subjective = require_text("clinical_state.subjective", &self.clinical_state.subjective)?;
        let lab_results = require_text("labs.results", &self.labs.results)?;
        let imaging_description = require_text("imaging.description", &self.imaging.description)?;
        let imaging_findings =
            require_text("imaging.relevant_findings", &self.imaging.relevant_findings)?;
        let personal_history = require_text("personal_history", &self.personal_history)?;
        let family_history = require_text("family_history", &self.family_history)?;

        Ok(Referral {
            id: Uuid::new_v4(),
            patient: PatientDetails {
                name,
                age,
                history_number,
            },
            requesting_department,
            target_department,
            consultation_objective,
            clinical_history,
            clinical_state: ClinicalState {
                subjective,
                vital_signs: self.clinical_state.vital_signs,
            },
            labs: LabReport {
                last_date: self.labs.last_date,
                results: lab_results,
                observations: self.labs.observations,
            },
            imaging: ImagingReport {
                date: self.imaging.date,
                kind: self.imaging.kind,
                description: imaging_description,
                relevant_findings: imaging_findings,
            },
            personal_history,
            family_history,
            allergies: self
                .allergies
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ALLERGIES.to_owned()),
            medications: Medications {
                pre_hospital: self
                    .medications
                    .pre_hospital
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_MEDICATIONS.to_owned()),
                in_hospital: self
                    .medications
                    .in_hospital
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_MEDICATIONS.to_owned()),
            },
            status: Status::Pending,
            priority: self.priority.unwrap_or(Priority::Medium),
            notes: Vec::new(),
            notifications: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }
}

fn require_text(field: &'static str, value: &str) -> ReferralResult<NonEmptyText> {
    NonEmptyText::new(value).map_err(|_| ReferralError::validation(field, "is required"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_draft;
    use chrono::Duration;

    fn offending_field(err: ReferralError) -> &'static str {
        match err {
            ReferralError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_draft_defaults_to_pending_medium() {
        let now = Utc::now();
        let referral = sample_draft(Uuid::new_v4(), Uuid::new_v4())
            .validate(now)
            .expect("valid draft");

        assert_eq!(referral.status(), Status::Pending);
        assert_eq!(referral.priority, Priority::Medium);
        assert!(referral.notes().is_empty());
        assert!(referral.notifications().is_empty());
        assert_eq!(referral.created_at, now);
        assert_eq!(referral.updated_at, now);
        assert_eq!(referral.allergies, DEFAULT_ALLERGIES);
        assert_eq!(referral.medications.pre_hospital, DEFAULT_MEDICATIONS);
    }

    #[test]
    fn patient_checks_run_before_department_checks() {
        let mut draft = sample_draft(Uuid::new_v4(), Uuid::new_v4());
        draft.patient.name = String::new();
        draft.requesting_department = None;

        let err = draft.validate(Utc::now()).expect_err("invalid draft");
        assert_eq!(offending_field(err), "patient.name");
    }

    #[test]
    fn department_checks_run_before_narrative_checks() {
        let mut draft = sample_draft(Uuid::new_v4(), Uuid::new_v4());
        draft.target_department = None;
        draft.consultation_objective = String::new();

        let err = draft.validate(Utc::now()).expect_err("invalid draft");
        assert_eq!(offending_field(err), "target_department");
    }

    #[test]
    fn narrative_checks_follow_declaration_order() {
        let mut draft = sample_draft(Uuid::new_v4(), Uuid::new_v4());
        draft.clinical_history = "  ".into();
        draft.family_history = String::new();

        let err = draft.validate(Utc::now()).expect_err("invalid draft");
        assert_eq!(offending_field(err), "clinical_history");
    }

    #[test]
    fn rejects_out_of_range_age() {
        let mut draft = sample_draft(Uuid::new_v4(), Uuid::new_v4());
        draft.patient.age = Some(151);

        let err = draft.validate(Utc::now()).expect_err("invalid draft");
        assert_eq!(offending_field(err), "patient.age");
    }

    #[test]
    fn rejects_equal_departments() {
        let department = Uuid::new_v4();
        let draft = sample_draft(department, department);

        let err = draft.validate(Utc::now()).expect_err("invalid draft");
        assert_eq!(offending_field(err), "target_department");
    }

    #[test]
    fn save_guard_rejects_equal_departments() {
        let mut referral = crate::testing::sample_referral(Uuid::new_v4(), Uuid::new_v4());
        referral.ensure_departments_differ().expect("distinct endpoints");

        referral.target_department = referral.requesting_department;
        assert!(referral.ensure_departments_differ().is_err());
    }

    #[test]
    fn projection_computes_elapsed_time_from_now() {
        let created = Utc::now();
        let mut referral = crate::testing::sample_referral(Uuid::new_v4(), Uuid::new_v4());
        referral.created_at = created;
        referral.updated_at = created + Duration::days(2);

        let now = created + Duration::days(5) + Duration::hours(7);
        let view = referral.project(now);

        assert_eq!(view.days_since_creation, 5);
        assert_eq!(view.hours_since_last_update, 3 * 24 + 7);
        assert_eq!(view.days_in_current_state, 3);
        assert_eq!(view.pending_notifications, 0);
    }

    #[test]
    fn projection_counts_only_unread_notifications() {
        let now = Utc::now();
        let mut referral = crate::testing::sample_referral(Uuid::new_v4(), Uuid::new_v4());
        referral.push_notification("First consult booked", now);
        referral.push_notification("Results attached", now);
        referral.notifications[0].read = true;

        assert_eq!(referral.project(now).pending_notifications, 1);
    }

    #[test]
    fn view_flattens_derived_fields_next_to_document_fields() {
        let now = Utc::now();
        let referral = crate::testing::sample_referral(Uuid::new_v4(), Uuid::new_v4());
        let value = serde_json::to_value(referral.project(now)).expect("serialize view");

        assert!(value.get("status").is_some());
        assert!(value.get("days_since_creation").is_some());
        assert!(value.get("pending_notifications").is_some());
    }

    #[test]
    fn blank_optional_narratives_fall_back_to_defaults() {
        let mut draft = sample_draft(Uuid::new_v4(), Uuid::new_v4());
        draft.allergies = Some("  ".into());
        draft.medications.in_hospital = Some("Enalapril 10mg".into());

        let referral = draft.validate(Utc::now()).expect("valid draft");
        assert_eq!(referral.allergies, DEFAULT_ALLERGIES);
        assert_eq!(referral.medications.pre_hospital, DEFAULT_MEDICATIONS);
        assert_eq!(referral.medications.in_hospital, "Enalapril 10mg");
    }
}
