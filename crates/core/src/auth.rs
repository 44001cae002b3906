//! Authorization policy.
//!
//! Pure decision functions over an authenticated principal and a referral (or
//! a filter request). Every operation is gated here, uniformly, before any
//! state is touched; handlers never re-implement role checks.
//!
//! Credential verification is an external collaborator: this module consumes
//! an already-verified principal and never reads ambient state.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{ReferralError, ReferralResult};
use crate::query::{ListFilter, TrafficKind};
use crate::referral::{DepartmentId, Referral};

/// Role carried by an authenticated principal.
///
/// This enum is deliberately *closed*: role handling stays
/// exhaustiveness-checked at compile time rather than comparing open-ended
/// strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    DepartmentHead,
    Physician,
}

impl std::str::FromStr for Role {
    type Err = ReferralError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "ADMIN" => Ok(Role::Admin),
            "DEPARTMENT_HEAD" => Ok(Role::DepartmentHead),
            "PHYSICIAN" => Ok(Role::Physician),
            other => Err(ReferralError::validation(
                "role",
                format!("unknown role {other:?}"),
            )),
        }
    }
}

/// The authenticated actor issuing a request.
///
/// Immutable for the duration of a request. `department` is the actor's
/// affiliation and is absent only for administrators; the authentication
/// boundary rejects non-admin principals without one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub role: Role,
    pub department: Option<DepartmentId>,
}

/// The department restriction silently added to list and search requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DepartmentScope {
    /// No department restriction (administrators without an explicit filter).
    Unrestricted,
    /// Referrals sent by the given department.
    Sent(DepartmentId),
    /// Referrals received by the given department.
    Received(DepartmentId),
    /// Referrals where the given department is either endpoint.
    Either(DepartmentId),
}

impl DepartmentScope {
    /// Whether the referral falls inside this scope.
    pub fn permits(&self, referral: &Referral) -> bool {
        match self {
            DepartmentScope::Unrestricted => true,
            DepartmentScope::Sent(department) => referral.requesting_department == *department,
            DepartmentScope::Received(department) => referral.target_department == *department,
            DepartmentScope::Either(department) => {
                referral.requesting_department == *department
                    || referral.target_department == *department
            }
        }
    }
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether the principal's department is one of the referral's endpoints.
    fn is_member_of(&self, referral: &Referral) -> bool {
        match self.department {
            Some(department) => {
                department == referral.requesting_department
                    || department == referral.target_department
            }
            None => false,
        }
    }

    /// May the principal see this referral?
    ///
    /// Administrators see everything; everyone else must belong to one of the
    /// two endpoint departments. A `false` answer maps to a forbidden
    /// response, never to not-found.
    pub fn can_view(&self, referral: &Referral) -> bool {
        self.is_admin() || self.is_member_of(referral)
    }

    /// May the principal originate a referral from `requesting_department`?
    ///
    /// Non-administrators may only originate referrals from their own
    /// department.
    pub fn can_create(&self, requesting_department: DepartmentId) -> bool {
        self.is_admin() || self.department == Some(requesting_department)
    }

    /// Gate for content-changing operations.
    ///
    /// Membership and mutability are both required, and their failures stay
    /// distinguishable: a non-member gets `Forbidden`, a member touching a
    /// terminal referral gets `NotModifiable`.
    pub fn ensure_can_mutate(&self, referral: &Referral) -> ReferralResult<()> {
        if !self.can_view(referral) {
            return Err(ReferralError::Forbidden);
        }
        if !referral.is_mutable() {
            return Err(ReferralError::NotModifiable);
        }
        Ok(())
    }

    /// Gate for note additions. Identical to the mutation gate.
    pub fn ensure_can_annotate(&self, referral: &Referral) -> ReferralResult<()> {
        self.ensure_can_mutate(referral)
    }

    /// Derive the department scope for a list or search request.
    ///
    /// Administrators may narrow by explicit sent/received/department
    /// parameters; with none supplied the scope is unrestricted. Everyone
    /// else is scoped to their own department — sent, received, or either
    /// endpoint depending on the requested kind — and any department
    /// parameters they supply are ignored.
    pub fn implicit_scope(&self, filter: &ListFilter) -> DepartmentScope {
        if self.is_admin() {
            return match filter.kind {
                Some(TrafficKind::Sent) => match filter.requesting_department {
                    Some(department) => DepartmentScope::Sent(department),
                    None => DepartmentScope::Unrestricted,
                },
                Some(TrafficKind::Received) => match filter.target_department {
                    Some(department) => DepartmentScope::Received(department),
                    None => DepartmentScope::Unrestricted,
                },
                None => match filter.department {
                    Some(department) => DepartmentScope::Either(department),
                    None => DepartmentScope::Unrestricted,
                },
            };
        }

        let Some(department) = self.department else {
            // A non-admin principal without an affiliation can see nothing.
            return DepartmentScope::Either(DepartmentId::nil());
        };

        match filter.kind {
            Some(TrafficKind::Sent) => DepartmentScope::Sent(department),
            Some(TrafficKind::Received) => DepartmentScope::Received(department),
            None => DepartmentScope::Either(department),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Status;
    use crate::testing::{admin, physician, sample_referral};
    use uuid::Uuid;

    #[test]
    fn membership_decides_visibility_for_non_admins() {
        let requesting = Uuid::new_v4();
        let target = Uuid::new_v4();
        let referral = sample_referral(requesting, target);

        assert!(physician(requesting).can_view(&referral));
        assert!(physician(target).can_view(&referral));
        assert!(!physician(Uuid::new_v4()).can_view(&referral));
    }

    #[test]
    fn admin_sees_every_referral() {
        let referral = sample_referral(Uuid::new_v4(), Uuid::new_v4());
        assert!(admin().can_view(&referral));
    }

    #[test]
    fn creation_is_restricted_to_own_department() {
        let department = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert!(physician(department).can_create(department));
        assert!(!physician(department).can_create(other));
        assert!(admin().can_create(other));
    }

    #[test]
    fn mutation_gate_distinguishes_membership_from_mutability() {
        let requesting = Uuid::new_v4();
        let mut referral = sample_referral(requesting, Uuid::new_v4());

        let outsider = physician(Uuid::new_v4());
        assert!(matches!(
            outsider.ensure_can_mutate(&referral),
            Err(ReferralError::Forbidden)
        ));

        referral.status = Status::Completed;
        let member = physician(requesting);
        assert!(matches!(
            member.ensure_can_mutate(&referral),
            Err(ReferralError::NotModifiable)
        ));
    }

    #[test]
    fn terminal_referrals_reject_mutation_for_every_principal() {
        let requesting = Uuid::new_v4();
        let target = Uuid::new_v4();
        for status in [Status::Completed, Status::Cancelled] {
            let mut referral = sample_referral(requesting, target);
            referral.status = status;

            for principal in [admin(), physician(requesting), physician(target)] {
                assert!(matches!(
                    principal.ensure_can_mutate(&referral),
                    Err(ReferralError::NotModifiable)
                ));
                assert!(matches!(
                    principal.ensure_can_annotate(&referral),
                    Err(ReferralError::NotModifiable)
                ));
            }
        }
    }

    #[test]
    fn non_admin_scope_always_lands_on_own_department() {
        let department = Uuid::new_v4();
        let someone_else = Uuid::new_v4();
        let principal = physician(department);

        // Department parameters supplied by non-admins are overridden.
        let filter = ListFilter {
            kind: Some(TrafficKind::Sent),
            requesting_department: Some(someone_else),
            department: Some(someone_else),
            ..ListFilter::default()
        };
        assert_eq!(
            principal.implicit_scope(&filter),
            DepartmentScope::Sent(department)
        );

        let filter = ListFilter {
            kind: Some(TrafficKind::Received),
            target_department: Some(someone_else),
            ..ListFilter::default()
        };
        assert_eq!(
            principal.implicit_scope(&filter),
            DepartmentScope::Received(department)
        );

        assert_eq!(
            principal.implicit_scope(&ListFilter::default()),
            DepartmentScope::Either(department)
        );
    }

    #[test]
    fn admin_scope_narrows_only_when_requested() {
        let department = Uuid::new_v4();

        assert_eq!(
            admin().implicit_scope(&ListFilter::default()),
            DepartmentScope::Unrestricted
        );

        let filter = ListFilter {
            kind: Some(TrafficKind::Sent),
            requesting_department: Some(department),
            ..ListFilter::default()
        };
        assert_eq!(
            admin().implicit_scope(&filter),
            DepartmentScope::Sent(department)
        );

        let filter = ListFilter {
            department: Some(department),
            ..ListFilter::default()
        };
        assert_eq!(
            admin().implicit_scope(&filter),
            DepartmentScope::Either(department)
        );
    }

    #[test]
    fn unaffiliated_non_admin_scope_matches_nothing() {
        let principal = Principal {
            id: "u-1".into(),
            role: Role::Physician,
            department: None,
        };
        let scope = principal.implicit_scope(&ListFilter::default());
        let referral = sample_referral(Uuid::new_v4(), Uuid::new_v4());
        assert!(!scope.permits(&referral));
    }

    #[test]
    fn scope_permits_matching_endpoints_only() {
        let requesting = Uuid::new_v4();
        let target = Uuid::new_v4();
        let referral = sample_referral(requesting, target);

        assert!(DepartmentScope::Unrestricted.permits(&referral));
        assert!(DepartmentScope::Sent(requesting).permits(&referral));
        assert!(!DepartmentScope::Sent(target).permits(&referral));
        assert!(DepartmentScope::Received(target).permits(&referral));
        assert!(!DepartmentScope::Received(requesting).permits(&referral));
        assert!(DepartmentScope::Either(requesting).permits(&referral));
        assert!(DepartmentScope::Either(target).permits(&referral));
        assert!(!DepartmentScope::Either(Uuid::new_v4()).permits(&referral));
    }
}
