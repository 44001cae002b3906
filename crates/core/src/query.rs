//! Query and filter construction for list operations.
//!
//! A caller's requested filter and the authorization-derived department scope
//! are combined here into a single `QuerySpec` with AND semantics across
//! independent dimensions. Stores apply the spec through
//! [`QuerySpec::matches`] and [`QuerySpec::sort`], so filtering logic is
//! written once and testable without a store.

use chrono::{DateTime, Utc};
use referral_types::HistoryNumber;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::{DepartmentScope, Principal};
use crate::referral::{DepartmentId, Referral};
use crate::status::{Priority, Status};

/// Direction of referral traffic relative to a department.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TrafficKind {
    /// Referrals originated by the department.
    Sent,
    /// Referrals addressed to the department.
    Received,
}

/// A requested list filter, as supplied by the caller.
///
/// Department parameters act as scoping hints only for administrators;
/// everyone else is scoped to their own affiliation regardless of what they
/// supply here.
#[derive(Clone, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(default)]
pub struct ListFilter {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub kind: Option<TrafficKind>,
    #[param(value_type = Option<String>)]
    pub department: Option<DepartmentId>,
    #[param(value_type = Option<String>)]
    pub requesting_department: Option<DepartmentId>,
    #[param(value_type = Option<String>)]
    pub target_department: Option<DepartmentId>,
    /// Inclusive lower bound on creation time (RFC 3339).
    #[param(value_type = Option<String>)]
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on creation time (RFC 3339).
    #[param(value_type = Option<String>)]
    pub to: Option<DateTime<Utc>>,
    /// Triage view: high/urgent priority referrals still awaiting attention,
    /// oldest first. Overrides the ad-hoc filters above.
    pub urgent: bool,
    /// Pending queue of a department, oldest first.
    pub pending: bool,
}

/// Result ordering of a query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest first (triage and pending queues).
    CreatedAsc,
    /// Newest first (the default).
    CreatedDesc,
}

/// The combined data-selection criteria for a list operation.
///
/// All dimensions are AND-combined: a referral is selected only when it
/// satisfies every supplied criterion and falls inside the department scope.
#[derive(Clone, Debug)]
pub struct QuerySpec {
    statuses: Option<Vec<Status>>,
    priorities: Option<Vec<Priority>>,
    history_number: Option<HistoryNumber>,
    created_from: Option<DateTime<Utc>>,
    created_to: Option<DateTime<Utc>>,
    scope: DepartmentScope,
    sort: SortOrder,
}

impl QuerySpec {
    /// Combine a requested filter with the caller's authorization scope.
    ///
    /// The urgent view bypasses the ad-hoc filters entirely and selects
    /// high/urgent referrals still awaiting attention, oldest first. The
    /// pending view selects the pending queue of a department (received
    /// traffic unless the caller asked otherwise), oldest first. Both remain
    /// AND-combined with the caller's department scope. Everything else
    /// combines the explicit equality and date-range filters with the scope,
    /// newest first.
    pub fn build(filter: &ListFilter, principal: &Principal) -> QuerySpec {
        let mut filter = filter.clone();
        if filter.pending && filter.kind.is_none() {
            filter.kind = Some(TrafficKind::Received);
        }
        let scope = principal.implicit_scope(&filter);

        if filter.urgent {
            return QuerySpec {
                statuses: Some(vec![Status::Pending, Status::InProgress]),
                priorities: Some(vec![Priority::High, Priority::Urgent]),
                history_number: None,
                created_from: None,
                created_to: None,
                scope,
                sort: SortOrder::CreatedAsc,
            };
        }

        if filter.pending {
            return QuerySpec {
                statuses: Some(vec![Status::Pending]),
                priorities: None,
                history_number: None,
                created_from: None,
                created_to: None,
                scope,
                sort: SortOrder::CreatedAsc,
            };
        }

        QuerySpec {
            statuses: filter.status.map(|status| vec![status]),
            priorities: filter.priority.map(|priority| vec![priority]),
            history_number: None,
            created_from: filter.from,
            created_to: filter.to,
            scope,
            sort: SortOrder::CreatedDesc,
        }
    }

    /// Scoped lookup of every referral carrying the given history number.
    pub fn for_history_number(history_number: HistoryNumber, principal: &Principal) -> QuerySpec {
        QuerySpec {
            statuses: None,
            priorities: None,
            history_number: Some(history_number),
            created_from: None,
            created_to: None,
            scope: principal.implicit_scope(&ListFilter::default()),
            sort: SortOrder::CreatedDesc,
        }
    }

    /// Whether the referral satisfies every criterion of this spec.
    pub fn matches(&self, referral: &Referral) -> bool {
        if let Some(statuses) = &self.statuses {
            if !statuses.contains(&referral.status()) {
                return false;
            }
        }
        if let Some(priorities) = &self.priorities {
            if !priorities.contains(&referral.priority) {
                return false;
            }
        }
        if let Some(history_number) = &self.history_number {
            if referral.patient.history_number != *history_number {
                return false;
            }
        }
        if let Some(from) = self.created_from {
            if referral.created_at < from {
                return false;
            }
        }
        if let Some(to) = self.created_to {
            if referral.created_at > to {
                return false;
            }
        }
        self.scope.permits(referral)
    }

    /// Order a result set according to this spec.
    pub fn sort(&self, referrals: &mut [Referral]) {
        match self.sort {
            SortOrder::CreatedAsc => referrals.sort_by_key(|r| r.created_at),
            SortOrder::CreatedDesc => {
                referrals.sort_by_key(|r| std::cmp::Reverse(r.created_at))
            }
        }
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort
    }

    pub fn scope(&self) -> &DepartmentScope {
        &self.scope
    }
}
