//! Status workflows for hotel service panels
//!
//! Each panel (housekeeping tasks, laundry orders, maintenance requests,
//! guest service requests) moves its items through a small forward-only
//! status graph. The graphs are data in [`tables`]; this module validates
//! moves against them and produces the update to send.

pub mod tables;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Workflow error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("{workflow}: unknown status '{status}'")]
    UnknownStatus {
        workflow: &'static str,
        status: String,
    },

    #[error("{workflow}: cannot move from '{from}' to '{to}'")]
    IllegalTransition {
        workflow: &'static str,
        from: String,
        to: String,
    },

    #[error("{workflow}: items cannot be assigned")]
    NotAssignable { workflow: &'static str },
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Where a status sits in the panel's summary counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Counted as pending
    Open,
    /// Between steps; not counted in pending/in-progress/completed
    Waiting,
    Active,
    Done,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusDef {
    pub id: &'static str,
    pub label: &'static str,
    pub phase: Phase,
    /// Timestamp field set when an item enters this status
    pub stamp: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: &'static str,
    pub to: &'static str,
    /// Name of the panel action triggering the move
    pub action: &'static str,
}

/// Assignment goes through its own endpoint carrying the assignee id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub target_status: &'static str,
    pub assignee_field: &'static str,
}

/// Explicit status graph for one service domain
#[derive(Debug)]
pub struct StatusWorkflow {
    pub name: &'static str,
    /// Collection path on the REST backend
    pub resource_path: &'static str,
    pub statuses: &'static [StatusDef],
    pub transitions: &'static [Transition],
    pub assignment: Option<Assignment>,
}

impl StatusWorkflow {
    pub fn status(&self, id: &str) -> Option<&'static StatusDef> {
        self.statuses.iter().find(|s| s.id == id)
    }

    pub fn is_known(&self, id: &str) -> bool {
        self.status(id).is_some()
    }

    fn known(&self, id: &str) -> WorkflowResult<&'static StatusDef> {
        self.status(id).ok_or_else(|| WorkflowError::UnknownStatus {
            workflow: self.name,
            status: id.to_string(),
        })
    }

    pub fn can_transition(&self, from: &str, to: &str) -> bool {
        self.transitions
            .iter()
            .any(|t| t.from == from && t.to == to)
    }

    /// Moves available from `from`, in table order
    pub fn next_statuses(&self, from: &str) -> Vec<&'static Transition> {
        self.transitions.iter().filter(|t| t.from == from).collect()
    }

    /// A known status with no way out
    pub fn is_terminal(&self, status: &str) -> bool {
        self.is_known(status) && !self.transitions.iter().any(|t| t.from == status)
    }

    /// Validate a move and record it, stamped with the current time
    pub fn transition(&self, from: &str, to: &str) -> WorkflowResult<TransitionRecord> {
        self.transition_at(from, to, Utc::now())
    }

    pub fn transition_at(
        &self,
        from: &str,
        to: &str,
        at: DateTime<Utc>,
    ) -> WorkflowResult<TransitionRecord> {
        let from_def = self.known(from)?;
        let to_def = self.known(to)?;

        let edge = self
            .transitions
            .iter()
            .find(|t| t.from == from_def.id && t.to == to_def.id)
            .ok_or_else(|| WorkflowError::IllegalTransition {
                workflow: self.name,
                from: from.to_string(),
                to: to.to_string(),
            })?;

        Ok(TransitionRecord {
            workflow: self.name,
            from: edge.from,
            to: edge.to,
            action: edge.action,
            stamp: to_def.stamp.map(|field| (field, at)),
            assignee: None,
        })
    }

    /// Validate an assignment from `from` to the assigned status
    pub fn assign(&self, from: &str, assignee_id: &str) -> WorkflowResult<TransitionRecord> {
        let assignment = self.assignment.ok_or(WorkflowError::NotAssignable {
            workflow: self.name,
        })?;

        let mut record = self.transition(from, assignment.target_status)?;
        record.assignee = Some((assignment.assignee_field, assignee_id.to_string()));
        Ok(record)
    }

    /// Count items per summary bucket
    pub fn summarize<'a, I>(&self, statuses: I) -> StatusSummary
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut summary = StatusSummary::default();
        for status in statuses {
            summary.total += 1;
            match self.status(status).map(|s| s.phase) {
                Some(Phase::Open) => summary.pending += 1,
                Some(Phase::Active) => summary.in_progress += 1,
                Some(Phase::Done) => summary.completed += 1,
                Some(Phase::Cancelled) => summary.cancelled += 1,
                Some(Phase::Waiting) => {}
                None => summary.unknown += 1,
            }
        }
        summary
    }
}

/// A validated status move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRecord {
    pub workflow: &'static str,
    pub from: &'static str,
    pub to: &'static str,
    pub action: &'static str,
    /// Timestamp field and value to record on the item
    pub stamp: Option<(&'static str, DateTime<Utc>)>,
    /// Assignee field and id, for assignments
    pub assignee: Option<(&'static str, String)>,
}

impl TransitionRecord {
    pub fn is_assignment(&self) -> bool {
        self.assignee.is_some()
    }

    /// Body sent to the status or assign endpoint
    pub fn request_body(&self) -> Value {
        match &self.assignee {
            Some((field, id)) => {
                let mut body = Map::new();
                body.insert(field.to_string(), Value::from(id.as_str()));
                Value::Object(body)
            }
            None => json!({ "status": self.to }),
        }
    }

    /// Fields to merge into the locally held item after the server accepts
    pub fn local_patch(&self) -> Map<String, Value> {
        let mut patch = Map::new();
        patch.insert("status".to_string(), Value::from(self.to));
        if let Some((field, at)) = self.stamp {
            patch.insert(
                field.to_string(),
                Value::from(at.to_rfc3339_opts(SecondsFormat::Millis, true)),
            );
        }
        if let Some((field, id)) = &self.assignee {
            patch.insert(field.to_string(), Value::from(id.as_str()));
        }
        patch
    }
}

/// Summary counts shown at the top of a panel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub unknown: usize,
}

/// Hotel service domains with a status workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceDomain {
    Housekeeping,
    Laundry,
    Maintenance,
    ServiceRequest,
}

impl ServiceDomain {
    pub const ALL: [ServiceDomain; 4] = [
        ServiceDomain::Housekeeping,
        ServiceDomain::Laundry,
        ServiceDomain::Maintenance,
        ServiceDomain::ServiceRequest,
    ];

    pub fn workflow(&self) -> &'static StatusWorkflow {
        match self {
            ServiceDomain::Housekeeping => &tables::HOUSEKEEPING,
            ServiceDomain::Laundry => &tables::LAUNDRY,
            ServiceDomain::Maintenance => &tables::MAINTENANCE,
            ServiceDomain::ServiceRequest => &tables::SERVICE_REQUEST,
        }
    }

    /// `PATCH` target for a status change
    pub fn status_path(&self, item_id: &str) -> String {
        format!(
            "{}/{}/status",
            self.workflow().resource_path,
            urlencoding::encode(item_id)
        )
    }

    /// `PATCH` target for an assignment, if the domain supports one
    pub fn assign_path(&self, item_id: &str) -> Option<String> {
        let workflow = self.workflow();
        workflow.assignment.map(|_| {
            format!(
                "{}/{}/assign",
                workflow.resource_path,
                urlencoding::encode(item_id)
            )
        })
    }
}

impl std::fmt::Display for ServiceDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.workflow().name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_tables_only_reference_declared_statuses() {
        for domain in ServiceDomain::ALL {
            let workflow = domain.workflow();
            for t in workflow.transitions {
                assert!(workflow.is_known(t.from), "{}: {}", workflow.name, t.from);
                assert!(workflow.is_known(t.to), "{}: {}", workflow.name, t.to);
            }
            if let Some(assignment) = workflow.assignment {
                assert!(workflow.is_known(assignment.target_status));
            }
        }
    }

    #[test]
    fn test_housekeeping_forward_only() {
        let hk = ServiceDomain::Housekeeping.workflow();
        assert!(hk.can_transition("pending", "assigned"));
        assert!(hk.can_transition("assigned", "in_progress"));
        assert!(!hk.can_transition("completed", "in_progress"));
        assert!(!hk.can_transition("in_progress", "pending"));
        assert!(hk.is_terminal("completed"));
        assert!(hk.is_terminal("cancelled"));
        assert!(!hk.is_terminal("pending"));
        assert!(!hk.is_terminal("nonsense"));
    }

    #[test]
    fn test_transition_stamps_entry_time() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        let record = ServiceDomain::Maintenance
            .workflow()
            .transition_at("assigned", "in_progress", at)
            .unwrap();

        assert_eq!(record.action, "start");
        assert_eq!(record.request_body(), json!({ "status": "in_progress" }));

        let patch = record.local_patch();
        assert_eq!(patch["status"], json!("in_progress"));
        assert_eq!(patch["startedAt"], json!("2026-03-01T09:30:00.000Z"));
    }

    #[test]
    fn test_illegal_and_unknown_moves() {
        let laundry = ServiceDomain::Laundry.workflow();
        assert_eq!(
            laundry.transition("pickup_scheduled", "delivered"),
            Err(WorkflowError::IllegalTransition {
                workflow: "laundry",
                from: "pickup_scheduled".to_string(),
                to: "delivered".to_string(),
            })
        );
        assert!(matches!(
            laundry.transition("lost", "collected"),
            Err(WorkflowError::UnknownStatus { .. })
        ));
    }

    #[test]
    fn test_assignment_only_where_supported() {
        let record = ServiceDomain::Housekeeping
            .workflow()
            .assign("pending", "staff-7")
            .unwrap();
        assert!(record.is_assignment());
        assert_eq!(record.request_body(), json!({ "staffId": "staff-7" }));
        assert_eq!(record.local_patch()["status"], json!("assigned"));

        assert!(ServiceDomain::Maintenance
            .workflow()
            .assign("in_progress", "tech-1")
            .is_err());
        assert_eq!(
            ServiceDomain::Laundry.workflow().assign("pickup_scheduled", "x"),
            Err(WorkflowError::NotAssignable {
                workflow: "laundry"
            })
        );
    }

    #[test]
    fn test_summary_buckets() {
        let summary = ServiceDomain::Laundry.workflow().summarize([
            "pickup_scheduled",
            "collected",
            "processing",
            "ready",
            "delivered",
            "cancelled",
            "misplaced",
        ]);

        assert_eq!(
            summary,
            StatusSummary {
                total: 7,
                pending: 2,
                in_progress: 1,
                completed: 1,
                cancelled: 1,
                unknown: 1,
            }
        );
    }

    #[test]
    fn test_paths() {
        assert_eq!(
            ServiceDomain::ServiceRequest.status_path("r 1"),
            "/api/service-requests/r%201/status"
        );
        assert_eq!(
            ServiceDomain::Maintenance.assign_path("m1").as_deref(),
            Some("/api/maintenance/requests/m1/assign")
        );
        assert_eq!(ServiceDomain::Laundry.assign_path("o1"), None);
    }
}
