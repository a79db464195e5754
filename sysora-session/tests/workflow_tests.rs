//! Service panel workflows end to end

use chrono::{TimeZone, Utc};
use serde_json::json;
use sysora_session::workflow::{Phase, WorkflowError};
use sysora_session::{ServiceDomain, StatusSummary};

#[test]
fn test_laundry_order_lifecycle_stamps_each_step() {
    let laundry = ServiceDomain::Laundry.workflow();
    let at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap();

    let steps = [
        ("pickup_scheduled", "collected", "collectedAt"),
        ("collected", "processing", "processingStarted"),
        ("processing", "ready", "processingCompleted"),
        ("ready", "delivered", "deliveredAt"),
    ];
    for (from, to, field) in steps {
        let record = laundry.transition_at(from, to, at).unwrap();
        let patch = record.local_patch();
        assert_eq!(patch["status"], json!(to));
        assert_eq!(patch[field], json!("2026-03-14T09:30:00.000Z"));
        assert_eq!(record.request_body(), json!({ "status": to }));
    }

    assert!(laundry.is_terminal("delivered"));
    assert!(laundry.next_statuses("delivered").is_empty());
}

#[test]
fn test_maintenance_assignment_uses_technician_field() {
    let record = ServiceDomain::Maintenance
        .workflow()
        .assign("reported", "tech-7")
        .unwrap();

    assert!(record.is_assignment());
    assert_eq!(record.to, "assigned");
    assert_eq!(record.request_body(), json!({ "technicianId": "tech-7" }));
    assert_eq!(
        ServiceDomain::Maintenance.assign_path("r 1").as_deref(),
        Some("/api/maintenance/requests/r%201/assign")
    );
}

#[test]
fn test_service_request_cannot_skip_confirmation() {
    let workflow = ServiceDomain::ServiceRequest.workflow();

    assert_eq!(
        workflow.transition("pending", "in_progress"),
        Err(WorkflowError::IllegalTransition {
            workflow: "service_request",
            from: "pending".to_string(),
            to: "in_progress".to_string(),
        })
    );
    assert!(matches!(
        workflow.transition("pending", "archived"),
        Err(WorkflowError::UnknownStatus { .. })
    ));
    assert_eq!(
        workflow.assign("pending", "s1"),
        Err(WorkflowError::NotAssignable {
            workflow: "service_request"
        })
    );
}

#[test]
fn test_housekeeping_summary_counts() {
    let housekeeping = ServiceDomain::Housekeeping.workflow();
    let summary = housekeeping.summarize([
        "pending",
        "pending",
        "assigned",
        "in_progress",
        "completed",
        "cancelled",
        "mystery",
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
    assert_eq!(housekeeping.status("assigned").map(|s| s.phase), Some(Phase::Waiting));
}

#[test]
fn test_every_domain_has_reachable_terminal_status() {
    for domain in ServiceDomain::ALL {
        let workflow = domain.workflow();
        assert!(
            workflow.statuses.iter().any(|s| workflow.is_terminal(s.id)),
            "{domain} has no terminal status"
        );
        assert!(domain.status_path("x").ends_with("/x/status"));
    }
}
