//! Transition tables for the hotel service panels

use super::{Assignment, Phase, StatusDef, StatusWorkflow, Transition};

const fn status(
    id: &'static str,
    label: &'static str,
    phase: Phase,
    stamp: Option<&'static str>,
) -> StatusDef {
    StatusDef {
        id,
        label,
        phase,
        stamp,
    }
}

const fn edge(from: &'static str, to: &'static str, action: &'static str) -> Transition {
    Transition { from, to, action }
}

pub static HOUSEKEEPING: StatusWorkflow = StatusWorkflow {
    name: "housekeeping",
    resource_path: "/api/housekeeping/tasks",
    statuses: &[
        status("pending", "Pending", Phase::Open, None),
        status("assigned", "Assigned", Phase::Waiting, None),
        status("in_progress", "In Progress", Phase::Active, Some("startedAt")),
        status("completed", "Completed", Phase::Done, Some("completedAt")),
        status("cancelled", "Cancelled", Phase::Cancelled, None),
    ],
    transitions: &[
        edge("pending", "assigned", "assign"),
        edge("pending", "cancelled", "cancel"),
        edge("assigned", "in_progress", "start"),
        edge("in_progress", "completed", "complete"),
    ],
    assignment: Some(Assignment {
        target_status: "assigned",
        assignee_field: "staffId",
    }),
};

pub static LAUNDRY: StatusWorkflow = StatusWorkflow {
    name: "laundry",
    resource_path: "/api/laundry/orders",
    statuses: &[
        status("pickup_scheduled", "Pickup Scheduled", Phase::Open, None),
        status("collected", "Collected", Phase::Open, Some("collectedAt")),
        status("processing", "Processing", Phase::Active, Some("processingStarted")),
        status(
            "ready",
            "Ready for Delivery",
            Phase::Waiting,
            Some("processingCompleted"),
        ),
        status("delivered", "Delivered", Phase::Done, Some("deliveredAt")),
        status("cancelled", "Cancelled", Phase::Cancelled, None),
    ],
    transitions: &[
        edge("pickup_scheduled", "collected", "collect"),
        edge("collected", "processing", "process"),
        edge("processing", "ready", "mark_ready"),
        edge("ready", "delivered", "deliver"),
    ],
    assignment: None,
};

pub static MAINTENANCE: StatusWorkflow = StatusWorkflow {
    name: "maintenance",
    resource_path: "/api/maintenance/requests",
    statuses: &[
        status("reported", "Reported", Phase::Open, None),
        status("assigned", "Assigned", Phase::Waiting, None),
        status("in_progress", "In Progress", Phase::Active, Some("startedAt")),
        status("completed", "Completed", Phase::Done, Some("completedAt")),
        status("cancelled", "Cancelled", Phase::Cancelled, None),
    ],
    transitions: &[
        edge("reported", "assigned", "assign"),
        edge("assigned", "in_progress", "start"),
        edge("in_progress", "completed", "complete"),
    ],
    assignment: Some(Assignment {
        target_status: "assigned",
        assignee_field: "technicianId",
    }),
};

pub static SERVICE_REQUEST: StatusWorkflow = StatusWorkflow {
    name: "service_request",
    resource_path: "/api/service-requests",
    statuses: &[
        status("pending", "Pending", Phase::Open, None),
        status("confirmed", "Confirmed", Phase::Waiting, None),
        status("in_progress", "In Progress", Phase::Active, None),
        status(
            "completed",
            "Completed",
            Phase::Done,
            Some("completedDateTime"),
        ),
        status("cancelled", "Cancelled", Phase::Cancelled, None),
    ],
    transitions: &[
        edge("pending", "confirmed", "confirm"),
        edge("pending", "cancelled", "cancel"),
        edge("confirmed", "in_progress", "start"),
        edge("confirmed", "cancelled", "cancel"),
        edge("in_progress", "completed", "complete"),
    ],
    assignment: None,
};
