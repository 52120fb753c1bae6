//! Static mapping from job types to queues and entry points.

use geosync_entity::job::JobType;

/// Where a job type's work is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueRoute {
    /// Queue the job reference is placed on.
    pub queue: &'static str,
    /// Entry point identifier bound to the worker capability.
    pub entry_point: &'static str,
}

/// Resolves a job type to its queue and entry point.
///
/// The mapping is a total function over the closed [`JobType`]
/// enumeration, fixed at compile time. Unknown type *strings* are
/// rejected at the wire boundary by `JobType::from_str`, so an
/// unsupported type can never reach the registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueueRegistry;

impl QueueRegistry {
    /// Create a registry.
    pub fn new() -> Self {
        Self
    }

    /// Resolve the route for a job type. Deterministic, no side effects.
    pub fn resolve(&self, job_type: JobType) -> QueueRoute {
        match job_type {
            JobType::Export => QueueRoute {
                queue: "export",
                entry_point: "capability.export",
            },
            JobType::DeltaApply => QueueRoute {
                queue: "deltas",
                entry_point: "capability.delta_apply",
            },
            JobType::ProcessProjectFile => QueueRoute {
                queue: "process",
                entry_point: "capability.process_project_file",
            },
            JobType::Ping => QueueRoute {
                queue: "status",
                entry_point: "capability.ping",
            },
        }
    }
}
