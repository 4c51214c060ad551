//! Typed records of the workforce console pages

#[macro_use]
pub mod macros;

use chrono::{DateTime, Utc};

impl_view_entity!(
    Employee,
    "ai_employees",
    ["name", "role", "description"],
    {
        role: String,
        department: String,
        description: String,
        success_rate: f64,
        tasks_completed: u32,
        skills: Vec<String>,
    }
);

impl_view_entity!(
    SecurityEvent,
    "security_events",
    ["name", "source", "description"],
    {
        severity: String,
        source: String,
        description: String,
        occurred_at: DateTime<Utc>,
    }
);

impl_view_entity!(
    Integration,
    "integrations",
    ["name", "provider", "description"],
    {
        provider: String,
        category: String,
        description: String,
        last_sync: Option<DateTime<Utc>>,
    }
);

impl_view_entity!(
    Webhook,
    "webhooks",
    ["name", "url", "events"],
    {
        url: String,
        events: Vec<String>,
        success_rate: f64,
        deliveries: u32,
    }
);

impl_view_entity!(
    ProcessingJob,
    "processing_jobs",
    ["name", "job_type"],
    {
        job_type: String,
        priority: String,
        progress: f64,
    }
);
