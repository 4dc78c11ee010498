//! Metric names emitted through the `metrics` facade.

pub const REGISTRATIONS_TOTAL: &str = "pdfgen_worker_registrations_total";
pub const HEARTBEATS_TOTAL: &str = "pdfgen_worker_heartbeats_total";
pub const JOBS_TOTAL: &str = "pdfgen_worker_jobs_total";
pub const JOB_DURATION_MS: &str = "pdfgen_worker_job_duration_ms";
pub const RESULT_SUBMISSIONS_TOTAL: &str = "pdfgen_worker_result_submissions_total";
pub const JOBS_IN_FLIGHT: &str = "pdfgen_worker_jobs_in_flight";
