pub mod job_source;

pub use job_source::{ChannelJobFetcher, JobFetcher, JobSender, NoopJobFetcher};
