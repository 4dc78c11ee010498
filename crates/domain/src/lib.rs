pub mod entities;
pub mod job;
pub mod ports;

pub use entities::*;
pub use job::*;
pub use pdfgen_errors::{WorkerError, WorkerResult};
pub use ports::*;
