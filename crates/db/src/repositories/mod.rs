//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod comment_repo;
pub mod sla_policy_repo;
pub mod status_log_repo;
pub mod ticket_repo;

pub use comment_repo::CommentRepo;
pub use sla_policy_repo::SlaPolicyRepo;
pub use status_log_repo::StatusLogRepo;
pub use ticket_repo::{TicketRepo, TransitionError};
