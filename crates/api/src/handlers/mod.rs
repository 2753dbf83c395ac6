//! Request handlers, grouped by resource.

pub mod comments;
pub mod sla_policies;
pub mod tickets;
