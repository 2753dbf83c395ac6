//! Pure domain logic for the helpdesk ticketing service.
//!
//! Everything in this crate is side-effect free: the SLA calculator and the
//! lifecycle planner take explicit inputs (including the current time) and
//! return values for the persistence layer to apply. No database or clock
//! access happens here.

pub mod error;
pub mod lifecycle;
pub mod sla;
pub mod status;
pub mod types;
