//! Fire-and-forget event dispatch run in strict isolation from the
//! triggering request's scope — §4.9.

pub mod scheduler;

pub use scheduler::EventScheduler;
