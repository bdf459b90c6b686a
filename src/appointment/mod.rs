// Appointment lifecycle behavior layered on the room core

pub use hooks::AppointmentHooks;
pub use summary::{AppointmentSummary, LoggingSummarySink, SummarySink};

pub mod hooks;
pub mod summary;
