// Adapters layer: concrete implementations of the domain ports for external systems.

pub mod llm;
pub mod timetable;

pub use llm::LlmClient;
pub use timetable::TimetableClient;
