//! Intake subsystems: records, validation, assessment, workflow, console.

pub mod assessment;
pub mod console;
pub mod diagnosis;
pub mod intake;
pub mod patient;
pub mod prompts;
pub mod records;
