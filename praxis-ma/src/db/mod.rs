//! Database access for the module access engine

pub mod assignments;
pub mod course_config;
pub mod courses;
pub mod progress;
