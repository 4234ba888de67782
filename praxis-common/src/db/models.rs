//! Database models

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub guid: String,
    pub username: String,
    pub role: String,
    pub archived: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub guid: String,
    pub title: String,
    pub module_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseModule {
    pub course_guid: String,
    pub module_index: i64,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleLesson {
    pub guid: String,
    pub course_guid: String,
    pub module_index: i64,
    pub title: String,
}
