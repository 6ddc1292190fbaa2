pub const DEFAULT_CONTENT_DIR: &str = "lesson-content";
pub const DEFAULT_DATA_DIR: &str = "lesson-data";
pub const LESSON_FILE_PREFIX: &str = "lesson_";
pub const LESSON_FILE_EXTENSION: &str = "json";
pub const SAMPLE_DB_EXTENSION: &str = "db";

pub const MCQ: &str = "mcq";
pub const TRUE_FALSE: &str = "truefalse";
pub const FILL: &str = "fill";

// Top-level sections every normalized lesson carries
pub const QUIZ: &str = "quiz";
pub const PRACTICE: &str = "practice";
pub const EXAMPLES: &str = "examples";
pub const CHALLENGES: &str = "challenges";
pub const SCHEMA: &str = "schema";
pub const SAMPLE_DATA: &str = "sample_data";

// Migration layout
pub const MIGRATION_LOG_FILE: &str = "MIGRATION_LOG.md";

pub fn lesson_file_name(lesson_id: &str) -> String {
    format!("{LESSON_FILE_PREFIX}{lesson_id}.{LESSON_FILE_EXTENSION}")
}

pub fn sample_db_file_name(lesson_id: &str) -> String {
    format!("{LESSON_FILE_PREFIX}{lesson_id}.{SAMPLE_DB_EXTENSION}")
}

pub fn namespace_prefix(lesson_id: &str) -> String {
    format!("{lesson_id}_")
}

pub fn quiz_id(position: usize) -> String {
    format!("q{position}")
}

pub fn practice_id(position: usize) -> String {
    format!("practice{position}")
}

pub fn challenge_id(position: usize) -> String {
    format!("ch{position}")
}

pub fn step_id(challenge_id: &str, position: usize) -> String {
    format!("{challenge_id}_step{position}")
}

pub fn namespaced(lesson_id: &str, local_id: &str) -> String {
    format!("{lesson_id}_{local_id}")
}
