pub mod batch;
pub mod db;
pub mod document;
pub mod migrate;
pub mod models;
pub mod names;
pub mod namespace;
pub mod normalize;
pub mod utils;
pub mod validate;

pub use batch::{run, BatchConfig, BatchReport, Operations};
pub use document::LessonDoc;
pub use normalize::Defaults;
