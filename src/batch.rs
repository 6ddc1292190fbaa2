// Batch module - runs the lesson passes over a directory, one file at a time.
// A failing file is recorded in the report and the batch moves on.

use std::fmt;
use std::path::{Path, PathBuf};

use color_eyre::{eyre::WrapErr, Result};

use crate::db::{sample_db_path, SampleDb};
use crate::document::LessonDoc;
use crate::names;
use crate::namespace::namespace;
use crate::normalize::{normalize, Defaults};
use crate::utils;
use crate::validate::{validate, validate_source, Issue};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Operations {
    pub normalize: bool,
    pub namespace: bool,
    pub validate: bool,
    pub materialize: bool,
}

impl Operations {
    pub fn all() -> Self {
        Self {
            normalize: true,
            namespace: true,
            validate: true,
            materialize: true,
        }
    }

    /// Whether any selected pass needs the lesson id.
    pub fn needs_id(&self) -> bool {
        self.normalize || self.namespace || self.materialize
    }
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub content_dir: PathBuf,
    pub data_dir: PathBuf,
    /// Write changed lessons here instead of back in place.
    pub output_dir: Option<PathBuf>,
    pub file_prefix: Option<String>,
    pub operations: Operations,
    /// Report what would change without writing anything.
    pub dry_run: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from(names::DEFAULT_CONTENT_DIR),
            data_dir: PathBuf::from(names::DEFAULT_DATA_DIR),
            output_dir: None,
            file_prefix: Some(names::LESSON_FILE_PREFIX.to_owned()),
            operations: Operations::default(),
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Updated,
    Unchanged,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub file: String,
    pub outcome: Outcome,
    pub changes: Vec<String>,
    pub issues: Vec<Issue>,
    pub materialized: Option<PathBuf>,
    /// Row count of every table in the built sample database.
    pub tables: Vec<(String, i64)>,
}

impl FileReport {
    fn new(file: String) -> Self {
        Self {
            file,
            outcome: Outcome::Unchanged,
            changes: Vec::new(),
            issues: Vec::new(),
            materialized: None,
            tables: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub processed: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
    pub materialized: usize,
    pub issues: usize,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            processed: self.files.len(),
            ..Summary::default()
        };
        for file in &self.files {
            match file.outcome {
                Outcome::Updated => summary.updated += 1,
                Outcome::Unchanged => summary.unchanged += 1,
                Outcome::Skipped(_) => summary.skipped += 1,
                Outcome::Failed(_) => summary.failed += 1,
            }
            summary.materialized += usize::from(file.materialized.is_some());
            summary.issues += file.issues.len();
        }
        summary
    }

    pub fn file(&self, name: &str) -> Option<&FileReport> {
        self.files.iter().find(|f| f.file == name)
    }
}

impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::Updated => write!(f, "updated    {}", self.file)?,
            Outcome::Unchanged => write!(f, "ok         {}", self.file)?,
            Outcome::Skipped(reason) => write!(f, "skipped    {}: {reason}", self.file)?,
            Outcome::Failed(error) => write!(f, "failed     {}: {error}", self.file)?,
        }
        if !self.changes.is_empty() {
            write!(f, " ({})", self.changes.join(", "))?;
        }
        if let Some(db) = &self.materialized {
            write!(f, " -> {}", db.display())?;
            let tables: Vec<String> = self
                .tables
                .iter()
                .map(|(name, rows)| format!("{name}: {rows}"))
                .collect();
            if !tables.is_empty() {
                write!(f, " [{}]", tables.join(", "))?;
            }
        }
        for issue in &self.issues {
            write!(f, "\n    {}: {}", issue.section, issue.message)?;
        }
        Ok(())
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed {} files: {} updated, {} unchanged, {} skipped, {} failed, {} databases, {} issues",
            self.processed,
            self.updated,
            self.unchanged,
            self.skipped,
            self.failed,
            self.materialized,
            self.issues
        )
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for file in &self.files {
            writeln!(f, "{file}")?;
        }
        write!(f, "{}", self.summary())
    }
}

/// Run the selected passes over every lesson file in `config.content_dir`.
pub async fn run(config: &BatchConfig, defaults: &Defaults) -> Result<BatchReport> {
    let files = utils::lesson_files(&config.content_dir, config.file_prefix.as_deref())?;
    tracing::info!(
        dir = %config.content_dir.display(),
        files = files.len(),
        "processing lesson files"
    );

    let mut report = BatchReport::default();
    for path in files {
        let mut file = FileReport::new(utils::file_label(&path));
        if let Err(e) = process(config, defaults, &path, &mut file).await {
            tracing::error!(file = %file.file, "failed to process lesson: {e:#}");
            file.outcome = Outcome::Failed(format!("{e:#}"));
        }
        report.files.push(file);
    }

    tracing::info!("{}", report.summary());
    Ok(report)
}

async fn process(
    config: &BatchConfig,
    defaults: &Defaults,
    path: &Path,
    file: &mut FileReport,
) -> Result<()> {
    let ops = config.operations;
    let text = utils::read_text(path)?;
    let mut doc = match LessonDoc::parse(&text) {
        Ok(doc) => doc,
        Err(e) => {
            if ops.validate {
                file.issues = validate_source(&file.file, &text);
            }
            return Err(e).wrap_err("invalid JSON");
        }
    };

    let Some(lesson_id) = doc.id().map(str::to_owned) else {
        if ops.validate {
            file.issues = validate(&file.file, &doc);
        }
        if ops.needs_id() {
            tracing::warn!(file = %file.file, "skipping lesson without id");
            file.outcome = Outcome::Skipped("missing lesson id".to_owned());
        }
        return Ok(());
    };

    let mut changed = false;
    if ops.normalize {
        let normalized = normalize(&mut doc, defaults);
        for entry in normalized.coerced() {
            tracing::debug!(file = %file.file, path = %entry.path, "coerced malformed entry");
        }
        if normalized.changed() {
            changed = true;
            let filled = normalized.repaired().count() + normalized.added_sections.len();
            file.changes.push(format!("filled {filled} entries"));
        }
    }
    if ops.namespace {
        // id checked above
        let namespaced = namespace(&mut doc)?;
        if namespaced.changed() {
            changed = true;
            file.changes
                .push(format!("renamed {} ids", namespaced.renames.len()));
        }
    }
    if ops.validate {
        file.issues = validate(&file.file, &doc);
    }

    let target = match &config.output_dir {
        Some(dir) => dir.join(path.file_name().unwrap_or_default()),
        None => path.to_owned(),
    };
    let write = changed || (config.output_dir.is_some() && ops.normalize);
    if write && !config.dry_run {
        utils::write_lesson(&target, &doc)?;
        tracing::info!(file = %file.file, target = %target.display(), "lesson written");
    }
    if changed {
        file.outcome = Outcome::Updated;
    }

    if ops.materialize && !config.dry_run {
        let source = doc.sample_source()?;
        let db_path = sample_db_path(&config.data_dir, &lesson_id);
        let db = SampleDb::materialize(&db_path, &source)
            .await
            .wrap_err_with(|| format!("failed to materialize {}", db_path.display()))?;
        for table in db.table_names().await? {
            let rows = db.row_count(&table).await?;
            file.tables.push((table, rows));
        }
        file.materialized = Some(db.path().to_owned());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, outcome: Outcome) -> FileReport {
        FileReport {
            outcome,
            ..FileReport::new(name.to_owned())
        }
    }

    #[test]
    fn summary_counts_outcomes() {
        let mut failed = file("lesson_c.json", Outcome::Failed("invalid JSON".to_owned()));
        failed.issues.push(Issue {
            file: "lesson_c.json".to_owned(),
            section: "JSON".to_owned(),
            message: "invalid format".to_owned(),
        });
        let report = BatchReport {
            files: vec![
                file("lesson_a.json", Outcome::Updated),
                file("lesson_b.json", Outcome::Unchanged),
                failed,
                file("lesson_d.json", Outcome::Skipped("missing lesson id".to_owned())),
            ],
        };

        assert_eq!(
            report.summary(),
            Summary {
                processed: 4,
                updated: 1,
                unchanged: 1,
                skipped: 1,
                failed: 1,
                materialized: 0,
                issues: 1,
            }
        );
        let text = report.to_string();
        assert!(text.contains("failed     lesson_c.json: invalid JSON\n    JSON: invalid format"));
        assert!(text.ends_with("1 failed, 0 databases, 1 issues"));
    }

    #[test]
    fn materialized_file_lists_table_row_counts() {
        let mut built = file("lesson_joins.json", Outcome::Unchanged);
        built.materialized = Some(PathBuf::from("lesson-data/lesson_joins.db"));
        built.tables = vec![("departments".to_owned(), 2), ("employees".to_owned(), 3)];

        assert_eq!(
            built.to_string(),
            "ok         lesson_joins.json -> lesson-data/lesson_joins.db [departments: 2, employees: 3]"
        );
    }

    #[test]
    fn validation_alone_does_not_need_an_id() {
        let ops = Operations {
            validate: true,
            ..Operations::default()
        };
        assert!(!ops.needs_id());
        assert!(Operations::all().needs_id());
    }
}
