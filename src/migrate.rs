// Migration module - one-shot copy of lesson content into the monorepo layout

use std::fmt;
use std::path::{Path, PathBuf};

use color_eyre::{
    eyre::{bail, WrapErr},
    Result,
};

use crate::names;

struct CopyStep {
    from: &'static str,
    to: &'static [&'static str],
    extension: &'static str,
    what: &'static str,
}

const PLAN: &[CopyStep] = &[
    CopyStep {
        from: names::DEFAULT_CONTENT_DIR,
        to: &["apps", "web", "public", "lessons"],
        extension: names::LESSON_FILE_EXTENSION,
        what: "lesson",
    },
    CopyStep {
        from: names::DEFAULT_DATA_DIR,
        to: &["apps", "web", "public", "lesson-data"],
        extension: names::SAMPLE_DB_EXTENSION,
        what: "database",
    },
];

#[derive(Debug, Clone)]
pub struct MigrationLog {
    pub source: PathBuf,
    pub target: PathBuf,
    pub entries: Vec<String>,
    pub log_file: PathBuf,
}

impl fmt::Display for MigrationLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        writeln!(f, "source: {}", self.source.display())?;
        writeln!(f, "target: {}", self.target.display())?;
        write!(
            f,
            "{} log entries written to {}",
            self.entries.len(),
            self.log_file.display()
        )
    }
}

pub struct Migrator {
    source: PathBuf,
    target: PathBuf,
    entries: Vec<String>,
}

impl Migrator {
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Result<Self> {
        let source = source.into();
        if !source.is_dir() {
            bail!("source directory does not exist: {}", source.display());
        }
        Ok(Self {
            source,
            target: target.into(),
            entries: Vec::new(),
        })
    }

    fn log(&mut self, entry: String) {
        tracing::info!("{entry}");
        self.entries.push(entry);
    }

    pub fn run(mut self) -> Result<MigrationLog> {
        self.log("starting lesson content migration".to_owned());
        for step in PLAN {
            self.copy(step)?;
        }
        self.log("migration completed".to_owned());

        let log_file = self.target.join(names::MIGRATION_LOG_FILE);
        let mut text = format!(
            "# Migration Log\n\nsqlflow-lessons {}\n\n",
            crate::utils::VERSION
        );
        for entry in &self.entries {
            text.push_str(&format!("- {entry}\n"));
        }
        std::fs::create_dir_all(&self.target)?;
        std::fs::write(&log_file, text)
            .wrap_err_with(|| format!("failed to write {}", log_file.display()))?;

        Ok(MigrationLog {
            source: self.source,
            target: self.target,
            entries: self.entries,
            log_file,
        })
    }

    fn copy(&mut self, step: &CopyStep) -> Result<()> {
        let from = self.source.join(step.from);
        if !from.is_dir() {
            self.log(format!("no {} directory, skipped", step.from));
            return Ok(());
        }
        let to = step.to.iter().fold(self.target.clone(), |dir, part| dir.join(part));
        std::fs::create_dir_all(&to)
            .wrap_err_with(|| format!("failed to create {}", to.display()))?;

        let mut files: Vec<PathBuf> = std::fs::read_dir(&from)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && has_extension(path, step.extension))
            .collect();
        files.sort();

        for file in files {
            let Some(name) = file.file_name() else {
                continue;
            };
            std::fs::copy(&file, to.join(name))
                .wrap_err_with(|| format!("failed to copy {}", file.display()))?;
            self.log(format!("migrated {}: {}", step.what, name.to_string_lossy()));
        }
        Ok(())
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|ext| ext == extension)
}
