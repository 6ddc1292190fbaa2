// Sample database module - builds the per-lesson SQLite store learners query

use std::path::{Path, PathBuf};

use color_eyre::{eyre::WrapErr, Result};
use serde::Deserialize;

use crate::models::SampleSource;
use crate::names;

pub mod helpers;
mod schema;

pub use schema::{create_table_sql, insert_sql, to_sql_value};

/// Where the sample database of `lesson_id` lives inside `data_dir`.
pub fn sample_db_path(data_dir: &Path, lesson_id: &str) -> PathBuf {
    data_dir.join(names::sample_db_file_name(lesson_id))
}

// Handle to one lesson's sample database
pub struct SampleDb {
    db: libsql::Database,
    path: PathBuf,
}

#[derive(Deserialize)]
struct Count {
    count: i64,
}

#[derive(Deserialize)]
struct TableName {
    name: String,
}

impl SampleDb {
    /// Build the store at `path` from scratch: any previous file is deleted,
    /// then every declared table is created and filled in one transaction.
    pub async fn materialize(path: impl AsRef<Path>, source: &SampleSource) -> Result<Self> {
        let path = path.as_ref();
        remove_existing(path)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
        }

        let db = libsql::Builder::new_local(path).build().await?;
        let conn = db.connect()?;
        let rows = schema::populate(&conn, source).await?;

        tracing::info!(
            path = %path.display(),
            tables = source.schema.tables.len(),
            rows,
            "sample database has been materialized"
        );

        Ok(Self {
            db,
            path: path.to_owned(),
        })
    }

    /// Open an existing sample database for reading.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            color_eyre::eyre::bail!("sample database {} does not exist", path.display());
        }
        let db = libsql::Builder::new_local(path).build().await?;
        Ok(Self {
            db,
            path: path.to_owned(),
        })
    }

    pub fn connect(&self) -> Result<libsql::Connection> {
        Ok(self.db.connect()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn table_names(&self) -> Result<Vec<String>> {
        let conn = self.connect()?;
        let tables: Vec<TableName> = helpers::query_all(
            &conn,
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
            (),
        )
        .await?;
        Ok(tables.into_iter().map(|t| t.name).collect())
    }

    pub async fn row_count(&self, table: &str) -> Result<i64> {
        let conn = self.connect()?;
        let count: Count =
            helpers::query_one(&conn, &format!("SELECT COUNT(*) AS count FROM {table}"), ())
                .await?;
        Ok(count.count)
    }
}

fn remove_existing(path: &Path) -> Result<()> {
    let mut targets = vec![path.to_owned()];
    for suffix in ["-wal", "-shm", "-journal"] {
        let mut sibling = path.as_os_str().to_owned();
        sibling.push(suffix);
        targets.push(PathBuf::from(sibling));
    }

    for target in targets {
        if target.exists() {
            std::fs::remove_file(&target)
                .wrap_err_with(|| format!("failed to remove {}", target.display()))?;
            tracing::debug!(path = %target.display(), "removed previous sample database file");
        }
    }
    Ok(())
}
