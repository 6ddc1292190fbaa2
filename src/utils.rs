use std::path::{Path, PathBuf};

use color_eyre::{eyre::WrapErr, Result};

use crate::document::LessonDoc;
use crate::names;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lesson files in `dir`, sorted by name. With a `prefix` only names starting
/// with it are returned.
pub fn lesson_files(dir: &Path, prefix: Option<&str>) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .wrap_err_with(|| format!("failed to read lesson directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_lesson = path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext == names::LESSON_FILE_EXTENSION)
            && path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| prefix.map_or(true, |p| name.starts_with(p)));
        if is_lesson {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).wrap_err_with(|| format!("failed to read {}", path.display()))
}

/// Serialize the whole document, write it next to `path` and rename it into
/// place, so a lesson file is never left half written.
pub fn write_lesson(path: &Path, doc: &LessonDoc) -> Result<()> {
    let text = doc.to_pretty_string()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, text).wrap_err_with(|| format!("failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .wrap_err_with(|| format!("failed to replace {}", path.display()))
}

pub fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
