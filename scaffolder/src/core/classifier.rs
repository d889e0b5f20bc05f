//! Deterministic classification of file writes as new or modified.

use std::collections::BTreeSet;

use crate::core::catalog::WriteMode;

/// Effect of a `write_to_file` call relative to the files known before the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChange {
    New,
    Modified,
}

/// Classify one write.
///
/// - `New` if the write overwrites and `filename` is not a known file.
/// - `Modified` otherwise (appends always modify, as does overwriting a known file).
pub fn classify_write(filename: &str, mode: WriteMode, known_files: &BTreeSet<String>) -> FileChange {
    if mode == WriteMode::Overwrite && !known_files.contains(filename) {
        FileChange::New
    } else {
        FileChange::Modified
    }
}

/// New and modified files of a session, each in first-seen order without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileChanges {
    pub new_files: Vec<String>,
    pub modified_files: Vec<String>,
}

/// Classify a sequence of successful writes.
///
/// A file that was first created in this session and later written again
/// stays `new`.
pub fn classify_writes<'a, I>(writes: I, known_files: &BTreeSet<String>) -> FileChanges
where
    I: IntoIterator<Item = (&'a str, WriteMode)>,
{
    let mut changes = FileChanges::default();
    for (filename, mode) in writes {
        if changes.new_files.iter().any(|f| f == filename) {
            continue;
        }
        match classify_write(filename, mode, known_files) {
            FileChange::New => changes.new_files.push(filename.to_string()),
            FileChange::Modified => {
                if !changes.modified_files.iter().any(|f| f == filename) {
                    changes.modified_files.push(filename.to_string());
                }
            }
        }
    }
    changes
}
