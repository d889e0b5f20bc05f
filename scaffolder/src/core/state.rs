//! Mutable bookkeeping owned by one agent-loop invocation.

use std::collections::BTreeSet;

use crate::core::catalog::WriteMode;
use crate::core::classifier::{FileChange, FileChanges, classify_write, classify_writes};
use crate::core::types::{ActionRecord, Message};

/// A successful `write_to_file` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    pub filename: String,
    pub mode: WriteMode,
}

/// State of one loop invocation.
///
/// Owned by the loop and moved through [`run_step`](crate::step::run_step);
/// nothing else holds a reference to the transcript while the loop runs.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopState {
    /// Last step started (0 before the first step, 1-indexed afterwards).
    pub step: u32,
    pub transcript: Vec<Message>,
    pub actions: Vec<ActionRecord>,
    pub writes: Vec<WriteRecord>,
    pub directories: Vec<String>,
}

impl LoopState {
    pub fn new(seed: Vec<Message>) -> Self {
        Self {
            step: 0,
            transcript: seed,
            actions: Vec::new(),
            writes: Vec::new(),
            directories: Vec::new(),
        }
    }

    pub fn push(&mut self, message: Message) {
        self.transcript.push(message);
    }

    /// Record a successful write and report how it changed the project.
    pub fn record_write(
        &mut self,
        filename: &str,
        mode: WriteMode,
        known_files: &BTreeSet<String>,
    ) -> FileChange {
        let created_here = self.writes.iter().any(|w| {
            w.filename == filename
                && classify_write(&w.filename, w.mode, known_files) == FileChange::New
        });
        self.writes.push(WriteRecord {
            filename: filename.to_string(),
            mode,
        });
        if created_here {
            FileChange::New
        } else {
            classify_write(filename, mode, known_files)
        }
    }

    pub fn record_directory(&mut self, directory: &str) {
        if !self.directories.iter().any(|d| d == directory) {
            self.directories.push(directory.to_string());
        }
    }

    /// Every written file, in first-seen order without duplicates.
    pub fn written_files(&self) -> Vec<String> {
        let mut files: Vec<String> = Vec::new();
        for write in &self.writes {
            if !files.contains(&write.filename) {
                files.push(write.filename.clone());
            }
        }
        files
    }

    pub fn file_changes(&self, known_files: &BTreeSet<String>) -> FileChanges {
        classify_writes(
            self.writes.iter().map(|w| (w.filename.as_str(), w.mode)),
            known_files,
        )
    }
}
