//! File operations confined to a single root directory.
//!
//! Every operation resolves its path against the root first and refuses any
//! path that lands outside it. Failures are logged here and returned as
//! [`FsError`]; the dispatcher turns them into the model-facing sentinel.

use std::ffi::OsString;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local};
use tracing::{debug, warn};

use crate::core::catalog::WriteMode;
use crate::core::types::DirectoryListing;

/// Why a file operation did not happen.
#[derive(Debug)]
pub enum FsError {
    /// The path resolves outside the sandbox root.
    SandboxViolation { path: String },
    NotFound { path: String },
    /// A directory was required.
    NotADirectory { path: String },
    Io { path: String, source: io::Error },
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsError::SandboxViolation { path } => {
                write!(f, "'{path}' is not in the current working directory")
            }
            FsError::NotFound { path } => write!(f, "'{path}' not found"),
            FsError::NotADirectory { path } => write!(f, "'{path}' is not a directory"),
            FsError::Io { path, source } => write!(f, "'{path}': {source}"),
        }
    }
}

impl std::error::Error for FsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FsError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

fn io_error(path: &str, source: io::Error) -> FsError {
    if source.kind() == io::ErrorKind::NotFound {
        FsError::NotFound {
            path: path.to_string(),
        }
    } else {
        FsError::Io {
            path: path.to_string(),
            source,
        }
    }
}

/// Raw metadata of a sandboxed path.
#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub name: String,
    pub size: u64,
    pub created: DateTime<Local>,
    pub modified: DateTime<Local>,
    pub accessed: DateTime<Local>,
    pub permissions: String,
    pub is_dir: bool,
    pub is_file: bool,
    pub absolute_path: PathBuf,
}

/// File store rooted at a directory that must already exist.
#[derive(Debug, Clone)]
pub struct SandboxedFileStore {
    root: PathBuf,
}

impl SandboxedFileStore {
    pub fn new(root: &Path) -> Result<Self> {
        let root = root
            .canonicalize()
            .with_context(|| format!("resolve sandbox root {}", root.display()))?;
        if !root.is_dir() {
            bail!("sandbox root {} is not a directory", root.display());
        }
        debug!(root = %root.display(), "sandbox ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `path` to an absolute path inside the root.
    ///
    /// Relative paths are taken from the root. `..` is folded lexically, then
    /// the deepest existing ancestor is canonicalized so symlinks cannot lead
    /// out of the root.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, FsError> {
        let requested = Path::new(path);
        let joined = if requested.is_absolute() {
            requested.to_path_buf()
        } else {
            self.root.join(requested)
        };
        let violation = || FsError::SandboxViolation {
            path: path.to_string(),
        };
        let resolved = resolve_existing_prefix(&normalize(&joined)).ok_or_else(violation)?;
        if resolved.starts_with(&self.root) {
            Ok(resolved)
        } else {
            Err(violation())
        }
    }

    pub fn read(&self, path: &str) -> Result<String, FsError> {
        logged("read", path, self.read_inner(path))
    }

    /// Write `content`, creating missing parent directories first.
    pub fn write(&self, path: &str, content: &str, mode: WriteMode) -> Result<(), FsError> {
        logged("write", path, self.write_inner(path, content, mode))
    }

    pub fn metadata(&self, path: &str) -> Result<FileMetadata, FsError> {
        logged("metadata", path, self.metadata_inner(path))
    }

    pub fn list(&self, path: &str) -> Result<DirectoryListing, FsError> {
        logged("list", path, self.list_inner(path))
    }

    /// Create a directory and its parents; an existing directory is not an error.
    pub fn mkdir(&self, path: &str) -> Result<(), FsError> {
        logged("mkdir", path, self.mkdir_inner(path))
    }

    fn read_inner(&self, path: &str) -> Result<String, FsError> {
        let resolved = self.resolve(path)?;
        fs::read_to_string(&resolved).map_err(|err| io_error(path, err))
    }

    fn write_inner(&self, path: &str, content: &str, mode: WriteMode) -> Result<(), FsError> {
        let resolved = self.resolve(path)?;
        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent).map_err(|err| io_error(path, err))?;
        }
        let mut options = OpenOptions::new();
        options.create(true);
        match mode {
            WriteMode::Overwrite => options.write(true).truncate(true),
            WriteMode::Append => options.append(true),
        };
        let mut file = options.open(&resolved).map_err(|err| io_error(path, err))?;
        file.write_all(content.as_bytes())
            .map_err(|err| io_error(path, err))?;
        debug!(path, bytes = content.len(), ?mode, "wrote file");
        Ok(())
    }

    fn metadata_inner(&self, path: &str) -> Result<FileMetadata, FsError> {
        let resolved = self.resolve(path)?;
        let meta = fs::metadata(&resolved).map_err(|err| io_error(path, err))?;
        let modified = meta.modified().map_err(|err| io_error(path, err))?;
        let accessed = meta.accessed().unwrap_or(modified);
        let created = meta.created().unwrap_or(modified);
        let name = resolved
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(FileMetadata {
            name,
            size: meta.len(),
            created: DateTime::<Local>::from(created),
            modified: DateTime::<Local>::from(modified),
            accessed: DateTime::<Local>::from(accessed),
            permissions: permission_string(&meta),
            is_dir: meta.is_dir(),
            is_file: meta.is_file(),
            absolute_path: resolved,
        })
    }

    fn list_inner(&self, path: &str) -> Result<DirectoryListing, FsError> {
        let resolved = self.resolve(path)?;
        let meta = fs::metadata(&resolved).map_err(|err| io_error(path, err))?;
        if !meta.is_dir() {
            return Err(FsError::NotADirectory {
                path: path.to_string(),
            });
        }

        let mut files = Vec::new();
        let mut directories = Vec::new();
        for entry in fs::read_dir(&resolved).map_err(|err| io_error(path, err))? {
            let entry = entry.map_err(|err| io_error(path, err))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            // Follow symlinks; dangling links are neither files nor directories.
            match fs::metadata(entry.path()) {
                Ok(meta) if meta.is_dir() => directories.push(name),
                Ok(meta) if meta.is_file() => files.push(name),
                _ => {}
            }
        }
        files.sort();
        directories.sort();

        Ok(DirectoryListing {
            total_files: files.len(),
            total_directories: directories.len(),
            files,
            directories,
        })
    }

    fn mkdir_inner(&self, path: &str) -> Result<(), FsError> {
        let resolved = self.resolve(path)?;
        fs::create_dir_all(&resolved).map_err(|err| io_error(path, err))?;
        debug!(path, "created directory");
        Ok(())
    }
}

fn logged<T>(op: &'static str, path: &str, result: Result<T, FsError>) -> Result<T, FsError> {
    if let Err(err) = &result {
        warn!(op, path, err = %err, "file operation failed");
    }
    result
}

/// Fold `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonicalize the deepest existing ancestor of `path` and re-append the rest.
///
/// Returns `None` for a dangling symlink, whose eventual target is unknown.
fn resolve_existing_prefix(path: &Path) -> Option<PathBuf> {
    let mut existing = path;
    let mut rest: Vec<OsString> = Vec::new();
    loop {
        match existing.canonicalize() {
            Ok(mut resolved) => {
                for part in rest.iter().rev() {
                    resolved.push(part);
                }
                return Some(resolved);
            }
            Err(_) if existing.symlink_metadata().is_ok() => return None,
            Err(_) => {}
        }
        let (parent, name) = (existing.parent()?, existing.file_name()?);
        rest.push(name.to_os_string());
        existing = parent;
    }
}

fn permission_string(meta: &fs::Metadata) -> String {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        mode_string(meta.permissions().mode(), meta.is_dir())
    }
    #[cfg(not(unix))]
    {
        let mode = if meta.permissions().readonly() { 0o444 } else { 0o666 };
        mode_string(mode, meta.is_dir())
    }
}

/// `ls -l` style rendering of the permission bits, e.g. `drwxr-xr-x`.
fn mode_string(mode: u32, is_dir: bool) -> String {
    const BITS: [(u32, char); 9] = [
        (0o400, 'r'),
        (0o200, 'w'),
        (0o100, 'x'),
        (0o040, 'r'),
        (0o020, 'w'),
        (0o010, 'x'),
        (0o004, 'r'),
        (0o002, 'w'),
        (0o001, 'x'),
    ];
    let mut out = String::with_capacity(10);
    out.push(if is_dir { 'd' } else { '-' });
    for (bit, flag) in BITS {
        out.push(if mode & bit != 0 { flag } else { '-' });
    }
    out
}
