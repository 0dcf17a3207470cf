//! Source/test layout scaffolding.
//!
//! `ensure` is idempotent: it creates missing directories and empty marker
//! files and never truncates or removes anything, unless the caller opted
//! into `clean`, which deletes the source and tests directories first.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::domain::RunConfig;
use crate::error::{AutoTddError, Result};

/// What a scaffold pass changed on disk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScaffoldReport {
    /// Directories removed by a clean pass
    pub removed: Vec<PathBuf>,
    /// Directories that did not exist and were created
    pub created_dirs: Vec<PathBuf>,
    /// Marker files that did not exist and were created
    pub created_files: Vec<PathBuf>,
}

impl ScaffoldReport {
    pub fn is_noop(&self) -> bool {
        self.removed.is_empty() && self.created_dirs.is_empty() && self.created_files.is_empty()
    }
}

/// Creates the source and tests directories for a run
pub struct Scaffolder<'a> {
    config: &'a RunConfig,
}

impl<'a> Scaffolder<'a> {
    pub fn new(config: &'a RunConfig) -> Self {
        Self { config }
    }

    /// Make sure the layout exists, cleaning first if the run asked for it
    pub fn ensure(&self) -> Result<ScaffoldReport> {
        let mut report = ScaffoldReport::default();
        let dirs = [self.config.source_path(), self.config.tests_path()];

        if self.config.clean {
            for dir in &dirs {
                if self.clean_dir(dir)? {
                    report.removed.push(dir.clone());
                }
            }
        }

        for dir in &dirs {
            if !dir.is_dir() {
                fs::create_dir_all(dir)
                    .map_err(|e| AutoTddError::Scaffold(format!("Failed to create {}: {}", dir.display(), e)))?;
                report.created_dirs.push(dir.clone());
            }

            for marker in &self.config.layout.marker_files {
                let path = dir.join(marker);
                if touch(&path)? {
                    report.created_files.push(path);
                }
            }
        }

        debug!("Scaffold report: {:?}", report);
        Ok(report)
    }

    /// Remove one directory, refusing anything that is not inside the project.
    ///
    /// Both sides are canonicalized so `..` segments and symlinks cannot
    /// point the removal outside the project.
    fn clean_dir(&self, dir: &Path) -> Result<bool> {
        if !dir.exists() {
            return Ok(false);
        }
        let root = canonical(&self.config.project_dir)?;
        let target = canonical(dir)?;
        if !target.starts_with(&root) || target == root {
            return Err(AutoTddError::Scaffold(format!(
                "Refusing to clean {}: not a subdirectory of {}",
                dir.display(),
                self.config.project_dir.display()
            )));
        }

        warn!("Clean requested: removing {}", target.display());
        fs::remove_dir_all(&target)
            .map_err(|e| AutoTddError::Scaffold(format!("Failed to remove {}: {}", target.display(), e)))?;
        Ok(true)
    }
}

fn canonical(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path)
        .map_err(|e| AutoTddError::Scaffold(format!("Failed to resolve {}: {}", path.display(), e)))
}

/// Create `path` as an empty file if it does not exist. Never truncates.
///
/// Returns whether the file was created.
fn touch(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AutoTddError::Scaffold(format!("Failed to create {}: {}", path.display(), e)))?;
    Ok(true)
}
