//! A project directory: root manifest plus installed packages.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::{InstalledPackages, ProjectManifest};

/// Default manifest file name inside a project directory.
pub const MANIFEST_FILE: &str = "composer.json";

/// Default installed package list, relative to the project directory.
pub const INSTALLED_FILE: &str = "vendor/composer/installed.json";

/// A loaded project.
///
/// The manifest and package list are separate fields so that the manifest can
/// be borrowed mutably while the packages are read.
///
/// # Examples
///
/// ```no_run
/// use script_merge_core::{Orchestrator, TracingSink, TriggerEvent};
/// use script_merge_project::Project;
///
/// let mut project = Project::open(".").unwrap();
/// let mut orchestrator = Orchestrator::new();
/// orchestrator.handle(
///     TriggerEvent::PostInstall,
///     &mut project.manifest,
///     &project.packages,
///     &mut TracingSink,
/// );
/// project.save().unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct Project {
    /// Where the manifest was loaded from and will be saved to.
    pub manifest_path: PathBuf,
    pub manifest: ProjectManifest,
    pub packages: InstalledPackages,
}

impl Project {
    /// Opens a project directory using the default file locations.
    ///
    /// # Errors
    ///
    /// Propagates manifest and package list loading errors.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        Self::open_with(dir.join(MANIFEST_FILE), dir.join(INSTALLED_FILE))
    }

    /// Opens a project from explicit file paths.
    ///
    /// # Errors
    ///
    /// Propagates manifest and package list loading errors.
    pub fn open_with(manifest_path: impl Into<PathBuf>, installed_path: impl AsRef<Path>) -> Result<Self> {
        let manifest_path = manifest_path.into();
        let manifest = ProjectManifest::load(&manifest_path)?;
        let packages = InstalledPackages::load(installed_path)?;
        Ok(Self {
            manifest_path,
            manifest,
            packages,
        })
    }

    /// Writes the manifest back to [`manifest_path`](Self::manifest_path).
    ///
    /// # Errors
    ///
    /// Propagates manifest write errors.
    pub fn save(&self) -> Result<()> {
        self.manifest.save(&self.manifest_path)
    }
}
