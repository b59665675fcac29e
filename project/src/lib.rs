//! Project manifest and installed package loading for script-merge.
//!
//! This crate connects the in-memory merge engine in `script-merge-core` to
//! files on disk:
//!
//! - [`ProjectManifest`]: the root manifest (`composer.json` layout),
//!   implementing [`RootProject`](script_merge_core::RootProject).
//! - [`InstalledPackages`]: the installed package list, implementing
//!   [`PackageRepository`](script_merge_core::PackageRepository).
//! - [`Project`]: both, opened from a project directory.
//!
//! # Quick start
//!
//! ```no_run
//! use script_merge_core::{Orchestrator, TriggerEvent};
//! use script_merge_project::Project;
//!
//! let mut project = Project::open("path/to/app").unwrap();
//! let mut log: Vec<String> = Vec::new();
//! Orchestrator::new().handle(
//!     TriggerEvent::PostUpdate,
//!     &mut project.manifest,
//!     &project.packages,
//!     &mut log,
//! );
//! project.save().unwrap();
//! ```

mod error;
mod installed;
mod manifest;
mod project;

pub use error::{ProjectError, Result};
pub use installed::InstalledPackages;
pub use manifest::ProjectManifest;
pub use project::{INSTALLED_FILE, MANIFEST_FILE, Project};
