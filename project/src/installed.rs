//! Installed package list.
//!
//! Reads the dependency manager's `installed.json`, which comes in two
//! layouts: a bare array of package objects, or an object with a `packages`
//! array. Each package contributes its `name` and `extra` block; everything
//! else is ignored.

use std::io::BufReader;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use script_merge_core::{Package, PackageRepository};

use crate::error::{ProjectError, Result};

/// Packages installed alongside the root project.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use script_merge_core::PackageRepository;
/// use script_merge_project::InstalledPackages;
///
/// let installed = InstalledPackages::from_value(json!({
///     "packages": [
///         { "name": "acme/qa", "extra": { "script-merge": {} } },
///         { "version": "1.0.0" }
///     ]
/// }))
/// .unwrap();
/// assert_eq!(installed.packages().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstalledPackages {
    packages: Vec<Package>,
}

impl InstalledPackages {
    /// Loads the package list from `path`.
    ///
    /// A missing file means nothing is installed and yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](ProjectError::IoError) for read failures other
    /// than a missing file, [`JsonError`](ProjectError::JsonError) for invalid
    /// JSON, or [`InvalidManifest`](ProjectError::InvalidManifest) if neither
    /// layout matches.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = match std::fs::File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No installed package list");
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };
        let reader = BufReader::new(file);
        let document: Value = serde_json::from_reader(reader)?;
        Self::from_value(document)
    }

    /// Builds the list from an already parsed document.
    pub fn from_value(document: Value) -> Result<Self> {
        let entries = match document {
            Value::Array(entries) => entries,
            Value::Object(mut object) => match object.remove("packages") {
                Some(Value::Array(entries)) => entries,
                _ => {
                    return Err(ProjectError::InvalidManifest(
                        "installed package list has no `packages` array".to_string(),
                    ));
                }
            },
            _ => {
                return Err(ProjectError::InvalidManifest(
                    "installed package list must be an array or object".to_string(),
                ));
            }
        };

        let packages = entries
            .into_iter()
            .filter_map(|entry| {
                let name = entry.get("name")?.as_str()?.to_string();
                let extra = entry.get("extra").cloned().unwrap_or(Value::Null);
                Some(Package::new(name, extra))
            })
            .collect();

        Ok(Self { packages })
    }

    /// Number of installed packages.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Returns `true` if nothing is installed.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl PackageRepository for InstalledPackages {
    fn packages(&self) -> Vec<Package> {
        self.packages.clone()
    }
}

impl From<Vec<Package>> for InstalledPackages {
    fn from(packages: Vec<Package>) -> Self {
        Self { packages }
    }
}
