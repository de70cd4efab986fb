//! Output bundle writer
//!
//! Layout under the output directory:
//!
//! ```text
//! docker-compose.yml
//! MIGRATION.md
//! configs/<path>
//! scripts/<name>
//! ```

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use cloudport_types::{
    blueprints::{CONFIG_DIR, SCRIPTS_DIR},
    MappingResult, Resource, TranslationSettings,
};
use tracing::{debug, info, warn};

use crate::{
    compose::ComposeFile,
    error::{ComposeError, ComposeResult},
    report::MigrationReport,
};

pub const COMPOSE_FILE_NAME: &str = "docker-compose.yml";
pub const REPORT_FILE_NAME: &str = "MIGRATION.md";

/// Everything a translation run writes to disk
#[derive(Debug, Clone)]
pub struct OutputBundle {
    pub compose: ComposeFile,
    pub configs: BTreeMap<String, String>,
    pub scripts: BTreeMap<String, String>,
    pub report: MigrationReport,
}

impl OutputBundle {
    /// Assemble the bundle for a batch; `results` must match `resources` in order
    pub fn from_results(
        resources: &[Resource],
        results: &[MappingResult],
        settings: &TranslationSettings,
    ) -> Self {
        let mut configs = BTreeMap::new();
        let mut scripts = BTreeMap::new();

        for result in results.iter().filter(|r| !r.is_error_placeholder()) {
            for (path, content) in &result.configs {
                if configs.insert(path.clone(), content.clone()).is_some() {
                    warn!("Config {} generated twice; keeping the later one", path);
                }
            }
            for (name, content) in &result.scripts {
                if scripts.insert(name.clone(), content.clone()).is_some() {
                    warn!("Script {} generated twice; keeping the later one", name);
                }
            }
        }

        let compose = ComposeFile::from_results(results, settings);
        let report =
            MigrationReport::from_results(resources, results).with_notes(compose.adjustments.clone());

        Self {
            compose,
            configs,
            scripts,
            report,
        }
    }
}

/// Reject absolute paths and parent-directory traversal
pub fn safe_relative_path(path: &str) -> ComposeResult<PathBuf> {
    let candidate = Path::new(path);
    if path.is_empty() {
        return Err(ComposeError::UnsafePath("empty path".to_string()));
    }

    let mut clean = PathBuf::new();
    for component in candidate.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ComposeError::UnsafePath(path.to_string()));
            }
        }
    }

    if clean.as_os_str().is_empty() {
        return Err(ComposeError::UnsafePath(path.to_string()));
    }
    Ok(clean)
}

/// Writes an `OutputBundle` under a root directory
pub struct OutputWriter {
    root: PathBuf,
}

impl OutputWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write the bundle, returning every written path
    ///
    /// All paths are checked before anything is written, so an unsafe entry
    /// leaves the output directory untouched.
    pub async fn write(&self, bundle: &OutputBundle) -> ComposeResult<Vec<PathBuf>> {
        let mut files: Vec<(PathBuf, String, bool)> =
            vec![(self.root.join(COMPOSE_FILE_NAME), bundle.compose.to_yaml()?, false)];

        for (path, content) in &bundle.configs {
            let relative = safe_relative_path(path)?;
            files.push((self.root.join(CONFIG_DIR).join(relative), content.clone(), false));
        }
        for (name, content) in &bundle.scripts {
            let relative = safe_relative_path(name)?;
            files.push((self.root.join(SCRIPTS_DIR).join(relative), content.clone(), true));
        }
        files.push((self.root.join(REPORT_FILE_NAME), bundle.report.render(), false));

        let mut written = Vec::with_capacity(files.len());
        for (path, content, executable) in files {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, content).await?;
            if executable {
                make_executable(&path).await?;
            }
            debug!("Wrote {}", path.display());
            written.push(path);
        }

        info!(
            "Wrote {} files to {}",
            written.len(),
            self.root.display()
        );
        Ok(written)
    }
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> ComposeResult<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> ComposeResult<()> {
    Ok(())
}
