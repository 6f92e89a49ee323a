//! Filesystem-backed gardens: `<root>/<garden>/<path>`.

use std::future::Future;
use std::path::{Component, Path, PathBuf};
use std::pin::Pin;

use async_trait::async_trait;
use tracing::{debug, instrument};

use gardenlink_shared::{GardenError, Result};

use crate::DocumentStore;

/// Reserved per-garden metadata directory, never listed.
pub const METADATA_DIR: &str = ".git";

/// Garden used when nothing else is known.
const FALLBACK_GARDEN: &str = "home";

/// Gardens stored as sibling directories under one root.
#[derive(Debug, Clone)]
pub struct GardenStore {
    root: PathBuf,
    current: String,
    /// Explicit garden list; empty means "discover from `root`".
    gardens: Vec<String>,
}

impl GardenStore {
    pub fn new(root: impl Into<PathBuf>, current: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            current: current.into(),
            gardens: Vec::new(),
        }
    }

    /// Pin the known gardens instead of discovering them from disk.
    pub fn with_gardens(mut self, gardens: Vec<String>) -> Self {
        self.gardens = gardens;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn garden_dir(&self, garden: &str) -> Result<PathBuf> {
        if garden.is_empty() || garden.contains(['/', '\\']) || garden == ".." || garden == "." {
            return Err(GardenError::validation(format!("invalid garden name: {garden:?}")));
        }
        Ok(self.root.join(garden))
    }

    /// Map a garden-rooted path onto disk, refusing anything that climbs out.
    fn file_path(&self, garden: &str, path: &str) -> Result<PathBuf> {
        let mut resolved = self.garden_dir(garden)?;
        for component in Path::new(path.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(GardenError::validation(format!(
                        "path escapes garden {garden}: {path}"
                    )));
                }
            }
        }
        Ok(resolved)
    }
}

#[async_trait]
impl DocumentStore for GardenStore {
    fn current_garden(&self) -> &str {
        &self.current
    }

    async fn gardens(&self) -> Result<Vec<String>> {
        if !self.gardens.is_empty() {
            return Ok(self.gardens.clone());
        }

        let mut found = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| GardenError::io(&self.root, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| GardenError::io(&self.root, e))?
        {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_dir && !name.starts_with('.') {
                found.push(name);
            }
        }
        found.sort();

        if found.is_empty() {
            found.push(FALLBACK_GARDEN.to_string());
        }
        Ok(found)
    }

    #[instrument(skip(self))]
    async fn read_file(&self, garden: &str, path: &str) -> Result<String> {
        let dir = self.garden_dir(garden)?;
        if !tokio::fs::try_exists(&dir).await.unwrap_or(false) {
            return Err(GardenError::Storage(format!("garden not found: {garden}")));
        }

        let file = self.file_path(garden, path)?;
        tokio::fs::read_to_string(&file)
            .await
            .map_err(|e| GardenError::io(&file, e))
    }

    #[instrument(skip(self))]
    async fn list_files(&self, garden: &str) -> Result<Vec<String>> {
        let dir = self.garden_dir(garden)?;
        if !tokio::fs::try_exists(&dir).await.unwrap_or(false) {
            return Err(GardenError::Storage(format!("garden not found: {garden}")));
        }

        let mut files = Vec::new();
        walk(dir, String::new(), &mut files).await;
        debug!(count = files.len(), "listed garden files");
        Ok(files)
    }
}

/// Depth-first walk appending garden-rooted paths. Unreadable entries are skipped.
fn walk<'a>(
    dir: PathBuf,
    prefix: String,
    out: &'a mut Vec<String>,
) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
    Box::pin(async move {
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "skipping unreadable directory");
                return;
            }
        };

        let mut names = Vec::new();
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => names.push(entry.file_name().to_string_lossy().into_owned()),
                Ok(None) => break,
                Err(e) => {
                    debug!(dir = %dir.display(), error = %e, "directory read interrupted");
                    break;
                }
            }
        }
        // read_dir order is platform dependent
        names.sort();

        for name in names {
            if name == METADATA_DIR {
                continue;
            }
            let path = dir.join(&name);
            let rel = format!("{prefix}/{name}");
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_dir() => walk(path, rel, out).await,
                Ok(_) => out.push(rel),
                Err(e) => debug!(path = %path.display(), error = %e, "skipping unstatable entry"),
            }
        }
    })
}
