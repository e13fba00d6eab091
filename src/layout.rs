//! Project layout: where module definitions and probe files live.
//!
//! A project is any directory holding a `SAAD/` directory. Module definition
//! documents sit in `SAAD/module_configs/` and probe files in
//! `SAAD/probe_configs/`. `ProjectLayout::open` performs the pre-flight checks
//! that must pass before authoring starts; `ProjectLayout::open_probe_files`
//! is the lighter check for work on existing probe files.

use crate::catalog::{ModuleCatalog, ModuleDocument};
use crate::codec;
use crate::error::AuthorError;
use crate::probe::Probe;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

pub const SAAD_DIR: &str = "SAAD";
pub const MODULE_CONFIGS_DIR: &str = "module_configs";
pub const PROBE_CONFIGS_DIR: &str = "probe_configs";
pub const PROJECT_ROOT_ENV: &str = "SAAD_PROJECT_ROOT";
const JSON_SUFFIX: &str = ".json";

fn is_project_root(candidate: &Path) -> bool {
    candidate.join(SAAD_DIR).is_dir()
}

fn search_upwards(start: &Path) -> Option<PathBuf> {
    let mut dir = fs::canonicalize(start).ok()?;
    loop {
        if is_project_root(&dir) {
            return Some(dir);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

/// Locate the project root.
///
/// An explicit hint (from `--project` or `SAAD_PROJECT_ROOT`) must itself hold
/// a `SAAD` directory. Without a hint the search climbs from `start` towards
/// the filesystem root.
pub fn find_project_root(hint: Option<&Path>, start: &Path) -> Result<PathBuf, AuthorError> {
    if let Some(hint) = hint {
        if !is_project_root(hint) {
            return Err(AuthorError::MissingSaadDirectory(hint.to_path_buf()));
        }
        return Ok(canonicalize_path(hint));
    }
    search_upwards(start).ok_or(AuthorError::ProjectRootNotFound)
}

#[derive(Clone, Debug)]
pub struct ProjectLayout {
    root: PathBuf,
    module_configs: PathBuf,
    probe_configs: PathBuf,
}

impl ProjectLayout {
    /// Run the pre-flight checks and create `probe_configs` when missing.
    pub fn open(root: &Path) -> Result<Self, AuthorError> {
        let layout = Self::open_probe_files(root)?;
        if !layout.module_configs.is_dir() || json_files(&layout.module_configs)?.is_empty() {
            return Err(AuthorError::NoModuleDefinitions(layout.module_configs));
        }
        if !layout.probe_configs.is_dir() {
            fs::create_dir_all(&layout.probe_configs)
                .map_err(|err| AuthorError::io(&layout.probe_configs, err))?;
            info!(path = %layout.probe_configs.display(), "created probe_configs directory");
        }
        Ok(layout)
    }

    /// Only require the `SAAD` directory. Module definitions are not needed
    /// to list, show or edit probe files that already exist.
    pub fn open_probe_files(root: &Path) -> Result<Self, AuthorError> {
        let saad = root.join(SAAD_DIR);
        if !saad.is_dir() {
            return Err(AuthorError::MissingSaadDirectory(root.to_path_buf()));
        }
        Ok(Self {
            root: canonicalize_path(root),
            module_configs: saad.join(MODULE_CONFIGS_DIR),
            probe_configs: saad.join(PROBE_CONFIGS_DIR),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn module_configs(&self) -> &Path {
        &self.module_configs
    }

    pub fn probe_configs(&self) -> &Path {
        &self.probe_configs
    }

    /// Every module definition document, sorted by file name.
    pub fn module_documents(&self) -> Result<Vec<ModuleDocument>, AuthorError> {
        let mut documents = Vec::new();
        for path in json_files(&self.module_configs)? {
            let text = fs::read_to_string(&path).map_err(|err| AuthorError::io(&path, err))?;
            documents.push(ModuleDocument::new(file_label(&path), text));
        }
        Ok(documents)
    }

    pub fn load_catalog(&self) -> Result<ModuleCatalog, AuthorError> {
        let documents = self.module_documents()?;
        debug!(count = documents.len(), "loading module definitions");
        let catalog = ModuleCatalog::from_documents(documents)?;
        if catalog.is_empty() {
            return Err(AuthorError::NoModuleDefinitions(self.module_configs.clone()));
        }
        Ok(catalog)
    }

    /// Path for a user-supplied probe file name.
    ///
    /// A trailing `.json` is stripped (only when something precedes it) and
    /// re-appended, so `checks` and `checks.json` name the same file.
    pub fn probe_file_path(&self, raw_name: &str) -> Result<PathBuf, AuthorError> {
        Ok(self.probe_configs.join(normalize_probe_file_name(raw_name)?))
    }

    /// Write `probes` to the named file, replacing any previous content.
    ///
    /// An empty list writes nothing and returns `None`.
    pub fn save_probes(
        &self,
        raw_name: &str,
        probes: &mut [Probe],
    ) -> Result<Option<PathBuf>, AuthorError> {
        if probes.is_empty() {
            debug!("no probes to save");
            return Ok(None);
        }
        let path = self.probe_file_path(raw_name)?;
        codec::write_probe_file(&path, probes)?;
        Ok(Some(path))
    }

    /// Probe files under `probe_configs`, sorted by file name.
    pub fn probe_files(&self) -> Result<Vec<PathBuf>, AuthorError> {
        if !self.probe_configs.is_dir() {
            return Ok(Vec::new());
        }
        json_files(&self.probe_configs)
    }

    /// Parse every probe file, keeping failures per file.
    pub fn load_probe_files(
        &self,
    ) -> Result<BTreeMap<String, Result<Vec<Probe>, AuthorError>>, AuthorError> {
        Ok(self
            .probe_files()?
            .into_iter()
            .map(|path| (file_label(&path), codec::read_probe_file(&path)))
            .collect())
    }
}

/// Normalize a probe file name to `<stem>.json`.
pub fn normalize_probe_file_name(raw_name: &str) -> Result<String, AuthorError> {
    let trimmed = raw_name.trim();
    if trimmed.is_empty() || trimmed.contains(['/', '\\']) {
        return Err(AuthorError::InvalidProbeFileName(raw_name.to_string()));
    }
    let stem = match trimmed.strip_suffix(JSON_SUFFIX) {
        Some(stem) if !stem.is_empty() => stem,
        _ => trimmed,
    };
    Ok(format!("{stem}{JSON_SUFFIX}"))
}

/// Express `path` relative to `root`, with `/` separators.
///
/// Relative inputs are taken as relative to `root`. The comparison is made on
/// canonical paths when both exist, and on lexically normalized paths
/// otherwise. Anything that does not land strictly inside `root` fails with
/// `PathOutsideProject`.
pub fn relativize(root: &Path, path: &Path) -> Result<String, AuthorError> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };
    let outside = || AuthorError::PathOutsideProject {
        path: path.to_path_buf(),
        root: root.to_path_buf(),
    };

    let pairs = [
        (canonicalize_path(root), canonicalize_path(&joined)),
        (lexical_normalize(root), lexical_normalize(&joined)),
    ];
    for (base, candidate) in &pairs {
        if let Ok(relative) = candidate.strip_prefix(base) {
            let parts: Vec<String> = relative
                .components()
                .map(|part| part.as_os_str().to_string_lossy().into_owned())
                .collect();
            if parts.is_empty() {
                return Err(outside());
            }
            return Ok(parts.join("/"));
        }
    }
    Err(outside())
}

pub fn canonicalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| lexical_normalize(path))
}

fn lexical_normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

fn json_files(dir: &Path) -> Result<Vec<PathBuf>, AuthorError> {
    let mut files = Vec::new();
    let entries = fs::read_dir(dir).map_err(|err| AuthorError::io(dir, err))?;
    for entry in entries {
        let path = entry.map_err(|err| AuthorError::io(dir, err))?.path();
        if path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some("json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
