//! Project configuration (`.compdoc.yml`) and project indexing.
//!
//! ```yaml
//! modules:
//!   pkg.vec: pkg/vec.py
//! formatters:
//!   markdown: compdoc-formatters/markdown.md.j2
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = ".compdoc.yml";

/// Folder, relative to the project root, holding formatter fragments.
pub const FORMATTER_DIR: &str = "compdoc-formatters";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Short module name → source path
    pub modules: BTreeMap<String, PathBuf>,
    /// Formatter name → fragment path
    pub formatters: BTreeMap<String, PathBuf>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Config::from_yaml(&text, path)
    }

    /// Parse YAML text; `path` only labels errors.
    pub fn from_yaml(text: &str, path: &Path) -> Result<Config> {
        serde_yaml::from_str(text).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Resolve every relative path against `dir`. Absolute paths are kept.
    pub fn relative_to(self, dir: &Path) -> Config {
        let join = |map: BTreeMap<String, PathBuf>| {
            map.into_iter()
                .map(|(name, path)| (name, dir.join(path)))
                .collect()
        };
        Config {
            modules: join(self.modules),
            formatters: join(self.formatters),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_yaml::to_string(self).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        fs::write(path, text).map_err(|e| Error::io(path, e))
    }

    /// Index a project: every `.py` file under `root` and every formatter in
    /// `root/compdoc-formatters` whose file name matches `formatter_pattern`.
    pub fn index(root: &Path, formatter_pattern: &str) -> Result<Config> {
        Ok(Config {
            modules: index_modules(root)?,
            formatters: index_formatters(root, formatter_pattern)?,
        })
    }
}

fn glob_error(root: &Path, message: impl ToString) -> Error {
    Error::Config {
        path: root.to_path_buf(),
        message: message.to_string(),
    }
}

/// Map `pkg/sub/mod.py` to `pkg.sub.mod`, skipping package `__init__` files.
/// Paths are relative to `root`.
pub fn index_modules(root: &Path) -> Result<BTreeMap<String, PathBuf>> {
    let pattern = format!(
        "{}/**/*.py",
        glob::Pattern::escape(&root.to_string_lossy())
    );
    let mut modules = BTreeMap::new();
    for entry in glob::glob(&pattern).map_err(|e| glob_error(root, e))? {
        let path = entry.map_err(|e| glob_error(root, e))?;
        let relative = path.strip_prefix(root).unwrap_or(&path);
        let name = module_name(relative);
        if name.ends_with("__init__") {
            continue;
        }
        debug!(module = %name, path = %relative.display(), "indexed module");
        modules.insert(name, relative.to_path_buf());
    }
    Ok(modules)
}

fn module_name(relative: &Path) -> String {
    let parts: Vec<String> = relative
        .with_extension("")
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    parts.join(".")
}

/// Formatter fragments in `root/compdoc-formatters` matching `pattern`.
/// The formatter name is the file name up to its first `.`. The folder is
/// created when missing.
pub fn index_formatters(root: &Path, pattern: &str) -> Result<BTreeMap<String, PathBuf>> {
    let matcher = glob::Pattern::new(pattern).map_err(|e| glob_error(root, e))?;
    let dir = root.join(FORMATTER_DIR);
    if !dir.exists() {
        fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
    }

    let mut formatters = BTreeMap::new();
    for entry in fs::read_dir(&dir).map_err(|e| Error::io(&dir, e))? {
        let entry = entry.map_err(|e| Error::io(&dir, e))?;
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if !entry.path().is_file() || !matcher.matches(&file_name) {
            continue;
        }
        let name = file_name
            .split('.')
            .next()
            .unwrap_or(&file_name)
            .to_string();
        formatters.insert(name, Path::new(FORMATTER_DIR).join(&file_name));
    }
    Ok(formatters)
}
