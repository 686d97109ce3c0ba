//! Parser module — Python source file → [`ModuleDoc`].

pub mod annotation;
pub mod builder;
pub mod syntax;

use crate::error::{Error, Result};
use crate::model::ModuleDoc;
use builder::ModuleBuilder;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Read and parse a source file. The module name is the file stem.
pub fn parse_module(path: &Path) -> Result<ModuleDoc> {
    if !path.is_file() {
        return Err(Error::SourceNotFound {
            path: path.to_path_buf(),
        });
    }
    let source = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    debug!(path = %path.display(), bytes = source.len(), "parsing module");
    parse_source(&source, path)
}

/// Parse already-loaded source text attributed to `path`.
pub fn parse_source(source: &str, path: &Path) -> Result<ModuleDoc> {
    let module = syntax::parse(source).map_err(|e| Error::ParseFailure {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut builder = ModuleBuilder::new(name, path);
    builder.visit(&module);
    Ok(builder.finish())
}
