//! Compile driver: renders a template file against a config and writes the result.

use crate::config::Config;
use crate::context::Resolver;
use crate::error::{Error, Result};
use crate::render::jinja::JinjaEngine;
use crate::render::{RenderError, TemplateEngine};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Compile `template` with the Jinja engine. See [`compile_with`].
pub fn compile(template: &Path, config: Config, out: Option<&Path>) -> Result<PathBuf> {
    compile_with(&JinjaEngine, template, config, out)
}

/// Render `template` and write the result to `out` (or the default output
/// path). Config paths are resolved relative to the template's directory.
pub fn compile_with(
    engine: &dyn TemplateEngine,
    template: &Path,
    config: Config,
    out: Option<&Path>,
) -> Result<PathBuf> {
    let project_dir = template.parent().unwrap_or_else(|| Path::new(""));
    let resolver = Arc::new(Resolver::new(config.relative_to(project_dir)));
    let out_path = out.map_or_else(|| default_output_path(template), Path::to_path_buf);

    let source = fs::read_to_string(template).map_err(|e| Error::io(template, e))?;
    debug!(template = %template.display(), "rendering template");

    let rendered = engine
        .render(&source, resolver)
        .map_err(|e| compile_failure(template, e))?;

    fs::write(&out_path, rendered).map_err(|e| Error::io(&out_path, e))?;
    info!(
        template = %template.display(),
        output = %out_path.display(),
        "compiled template"
    );
    Ok(out_path)
}

fn compile_failure(template: &Path, error: RenderError) -> Error {
    let message = error.to_string();
    let cause = match error {
        RenderError::Resolve(cause) => Some(Box::new(cause)),
        RenderError::Engine(_) => None,
    };
    Error::CompileFailure {
        template: template.to_path_buf(),
        message,
        cause,
    }
}

/// `README.md.j2` → `README.md`; `notes.md` → `notes.compiled.md`.
pub fn default_output_path(template: &Path) -> PathBuf {
    if template.extension().is_some_and(|ext| ext == "j2") {
        return template.with_extension("");
    }
    let stem = template
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match template.extension() {
        Some(ext) => format!("{stem}.compiled.{}", ext.to_string_lossy()),
        None => format!("{stem}.compiled"),
    };
    template.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Echo;

    impl TemplateEngine for Echo {
        fn render(&self, source: &str, _resolver: Arc<Resolver>) -> std::result::Result<String, RenderError> {
            Ok(source.to_uppercase())
        }
    }

    struct FailingLookup;

    impl TemplateEngine for FailingLookup {
        fn render(&self, _source: &str, resolver: Arc<Resolver>) -> std::result::Result<String, RenderError> {
            resolver.module("missing").map(|_| String::new()).map_err(RenderError::Resolve)
        }
    }

    #[test]
    fn output_path_strips_j2() {
        assert_eq!(
            default_output_path(Path::new("docs/README.md.j2")),
            PathBuf::from("docs/README.md")
        );
    }

    #[test]
    fn output_path_without_j2() {
        assert_eq!(
            default_output_path(Path::new("docs/notes.md")),
            PathBuf::from("docs/notes.compiled.md")
        );
        assert_eq!(
            default_output_path(Path::new("docs/NOTES")),
            PathBuf::from("docs/NOTES.compiled")
        );
    }

    #[test]
    fn writes_rendered_output() {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("README.md.j2");
        fs::write(&template, "hello").unwrap();

        let out = compile_with(&Echo, &template, Config::default(), None).unwrap();
        assert_eq!(out, dir.path().join("README.md"));
        assert_eq!(fs::read_to_string(out).unwrap(), "HELLO");
    }

    #[test]
    fn explicit_output_path() {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("README.md.j2");
        fs::write(&template, "hello").unwrap();
        let target = dir.path().join("out.md");

        let out = compile_with(&Echo, &template, Config::default(), Some(&target)).unwrap();
        assert_eq!(out, target);
        assert!(target.is_file());
        assert!(!dir.path().join("README.md").exists());
    }

    #[test]
    fn resolution_failure_keeps_cause() {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("README.md.j2");
        fs::write(&template, "").unwrap();

        let err = compile_with(&FailingLookup, &template, Config::default(), None).unwrap_err();
        match err {
            Error::CompileFailure {
                template: path,
                message,
                cause,
            } => {
                assert_eq!(path, template);
                assert!(message.contains("missing"));
                assert!(matches!(
                    cause.as_deref(),
                    Some(Error::UnrecognizedModule { .. })
                ));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(!dir.path().join("README.md").exists());
    }

    #[test]
    fn missing_template_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = compile(&dir.path().join("nope.md.j2"), Config::default(), None).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn config_paths_follow_template_dir() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(
            dir.path().join("src/shapes.py"),
            "def area(r: float) -> float:\n    \"\"\"Area.\"\"\"\n",
        )
        .unwrap();
        let template = dir.path().join("API.md.j2");
        fs::write(
            &template,
            "{{ compdoc.module('shapes').area.doc.signature.returns }}",
        )
        .unwrap();

        let mut config = Config::default();
        config.modules.insert("shapes".into(), "src/shapes.py".into());
        let out = compile(&template, config, None).unwrap();
        assert_eq!(fs::read_to_string(out).unwrap(), "float");
    }
}
