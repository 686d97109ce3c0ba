//! Error taxonomy shared by the parser, resolver and compile driver.

use std::path::PathBuf;

/// Every failure the library can surface. All variants are fatal to the
/// operation that produced them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not find source file: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("failed to parse {}: {message}", path.display())]
    ParseFailure { path: PathBuf, message: String },

    #[error("unsupported {context} expression `{expression}`")]
    AnnotationExtractionFailure { expression: String, context: String },

    #[error("did not recognize module \"{name}\"")]
    UnrecognizedModule { name: String },

    #[error("could not find element {key} of module {module}")]
    UnrecognizedModuleAttribute { module: String, key: String },

    #[error("could not find function {key} in class {class}")]
    ClassFunctionNotFound { class: String, key: String },

    #[error("unrecognized formatter: {name}")]
    UnrecognizedFormatter { name: String },

    #[error("could not find formatter: {}", path.display())]
    FormatterMissing { path: PathBuf },

    #[error("failed to compile template {}: {message}", template.display())]
    CompileFailure {
        template: PathBuf,
        message: String,
        #[source]
        cause: Option<Box<Error>>,
    },

    #[error("invalid configuration {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn unsupported(expression: impl ToString, context: &str) -> Self {
        Error::AnnotationExtractionFailure {
            expression: expression.to_string(),
            context: context.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
