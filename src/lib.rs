//! compdoc — documentation extraction, validation and templating for Python
//! source files.
//!
//! A source file is parsed into a [`ModuleDoc`] of classes and functions, each
//! carrying its normalized [`Signature`] and parsed docstring. Modules can be
//! validated (documented parameters vs declared ones) or rendered through
//! Jinja templates that look up declarations by name.

pub mod compile;
pub mod config;
pub mod context;
pub mod docstring;
pub mod error;
pub mod logging;
pub mod model;
pub mod parser;
pub mod render;
pub mod validate;

pub use compile::{compile, compile_with};
pub use config::Config;
pub use context::Resolver;
pub use error::{Error, Result};
pub use model::{ClassDoc, FunctionDoc, ModuleDoc, ModuleEntry, Signature};
pub use parser::{parse_module, parse_source};
pub use validate::{ValidationResult, ValidationStatus};
