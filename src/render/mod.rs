//! Renderer module — template engine seam.

pub mod jinja;

use crate::context::Resolver;
use crate::error::Error;
use std::sync::Arc;

/// A template engine that can evaluate documentation templates against a
/// [`Resolver`].
pub trait TemplateEngine {
    fn render(&self, source: &str, resolver: Arc<Resolver>) -> Result<String, RenderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A module, attribute or formatter lookup failed during rendering.
    #[error(transparent)]
    Resolve(Error),

    /// Template syntax or evaluation error.
    #[error("{0}")]
    Engine(String),
}
