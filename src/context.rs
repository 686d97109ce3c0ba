//! Named lookups from templates into parsed modules.
//!
//! Every lookup is explicit: unknown names fail with a typed error instead of
//! rendering as empty.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{ClassDoc, FunctionDoc, ModuleDoc, ModuleEntry};
use crate::parser;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Resolves module and formatter names through a [`Config`].
#[derive(Debug, Clone)]
pub struct Resolver {
    config: Config,
}

/// A loaded formatter fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatter {
    pub name: String,
    pub path: PathBuf,
    pub source: String,
}

impl Resolver {
    pub fn new(config: Config) -> Self {
        Resolver { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Parse the configured module. Each call re-reads the source file.
    pub fn module(&self, name: &str) -> Result<ModuleContext> {
        let path = self
            .config
            .modules
            .get(name)
            .ok_or_else(|| Error::UnrecognizedModule {
                name: name.to_string(),
            })?;
        debug!(module = name, path = %path.display(), "resolving module");
        Ok(ModuleContext::new(parser::parse_module(path)?))
    }

    pub fn formatter(&self, name: &str) -> Result<Formatter> {
        let path = self
            .config
            .formatters
            .get(name)
            .ok_or_else(|| Error::UnrecognizedFormatter {
                name: name.to_string(),
            })?;
        if !path.exists() {
            return Err(Error::FormatterMissing { path: path.clone() });
        }
        let source = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        debug!(formatter = name, path = %path.display(), "loaded formatter");
        Ok(Formatter {
            name: name.to_string(),
            path: path.clone(),
            source,
        })
    }
}

/// One resolvable module entry.
#[derive(Debug, Clone)]
pub enum ContextNode {
    Class(ClassContext),
    Function(FunctionContext),
}

/// Borrowed result of a dotted lookup.
#[derive(Debug, Clone, Copy)]
pub enum Resolved<'a> {
    Class(&'a ClassContext),
    Function(&'a FunctionContext),
}

#[derive(Debug, Clone)]
pub struct ModuleContext {
    doc: ModuleDoc,
    nodes: HashMap<String, ContextNode>,
}

impl ModuleContext {
    pub fn new(doc: ModuleDoc) -> Self {
        let nodes = doc
            .entries
            .iter()
            .map(|entry| {
                let node = match entry {
                    ModuleEntry::Class(class) => ContextNode::Class(ClassContext::new(class.clone())),
                    ModuleEntry::Function(func) => {
                        ContextNode::Function(FunctionContext::new(func.clone()))
                    }
                };
                (entry.name().to_string(), node)
            })
            .collect();
        ModuleContext { doc, nodes }
    }

    pub fn doc(&self) -> &ModuleDoc {
        &self.doc
    }

    pub fn get(&self, key: &str) -> Result<&ContextNode> {
        self.nodes
            .get(key)
            .ok_or_else(|| Error::UnrecognizedModuleAttribute {
                module: self.doc.name.clone(),
                key: key.to_string(),
            })
    }

    /// Resolve `name` or `Class.method`.
    pub fn resolve(&self, path: &str) -> Result<Resolved<'_>> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        match (self.get(head)?, rest) {
            (ContextNode::Class(class), None) => Ok(Resolved::Class(class)),
            (ContextNode::Function(func), None) => Ok(Resolved::Function(func)),
            (ContextNode::Class(class), Some(method)) => Ok(Resolved::Function(class.get(method)?)),
            (ContextNode::Function(_), Some(_)) => Err(Error::UnrecognizedModuleAttribute {
                module: self.doc.name.clone(),
                key: path.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassContext {
    doc: ClassDoc,
    methods: HashMap<String, FunctionContext>,
}

impl ClassContext {
    pub fn new(doc: ClassDoc) -> Self {
        let methods = doc
            .methods
            .iter()
            .map(|m| (m.name.clone(), FunctionContext::new(m.clone())))
            .collect();
        ClassContext { doc, methods }
    }

    pub fn doc(&self) -> &ClassDoc {
        &self.doc
    }

    pub fn get(&self, key: &str) -> Result<&FunctionContext> {
        self.methods
            .get(key)
            .ok_or_else(|| Error::ClassFunctionNotFound {
                class: self.doc.name.clone(),
                key: key.to_string(),
            })
    }
}

#[derive(Debug, Clone)]
pub struct FunctionContext {
    doc: FunctionDoc,
}

impl FunctionContext {
    pub fn new(doc: FunctionDoc) -> Self {
        FunctionContext { doc }
    }

    pub fn doc(&self) -> &FunctionDoc {
        &self.doc
    }
}
