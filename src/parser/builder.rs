//! Builds [`ModuleDoc`] from a parsed declaration tree.

use super::annotation::{extract_signature, render_base};
use super::syntax::{ClassDef, FunctionDef, Module, Stmt};
use crate::docstring;
use crate::error::Result;
use crate::model::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Docstring continuation lines are indented one level past the declaration.
const BODY_INDENT: usize = 4;

/// Accumulates top-level entries of one module.
pub struct ModuleBuilder {
    name: String,
    source_path: PathBuf,
    entries: Vec<ModuleEntry>,
    rejected: Vec<RejectedDeclaration>,
}

impl ModuleBuilder {
    pub fn new(name: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        ModuleBuilder {
            name: name.into(),
            source_path: source_path.into(),
            entries: Vec::new(),
            rejected: Vec::new(),
        }
    }

    /// Add every top-level declaration of `module` in source order.
    pub fn visit(&mut self, module: &Module) {
        for stmt in &module.body {
            match stmt {
                Stmt::Function(def) => match function_doc(def, &self.source_path) {
                    Ok(func) => self.entries.push(ModuleEntry::Function(func)),
                    Err(e) => self.reject(def.name.clone(), def.line, e.to_string()),
                },
                Stmt::Class(def) => self.visit_class(def),
                Stmt::Str(_) | Stmt::Other => {}
            }
        }
    }

    fn visit_class(&mut self, def: &ClassDef) {
        let bases = match def.bases.iter().map(render_base).collect::<Result<Vec<_>>>() {
            Ok(bases) => bases,
            Err(e) => return self.reject(def.name.clone(), def.line, e.to_string()),
        };

        let mut class = ClassBuilder::new(def, &self.source_path, bases);
        for stmt in &def.body {
            if let Stmt::Function(method) = stmt {
                match function_doc(method, &self.source_path) {
                    Ok(func) => class.add_method(func),
                    Err(e) => self.reject(
                        format!("{}.{}", def.name, method.name),
                        method.line,
                        e.to_string(),
                    ),
                }
            }
        }
        self.entries.push(ModuleEntry::Class(class.finish()));
    }

    fn reject(&mut self, name: String, line: usize, reason: String) {
        warn!(
            module = %self.name,
            line,
            "skipping `{}`: {}",
            name,
            reason
        );
        self.rejected.push(RejectedDeclaration { name, line, reason });
    }

    pub fn finish(self) -> ModuleDoc {
        debug!(
            module = %self.name,
            entries = self.entries.len(),
            rejected = self.rejected.len(),
            "module built"
        );
        ModuleDoc {
            name: self.name,
            source_path: self.source_path,
            entries: self.entries,
            rejected: self.rejected,
        }
    }
}

/// Accumulates the methods of one class.
pub struct ClassBuilder {
    name: String,
    source_path: PathBuf,
    line: usize,
    bases: Vec<String>,
    methods: Vec<FunctionDoc>,
    raw_comment: Option<String>,
}

impl ClassBuilder {
    pub fn new(def: &ClassDef, source_path: &Path, bases: Vec<String>) -> Self {
        ClassBuilder {
            name: def.name.clone(),
            source_path: source_path.to_path_buf(),
            line: def.line,
            bases,
            methods: Vec::new(),
            raw_comment: docstring_of(&def.body, def.col),
        }
    }

    pub fn add_method(&mut self, method: FunctionDoc) {
        self.methods.push(method);
    }

    pub fn finish(self) -> ClassDoc {
        let comment = self.raw_comment.as_deref().map(docstring::parse);
        ClassDoc {
            name: self.name,
            source_path: self.source_path,
            line: self.line,
            bases: self.bases,
            methods: self.methods,
            raw_comment: self.raw_comment,
            comment,
        }
    }
}

fn function_doc(def: &FunctionDef, source_path: &Path) -> Result<FunctionDoc> {
    let signature = extract_signature(def)?;
    let raw_comment = docstring_of(&def.body, def.col);
    let comment = raw_comment.as_deref().map(docstring::parse);
    Ok(FunctionDoc {
        name: def.name.clone(),
        source_path: source_path.to_path_buf(),
        line: def.line,
        signature,
        raw_comment,
        comment,
    })
}

/// Leading plain string statement of a body, normalized.
fn docstring_of(body: &[Stmt], col: usize) -> Option<String> {
    match body.first() {
        Some(Stmt::Str(s)) if s.plain => Some(normalize_docstring(&s.value, col)),
        _ => None,
    }
}

/// Strip the body indentation from continuation lines, then trim.
pub fn normalize_docstring(text: &str, col: usize) -> String {
    let indent = " ".repeat(col + BODY_INDENT);
    let mut lines = text.split('\n');
    let mut out = lines.next().unwrap_or_default().to_string();
    for line in lines {
        out.push('\n');
        out.push_str(line.strip_prefix(indent.as_str()).unwrap_or(line));
    }
    out.trim().to_string()
}
