//! Data model for extracted documentation. Built once per parse, read-only after.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Whether a function takes an implicit leading receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundKind {
    None,
    /// `self`
    Instance,
    /// `cls`
    Type,
}

impl BoundKind {
    /// Conventional receiver name, if any.
    pub fn receiver(&self) -> Option<&'static str> {
        match self {
            BoundKind::None => None,
            BoundKind::Instance => Some("self"),
            BoundKind::Type => Some("cls"),
        }
    }
}

/// One declared parameter. Variadic names carry a `*` or `**` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub type_text: String,
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.type_text)
    }
}

/// Normalized parameter list and return type of a declaration.
///
/// `parameters` never contains the receiver; `*args` and `**kwargs` come last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signature {
    pub bound: BoundKind,
    pub parameters: Vec<Parameter>,
    pub returns: String,
}

impl Signature {
    /// `[a: int, *rest: Any]`, used in validation messages.
    pub fn parameter_list(&self) -> String {
        let parts: Vec<String> = self.parameters.iter().map(|p| p.to_string()).collect();
        format!("[{}]", parts.join(", "))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if let Some(receiver) = self.bound.receiver() {
            parts.push(receiver.to_string());
        }
        parts.extend(self.parameters.iter().map(|p| p.to_string()));
        write!(f, "({}) -> {}", parts.join(", "), self.returns)
    }
}

/// Parsed docstring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocComment {
    /// First line of the docstring
    pub summary: Option<String>,
    /// Free text between the summary and the first section
    pub description: Option<String>,
    pub params: Vec<DocParam>,
    /// `Attributes:` entries (class docstrings)
    pub attributes: Vec<DocParam>,
    pub returns: Option<DocReturns>,
    pub raises: Vec<DocRaises>,
}

impl DocComment {
    /// `[xs: list[float], flag]`, used in validation messages.
    pub fn parameter_list(&self) -> String {
        let parts: Vec<String> = self
            .params
            .iter()
            .map(|p| match p.type_name {
                Some(ref ty) => format!("{}: {}", p.name, ty),
                None => p.name.clone(),
            })
            .collect();
        format!("[{}]", parts.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocParam {
    pub name: String,
    pub type_name: Option<String>,
    pub description: String,
    /// Type was written as `T, optional`
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocReturns {
    pub type_name: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocRaises {
    pub type_name: Option<String>,
    pub description: String,
}

/// A documented function or method.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDoc {
    pub name: String,
    pub source_path: PathBuf,
    /// 1-based line of the `def` keyword
    pub line: usize,
    pub signature: Signature,
    /// Normalized docstring text
    pub raw_comment: Option<String>,
    pub comment: Option<DocComment>,
}

/// A documented class and its direct methods.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassDoc {
    pub name: String,
    pub source_path: PathBuf,
    pub line: usize,
    pub bases: Vec<String>,
    pub methods: Vec<FunctionDoc>,
    pub raw_comment: Option<String>,
    pub comment: Option<DocComment>,
}

impl ClassDoc {
    pub fn get_method(&self, name: &str) -> Option<&FunctionDoc> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// Top-level module entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModuleEntry {
    Class(ClassDoc),
    Function(FunctionDoc),
}

impl ModuleEntry {
    pub fn name(&self) -> &str {
        match self {
            ModuleEntry::Class(c) => &c.name,
            ModuleEntry::Function(f) => &f.name,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            ModuleEntry::Class(c) => c.line,
            ModuleEntry::Function(f) => f.line,
        }
    }
}

/// A declaration the builder could not turn into a model node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedDeclaration {
    /// `name` or `Class.method`
    pub name: String,
    pub line: usize,
    pub reason: String,
}

/// Complete documentation model of one source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleDoc {
    /// File stem, e.g. `vec` for `pkg/vec.py`
    pub name: String,
    pub source_path: PathBuf,
    pub entries: Vec<ModuleEntry>,
    pub rejected: Vec<RejectedDeclaration>,
}

impl ModuleDoc {
    pub fn classes(&self) -> impl Iterator<Item = &ClassDoc> {
        self.entries.iter().filter_map(|e| match e {
            ModuleEntry::Class(c) => Some(c),
            ModuleEntry::Function(_) => None,
        })
    }

    /// Free functions, excluding methods.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDoc> {
        self.entries.iter().filter_map(|e| match e {
            ModuleEntry::Function(f) => Some(f),
            ModuleEntry::Class(_) => None,
        })
    }

    pub fn get_class(&self, name: &str) -> Option<&ClassDoc> {
        self.classes().find(|c| c.name == name)
    }

    /// Look up `func` or `Class.method`. Deeper paths are never found.
    pub fn get_function(&self, name: &str) -> Option<&FunctionDoc> {
        match name.split_once('.') {
            None => self.functions().find(|f| f.name == name),
            Some((class, method)) if !method.contains('.') => {
                self.get_class(class)?.get_method(method)
            }
            Some(_) => None,
        }
    }
}
