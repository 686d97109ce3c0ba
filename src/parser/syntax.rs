//! Declaration tree over the tree-sitter Python grammar.
//!
//! Only `def`, `async def`, `class` and bare string statements are lowered
//! structurally; every other statement becomes [`Stmt::Other`]. Annotations and
//! class bases are lowered into [`Expr`], and anything the expression shapes
//! do not cover is kept as [`Expr::Other`] source text.

use std::fmt;
use tree_sitter::{Node, Parser};

/// A syntax error with a 1-based line and 0-based column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub line: usize,
    pub col: usize,
    pub message: String,
}

impl SyntaxError {
    pub fn new(line: usize, col: usize, message: impl Into<String>) -> Self {
        SyntaxError {
            line,
            col,
            message: message.into(),
        }
    }

    fn at(node: Node, message: impl Into<String>) -> Self {
        let pos = node.start_position();
        SyntaxError::new(pos.row + 1, pos.column, message)
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.col, self.message)
    }
}

impl std::error::Error for SyntaxError {}

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Function(FunctionDef),
    Class(ClassDef),
    Str(StringStmt),
    Other,
}

/// A statement made only of string literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringStmt {
    pub value: String,
    /// Neither a bytes literal nor an f-string
    pub plain: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub line: usize,
    pub col: usize,
    pub is_async: bool,
    pub params: Vec<Param>,
    pub returns: Option<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    PositionalOnly,
    Regular,
    VarPositional,
    KeywordOnly,
    VarKeyword,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    pub annotation: Option<Expr>,
    pub has_default: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub line: usize,
    pub col: usize,
    /// Positional bases
    pub bases: Vec<Expr>,
    /// Names of keyword arguments, e.g. `metaclass`
    pub keywords: Vec<String>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Bytes(String),
    Number(String),
    Bool(bool),
    None,
    Ellipsis,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Name(String),
    Constant(Literal),
    Attribute { value: Box<Expr>, attr: String },
    Subscript { value: Box<Expr>, slice: Box<Expr> },
    Tuple(Vec<Expr>),
    List(Vec<Expr>),
    BinOp { left: Box<Expr>, op: String, right: Box<Expr> },
    UnaryOp { op: String, operand: Box<Expr> },
    /// Any other expression, as written
    Other(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Str(s) => write!(f, "'{}'", escape_quote(s)),
            Literal::Bytes(s) => write!(f, "b'{}'", escape_quote(s)),
            Literal::Number(n) => f.write_str(n),
            Literal::Bool(true) => f.write_str("True"),
            Literal::Bool(false) => f.write_str("False"),
            Literal::None => f.write_str("None"),
            Literal::Ellipsis => f.write_str("..."),
        }
    }
}

fn escape_quote(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Name(id) => f.write_str(id),
            Expr::Constant(lit) => write!(f, "{lit}"),
            Expr::Attribute { value, attr } => write!(f, "{value}.{attr}"),
            Expr::Subscript { value, slice } => match slice.as_ref() {
                Expr::Tuple(items) if !items.is_empty() => {
                    write!(f, "{value}[{}]", join(items))
                }
                other => write!(f, "{value}[{other}]"),
            },
            Expr::Tuple(items) if items.len() == 1 => write!(f, "({},)", items[0]),
            Expr::Tuple(items) => write!(f, "({})", join(items)),
            Expr::List(items) => write!(f, "[{}]", join(items)),
            Expr::BinOp { left, op, right } => write!(f, "{left} {op} {right}"),
            Expr::UnaryOp { op, operand } => write!(f, "{op}{operand}"),
            Expr::Other(text) => f.write_str(text),
        }
    }
}

fn join(items: &[Expr]) -> String {
    items.iter().map(|e| e.to_string()).collect::<Vec<_>>().join(", ")
}

/// Parse Python source into its declaration tree.
pub fn parse(source: &str) -> Result<Module, SyntaxError> {
    let source = source.replace("\r\n", "\n");
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| SyntaxError::new(0, 0, format!("cannot load Python grammar: {e}")))?;
    let tree = parser
        .parse(&source, None)
        .ok_or_else(|| SyntaxError::new(0, 0, "parser produced no tree"))?;

    let root = tree.root_node();
    if root.has_error() {
        return Err(first_error(root)
            .unwrap_or_else(|| SyntaxError::new(1, 0, "invalid syntax")));
    }
    let lower = Lower { source: &source };
    Ok(Module {
        body: lower.statements(root),
    })
}

/// First error or missing node in document order.
fn first_error(node: Node) -> Option<SyntaxError> {
    if node.is_missing() {
        return Some(SyntaxError::at(node, format!("missing {}", node.kind())));
    }
    if node.is_error() {
        return Some(SyntaxError::at(node, "invalid syntax"));
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

fn named_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// Lowers tree-sitter nodes of one source text.
struct Lower<'s> {
    source: &'s str,
}

impl Lower<'_> {
    fn text(&self, node: Node) -> String {
        self.source[node.byte_range()].to_string()
    }

    // -- Statements ---------------------------------------------------------------

    fn statements(&self, parent: Node) -> Vec<Stmt> {
        named_children(parent)
            .into_iter()
            .map(|node| self.statement(node))
            .collect()
    }

    fn statement(&self, node: Node) -> Stmt {
        match node.kind() {
            "function_definition" => Stmt::Function(self.function(node)),
            "class_definition" => Stmt::Class(self.class(node)),
            "decorated_definition" => match node.child_by_field_name("definition") {
                Some(def) => self.statement(def),
                None => Stmt::Other,
            },
            "expression_statement" => match named_children(node).as_slice() {
                [only] => self.string_statement(*only).unwrap_or(Stmt::Other),
                _ => Stmt::Other,
            },
            _ => Stmt::Other,
        }
    }

    fn string_statement(&self, node: Node) -> Option<Stmt> {
        let parts = match node.kind() {
            "string" => vec![node],
            "concatenated_string" => named_children(node),
            _ => return None,
        };
        let mut value = String::new();
        let mut plain = true;
        for part in parts {
            let lit = self.string(part)?;
            plain &= !lit.bytes && !lit.formatted;
            value.push_str(&lit.value);
        }
        Some(Stmt::Str(StringStmt { value, plain }))
    }

    fn body(&self, node: Node) -> Vec<Stmt> {
        node.child_by_field_name("body")
            .map(|block| self.statements(block))
            .unwrap_or_default()
    }

    fn name(&self, node: Node) -> String {
        node.child_by_field_name("name")
            .map(|name| self.text(name))
            .unwrap_or_default()
    }

    fn function(&self, node: Node) -> FunctionDef {
        let pos = node.start_position();
        let is_async = node.child(0).is_some_and(|first| first.kind() == "async");
        FunctionDef {
            name: self.name(node),
            line: pos.row + 1,
            col: pos.column,
            is_async,
            params: node
                .child_by_field_name("parameters")
                .map(|params| self.params(params))
                .unwrap_or_default(),
            returns: node.child_by_field_name("return_type").map(|t| self.expr(t)),
            body: self.body(node),
        }
    }

    fn params(&self, node: Node) -> Vec<Param> {
        let mut params: Vec<Param> = Vec::new();
        let mut keyword_only = false;
        for child in named_children(node) {
            let param = match child.kind() {
                "positional_separator" => {
                    for p in params.iter_mut().filter(|p| p.kind == ParamKind::Regular) {
                        p.kind = ParamKind::PositionalOnly;
                    }
                    continue;
                }
                "keyword_separator" => {
                    keyword_only = true;
                    continue;
                }
                "identifier" => self.param(self.text(child), keyword_only, None, false),
                "default_parameter" => self.param(self.name(child), keyword_only, None, true),
                "typed_default_parameter" => {
                    let annotation = child.child_by_field_name("type").map(|t| self.expr(t));
                    self.param(self.name(child), keyword_only, annotation, true)
                }
                "typed_parameter" => {
                    let annotation = child.child_by_field_name("type").map(|t| self.expr(t));
                    match named_children(child).first() {
                        Some(target) if target.kind() == "identifier" => {
                            self.param(self.text(*target), keyword_only, annotation, false)
                        }
                        Some(target) => match self.variadic(*target, annotation) {
                            Some(param) => param,
                            None => continue,
                        },
                        None => continue,
                    }
                }
                "list_splat_pattern" | "dictionary_splat_pattern" => {
                    match self.variadic(child, None) {
                        Some(param) => param,
                        None => continue,
                    }
                }
                _ => continue,
            };
            if param.kind == ParamKind::VarPositional {
                keyword_only = true;
            }
            params.push(param);
        }
        params
    }

    fn param(
        &self,
        name: String,
        keyword_only: bool,
        annotation: Option<Expr>,
        has_default: bool,
    ) -> Param {
        let kind = if keyword_only {
            ParamKind::KeywordOnly
        } else {
            ParamKind::Regular
        };
        Param {
            name,
            kind,
            annotation,
            has_default,
        }
    }

    /// `*args` or `**kwargs`, possibly annotated.
    fn variadic(&self, node: Node, annotation: Option<Expr>) -> Option<Param> {
        let kind = match node.kind() {
            "list_splat_pattern" => ParamKind::VarPositional,
            "dictionary_splat_pattern" => ParamKind::VarKeyword,
            _ => return None,
        };
        let name = named_children(node).first().map(|n| self.text(*n))?;
        Some(Param {
            name,
            kind,
            annotation,
            has_default: false,
        })
    }

    fn class(&self, node: Node) -> ClassDef {
        let pos = node.start_position();
        let mut bases = Vec::new();
        let mut keywords = Vec::new();
        if let Some(args) = node.child_by_field_name("superclasses") {
            for arg in named_children(args) {
                match arg.kind() {
                    "keyword_argument" => keywords.push(self.name(arg)),
                    "list_splat" | "dictionary_splat" => {}
                    _ => bases.push(self.expr(arg)),
                }
            }
        }
        ClassDef {
            name: self.name(node),
            line: pos.row + 1,
            col: pos.column,
            bases,
            keywords,
            body: self.body(node),
        }
    }

    // -- Expressions ----------------------------------------------------------------

    fn expr(&self, node: Node) -> Expr {
        let children = named_children(node);
        match (node.kind(), children.as_slice()) {
            ("type" | "parenthesized_expression", [inner]) => self.expr(*inner),
            ("identifier", _) => Expr::Name(self.text(node)),
            ("none", _) => Expr::Constant(Literal::None),
            ("true", _) => Expr::Constant(Literal::Bool(true)),
            ("false", _) => Expr::Constant(Literal::Bool(false)),
            ("ellipsis", _) => Expr::Constant(Literal::Ellipsis),
            ("integer" | "float", _) => Expr::Constant(Literal::Number(self.text(node))),
            ("string" | "concatenated_string", _) => self.string_expr(node),
            ("attribute", _) => match (
                node.child_by_field_name("object"),
                node.child_by_field_name("attribute"),
            ) {
                (Some(object), Some(attr)) => Expr::Attribute {
                    value: Box::new(self.expr(object)),
                    attr: self.text(attr),
                },
                _ => self.other(node),
            },
            ("member_type", [object, attr]) => Expr::Attribute {
                value: Box::new(self.expr(*object)),
                attr: self.text(*attr),
            },
            ("subscript", _) => self.subscript(node),
            ("generic_type", [value, params]) if params.kind() == "type_parameter" => {
                let items = named_children(*params);
                let items: Vec<Expr> = items.into_iter().map(|t| self.expr(t)).collect();
                Expr::Subscript {
                    value: Box::new(self.expr(*value)),
                    slice: Box::new(bracket_slice(items, has_comma(*params))),
                }
            }
            ("union_type", [left, right]) => Expr::BinOp {
                left: Box::new(self.expr(*left)),
                op: "|".to_string(),
                right: Box::new(self.expr(*right)),
            },
            ("binary_operator", _) => match (
                node.child_by_field_name("left"),
                node.child_by_field_name("operator"),
                node.child_by_field_name("right"),
            ) {
                (Some(left), Some(op), Some(right)) => Expr::BinOp {
                    left: Box::new(self.expr(left)),
                    op: self.text(op),
                    right: Box::new(self.expr(right)),
                },
                _ => self.other(node),
            },
            ("unary_operator", _) => match (
                node.child_by_field_name("operator"),
                node.child_by_field_name("argument"),
            ) {
                (Some(op), Some(operand)) => Expr::UnaryOp {
                    op: self.text(op),
                    operand: Box::new(self.expr(operand)),
                },
                _ => self.other(node),
            },
            ("tuple", items) => Expr::Tuple(items.iter().map(|n| self.expr(*n)).collect()),
            ("list", items) => Expr::List(items.iter().map(|n| self.expr(*n)).collect()),
            _ => self.other(node),
        }
    }

    fn other(&self, node: Node) -> Expr {
        Expr::Other(self.text(node))
    }

    fn subscript(&self, node: Node) -> Expr {
        let Some(value) = node.child_by_field_name("value") else {
            return self.other(node);
        };
        let mut cursor = node.walk();
        let items: Vec<Expr> = node
            .children_by_field_name("subscript", &mut cursor)
            .map(|n| self.expr(n))
            .collect();
        Expr::Subscript {
            value: Box::new(self.expr(value)),
            slice: Box::new(bracket_slice(items, has_comma(node))),
        }
    }

    fn string_expr(&self, node: Node) -> Expr {
        let parts = match node.kind() {
            "concatenated_string" => named_children(node),
            _ => vec![node],
        };
        let mut value = String::new();
        let mut bytes = false;
        for part in parts {
            match self.string(part) {
                Some(lit) if !lit.formatted => {
                    bytes |= lit.bytes;
                    value.push_str(&lit.value);
                }
                _ => return self.other(node),
            }
        }
        Expr::Constant(if bytes {
            Literal::Bytes(value)
        } else {
            Literal::Str(value)
        })
    }

    /// Decode one `string` node from its delimiters.
    fn string(&self, node: Node) -> Option<StrLit> {
        if node.kind() != "string" {
            return None;
        }
        let children = named_children(node);
        let start = children.iter().find(|n| n.kind() == "string_start")?;
        let end = children.iter().rev().find(|n| n.kind() == "string_end")?;
        let prefix: String = self.source[start.byte_range()]
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let raw = &self.source[start.end_byte()..end.start_byte()];
        Some(StrLit {
            value: decode(raw, prefix.contains('r')),
            bytes: prefix.contains('b'),
            formatted: prefix.contains('f'),
        })
    }
}

struct StrLit {
    value: String,
    bytes: bool,
    formatted: bool,
}

/// `x[a]` keeps the single item, `x[a, b]` and `x[a,]` become a tuple.
fn bracket_slice(mut items: Vec<Expr>, comma: bool) -> Expr {
    if items.len() == 1 && !comma {
        items.remove(0)
    } else {
        Expr::Tuple(items)
    }
}

fn has_comma(node: Node) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|child| child.kind() == ",");
    found
}

/// Decode backslash escapes of a string body unless the literal is raw.
fn decode(body: &str, raw: bool) -> String {
    if raw {
        return body.to_string();
    }
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\n') => {}
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('a') => out.push('\x07'),
            Some('b') => out.push('\x08'),
            Some('f') => out.push('\x0c'),
            Some('v') => out.push('\x0b'),
            Some(escaped @ ('\\' | '\'' | '"')) => out.push(escaped),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
