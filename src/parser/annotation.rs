//! Signature extraction from parameter lists and type expressions.

use super::syntax::{Expr, FunctionDef, Literal, Param, ParamKind};
use crate::error::{Error, Result};
use crate::model::{BoundKind, Parameter, Signature};

/// Type text of an ordinary parameter or return without annotation.
const MISSING_TYPE: &str = "None";

/// Type text of `*args` / `**kwargs` without annotation.
const MISSING_VARIADIC_TYPE: &str = "Any";

/// Build the normalized signature of a function definition.
///
/// Ordinary parameters keep declaration order (positional-only, regular,
/// keyword-only) with the receiver removed, followed by `*args` then `**kwargs`.
pub fn extract_signature(def: &FunctionDef) -> Result<Signature> {
    let bound = def.params.first().map_or(BoundKind::None, receiver_kind);

    let ordinary = def.params.iter().filter(|p| {
        matches!(
            p.kind,
            ParamKind::PositionalOnly | ParamKind::Regular | ParamKind::KeywordOnly
        )
    });
    let skip = usize::from(bound != BoundKind::None);

    let mut parameters = Vec::with_capacity(def.params.len());
    for param in ordinary.skip(skip) {
        parameters.push(Parameter {
            name: param.name.clone(),
            type_text: render_or(param.annotation.as_ref(), MISSING_TYPE)?,
        });
    }

    for (kind, prefix) in [(ParamKind::VarPositional, "*"), (ParamKind::VarKeyword, "**")] {
        if let Some(param) = def.params.iter().find(|p| p.kind == kind) {
            parameters.push(Parameter {
                name: format!("{prefix}{}", param.name),
                type_text: render_or(param.annotation.as_ref(), MISSING_VARIADIC_TYPE)?,
            });
        }
    }

    Ok(Signature {
        bound,
        parameters,
        returns: render_or(def.returns.as_ref(), MISSING_TYPE)?,
    })
}

/// An unannotated leading `self` or `cls` is a receiver.
fn receiver_kind(first: &Param) -> BoundKind {
    let positional = matches!(first.kind, ParamKind::PositionalOnly | ParamKind::Regular);
    if !positional || first.annotation.is_some() {
        return BoundKind::None;
    }
    match first.name.as_str() {
        "self" => BoundKind::Instance,
        "cls" => BoundKind::Type,
        _ => BoundKind::None,
    }
}

fn render_or(annotation: Option<&Expr>, missing: &str) -> Result<String> {
    match annotation {
        Some(expr) => render_type(expr),
        None => Ok(missing.to_string()),
    }
}

/// Render a type expression to its normalized text.
///
/// Names render as themselves, `Outer[Inner]` recursively, literals as their
/// value and tuples comma-joined. Other shapes are rejected.
pub fn render_type(expr: &Expr) -> Result<String> {
    match expr {
        Expr::Name(id) => Ok(id.clone()),
        Expr::Subscript { value, slice } => match value.as_ref() {
            Expr::Name(outer) => Ok(format!("{outer}[{}]", render_type(slice)?)),
            _ => Err(Error::unsupported(expr, "annotation")),
        },
        Expr::Constant(lit) => Ok(match lit {
            Literal::Str(s) | Literal::Bytes(s) | Literal::Number(s) => s.clone(),
            Literal::Bool(true) => "True".to_string(),
            Literal::Bool(false) => "False".to_string(),
            Literal::None => "None".to_string(),
            Literal::Ellipsis => "...".to_string(),
        }),
        Expr::Tuple(items) => {
            let parts = items.iter().map(render_type).collect::<Result<Vec<_>>>()?;
            Ok(parts.join(", "))
        }
        Expr::Attribute { .. }
        | Expr::List(_)
        | Expr::BinOp { .. }
        | Expr::UnaryOp { .. }
        | Expr::Other(_) => Err(Error::unsupported(expr, "annotation")),
    }
}

/// Render a class base: a simple name or a single-level generic `Name[Name]`.
pub fn render_base(expr: &Expr) -> Result<String> {
    match expr {
        Expr::Name(id) => Ok(id.clone()),
        Expr::Subscript { value, slice } => match (value.as_ref(), slice.as_ref()) {
            (Expr::Name(outer), Expr::Name(inner)) => Ok(format!("{outer}[{inner}]")),
            _ => Err(Error::unsupported(expr, "base class")),
        },
        _ => Err(Error::unsupported(expr, "base class")),
    }
}
