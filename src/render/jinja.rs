//! Jinja binding exposing `compdoc` to templates through minijinja.
//!
//! ```jinja
//! {% import compdoc.formatter("markdown") as fmt %}
//! {% set vec = compdoc.module("vec") %}
//! {{ fmt.function_doc(vec.Vec2.norm.doc) }}
//! ```
//!
//! Lookup failures inside the engine only surface as generic template
//! errors, so typed failures are kept aside. A failed call ends the render
//! and is reported as is. A missed attribute is only an undefined value,
//! which templates may test with `is defined`; it is reported only when the
//! failing expression names it.

use super::{RenderError, TemplateEngine};
use crate::context::{ClassContext, ContextNode, FunctionContext, ModuleContext, Resolver};
use crate::error::Error;
use minijinja::value::{from_args, Enumerator, Object, Value};
use minijinja::{context, Environment, ErrorKind, State, UndefinedBehavior};
use std::sync::{Arc, Mutex};

/// Name of the global exposed to templates.
const GLOBAL: &str = "compdoc";

#[derive(Debug, Default, Clone, Copy)]
pub struct JinjaEngine;

impl TemplateEngine for JinjaEngine {
    fn render(&self, source: &str, resolver: Arc<Resolver>) -> Result<String, RenderError> {
        let failure = FailureSlot::default();
        let sources = Arc::clone(&resolver);

        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);

        let loader_resolver = Arc::clone(&resolver);
        let loader_failure = failure.clone();
        env.set_loader(move |name: &str| match loader_resolver.formatter(name) {
            Ok(formatter) => Ok(Some(formatter.source)),
            Err(e) => Err(loader_failure.fatal(e)),
        });

        env.add_global(
            GLOBAL,
            Value::from_object(CompdocObject {
                resolver,
                failure: failure.clone(),
            }),
        );

        env.render_str(source, context! {}).map_err(|e| {
            let template = match e.name() {
                Some(name) if name != MAIN_TEMPLATE => {
                    sources.formatter(name).map(|f| f.source).unwrap_or_default()
                }
                _ => source.to_string(),
            };
            match failure.cause(&e, &template) {
                Some(cause) => RenderError::Resolve(cause),
                None => RenderError::Engine(e.to_string()),
            }
        })
    }
}

/// Name minijinja gives a template rendered from a string.
const MAIN_TEMPLATE: &str = "<string>";

#[derive(Debug, Default)]
struct Failures {
    /// Error returned to the engine; rendering stops on it.
    fatal: Option<Error>,
    /// Attribute misses by key, seen by the engine as undefined values.
    misses: Vec<(String, Error)>,
}

#[derive(Debug, Clone, Default)]
struct FailureSlot(Arc<Mutex<Failures>>);

impl FailureSlot {
    fn fatal(&self, error: Error) -> minijinja::Error {
        let jinja = minijinja::Error::new(ErrorKind::InvalidOperation, error.to_string());
        if let Ok(mut failures) = self.0.lock() {
            failures.fatal.get_or_insert(error);
        }
        jinja
    }

    fn miss(&self, key: &str, error: Error) {
        if let Ok(mut failures) = self.0.lock() {
            failures.misses.push((key.to_string(), error));
        }
    }

    /// Typed cause of `err`, raised while rendering `template`.
    fn cause(&self, err: &minijinja::Error, template: &str) -> Option<Error> {
        let mut failures = self.0.lock().ok()?;
        if let Some(fatal) = failures.fatal.take() {
            return Some(fatal);
        }
        if err.kind() != ErrorKind::UndefinedError {
            return None;
        }
        let snippet = failing_snippet(err, template)?;
        let index = failures
            .misses
            .iter()
            .rposition(|(key, _)| mentions(snippet, key))?;
        Some(failures.misses.swap_remove(index).1)
    }
}

/// Source text of the expression (or else the line) an error points at.
fn failing_snippet<'t>(err: &minijinja::Error, template: &'t str) -> Option<&'t str> {
    if let Some(range) = err.range() {
        return template.get(range);
    }
    let line = err.line()?;
    template.lines().nth(line.checked_sub(1)?)
}

/// Whether `snippet` contains `key` as a whole identifier.
fn mentions(snippet: &str, key: &str) -> bool {
    let is_ident = |c: char| c.is_alphanumeric() || c == '_';
    snippet.match_indices(key).any(|(at, _)| {
        let before = snippet[..at].chars().next_back();
        let after = snippet[at + key.len()..].chars().next();
        !before.is_some_and(is_ident) && !after.is_some_and(is_ident)
    })
}

fn single_name(method: &str, args: &[Value]) -> Result<String, minijinja::Error> {
    let (name,): (String,) = from_args(args).map_err(|e| {
        minijinja::Error::new(
            ErrorKind::InvalidOperation,
            format!("{GLOBAL}.{method}() takes one name: {e}"),
        )
    })?;
    Ok(name)
}

/// The `compdoc` global.
#[derive(Debug)]
struct CompdocObject {
    resolver: Arc<Resolver>,
    failure: FailureSlot,
}

impl Object for CompdocObject {
    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, minijinja::Error> {
        match method {
            "module" => {
                let name = single_name(method, args)?;
                let module = self
                    .resolver
                    .module(&name)
                    .map_err(|e| self.failure.fatal(e))?;
                Ok(Value::from_object(ModuleObject {
                    context: module,
                    failure: self.failure.clone(),
                }))
            }
            // Import name for the formatter; the loader serves its source.
            "formatter" => {
                let name = single_name(method, args)?;
                self.resolver
                    .formatter(&name)
                    .map_err(|e| self.failure.fatal(e))?;
                Ok(Value::from(name))
            }
            _ => Err(minijinja::Error::new(
                ErrorKind::UnknownMethod,
                format!("{GLOBAL} has no method named {method}"),
            )),
        }
    }
}

#[derive(Debug)]
struct ModuleObject {
    context: ModuleContext,
    failure: FailureSlot,
}

impl Object for ModuleObject {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let key = key.as_str()?;
        if key == "doc" {
            return Some(Value::from_serialize(self.context.doc()));
        }
        match self.context.get(key) {
            Ok(ContextNode::Class(class)) => Some(Value::from_object(ClassObject {
                context: class.clone(),
                failure: self.failure.clone(),
            })),
            Ok(ContextNode::Function(func)) => Some(function_value(func)),
            Err(e) => {
                self.failure.miss(key, e);
                None
            }
        }
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        let mut keys = vec![Value::from("doc")];
        keys.extend(
            self.context
                .doc()
                .entries
                .iter()
                .map(|e| Value::from(e.name())),
        );
        Enumerator::Values(keys)
    }
}

#[derive(Debug)]
struct ClassObject {
    context: ClassContext,
    failure: FailureSlot,
}

impl Object for ClassObject {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let key = key.as_str()?;
        if key == "doc" {
            return Some(Value::from_serialize(self.context.doc()));
        }
        match self.context.get(key) {
            Ok(func) => Some(function_value(func)),
            Err(e) => {
                self.failure.miss(key, e);
                None
            }
        }
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        let mut keys = vec![Value::from("doc")];
        keys.extend(
            self.context
                .doc()
                .methods
                .iter()
                .map(|m| Value::from(m.name.as_str())),
        );
        Enumerator::Values(keys)
    }
}

#[derive(Debug)]
struct FunctionObject {
    context: FunctionContext,
}

impl Object for FunctionObject {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        match key.as_str()? {
            "doc" => Some(Value::from_serialize(self.context.doc())),
            _ => None,
        }
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Str(&["doc"])
    }
}

fn function_value(func: &FunctionContext) -> Value {
    Value::from_object(FunctionObject {
        context: func.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs;
    use tempfile::TempDir;

    const SOURCE: &str = r#"class Vec2:
    """2-dimensional vector."""

    def norm(self) -> float:
        """Euclidean norm.

        Returns:
            float: the norm
        """
        return 0.0


def helper(x: int, *rest: int) -> int:
    """Help out."""
"#;

    const FORMATTER: &str =
        "{% macro signature(doc) %}{{ doc.name }}{{ doc.signature.parameters | map(attribute='name') | join(', ') }}{% endmacro %}";

    fn render(template: &str) -> Result<String, RenderError> {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("vec.py"), SOURCE).unwrap();
        fs::write(dir.path().join("text.txt.j2"), FORMATTER).unwrap();

        let mut config = Config::default();
        config.modules.insert("vec".into(), "vec.py".into());
        config.formatters.insert("text".into(), "text.txt.j2".into());
        config.formatters.insert("gone".into(), "gone.txt.j2".into());
        let resolver = Resolver::new(config.relative_to(dir.path()));
        JinjaEngine.render(template, Arc::new(resolver))
    }

    #[test]
    fn renders_module_attributes() {
        let out = render(
            "{% set vec = compdoc.module('vec') %}{{ vec.doc.name }}|{{ vec.Vec2.doc.comment.summary }}|{{ vec.Vec2.norm.doc.signature.returns }}",
        )
        .unwrap();
        assert_eq!(out, "vec|2-dimensional vector.|float");
    }

    #[test]
    fn iterates_entries() {
        let out = render(
            "{% for e in compdoc.module('vec').doc.entries %}{{ e.kind }}:{{ e.name }} {% endfor %}",
        )
        .unwrap();
        assert_eq!(out, "class:Vec2 function:helper ");
    }

    #[test]
    fn imports_formatter_macros() {
        let out = render(
            "{% import compdoc.formatter('text') as fmt %}{{ fmt.signature(compdoc.module('vec').helper.doc) }}",
        )
        .unwrap();
        assert_eq!(out, "helperx, *rest");
    }

    #[test]
    fn unknown_module_is_typed() {
        match render("{{ compdoc.module('nope').doc.name }}") {
            Err(RenderError::Resolve(Error::UnrecognizedModule { name })) => assert_eq!(name, "nope"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_attribute_is_typed() {
        match render("{{ compdoc.module('vec').Vec3.doc }}") {
            Err(RenderError::Resolve(Error::UnrecognizedModuleAttribute { module, key })) => {
                assert_eq!((module.as_str(), key.as_str()), ("vec", "Vec3"))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_method_is_typed() {
        match render("{{ compdoc.module('vec').Vec2.length.doc }}") {
            Err(RenderError::Resolve(Error::ClassFunctionNotFound { class, key })) => {
                assert_eq!((class.as_str(), key.as_str()), ("Vec2", "length"))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn formatter_failures_are_typed() {
        assert!(matches!(
            render("{% import compdoc.formatter('latex') as fmt %}"),
            Err(RenderError::Resolve(Error::UnrecognizedFormatter { .. }))
        ));
        assert!(matches!(
            render("{% import compdoc.formatter('gone') as fmt %}"),
            Err(RenderError::Resolve(Error::FormatterMissing { .. }))
        ));
    }

    #[test]
    fn guarded_miss_is_not_a_later_cause() {
        let out = render(
            "{% set vec = compdoc.module('vec') %}{% if vec.Missing is defined %}x{% else %}y{% endif %}",
        )
        .unwrap();
        assert_eq!(out, "y");

        assert!(matches!(
            render("{% if compdoc.module('vec').Missing is defined %}x{% endif %}{{ nothing }}"),
            Err(RenderError::Engine(_))
        ));
    }

    #[test]
    fn miss_is_matched_to_the_failing_expression() {
        let template = "{% set vec = compdoc.module('vec') %}{% if vec.Missing is defined %}{% endif %}\n{{ vec.Vec2.length.doc }}";
        match render(template) {
            Err(RenderError::Resolve(Error::ClassFunctionNotFound { key, .. })) => {
                assert_eq!(key, "length")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn identifier_mentions() {
        assert!(mentions("vec.Vec3.doc", "Vec3"));
        assert!(!mentions("vec.Vec30.doc", "Vec3"));
        assert!(!mentions("nothing", "no"));
    }

    #[test]
    fn undefined_variables_are_errors() {
        assert!(matches!(
            render("{{ nothing }}"),
            Err(RenderError::Engine(_))
        ));
    }

    #[test]
    fn syntax_errors_are_engine_errors() {
        assert!(matches!(
            render("{% for %}"),
            Err(RenderError::Engine(_))
        ));
    }
}
