//! Docstring parser for Google-style sections and reST field lists.
//!
//! Never fails: text without recognizable structure yields a summary and
//! empty parameter lists.

use crate::model::{DocComment, DocParam, DocRaises, DocReturns};
use regex::Regex;
use std::sync::LazyLock;

static RE_SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z][A-Za-z ]*):\s*$").unwrap());

// `name (type): description`, `*args: description`
static RE_GOOGLE_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\*{0,2}[A-Za-z_][A-Za-z0-9_]*)\s*(?:\((.*)\))?\s*:\s*(.*)$").unwrap()
});

// `:param int x: description`, `:returns: description`
static RE_REST_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:([A-Za-z]+)((?:\s+[^:]+)?):\s*(.*)$").unwrap());

static RE_REST_DETECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*:(param|parameter|arg|argument|key|keyword|type|returns?|rtype|raises?)\b")
        .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Params,
    Attributes,
    Returns,
    Raises,
    Ignored,
}

/// Unlisted titles still open a section, whose body is skipped.
fn section_kind(title: &str) -> Section {
    match title.to_ascii_lowercase().as_str() {
        "args" | "arguments" | "parameters" | "params" | "keyword args"
        | "keyword arguments" | "other parameters" => Section::Params,
        "attributes" => Section::Attributes,
        "returns" | "return" | "yields" | "yield" => Section::Returns,
        "raises" | "exceptions" | "except" => Section::Raises,
        _ => Section::Ignored,
    }
}

/// Parse a normalized docstring into its structured form.
pub fn parse(text: &str) -> DocComment {
    let text = text.trim();
    if text.is_empty() {
        return DocComment::default();
    }
    if RE_REST_DETECT.is_match(text) {
        parse_rest(text)
    } else {
        parse_google(text)
    }
}

/// Summary is the first line; description is the remaining preamble.
fn preamble(comment: &mut DocComment, lines: &[&str]) {
    let Some((first, rest)) = lines.split_first() else {
        return;
    };
    let summary = first.trim();
    if !summary.is_empty() {
        comment.summary = Some(summary.to_string());
    }
    let description = rest.join("\n").trim().to_string();
    if !description.is_empty() {
        comment.description = Some(description);
    }
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

// -- Google style -------------------------------------------------------------------

fn parse_google(text: &str) -> DocComment {
    let lines: Vec<&str> = text.lines().collect();
    let mut comment = DocComment::default();

    // An unlisted title on the summary line is prose, not a header.
    let header_at = |i: usize| -> Option<Section> {
        let line = lines[i];
        if indent_of(line) != 0 {
            return None;
        }
        let caps = RE_SECTION.captures(line)?;
        let section = section_kind(caps[1].trim());
        (i > 0 || section != Section::Ignored).then_some(section)
    };

    let first_section = (0..lines.len())
        .find(|&i| header_at(i).is_some())
        .unwrap_or(lines.len());
    preamble(&mut comment, &lines[..first_section]);

    let mut i = first_section;
    while i < lines.len() {
        let Some(section) = header_at(i) else {
            i += 1;
            continue;
        };
        let start = i + 1;
        let end = (start..lines.len())
            .find(|&j| header_at(j).is_some())
            .unwrap_or(lines.len());
        let body = &lines[start..end];

        let items = google_items(body);
        match section {
            Section::Params => comment.params.extend(items.iter().map(|item| google_param(item))),
            Section::Attributes => {
                comment.attributes.extend(items.iter().map(|item| google_param(item)))
            }
            Section::Returns => comment.returns = google_returns(body),
            Section::Raises => comment.raises.extend(items.iter().map(|item| google_raises(item))),
            Section::Ignored => {}
        }
        i = end;
    }

    comment
}

/// Split a section body into items: each line at the item indentation starts
/// an item, deeper lines continue it.
fn google_items(body: &[&str]) -> Vec<Vec<String>> {
    let Some(item_indent) = body
        .iter()
        .find(|l| !l.trim().is_empty())
        .map(|l| indent_of(l))
    else {
        return Vec::new();
    };

    let mut items: Vec<Vec<String>> = Vec::new();
    for line in body {
        if line.trim().is_empty() {
            continue;
        }
        if indent_of(line) <= item_indent {
            items.push(vec![line.trim().to_string()]);
        } else if let Some(current) = items.last_mut() {
            current.push(line.trim().to_string());
        }
    }
    items
}

/// Split `int, optional` into the type and the optional flag.
fn split_optional(type_name: &str) -> (Option<String>, bool) {
    let type_name = type_name.trim();
    let (base, optional) = match type_name.strip_suffix("optional") {
        Some(rest) if rest.trim_end().ends_with(',') => {
            (rest.trim_end().trim_end_matches(',').trim(), true)
        }
        _ if type_name == "optional" => ("", true),
        _ => (type_name, false),
    };
    let base = (!base.is_empty()).then(|| base.to_string());
    (base, optional)
}

fn google_param(item: &[String]) -> DocParam {
    let first = item.first().map(String::as_str).unwrap_or_default();
    let continuation = &item[1.min(item.len())..];

    let (name, type_name, optional, lead) = match RE_GOOGLE_ITEM.captures(first) {
        Some(caps) => {
            let (type_name, optional) = caps
                .get(2)
                .map_or((None, false), |m| split_optional(m.as_str()));
            (caps[1].to_string(), type_name, optional, caps[3].to_string())
        }
        None => match first.split_once(':') {
            Some((name, desc)) => (name.trim().to_string(), None, false, desc.trim().to_string()),
            None => (first.to_string(), None, false, String::new()),
        },
    };

    DocParam {
        name,
        type_name,
        description: join_description(&lead, continuation),
        optional,
    }
}

fn google_returns(body: &[&str]) -> Option<DocReturns> {
    let lines: Vec<String> = body
        .iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    let (first, rest) = lines.split_first()?;
    let (type_name, lead) = match first.split_once(':') {
        Some((ty, desc)) if !ty.trim().is_empty() => {
            (Some(ty.trim().to_string()), desc.trim().to_string())
        }
        _ => (None, first.clone()),
    };
    Some(DocReturns {
        type_name,
        description: join_description(&lead, rest),
    })
}

fn google_raises(item: &[String]) -> DocRaises {
    let first = item.first().map(String::as_str).unwrap_or_default();
    let continuation = &item[1.min(item.len())..];
    match first.split_once(':') {
        Some((ty, desc)) => DocRaises {
            type_name: Some(ty.trim().to_string()),
            description: join_description(desc.trim(), continuation),
        },
        None => DocRaises {
            type_name: None,
            description: join_description(first, continuation),
        },
    }
}

fn join_description(lead: &str, continuation: &[String]) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(continuation.len() + 1);
    if !lead.is_empty() {
        parts.push(lead);
    }
    parts.extend(continuation.iter().map(String::as_str));
    parts.join("\n")
}

// -- reST field lists ---------------------------------------------------------------

struct Field {
    key: String,
    args: Vec<String>,
    lines: Vec<String>,
}

fn parse_rest(text: &str) -> DocComment {
    let lines: Vec<&str> = text.lines().collect();
    let mut comment = DocComment::default();

    let first_field = lines
        .iter()
        .position(|l| RE_REST_FIELD.is_match(l.trim()))
        .unwrap_or(lines.len());
    preamble(&mut comment, &lines[..first_field]);

    let mut fields: Vec<Field> = Vec::new();
    for line in &lines[first_field..] {
        let trimmed = line.trim();
        if let Some(caps) = RE_REST_FIELD.captures(trimmed) {
            fields.push(Field {
                key: caps[1].to_ascii_lowercase(),
                args: caps[2].split_whitespace().map(str::to_string).collect(),
                lines: vec![caps[3].to_string()],
            });
        } else if !trimmed.is_empty() {
            if let Some(field) = fields.last_mut() {
                field.lines.push(trimmed.to_string());
            }
        }
    }

    let mut param_types: Vec<(String, String)> = Vec::new();
    let mut return_type: Option<String> = None;
    for field in fields {
        let description = field
            .lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        match field.key.as_str() {
            "param" | "parameter" | "arg" | "argument" | "key" | "keyword" => {
                let Some((name, type_words)) = field.args.split_last() else {
                    continue;
                };
                let (type_name, optional) = if type_words.is_empty() {
                    (None, false)
                } else {
                    split_optional(&type_words.join(" "))
                };
                comment.params.push(DocParam {
                    name: name.clone(),
                    type_name,
                    description,
                    optional,
                });
            }
            "type" => {
                if let Some(name) = field.args.first() {
                    param_types.push((name.clone(), description));
                }
            }
            "returns" | "return" => {
                comment.returns = Some(DocReturns {
                    type_name: None,
                    description,
                });
            }
            "rtype" => return_type = Some(description),
            "raises" | "raise" | "except" | "exception" => comment.raises.push(DocRaises {
                type_name: field.args.first().cloned(),
                description,
            }),
            _ => {}
        }
    }

    for (name, ty) in param_types {
        if let Some(param) = comment.params.iter_mut().find(|p| p.name == name) {
            if param.type_name.is_none() {
                let (type_name, optional) = split_optional(&ty);
                param.type_name = type_name;
                param.optional |= optional;
            }
        }
    }
    if let Some(ty) = return_type {
        let returns = comment.returns.get_or_insert_with(|| DocReturns {
            type_name: None,
            description: String::new(),
        });
        returns.type_name = Some(ty);
    }

    comment
}
