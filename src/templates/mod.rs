//! Underscore-style templates embedded by the page as
//! `<script type="underscore/template" id="...">` blocks.
//!
//! Only interpolation is supported: `<%= path %>` inserts the value as-is,
//! `<%- path %>` HTML-escapes it. `path` is a dotted field path into the
//! data object. Evaluation blocks (`<% ... %>`) are rejected at compile time.

use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

lazy_static! {
    static ref TAG: Regex = Regex::new(r"(?s)<%([=-]?)(.*?)%>").unwrap();
    static ref PATH: Regex =
        Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)*$").unwrap();
    static ref SCRIPT: Regex = Regex::new(r"(?s)<script\b([^>]*)>(.*?)</script>").unwrap();
    static ref TYPE_ATTR: Regex = Regex::new(r#"\btype\s*=\s*"underscore/template""#).unwrap();
    static ref ID_ATTR: Regex = Regex::new(r#"\bid\s*=\s*"([^"]+)""#).unwrap();
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template {template:?}: evaluation blocks are not supported: {code:?}")]
    Unsupported { template: String, code: String },
    #[error("template {template:?}: invalid expression {expr:?}")]
    InvalidExpression { template: String, expr: String },
    #[error("template {template:?}: {path:?} is not defined")]
    MissingField { template: String, path: String },
    #[error("no template named {0:?}")]
    UnknownTemplate(String),
    #[error("template {template:?}: data cannot be rendered: {message}")]
    InvalidData { template: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field { path: Vec<String>, escape: bool },
}

#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn compile(name: &str, source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut last = 0;
        for caps in TAG.captures_iter(source) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            if whole.start() > last {
                segments.push(Segment::Literal(source[last..whole.start()].to_string()));
            }
            last = whole.end();

            let expr = caps[2].trim();
            let escape = match &caps[1] {
                "=" => false,
                "-" => true,
                _ => {
                    return Err(TemplateError::Unsupported {
                        template: name.to_string(),
                        code: expr.to_string(),
                    });
                }
            };
            if !PATH.is_match(expr) {
                return Err(TemplateError::InvalidExpression {
                    template: name.to_string(),
                    expr: expr.to_string(),
                });
            }
            segments.push(Segment::Field {
                path: expr.split('.').map(str::to_string).collect(),
                escape,
            });
        }
        if last < source.len() {
            segments.push(Segment::Literal(source[last..].to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            segments,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn render(&self, data: &Value) -> Result<String, TemplateError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field { path, escape } => {
                    let value = lookup(data, path).ok_or_else(|| TemplateError::MissingField {
                        template: self.name.clone(),
                        path: path.join("."),
                    })?;
                    let text = display(value);
                    if *escape {
                        out.push_str(&escape_html(&text));
                    } else {
                        out.push_str(&text);
                    }
                }
            }
        }
        Ok(out)
    }
}

fn lookup<'a>(data: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(data, |value, key| value.get(key))
}

fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '`' => out.push_str("&#x60;"),
            _ => out.push(c),
        }
    }
    out
}

/// Compiled templates keyed by the id of the element that held them.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Template>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: &str, source: &str) -> Result<(), TemplateError> {
        let template = Template::compile(id, source)?;
        debug!("Compiled template {}", id);
        self.templates.insert(id.to_string(), template);
        Ok(())
    }

    pub fn from_sources<'a, I>(sources: I) -> Result<Self, TemplateError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut registry = Self::new();
        for (id, source) in sources {
            registry.register(id, source)?;
        }
        Ok(registry)
    }

    /// Collects every template script block out of a page. Script blocks
    /// without an id are skipped.
    pub fn from_document(html: &str) -> Result<Self, TemplateError> {
        let mut registry = Self::new();
        for caps in SCRIPT.captures_iter(html) {
            let attrs = &caps[1];
            if !TYPE_ATTR.is_match(attrs) {
                continue;
            }
            match ID_ATTR.captures(attrs) {
                Some(id) => registry.register(&id[1], &caps[2])?,
                None => warn!("Skipping template script without an id"),
            }
        }
        Ok(registry)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates.get(id)
    }

    pub fn render(&self, id: &str, data: &Value) -> Result<String, TemplateError> {
        self.get(id)
            .ok_or_else(|| TemplateError::UnknownTemplate(id.to_string()))?
            .render(data)
    }

    /// Like `render`, but takes any serializable row.
    pub fn render_serialized<T: Serialize>(&self, id: &str, data: &T) -> Result<String, TemplateError> {
        let value = serde_json::to_value(data).map_err(|e| TemplateError::InvalidData {
            template: id.to_string(),
            message: e.to_string(),
        })?;
        self.render(id, &value)
    }
}
