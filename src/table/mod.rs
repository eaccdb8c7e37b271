use crate::templates::{Template, TemplateError};
use log::debug;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

pub type Extractor = Box<dyn Fn(&Value) -> SortKey>;
pub type RowRenderer = Box<dyn Fn(&Value) -> Result<String, TemplateError>>;

/// Missing and null sort first, then numbers, then text.
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Missing,
    Number(f64),
    Text(String),
}

impl SortKey {
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => SortKey::Missing,
            Some(Value::Number(n)) => n.as_f64().map_or(SortKey::Missing, SortKey::Number),
            Some(Value::Bool(b)) => SortKey::Number(if *b { 1.0 } else { 0.0 }),
            Some(Value::String(s)) => SortKey::Text(s.clone()),
            Some(other) => SortKey::Text(other.to_string()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Missing => 0,
            SortKey::Number(_) => 1,
            SortKey::Text(_) => 2,
        }
    }

    pub fn compare(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    fn flipped(self) -> Self {
        match self {
            Direction::Ascending => Direction::Descending,
            Direction::Descending => Direction::Ascending,
        }
    }
}

/// Client-side sortable table body.
///
/// Clicking the active header only reverses the rows already in place;
/// keys are computed on the first click of a column.
pub struct TableSorter {
    rows: Vec<Value>,
    render_row: RowRenderer,
    extractors: HashMap<String, Extractor>,
    descending: HashSet<String>,
    active: Option<String>,
    direction: Direction,
}

impl TableSorter {
    pub fn new<F>(rows: Vec<Value>, render_row: F) -> Self
    where
        F: Fn(&Value) -> Result<String, TemplateError> + 'static,
    {
        Self {
            rows,
            render_row: Box::new(render_row),
            extractors: HashMap::new(),
            descending: HashSet::new(),
            active: None,
            direction: Direction::Ascending,
        }
    }

    pub fn from_template(rows: Vec<Value>, template: Template) -> Self {
        Self::new(rows, move |row| template.render(row))
    }

    pub fn with_extractor<F>(mut self, column: &str, extractor: F) -> Self
    where
        F: Fn(&Value) -> SortKey + 'static,
    {
        self.extractors.insert(column.to_string(), Box::new(extractor));
        self
    }

    pub fn with_default_descending(mut self, column: &str) -> Self {
        self.descending.insert(column.to_string());
        self
    }

    pub fn click_header(&mut self, column: &str) {
        if self.active.as_deref() == Some(column) {
            self.rows.reverse();
            self.direction = self.direction.flipped();
            debug!("Reversed table on {} ({:?})", column, self.direction);
            return;
        }

        let mut keyed: Vec<(SortKey, Value)> = self
            .rows
            .drain(..)
            .map(|row| {
                let key = match self.extractors.get(column) {
                    Some(extract) => extract(&row),
                    None => SortKey::from_value(row.get(column)),
                };
                (key, row)
            })
            .collect();
        keyed.sort_by(|a, b| a.0.compare(&b.0));
        self.rows = keyed.into_iter().map(|(_, row)| row).collect();

        self.direction = Direction::Ascending;
        if self.descending.contains(column) {
            self.rows.reverse();
            self.direction = Direction::Descending;
        }
        self.active = Some(column.to_string());
        debug!("Sorted table on {} ({:?})", column, self.direction);
    }

    pub fn is_active(&self, column: &str) -> bool {
        self.active.as_deref() == Some(column)
    }

    pub fn active_column(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn rows(&self) -> &[Value] {
        &self.rows
    }

    /// For callers that change row data; follow with `render`.
    pub fn rows_mut(&mut self) -> &mut Vec<Value> {
        &mut self.rows
    }

    /// Renders the body from the current order. Sort state is untouched.
    pub fn render(&self) -> Result<String, TemplateError> {
        self.rows.iter().map(|row| (self.render_row)(row)).collect()
    }
}
