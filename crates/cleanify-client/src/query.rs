//! Row filters in the REST service's query-string dialect.
//!
//! A [`Query`] renders to `?select=*&col=eq.v&order=created_at.desc` pairs for
//! the HTTP backend and can also be evaluated directly against JSON rows, which
//! is how the in-memory backend answers selects.

use std::cmp::Ordering;

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
enum Filter {
    Eq(String, String),
    In(String, Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    table: String,
    columns: String,
    filters: Vec<Filter>,
    order: Vec<(String, Direction)>,
    limit: Option<usize>,
}

impl Query {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: "*".into(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.columns = columns.into();
        self
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push(Filter::Eq(column.into(), value.to_string()));
        self
    }

    pub fn in_list<I, V>(mut self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        let values = values.into_iter().map(|v| v.to_string()).collect();
        self.filters.push(Filter::In(column.into(), values));
        self
    }

    pub fn order(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order.push((column.into(), direction));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Query-string pairs for `GET /rest/v1/{table}`. Updates reuse the
    /// filter pairs only.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), self.columns.clone())];
        pairs.extend(self.filter_pairs());
        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|(col, dir)| match dir {
                    Direction::Asc => format!("{}.asc", col),
                    Direction::Desc => format!("{}.desc", col),
                })
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(("order".to_string(), order));
        }
        if let Some(n) = self.limit {
            pairs.push(("limit".to_string(), n.to_string()));
        }
        pairs
    }

    pub fn filter_pairs(&self) -> Vec<(String, String)> {
        self.filters
            .iter()
            .map(|f| match f {
                Filter::Eq(col, v) => (col.clone(), format!("eq.{}", v)),
                Filter::In(col, vs) => {
                    let list = vs.iter().map(|v| quote_list_item(v)).collect::<Vec<_>>().join(",");
                    (col.clone(), format!("in.({})", list))
                }
            })
            .collect()
    }

    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|f| match f {
            Filter::Eq(col, v) => cell_text(row.get(col)).as_deref() == Some(v.as_str()),
            Filter::In(col, vs) => match cell_text(row.get(col)) {
                Some(text) => vs.iter().any(|v| *v == text),
                None => false,
            },
        })
    }

    /// Filter, order and limit `rows` the way the REST service would.
    pub fn apply(&self, rows: &[Value]) -> Vec<Value> {
        let mut out: Vec<Value> = rows.iter().filter(|r| self.matches(r)).cloned().collect();
        if !self.order.is_empty() {
            out.sort_by(|a, b| {
                for (col, dir) in &self.order {
                    let ord = compare_cells(a.get(col), b.get(col), *dir);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }
        if let Some(n) = self.limit {
            out.truncate(n);
        }
        out
    }
}

fn quote_list_item(v: &str) -> String {
    if v.contains([',', '(', ')', '"', ' ']) {
        format!("\"{}\"", v.replace('"', "\\\""))
    } else {
        v.to_string()
    }
}

/// Text form of a cell as the filter operators compare it. Null never matches.
fn cell_text(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Nulls sort last ascending and first descending, matching Postgres defaults.
fn compare_cells(a: Option<&Value>, b: Option<&Value>, dir: Direction) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    let ord = match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(x), Some(y)) => cell_text(Some(x)).cmp(&cell_text(Some(y))),
    };
    match dir {
        Direction::Asc => ord,
        Direction::Desc => ord.reverse(),
    }
}
