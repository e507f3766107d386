//! Search query accumulation.
//!
//! # Overview
//! Every predicate call on `Make` appends at most one `key=value` pair to a
//! `QueryPairs` list. Values are percent-encoded, negated values carry the
//! `{!}` marker the server understands, and multi-term values are sent as
//! `<execution>,<term>,<term>`. Empty values are skipped silently so callers
//! can pass optional inputs straight through.
//!
//! `Make::find` offers the same predicates from a JSON object, which is how
//! saved searches and configuration files describe queries.

use std::fmt;

use serde_json::{Map, Value};

use crate::client::Make;

/// Prefix that tells the server to invert a predicate.
pub const NEGATION_MARKER: &str = "{!}";

/// How the terms of a multi-term predicate combine on the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Execution {
    #[default]
    And,
    Or,
}

impl Execution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Execution::And => "and",
            Execution::Or => "or",
        }
    }
}

impl fmt::Display for Execution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort order for `sortByField`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Terms for a multi-term predicate such as `tags`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermList {
    terms: Vec<String>,
    execution: Execution,
}

impl TermList {
    /// Terms are trimmed; execution defaults to `and`.
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            terms: terms.into_iter().map(|t| t.as_ref().trim().to_string()).collect(),
            execution: Execution::default(),
        }
    }

    /// Split a comma-separated list, e.g. `"a, b,c"`.
    pub fn parse(csv: &str) -> Self {
        Self::new(csv.split(','))
    }

    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn execution(&self) -> Execution {
        self.execution
    }

    /// True when no term carries any text.
    pub fn is_empty(&self) -> bool {
        self.terms.iter().all(|t| t.is_empty())
    }

    fn encode(&self) -> String {
        format!("{},{}", self.execution, self.terms.join(","))
    }
}

impl From<&str> for TermList {
    fn from(csv: &str) -> Self {
        TermList::parse(csv)
    }
}

impl From<String> for TermList {
    fn from(csv: String) -> Self {
        TermList::parse(&csv)
    }
}

impl<S: AsRef<str>> From<Vec<S>> for TermList {
    fn from(terms: Vec<S>) -> Self {
        TermList::new(terms)
    }
}

impl<S: AsRef<str>, const N: usize> From<[S; N]> for TermList {
    fn from(terms: [S; N]) -> Self {
        TermList::new(terms)
    }
}

/// Argument of the `id` predicate: one identifier, or several matched with
/// `or` execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdQuery {
    Single(String),
    Many(TermList),
}

impl From<&str> for IdQuery {
    fn from(id: &str) -> Self {
        IdQuery::Single(id.to_string())
    }
}

impl From<String> for IdQuery {
    fn from(id: String) -> Self {
        IdQuery::Single(id)
    }
}

impl From<&String> for IdQuery {
    fn from(id: &String) -> Self {
        IdQuery::Single(id.clone())
    }
}

impl From<TermList> for IdQuery {
    fn from(ids: TermList) -> Self {
        IdQuery::Many(ids)
    }
}

impl<S: AsRef<str>> From<Vec<S>> for IdQuery {
    fn from(ids: Vec<S>) -> Self {
        IdQuery::Many(TermList::new(ids))
    }
}

impl<S: AsRef<str>, const N: usize> From<[S; N]> for IdQuery {
    fn from(ids: [S; N]) -> Self {
        IdQuery::Many(TermList::new(ids))
    }
}

/// Ordered list of encoded `key=value` predicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPairs(Vec<String>);

impl QueryPairs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `key=value`; an empty value is ignored.
    pub fn push(&mut self, key: &str, value: &str, not: bool) {
        if value.is_empty() {
            return;
        }
        let value = if not {
            format!("{NEGATION_MARKER}{value}")
        } else {
            value.to_string()
        };
        self.0.push(format!("{}={}", encode(key), encode(&value)));
    }

    pub fn push_terms(&mut self, key: &str, terms: &TermList, not: bool) {
        if terms.is_empty() {
            return;
        }
        self.push(key, &terms.encode(), not);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_query_string(&self) -> String {
        self.0.join("&")
    }

    /// Join the pairs and leave the list empty.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.0).join("&")
    }
}

/// Percent-encode one query component.
pub fn encode(component: &str) -> String {
    url::form_urlencoded::byte_serialize(component.as_bytes()).collect()
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

impl Make {
    pub fn author(&mut self, name: &str, not: bool) -> &mut Self {
        self.pairs.push("author", name, not);
        self
    }

    pub fn user(&mut self, id: &str, not: bool) -> &mut Self {
        self.pairs.push("user", id, not);
        self
    }

    pub fn tags(&mut self, terms: impl Into<TermList>, not: bool) -> &mut Self {
        self.pairs.push_terms("tags", &terms.into(), not);
        self
    }

    pub fn tag_prefix(&mut self, prefix: &str, not: bool) -> &mut Self {
        self.pairs.push("tagPrefix", prefix, not);
        self
    }

    pub fn url(&mut self, url: &str, not: bool) -> &mut Self {
        self.pairs.push("url", url, not);
        self
    }

    pub fn content_type(&mut self, content_type: &str, not: bool) -> &mut Self {
        self.pairs.push("contentType", content_type, not);
        self
    }

    pub fn remixed_from(&mut self, id: &str, not: bool) -> &mut Self {
        self.pairs.push("remixedFrom", id, not);
        self
    }

    /// A list of ids always matches with `or` execution.
    pub fn id(&mut self, ids: impl Into<IdQuery>, not: bool) -> &mut Self {
        match ids.into() {
            IdQuery::Single(id) => self.pairs.push("id", &id, not),
            IdQuery::Many(list) => {
                self.pairs
                    .push_terms("id", &list.with_execution(Execution::Or), not)
            }
        }
        self
    }

    pub fn title(&mut self, title: &str, not: bool) -> &mut Self {
        self.pairs.push("title", title, not);
        self
    }

    pub fn description(&mut self, description: &str, not: bool) -> &mut Self {
        self.pairs.push("description", description, not);
        self
    }

    /// Zero means "server default" and adds nothing.
    pub fn limit(&mut self, count: u32) -> &mut Self {
        if count > 0 {
            self.pairs.push("limit", &count.to_string(), false);
        }
        self
    }

    pub fn page(&mut self, page: u32) -> &mut Self {
        if page > 0 {
            self.pairs.push("page", &page.to_string(), false);
        }
        self
    }

    pub fn sort_by_field(&mut self, field: &str, direction: Option<SortDirection>) -> &mut Self {
        self.push_sort(field, direction.unwrap_or_default().as_str());
        self
    }

    fn push_sort(&mut self, field: &str, direction: &str) {
        if !field.is_empty() {
            self.pairs
                .push("sortByField", &format!("{field},{direction}"), false);
        }
    }

    /// Match records satisfying any predicate instead of all of them.
    pub fn or(&mut self) -> &mut Self {
        self.pairs.push("or", "1", false);
        self
    }

    /// Apply predicates from a JSON object keyed by wire name.
    ///
    /// Each value is either the single argument of the matching predicate or
    /// an array of its positional arguments, e.g.
    /// `{"author": ["bob", true], "tags": [["a", "b"]], "limit": 5}`.
    /// Keys are applied in the map's (sorted) order. A `sortByField`
    /// direction is sent as given, `desc` when missing. Unknown keys and
    /// non-object input are ignored.
    pub fn find(&mut self, options: &Value) -> &mut Self {
        let Some(options) = options.as_object() else {
            return self;
        };

        for (key, value) in options {
            let args: Vec<&Value> = match value {
                Value::Array(items) => items.iter().collect(),
                other => vec![other],
            };
            let first = args.first().copied().unwrap_or(&Value::Null);
            let not = args.get(1).is_some_and(|v| truthy(v));

            match key.as_str() {
                "author" | "user" | "tagPrefix" | "url" | "contentType" | "remixedFrom"
                | "title" | "description" => {
                    self.pairs.push(key, &js_string(first), not);
                }
                "tags" => {
                    if let Some(terms) = terms_from_json(first, "tags") {
                        self.pairs.push_terms("tags", &terms, not);
                    }
                }
                "id" => match first {
                    Value::String(id) => {
                        self.pairs.push("id", id, not);
                    }
                    other => {
                        if let Some(ids) = terms_from_json(other, "id") {
                            self.pairs
                                .push_terms("id", &ids.with_execution(Execution::Or), not);
                        }
                    }
                },
                "limit" | "page" => {
                    self.pairs.push(key, &js_string(first), false);
                }
                "sortByField" => {
                    if let Value::String(field) = first {
                        let direction = args
                            .get(1)
                            .and_then(|v| v.as_str())
                            .filter(|d| !d.is_empty())
                            .unwrap_or(SortDirection::default().as_str());
                        self.push_sort(field, direction);
                    }
                }
                "or" => {
                    if truthy(first) {
                        self.or();
                    }
                }
                _ => {}
            }
        }
        self
    }

    /// The predicates accumulated so far, joined as a query string.
    pub fn query_string(&self) -> String {
        self.pairs.to_query_string()
    }
}

// ---------------------------------------------------------------------------
// JSON argument coercion
// ---------------------------------------------------------------------------

pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Text form of a scalar argument; falsy values become empty.
fn js_string(value: &Value) -> String {
    if !truthy(value) {
        return String::new();
    }
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items.iter().map(js_string).collect::<Vec<_>>().join(","),
        Value::Null | Value::Object(_) => String::new(),
    }
}

fn terms_from_json(value: &Value, field: &str) -> Option<TermList> {
    match value {
        Value::String(csv) if !csv.is_empty() => Some(TermList::parse(csv)),
        Value::Array(items) => Some(TermList::new(items.iter().map(js_string))),
        Value::Object(obj) => terms_from_object(obj, field),
        _ => None,
    }
}

fn terms_from_object(obj: &Map<String, Value>, field: &str) -> Option<TermList> {
    let execution = match obj.get("execution").and_then(Value::as_str) {
        Some("or") => Execution::Or,
        _ => Execution::And,
    };
    let terms = match obj.get(field)? {
        Value::String(csv) => TermList::parse(csv),
        Value::Array(items) => TermList::new(items.iter().map(js_string)),
        _ => return None,
    };
    Some(terms.with_execution(execution))
}
