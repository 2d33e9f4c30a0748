//! Store-native filters.
//!
//! Filters are plain data: a store either translates them into its own query
//! language or evaluates them in process with [`Filter::apply`].
//!
//! ```rust
//! use docrepo::filter::{and, field};
//!
//! let filter = and(vec![field("name").eq("foo"), field("qty").gte(3)]);
//! ```

use crate::document::{compare_values, get_path, values_equal, Document};
use crate::errors::RepoResult;
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;

/// A predicate over documents.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    /// Matches every document
    All,
    Eq(String, Value),
    Ne(String, Value),
    Gt(String, Value),
    Gte(String, Value),
    Lt(String, Value),
    Lte(String, Value),
    In(String, Vec<Value>),
    NotIn(String, Vec<Value>),
    /// Field is a string matching the pattern
    Regex(String, Pattern),
    /// Field presence (`true`) or absence (`false`)
    Exists(String, bool),
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

/// A regular expression compiled once, when the filter is built.
///
/// An invalid pattern is kept so that evaluation reports it as a
/// `FilterError`. Two patterns are equal when their sources are.
#[derive(Clone, Debug)]
pub struct Pattern {
    source: String,
    compiled: Result<Regex, regex::Error>,
}

impl Pattern {
    pub fn new(source: &str) -> Self {
        let compiled = Regex::new(source);
        if let Err(e) = &compiled {
            log::error!("Invalid regex pattern '{}': {}", source, e);
        }
        Pattern {
            source: source.to_string(),
            compiled,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    fn is_match(&self, text: &str) -> RepoResult<bool> {
        match &self.compiled {
            Ok(regex) => Ok(regex.is_match(text)),
            Err(e) => Err(e.clone().into()),
        }
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Returns a filter matching every document.
pub fn all() -> Filter {
    Filter::All
}

/// Starts a fluent filter on `field_name`.
pub fn field(field_name: &str) -> FluentFilter {
    FluentFilter {
        field_name: field_name.to_string(),
    }
}

/// Conjunction of `filters`. An empty list matches everything.
pub fn and(filters: Vec<Filter>) -> Filter {
    Filter::And(filters)
}

/// Disjunction of `filters`. An empty list matches nothing.
pub fn or(filters: Vec<Filter>) -> Filter {
    Filter::Or(filters)
}

pub struct FluentFilter {
    field_name: String,
}

impl FluentFilter {
    #[inline]
    pub fn eq<T: Into<Value>>(self, value: T) -> Filter {
        Filter::Eq(self.field_name, value.into())
    }

    #[inline]
    pub fn ne<T: Into<Value>>(self, value: T) -> Filter {
        Filter::Ne(self.field_name, value.into())
    }

    #[inline]
    pub fn gt<T: Into<Value>>(self, value: T) -> Filter {
        Filter::Gt(self.field_name, value.into())
    }

    #[inline]
    pub fn gte<T: Into<Value>>(self, value: T) -> Filter {
        Filter::Gte(self.field_name, value.into())
    }

    #[inline]
    pub fn lt<T: Into<Value>>(self, value: T) -> Filter {
        Filter::Lt(self.field_name, value.into())
    }

    #[inline]
    pub fn lte<T: Into<Value>>(self, value: T) -> Filter {
        Filter::Lte(self.field_name, value.into())
    }

    pub fn in_array<T: Into<Value>>(self, values: Vec<T>) -> Filter {
        Filter::In(self.field_name, values.into_iter().map(Into::into).collect())
    }

    pub fn not_in_array<T: Into<Value>>(self, values: Vec<T>) -> Filter {
        Filter::NotIn(self.field_name, values.into_iter().map(Into::into).collect())
    }

    pub fn regex(self, pattern: &str) -> Filter {
        Filter::Regex(self.field_name, Pattern::new(pattern))
    }

    pub fn exists(self) -> Filter {
        Filter::Exists(self.field_name, true)
    }

    pub fn not_exists(self) -> Filter {
        Filter::Exists(self.field_name, false)
    }
}

impl Filter {
    /// Combines `self` and `other`, flattening nested conjunctions.
    pub fn and(self, other: Filter) -> Filter {
        match (self, other) {
            (Filter::All, other) => other,
            (this, Filter::All) => this,
            (Filter::And(mut filters), other) => {
                filters.push(other);
                Filter::And(filters)
            }
            (this, other) => Filter::And(vec![this, other]),
        }
    }

    pub fn or(self, other: Filter) -> Filter {
        match self {
            Filter::Or(mut filters) => {
                filters.push(other);
                Filter::Or(filters)
            }
            this => Filter::Or(vec![this, other]),
        }
    }

    pub fn not(self) -> Filter {
        Filter::Not(Box::new(self))
    }

    /// Evaluates the filter against one document.
    ///
    /// Missing fields compare as `null`. Fails only when a regex filter with
    /// an invalid pattern meets a string field.
    pub fn apply(&self, document: &Document) -> RepoResult<bool> {
        let matched = match self {
            Filter::All => true,
            Filter::Eq(path, value) => values_equal(lookup(document, path), value),
            Filter::Ne(path, value) => !values_equal(lookup(document, path), value),
            Filter::Gt(path, value) => ordered(document, path, value, |o| o == Ordering::Greater),
            Filter::Gte(path, value) => ordered(document, path, value, |o| o != Ordering::Less),
            Filter::Lt(path, value) => ordered(document, path, value, |o| o == Ordering::Less),
            Filter::Lte(path, value) => ordered(document, path, value, |o| o != Ordering::Greater),
            Filter::In(path, values) => {
                let actual = lookup(document, path);
                values.iter().any(|v| values_equal(actual, v))
            }
            Filter::NotIn(path, values) => {
                let actual = lookup(document, path);
                !values.iter().any(|v| values_equal(actual, v))
            }
            Filter::Regex(path, pattern) => match get_path(document, path) {
                Some(Value::String(text)) => pattern.is_match(text)?,
                _ => false,
            },
            Filter::Exists(path, expected) => get_path(document, path).is_some() == *expected,
            Filter::And(filters) => {
                for filter in filters {
                    if !filter.apply(document)? {
                        return Ok(false);
                    }
                }
                true
            }
            Filter::Or(filters) => {
                for filter in filters {
                    if filter.apply(document)? {
                        return Ok(true);
                    }
                }
                false
            }
            Filter::Not(filter) => !filter.apply(document)?,
        };
        Ok(matched)
    }
}

static NULL: Value = Value::Null;

fn lookup<'a>(document: &'a Document, path: &str) -> &'a Value {
    get_path(document, path).unwrap_or(&NULL)
}

fn ordered(document: &Document, path: &str, value: &Value, test: impl Fn(Ordering) -> bool) -> bool {
    match get_path(document, path) {
        Some(actual) => compare_values(actual, value).is_some_and(test),
        None => false,
    }
}
