//! Search filter over application collections.
//!
//! The query string is taken raw: ampersand-joined `key=value` tokens with
//! no percent-decoding. A token must contain exactly one `=`, otherwise it
//! is dropped. Repeated keys keep the last value. Recognized keys are
//! combined with AND:
//!
//! - `name`: exact match on the application name
//! - `table`: exact match on the table reference
//! - `q`: exact match on name OR table
//!
//! Unknown keys are ignored and an empty value counts as absent.

use std::collections::HashMap;

use crate::Application;

const KEY_NAME: &str = "name";
const KEY_TABLE: &str = "table";
const KEY_QUERY: &str = "q";

/// Parsed application search constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub name: Option<String>,
    pub table: Option<String>,
    pub q: Option<String>,
}

impl SearchFilter {
    /// Parse a raw query string (without the leading `?`).
    pub fn parse(raw: Option<&str>) -> Self {
        let mut pairs: HashMap<&str, &str> = HashMap::new();
        for token in raw.unwrap_or_default().split('&') {
            let mut parts = token.split('=');
            if let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) {
                pairs.insert(key, value);
            }
        }

        let take = |key: &str| {
            pairs
                .get(key)
                .filter(|value| !value.is_empty())
                .map(|value| value.to_string())
        };

        Self {
            name: take(KEY_NAME),
            table: take(KEY_TABLE),
            q: take(KEY_QUERY),
        }
    }

    /// True when no recognized constraint is present.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.table.is_none() && self.q.is_none()
    }

    /// Evaluate every present constraint against one application.
    pub fn matches(&self, app: &Application) -> bool {
        if let Some(name) = &self.name {
            if app.name != *name {
                return false;
            }
        }

        if let Some(table) = &self.table {
            if app.table() != Some(table.as_str()) {
                return false;
            }
        }

        if let Some(q) = &self.q {
            if app.name != *q && app.table() != Some(q.as_str()) {
                return false;
            }
        }

        true
    }

    /// Keep the matching applications.
    pub fn apply<'a, I>(&self, apps: I) -> Vec<&'a Application>
    where
        I: IntoIterator<Item = &'a Application>,
    {
        apps.into_iter().filter(|app| self.matches(app)).collect()
    }
}
