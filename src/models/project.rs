use chrono::DateTime;
use serde::{Deserialize, Serialize};

use super::{null_as_default, Customer};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Project {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub customers: Vec<Customer>,
}

impl Project {
    /// Creation timestamp for display. Falls back to the raw value when the
    /// server sends something that is not RFC 3339.
    pub fn created_label(&self) -> String {
        match &self.created_at {
            Some(raw) => match DateTime::parse_from_rfc3339(raw) {
                Ok(ts) => ts.format("%Y-%m-%d %H:%M").to_string(),
                Err(_) => raw.clone(),
            },
            None => String::new(),
        }
    }

    pub fn customer_ids(&self) -> Vec<i64> {
        self.customers.iter().map(|c| c.id).collect()
    }
}

/// Body of `POST /api/projects` and `PUT /api/projects/:id`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectPayload {
    pub name: String,
    pub description: String,
    pub customer_ids: Vec<i64>,
}
