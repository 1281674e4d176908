use serde::{Deserialize, Serialize};

use super::null_as_default;

/// A postal address owned by a customer.
///
/// `id` is `None` until the backend has persisted the address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub no: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub street: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub city: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: String,
}

impl Address {
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// "street, city, state" as shown in the customer detail panel
    pub fn summary(&self) -> String {
        format!("{}, {}, {}", self.street, self.city, self.state)
    }
}
