use serde::{Deserialize, Serialize};

use super::{null_as_default, Address};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Customer {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub company: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub contact: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub country: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub addresses: Vec<Address>,
}

/// Body of `POST /api/customers` and `PUT /api/customers/:id`.
///
/// Addresses are sent in form order; validation errors for them come back
/// keyed by their position in this list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CustomerPayload {
    pub name: String,
    pub email: String,
    pub company: String,
    pub contact: String,
    pub country: String,
    pub addresses: Vec<Address>,
}
