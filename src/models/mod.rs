mod address;
mod customer;
mod project;
mod user;

use serde::{Deserialize, Deserializer};

pub use address::Address;
pub use customer::{Customer, CustomerPayload};
pub use project::{Project, ProjectPayload};
pub use user::{Credentials, LoginResponse, User};

// The backend sends `null` for unset columns; treat those as the empty value
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
