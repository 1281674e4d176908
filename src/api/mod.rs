mod client;
mod error;
mod validation;

pub use client::{CrmApi, HttpApi};
pub use error::{ApiError, ApiResult};
pub use validation::{FieldPath, ValidationErrors};
