//! Backend REST client
//!
//! One method per endpoint. Every request goes through [`HttpApi::send`],
//! which injects the bearer token and turns the backend's error envelope
//! into an [`ApiError`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::{ApiError, ApiResult, ValidationErrors};
use crate::models::{
    Address, Credentials, Customer, CustomerPayload, LoginResponse, Project, ProjectPayload, User,
};

/// Operations the screens need from the backend.
///
/// `token` is the bearer token of the current session.
#[async_trait]
pub trait CrmApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> ApiResult<LoginResponse>;
    async fn current_user(&self, token: &str) -> ApiResult<User>;
    async fn logout(&self, token: &str) -> ApiResult<()>;

    async fn list_customers(&self, token: &str) -> ApiResult<Vec<Customer>>;
    async fn get_customer(&self, token: &str, id: i64) -> ApiResult<Customer>;
    async fn create_customer(&self, token: &str, payload: &CustomerPayload) -> ApiResult<()>;
    async fn update_customer(&self, token: &str, id: i64, payload: &CustomerPayload) -> ApiResult<()>;
    async fn delete_customer(&self, token: &str, id: i64) -> ApiResult<()>;
    async fn delete_address(&self, token: &str, id: i64) -> ApiResult<()>;

    async fn list_projects(&self, token: &str) -> ApiResult<Vec<Project>>;
    async fn get_project(&self, token: &str, id: i64) -> ApiResult<Project>;
    async fn create_project(&self, token: &str, payload: &ProjectPayload) -> ApiResult<()>;
    async fn update_project(&self, token: &str, id: i64, payload: &ProjectPayload) -> ApiResult<()>;
    async fn delete_project(&self, token: &str, id: i64) -> ApiResult<()>;
}

/// `{ data: [...] }` collection wrapper
#[derive(Deserialize)]
struct Collection<T> {
    data: Vec<T>,
}

/// `GET /api/customers/:id` returns the customer and its addresses side by side
#[derive(Deserialize)]
struct CustomerDetail {
    customer: Customer,
    #[serde(default)]
    addresses: Option<Vec<Address>>,
}

#[derive(Deserialize)]
struct ProjectDetail {
    project: Project,
}

#[derive(Deserialize, Default)]
struct ErrorEnvelope {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Option<ValidationErrors>,
}

/// reqwest-backed implementation of [`CrmApi`]
pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header(header::ACCEPT, "application/json");

        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and return the decoded JSON body (`Null` when the
    /// body is empty or not JSON).
    async fn send(&self, builder: RequestBuilder) -> ApiResult<Value> {
        let response = builder.send().await?;
        let status = response.status();
        let url = response.url().path().to_string();
        let bytes = response.bytes().await?;
        let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        tracing::debug!(%url, status = status.as_u16(), "backend response");
        check_envelope(status, body)
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<T> {
        let body = self.send(builder).await?;
        Ok(serde_json::from_value(body)?)
    }
}

fn check_envelope(status: StatusCode, body: Value) -> ApiResult<Value> {
    let has_errors = body.get("errors").is_some_and(|errors| !errors.is_null());
    if status.is_success() && !has_errors {
        return Ok(body);
    }

    let envelope: ErrorEnvelope = serde_json::from_value(body).unwrap_or_default();
    if let Some(errors) = envelope.errors {
        return Err(ApiError::Validation(errors));
    }

    let message = envelope.message.unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });

    if status == StatusCode::UNAUTHORIZED {
        Err(ApiError::Unauthorized(message))
    } else {
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl CrmApi for HttpApi {
    async fn login(&self, credentials: &Credentials) -> ApiResult<LoginResponse> {
        self.fetch(self.request(Method::POST, "/api/login", None).json(credentials))
            .await
    }

    async fn current_user(&self, token: &str) -> ApiResult<User> {
        self.fetch(self.request(Method::GET, "/api/user", Some(token)))
            .await
    }

    async fn logout(&self, token: &str) -> ApiResult<()> {
        self.send(self.request(Method::POST, "/api/logout", Some(token)))
            .await?;
        Ok(())
    }

    async fn list_customers(&self, token: &str) -> ApiResult<Vec<Customer>> {
        let collection: Collection<Customer> = self
            .fetch(self.request(Method::GET, "/api/customers", Some(token)))
            .await?;
        Ok(collection.data)
    }

    async fn get_customer(&self, token: &str, id: i64) -> ApiResult<Customer> {
        let detail: CustomerDetail = self
            .fetch(self.request(Method::GET, &format!("/api/customers/{}", id), Some(token)))
            .await?;

        let mut customer = detail.customer;
        if let Some(addresses) = detail.addresses {
            customer.addresses = addresses;
        }
        Ok(customer)
    }

    async fn create_customer(&self, token: &str, payload: &CustomerPayload) -> ApiResult<()> {
        self.send(self.request(Method::POST, "/api/customers", Some(token)).json(payload))
            .await?;
        Ok(())
    }

    async fn update_customer(&self, token: &str, id: i64, payload: &CustomerPayload) -> ApiResult<()> {
        let path = format!("/api/customers/{}", id);
        self.send(self.request(Method::PUT, &path, Some(token)).json(payload))
            .await?;
        Ok(())
    }

    async fn delete_customer(&self, token: &str, id: i64) -> ApiResult<()> {
        let path = format!("/api/customers/{}", id);
        self.send(self.request(Method::DELETE, &path, Some(token)))
            .await?;
        Ok(())
    }

    async fn delete_address(&self, token: &str, id: i64) -> ApiResult<()> {
        let path = format!("/api/addresses/{}", id);
        self.send(self.request(Method::DELETE, &path, Some(token)))
            .await?;
        Ok(())
    }

    async fn list_projects(&self, token: &str) -> ApiResult<Vec<Project>> {
        let collection: Collection<Project> = self
            .fetch(self.request(Method::GET, "/api/projects", Some(token)))
            .await?;
        Ok(collection.data)
    }

    async fn get_project(&self, token: &str, id: i64) -> ApiResult<Project> {
        let detail: ProjectDetail = self
            .fetch(self.request(Method::GET, &format!("/api/projects/{}", id), Some(token)))
            .await?;
        Ok(detail.project)
    }

    async fn create_project(&self, token: &str, payload: &ProjectPayload) -> ApiResult<()> {
        self.send(self.request(Method::POST, "/api/projects", Some(token)).json(payload))
            .await?;
        Ok(())
    }

    async fn update_project(&self, token: &str, id: i64, payload: &ProjectPayload) -> ApiResult<()> {
        let path = format!("/api/projects/{}", id);
        self.send(self.request(Method::PUT, &path, Some(token)).json(payload))
            .await?;
        Ok(())
    }

    async fn delete_project(&self, token: &str, id: i64) -> ApiResult<()> {
        let path = format!("/api/projects/{}", id);
        self.send(self.request(Method::DELETE, &path, Some(token)))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_body_passes_through() {
        let body = json!({"data": []});
        let checked = check_envelope(StatusCode::OK, body.clone()).unwrap();
        assert_eq!(checked, body);
    }

    #[test]
    fn errors_payload_is_validation_even_on_2xx() {
        let body = json!({"errors": {"name": ["required"]}});
        let err = check_envelope(StatusCode::OK, body).unwrap_err();
        let errors = err.validation().expect("validation error");
        assert_eq!(errors.field("name"), ["required"]);
    }

    #[test]
    fn unprocessable_entity_maps_dotted_paths() {
        let body = json!({
            "message": "The given data was invalid.",
            "errors": {"addresses.1.street": ["The street field is required."]}
        });
        let err = check_envelope(StatusCode::UNPROCESSABLE_ENTITY, body).unwrap_err();
        let errors = err.validation().expect("validation error");
        assert_eq!(errors.nested("addresses", 1, "street").len(), 1);
    }

    #[test]
    fn unauthorized_keeps_server_message() {
        let body = json!({"message": "Unauthenticated."});
        match check_envelope(StatusCode::UNAUTHORIZED, body) {
            Err(ApiError::Unauthorized(message)) => assert_eq!(message, "Unauthenticated."),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn other_failures_fall_back_to_reason_phrase() {
        match check_envelope(StatusCode::INTERNAL_SERVER_ERROR, Value::Null) {
            Err(ApiError::Status { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "Internal Server Error");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let api = HttpApi::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(api.base_url(), "http://localhost:8000");
    }
}
