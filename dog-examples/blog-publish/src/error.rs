use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dog_publish::{PersistError, PublishError, RegistryError};
use serde_json::{json, Value};

/// Feathers-style error body: `{ name, message, code, className, data? }`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    data: Option<Value>,
}

impl ApiError {
    pub fn new<S: Into<String>>(status: StatusCode, message: S) -> Self {
        Self {
            status,
            message: message.into(),
            data: None,
        }
    }

    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn with_data(mut self, data: Option<Value>) -> Self {
        self.data = data;
        self
    }

    pub fn from_json_rejection(rejection: JsonRejection) -> Self {
        Self::bad_request("Failed to parse the request body as JSON")
            .with_data(Some(json!({ "_schema": [rejection.to_string()] })))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    fn names(&self) -> (&'static str, &'static str) {
        match self.status {
            StatusCode::BAD_REQUEST => ("BadRequest", "bad-request"),
            StatusCode::UNAUTHORIZED => ("NotAuthenticated", "not-authenticated"),
            StatusCode::NOT_FOUND => ("NotFound", "not-found"),
            StatusCode::CONFLICT => ("Conflict", "conflict"),
            StatusCode::PAYLOAD_TOO_LARGE => ("PayloadTooLarge", "payload-too-large"),
            StatusCode::UNPROCESSABLE_ENTITY => ("Unprocessable", "unprocessable"),
            StatusCode::BAD_GATEWAY => ("BadGateway", "bad-gateway"),
            StatusCode::SERVICE_UNAVAILABLE => ("Unavailable", "unavailable"),
            _ => ("GeneralError", "general-error"),
        }
    }

    pub fn to_json(&self) -> Value {
        let (name, class_name) = self.names();
        let mut body = json!({
            "name": name,
            "message": self.message,
            "code": self.status.as_u16(),
            "className": class_name,
        });
        if let Some(data) = &self.data {
            body["data"] = data.clone();
        }
        body
    }
}

impl From<PublishError> for ApiError {
    fn from(err: PublishError) -> Self {
        let status = match &err {
            PublishError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PublishError::Upload(_) => StatusCode::BAD_GATEWAY,
            PublishError::Persist(PersistError::StorageUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            PublishError::Persist(_) => StatusCode::CONFLICT,
            PublishError::Registry(RegistryError::NotFound(_)) => StatusCode::NOT_FOUND,
            PublishError::Registry(RegistryError::Invalid(_)) => StatusCode::BAD_REQUEST,
            PublishError::Unauthorized => StatusCode::UNAUTHORIZED,
            PublishError::PublishInFlight(_) => StatusCode::CONFLICT,
        };
        Self::new(status, err.to_string()).with_data(serde_json::to_value(err.report()).ok())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::warn!(status = self.status.as_u16(), message = %self.message, "request failed");
        }
        (self.status, Json(self.to_json())).into_response()
    }
}
