//! Mapping from handler errors to HTTP responses.

use log::{debug, error, warn};
use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::{Request, catch};
use serde_json::{Value, json};
use worldhud_core::HudError;

/// Error returned by route handlers, rendered as `{"detail": ...}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: Status,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: Status, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl From<HudError> for ApiError {
    fn from(err: HudError) -> Self {
        let status = status_for(&err);
        if status.code >= 500 {
            error!("request failed (status={}): {err}", status.code);
        } else {
            warn!("request rejected (status={}): {err}", status.code);
        }
        Self::new(status, err.to_string())
    }
}

/// HTTP status for each error kind.
pub fn status_for(err: &HudError) -> Status {
    match err {
        HudError::Service(_) => Status::InternalServerError,
        HudError::NotFound(_) => Status::NotFound,
        HudError::Validation(_) => Status::UnprocessableEntity,
        HudError::Store(_) => Status::InternalServerError,
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        (self.status, detail(self.detail)).respond_to(request)
    }
}

fn detail(message: impl Into<String>) -> Json<Value> {
    Json(json!({ "detail": message.into() }))
}

#[catch(404)]
pub fn not_found(request: &Request<'_>) -> Json<Value> {
    debug!("no route for {} {}", request.method(), request.uri());
    detail("Not Found")
}

#[catch(422)]
pub fn unprocessable(request: &Request<'_>) -> Json<Value> {
    debug!("unprocessable request body for {}", request.uri());
    detail("Request body could not be parsed")
}

#[catch(default)]
pub fn fallback(status: Status, _request: &Request<'_>) -> (Status, Json<Value>) {
    (status, detail(status.reason().unwrap_or("Unknown error")))
}

#[cfg(test)]
mod tests {
    use super::{ApiError, status_for};
    use rocket::http::Status;
    use worldhud_core::HudError;
    use worldhud_store::StoreError;

    #[test]
    fn maps_each_kind_to_a_status() {
        assert_eq!(status_for(&HudError::Service("x".into())), Status::InternalServerError);
        assert_eq!(status_for(&HudError::NotFound("Memory".into())), Status::NotFound);
        assert_eq!(
            status_for(&HudError::Validation("bad".into())),
            Status::UnprocessableEntity
        );
        assert_eq!(
            status_for(&HudError::Store(StoreError::NotAnObject)),
            Status::InternalServerError
        );
    }

    #[test]
    fn detail_carries_the_error_message() {
        let err = ApiError::from(HudError::NotFound("Memory".into()));
        assert_eq!(err.status, Status::NotFound);
        assert_eq!(err.detail, "Memory not found");
    }
}
