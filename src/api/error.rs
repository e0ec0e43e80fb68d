use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use serde_json::json;

use crate::images::ImageStoreError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Error: the request does not include the required data")]
    EmptyForm,

    #[error("El campo {0} es requerido")]
    MissingField(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Acceso denegado. Se requiere rol de administrador")]
    Forbidden,

    #[error("{0}")]
    NotFound(&'static str),

    #[error("No se puede eliminar el animal debido a registros relacionados")]
    HasDependents,

    #[error("Error while saving to the database: {0}")]
    Persistence(DbErr),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Error while uploading image: {0}")]
    Upload(#[from] ImageStoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::EmptyForm
            | ApiError::MissingField(_)
            | ApiError::Validation(_)
            | ApiError::HasDependents => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Persistence(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upload(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    fn respond(self, key: &str) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            tracing::error!("{}", message);
        }
        tracing::Span::current().record("error", message.as_str());
        (status, Json(json!({ key: message }))).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.respond("message")
    }
}

/// Renders an [`ApiError`] under the `msg` key, the shape used by the
/// registration and listing endpoints.
#[derive(Debug)]
pub struct Msg(pub ApiError);

impl From<ApiError> for Msg {
    fn from(err: ApiError) -> Self {
        Msg(err)
    }
}

impl IntoResponse for Msg {
    fn into_response(self) -> Response {
        self.0.respond("msg")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_of(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn renders_under_message_key() {
        let response = ApiError::NotFound("Animal no encontrado").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_of(response).await, json!({"message": "Animal no encontrado"}));
    }

    #[tokio::test]
    async fn msg_wrapper_renders_under_msg_key() {
        let response = Msg(ApiError::MissingField("birth_date")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_of(response).await, json!({"msg": "El campo birth_date es requerido"}));
    }

    #[test]
    fn persistence_errors_carry_the_storage_message() {
        let err = ApiError::Persistence(DbErr::Custom("disk full".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Error while saving to the database: Custom Error: disk full");
    }

    #[test]
    fn upload_failures_are_bad_gateway() {
        let err = ApiError::from(ImageStoreError::MalformedResponse("no url".into()));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }
}
