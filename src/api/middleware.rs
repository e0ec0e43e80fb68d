use std::sync::Arc;

use axum::{
    extract::{Extension, Request},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::Deserialize;

use super::error::{ApiError, Msg};
use crate::entities::{sea_orm_active_enums::Role, user};

/// Verifies bearer tokens signed with the shared HS256 secret.
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Returns the user id the token was issued for.
    pub fn verify(&self, token: &str) -> Result<i32, ApiError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| ApiError::Unauthorized(format!("Invalid token: {}", e)))?;
        data.claims.sub.user_id()
    }
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: Subject,
}

/// Token issuers write the identity either as a number or as a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Subject {
    Id(i32),
    Text(String),
}

impl Subject {
    fn user_id(&self) -> Result<i32, ApiError> {
        match self {
            Subject::Id(id) => Ok(*id),
            Subject::Text(text) => text
                .parse()
                .map_err(|_| ApiError::Unauthorized("Invalid token subject".to_string())),
        }
    }
}

/// The authenticated user behind the current request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i32,
    pub role: Role,
}

impl Caller {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

fn bearer_token(request: &Request) -> Result<&str, ApiError> {
    let value = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization Header".to_string()))?;
    value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            ApiError::Unauthorized("Missing 'Bearer' type in 'Authorization' header".to_string())
        })
}

async fn resolve_caller(
    db: &DatabaseConnection,
    verifier: &JwtVerifier,
    token: &str,
) -> Result<Caller, ApiError> {
    let user_id = verifier.verify(token)?;
    let user = user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;
    Ok(Caller {
        user_id: user.id,
        role: user.role,
    })
}

pub async fn auth_middleware(
    Extension(db): Extension<DatabaseConnection>,
    Extension(verifier): Extension<Arc<JwtVerifier>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(&request) {
        Ok(token) => token.to_string(),
        Err(e) => return Msg(e).into_response(),
    };

    match resolve_caller(&db, &verifier, &token).await {
        Ok(caller) => {
            tracing::Span::current().record("user_id", caller.user_id);
            request.extensions_mut().insert(caller);
            next.run(request).await
        }
        Err(e) => Msg(e).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn token(claims: serde_json::Value, secret: &str) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn exp() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn accepts_numeric_and_string_subjects() {
        let verifier = JwtVerifier::new("secret");
        let numeric = token(json!({"sub": 7, "exp": exp()}), "secret");
        let text = token(json!({"sub": "7", "exp": exp()}), "secret");
        assert_eq!(verifier.verify(&numeric).unwrap(), 7);
        assert_eq!(verifier.verify(&text).unwrap(), 7);
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        let verifier = JwtVerifier::new("secret");
        let forged = token(json!({"sub": 1, "exp": exp()}), "other");
        assert!(matches!(verifier.verify(&forged), Err(ApiError::Unauthorized(_))));

        let expired = token(json!({"sub": 1, "exp": 1_000_000}), "secret");
        assert!(matches!(verifier.verify(&expired), Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn rejects_non_numeric_subject() {
        let verifier = JwtVerifier::new("secret");
        let t = token(json!({"sub": "alice", "exp": exp()}), "secret");
        assert!(matches!(verifier.verify(&t), Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn only_admins_pass_the_admin_check() {
        let admin = Caller { user_id: 1, role: Role::Admin };
        let user = Caller { user_id: 2, role: Role::User };
        assert!(admin.require_admin().is_ok());
        assert!(matches!(user.require_admin(), Err(ApiError::Forbidden)));
    }
}
