#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use serde_json::{json, Value};
use shelter_server::{
    api::{self, middleware::JwtVerifier},
    entities::{sea_orm_active_enums::Role, user},
    images::{ImageStore, ImageStoreError, ImageUpload, StoredImage},
    migrator::Migrator,
};
use tower::ServiceExt;

pub const JWT_SECRET: &str = "test-secret";
const BOUNDARY: &str = "----shelter-test-boundary";

/// In-memory stand-in for the photo host that records every call.
#[derive(Default)]
pub struct FakeImageStore {
    counter: AtomicUsize,
    fail_on: Mutex<Option<usize>>,
    pub uploaded: Mutex<Vec<String>>,
    pub destroyed: Mutex<Vec<String>>,
}

impl FakeImageStore {
    /// Makes the `nth` upload from now on (1-based) fail.
    pub fn fail_upload_number(&self, nth: usize) {
        let base = self.counter.load(Ordering::SeqCst);
        *self.fail_on.lock().unwrap() = Some(base + nth);
    }

    pub fn uploaded(&self) -> Vec<String> {
        self.uploaded.lock().unwrap().clone()
    }

    pub fn destroyed(&self) -> Vec<String> {
        self.destroyed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageStore for FakeImageStore {
    async fn upload(&self, image: &ImageUpload) -> Result<StoredImage, ImageStoreError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        if *self.fail_on.lock().unwrap() == Some(n) {
            return Err(ImageStoreError::Rejected {
                status: 500,
                message: format!("cannot store {}", image.file_name),
            });
        }
        let public_id = format!("shelter/test_{}", n);
        self.uploaded.lock().unwrap().push(public_id.clone());
        Ok(StoredImage {
            secure_url: format!("https://res.cloudinary.test/{}.jpg", public_id),
            public_id,
        })
    }

    async fn destroy(&self, public_id: &str) -> Result<(), ImageStoreError> {
        self.destroyed.lock().unwrap().push(public_id.to_string());
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
    pub images: Arc<FakeImageStore>,
    pub admin_id: i32,
    pub user_id: i32,
    pub admin_token: String,
    pub user_token: String,
}

pub async fn spawn_app() -> TestApp {
    // One pooled connection keeps the in-memory database alive and shared.
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    let admin_id = insert_user(&db, "admin@shelter.test", Role::Admin).await;
    let user_id = insert_user(&db, "volunteer@shelter.test", Role::User).await;

    let images = Arc::new(FakeImageStore::default());
    let router = api::router(
        db.clone(),
        images.clone(),
        JwtVerifier::new(JWT_SECRET),
        10 * 1024 * 1024,
    );

    TestApp {
        router,
        db,
        images,
        admin_id,
        user_id,
        admin_token: token_for(admin_id),
        user_token: token_for(user_id),
    }
}

async fn insert_user(db: &DatabaseConnection, email: &str, role: Role) -> i32 {
    user::ActiveModel {
        email: Set(email.to_string()),
        role: Set(role),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert user")
    .id
}

pub fn token_for(user_id: i32) -> String {
    let claims = json!({
        "sub": user_id.to_string(),
        "exp": chrono::Utc::now().timestamp() + 3600,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

/// Hand-built `multipart/form-data` body.
#[derive(Default)]
pub struct Form {
    body: Vec<u8>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn image(mut self, file_name: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{}\"\r\nContent-Type: image/jpeg\r\n\r\n",
                BOUNDARY, file_name
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(b"\xff\xd8\xff\xe0fake-jpeg");
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        self.body
    }
}

pub fn rex() -> Form {
    Form::new()
        .text("name", "Rex")
        .text("type", "dog")
        .text("birth_date", "2020-01-01")
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, token: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn send_form(
        &self,
        method: &str,
        uri: &str,
        token: &str,
        form: Form,
    ) -> Response<Body> {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(form.finish()))
                .unwrap(),
        )
        .await
    }

    /// Registers an animal as the regular user and returns the stored record.
    pub async fn register(&self, form: Form) -> Value {
        let response = self.send_form("POST", "/animal", &self.user_token, form).await;
        assert_eq!(response.status(), axum::http::StatusCode::CREATED);
        json_body(response).await["result"].clone()
    }
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
