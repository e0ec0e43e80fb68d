use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, rejection::PathRejection, Extension, Multipart, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DatabaseConnection;
use serde_json::json;

use super::error::{ApiError, Msg};
use super::form::AnimalForm;
use super::middleware::Caller;
use crate::images::ImageStore;
use crate::services::animal_service::{self, NewAnimal, NOT_FOUND_ON_READ, NOT_FOUND_ON_WRITE};

/// Ids that are not integers name no animal.
fn path_id(
    path: Result<Path<i32>, PathRejection>,
    not_found: &'static str,
) -> Result<i32, ApiError> {
    path.map(|Path(id)| id).map_err(|_| ApiError::NotFound(not_found))
}

fn record_event(action: &str, animal_id: Option<i32>, event: &str) {
    let span = tracing::Span::current();
    span.record("table", "animals")
        .record("action", action)
        .record("business_event", event);
    if let Some(id) = animal_id {
        span.record("animal_id", id);
    }
}

// POST /animal - Register an animal with optional photos
pub async fn register_animal(
    Extension(db): Extension<DatabaseConnection>,
    Extension(images): Extension<Arc<dyn ImageStore>>,
    Extension(caller): Extension<Caller>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, Msg> {
    let multipart = multipart.map_err(|_| ApiError::EmptyForm)?;
    let form = AnimalForm::from_multipart(multipart).await?;
    let new_animal = NewAnimal::from_form(&form)?;

    let view = animal_service::register(&db, images.as_ref(), new_animal, &form.images).await?;

    record_event("register_animal", Some(view.animal.id), "Animal registered");
    tracing::info!(
        "User {} registered animal {} ({} images)",
        caller.user_id,
        view.animal.id,
        view.image_urls.len()
    );

    Ok((StatusCode::CREATED, Json(json!({"msg": "ok", "result": view}))).into_response())
}

// GET / - Every animal with its photos
pub async fn list_animals(Extension(db): Extension<DatabaseConnection>) -> Result<Response, Msg> {
    let animals = animal_service::list_all(&db).await?;
    record_event("list_animals", None, "Animals listed");

    Ok((
        StatusCode::OK,
        Json(json!({
            "msg": "ok",
            "total_animals": animals.len(),
            "result": animals,
        })),
    )
        .into_response())
}

// GET /animal/:id
pub async fn get_animal(
    Extension(db): Extension<DatabaseConnection>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Response, ApiError> {
    let animal_id = path_id(path, NOT_FOUND_ON_READ)?;
    let view = animal_service::get_by_id(&db, animal_id).await?;
    record_event("get_animal", Some(animal_id), "Animal fetched");
    Ok((StatusCode::OK, Json(view)).into_response())
}

// DELETE /animal/:id - Admins only
pub async fn delete_animal(
    Extension(db): Extension<DatabaseConnection>,
    Extension(caller): Extension<Caller>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Response, ApiError> {
    caller.require_admin()?;
    let animal_id = path_id(path, NOT_FOUND_ON_WRITE)?;
    animal_service::delete_by_id(&db, animal_id).await?;

    record_event("delete_animal", Some(animal_id), "Animal deleted");
    tracing::info!("User {} deleted animal {}", caller.user_id, animal_id);

    Ok((
        StatusCode::OK,
        Json(json!({"message": "Animal eliminado exitosamente"})),
    )
        .into_response())
}

// PUT /animal/:id - Admins only; replaces every photo
pub async fn update_animal(
    Extension(db): Extension<DatabaseConnection>,
    Extension(images): Extension<Arc<dyn ImageStore>>,
    Extension(caller): Extension<Caller>,
    path: Result<Path<i32>, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    caller.require_admin()?;
    let animal_id = path_id(path, NOT_FOUND_ON_WRITE)?;
    // A body without multipart content is an update with no fields and no photos.
    let form = match multipart {
        Ok(multipart) => AnimalForm::from_multipart(multipart).await?,
        Err(_) => AnimalForm::default(),
    };

    let view = animal_service::update_by_id(&db, images.as_ref(), animal_id, &form).await?;

    record_event("update_animal", Some(animal_id), "Animal updated");
    tracing::info!(
        "User {} updated animal {} ({} images)",
        caller.user_id,
        animal_id,
        view.image_urls.len()
    );

    Ok((StatusCode::OK, Json(json!({"msg": "ok", "result": view}))).into_response())
}
