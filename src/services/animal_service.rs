//! Animal record lifecycle: registration, lookup, partial update with photo
//! replacement, and guarded deletion.
//!
//! Photos are uploaded before any row is written so that a failed upload leaves
//! the database untouched. Database work for one operation runs inside a single
//! transaction; if it fails, the photos uploaded for that operation are
//! destroyed again.

use std::collections::HashMap;

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::form::AnimalForm;
use crate::entities::sea_orm_active_enums::AdoptionStatus;
use crate::entities::{adoption_request, animal, animal_image, testimony};
use crate::images::{self, ImageStore, ImageUpload, StoredImage};

pub const NOT_FOUND_ON_READ: &str = "Animal not found";
pub const NOT_FOUND_ON_WRITE: &str = "Animal no encontrado";

/// Human readable code: `R`, the uppercased first letter of the type, then the
/// id padded to four digits.
pub fn identification_code(animal_type: &str, id: i32) -> String {
    let initial: String = animal_type
        .trim()
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect::<String>())
        .unwrap_or_default();
    format!("R{}{:04}", initial, id)
}

#[derive(Debug, Serialize)]
pub struct AnimalView {
    #[serde(flatten)]
    pub animal: animal::Model,
    pub image_urls: Vec<String>,
}

/// Validated registration input. Optional fields left as `None` keep the
/// column default.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnimal {
    pub name: String,
    pub animal_type: String,
    pub birth_date: NaiveDate,
    pub size: Option<String>,
    pub gender: Option<String>,
    pub vaccinated: Option<bool>,
    pub castrated: Option<bool>,
    pub dewormed: Option<bool>,
    pub microchip: Option<bool>,
    pub publication_date: Option<NaiveDate>,
    pub additional_information: Option<String>,
    pub status: AdoptionStatus,
}

impl NewAnimal {
    pub fn from_form(form: &AnimalForm) -> Result<Self, ApiError> {
        if form.is_empty() {
            return Err(ApiError::EmptyForm);
        }

        let name = required(form, "name")?;
        let animal_type = required(form, "type")?;
        let birth_date = parse_date("birth_date", &required(form, "birth_date")?)?;

        Ok(Self {
            name,
            animal_type,
            birth_date,
            size: form.get("size").and_then(optional_text),
            gender: form.get("gender").and_then(optional_text),
            vaccinated: form.get("vaccinated").map(|v| parse_bool("vaccinated", v)).transpose()?,
            castrated: form.get("castrated").map(|v| parse_bool("castrated", v)).transpose()?,
            dewormed: form.get("dewormed").map(|v| parse_bool("dewormed", v)).transpose()?,
            microchip: form.get("microchip").map(|v| parse_bool("microchip", v)).transpose()?,
            publication_date: form
                .get("publication_date")
                .map(|v| parse_date("publication_date", v))
                .transpose()?,
            additional_information: form.get("additional_information").and_then(optional_text),
            status: form
                .get("status")
                .map(parse_status)
                .transpose()?
                .unwrap_or_default(),
        })
    }

    fn into_active_model(self) -> animal::ActiveModel {
        let mut active = animal::ActiveModel {
            name: Set(self.name),
            animal_type: Set(self.animal_type),
            birth_date: Set(self.birth_date),
            status: Set(self.status),
            ..Default::default()
        };
        if let Some(size) = self.size {
            active.size = Set(Some(size));
        }
        if let Some(gender) = self.gender {
            active.gender = Set(Some(gender));
        }
        if let Some(v) = self.vaccinated {
            active.vaccinated = Set(v);
        }
        if let Some(v) = self.castrated {
            active.castrated = Set(v);
        }
        if let Some(v) = self.dewormed {
            active.dewormed = Set(v);
        }
        if let Some(v) = self.microchip {
            active.microchip = Set(v);
        }
        if let Some(date) = self.publication_date {
            active.publication_date = Set(date);
        }
        if let Some(info) = self.additional_information {
            active.additional_information = Set(Some(info));
        }
        active
    }
}

/// Fields an update may touch. For nullable columns `Some(None)` clears the
/// stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimalPatch {
    pub name: Option<String>,
    pub animal_type: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub size: Option<Option<String>>,
    pub gender: Option<Option<String>>,
    pub vaccinated: Option<bool>,
    pub castrated: Option<bool>,
    pub dewormed: Option<bool>,
    pub microchip: Option<bool>,
    pub publication_date: Option<NaiveDate>,
    pub additional_information: Option<Option<String>>,
    pub status: Option<AdoptionStatus>,
}

impl AnimalPatch {
    pub fn from_form(form: &AnimalForm) -> Result<Self, ApiError> {
        let mut patch = AnimalPatch::default();
        for (field, value) in &form.fields {
            match field.as_str() {
                "name" => patch.name = Some(non_blank("name", value)?),
                "type" => patch.animal_type = Some(non_blank("type", value)?),
                "birth_date" => patch.birth_date = Some(parse_date("birth_date", value)?),
                "size" => patch.size = Some(optional_text(value)),
                "gender" => patch.gender = Some(optional_text(value)),
                "vaccinated" => patch.vaccinated = Some(parse_bool("vaccinated", value)?),
                "castrated" => patch.castrated = Some(parse_bool("castrated", value)?),
                "dewormed" => patch.dewormed = Some(parse_bool("dewormed", value)?),
                "microchip" => patch.microchip = Some(parse_bool("microchip", value)?),
                "publication_date" => {
                    patch.publication_date = Some(parse_date("publication_date", value)?)
                }
                "additional_information" => {
                    patch.additional_information = Some(optional_text(value))
                }
                "status" => patch.status = Some(parse_status(value)?),
                other => return Err(ApiError::validation(format!("Unknown field: {}", other))),
            }
        }
        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        *self == AnimalPatch::default()
    }

    /// Copies every present field onto `active`. A changed type also changes
    /// the identification code.
    fn apply(self, active: &mut animal::ActiveModel, id: i32) {
        if let Some(name) = self.name {
            active.name = Set(name);
        }
        if let Some(animal_type) = self.animal_type {
            active.identification_code = Set(Some(identification_code(&animal_type, id)));
            active.animal_type = Set(animal_type);
        }
        if let Some(date) = self.birth_date {
            active.birth_date = Set(date);
        }
        if let Some(size) = self.size {
            active.size = Set(size);
        }
        if let Some(gender) = self.gender {
            active.gender = Set(gender);
        }
        if let Some(v) = self.vaccinated {
            active.vaccinated = Set(v);
        }
        if let Some(v) = self.castrated {
            active.castrated = Set(v);
        }
        if let Some(v) = self.dewormed {
            active.dewormed = Set(v);
        }
        if let Some(v) = self.microchip {
            active.microchip = Set(v);
        }
        if let Some(date) = self.publication_date {
            active.publication_date = Set(date);
        }
        if let Some(info) = self.additional_information {
            active.additional_information = Set(info);
        }
        if let Some(status) = self.status {
            active.status = Set(status);
        }
    }
}

fn required(form: &AnimalForm, field: &'static str) -> Result<String, ApiError> {
    match form.get(field).map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(ApiError::MissingField(field)),
    }
}

fn non_blank(field: &'static str, value: &str) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::MissingField(field));
    }
    Ok(value.to_string())
}

fn optional_text(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Accepts ISO dates and the RFC 2822 form dates are serialized in by the web
/// client (`Tue, 12 Dec 2023 00:00:00 GMT`).
fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ApiError> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| chrono::DateTime::parse_from_rfc2822(value).map(|dt| dt.date_naive()))
        .map_err(|_| ApiError::validation(format!("Invalid date for field {}: {}", field, value)))
}

fn parse_bool(field: &str, value: &str) -> Result<bool, ApiError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "si" | "sí" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ApiError::validation(format!(
            "Invalid value for field {}: {}",
            field, value
        ))),
    }
}

fn parse_status(value: &str) -> Result<AdoptionStatus, ApiError> {
    value
        .parse()
        .map_err(|_| ApiError::validation(format!("Invalid value for field status: {}", value)))
}

async fn image_urls_for<C: ConnectionTrait>(db: &C, animal_id: i32) -> Result<Vec<String>, DbErr> {
    let images = animal_image::Entity::find()
        .filter(animal_image::Column::AnimalId.eq(animal_id))
        .order_by_asc(animal_image::Column::Id)
        .all(db)
        .await?;
    Ok(images.into_iter().map(|i| i.image_url).collect())
}

async fn insert_images<C: ConnectionTrait>(
    db: &C,
    animal_id: i32,
    stored: &[StoredImage],
) -> Result<Vec<String>, DbErr> {
    let mut urls = Vec::with_capacity(stored.len());
    for image in stored {
        animal_image::ActiveModel {
            image_url: Set(image.secure_url.clone()),
            public_id: Set(image.public_id.clone()),
            animal_id: Set(animal_id),
            ..Default::default()
        }
        .insert(db)
        .await?;
        urls.push(image.secure_url.clone());
    }
    Ok(urls)
}

/// Registers an animal with its photos. Either everything is stored or
/// nothing is.
pub async fn register(
    db: &DatabaseConnection,
    store: &dyn ImageStore,
    new_animal: NewAnimal,
    uploads: &[ImageUpload],
) -> Result<AnimalView, ApiError> {
    let stored = images::upload_all(store, uploads).await?;

    match insert_animal(db, new_animal, &stored).await {
        Ok(view) => {
            crate::metrics::increment_animals_registered();
            crate::metrics::record_image_replacement(0, view.image_urls.len());
            Ok(view)
        }
        Err(e) => {
            images::discard(store, &stored).await;
            Err(ApiError::Persistence(e))
        }
    }
}

async fn insert_animal(
    db: &DatabaseConnection,
    new_animal: NewAnimal,
    stored: &[StoredImage],
) -> Result<AnimalView, DbErr> {
    let txn = db.begin().await?;

    let result = async {
        // The code embeds the generated id, so it can only be written once the
        // row exists.
        let inserted = new_animal.into_active_model().insert(&txn).await?;
        let code = identification_code(&inserted.animal_type, inserted.id);
        let mut active = inserted.into_active_model();
        active.identification_code = Set(Some(code));
        let animal = active.update(&txn).await?;

        let image_urls = insert_images(&txn, animal.id, stored).await?;
        Ok::<_, DbErr>(AnimalView { animal, image_urls })
    }
    .await;

    match result {
        Ok(view) => {
            txn.commit().await?;
            Ok(view)
        }
        Err(e) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::warn!("Rollback failed: {}", rollback_err);
            }
            Err(e)
        }
    }
}

/// Every animal in id order, each with its photo URLs.
pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<AnimalView>, ApiError> {
    let animals = animal::Entity::find()
        .order_by_asc(animal::Column::Id)
        .all(db)
        .await?;

    let mut urls_by_animal: HashMap<i32, Vec<String>> = HashMap::new();
    for image in animal_image::Entity::find()
        .order_by_asc(animal_image::Column::Id)
        .all(db)
        .await?
    {
        urls_by_animal
            .entry(image.animal_id)
            .or_default()
            .push(image.image_url);
    }

    Ok(animals
        .into_iter()
        .map(|animal| {
            let image_urls = urls_by_animal.remove(&animal.id).unwrap_or_default();
            AnimalView { animal, image_urls }
        })
        .collect())
}

pub async fn get_by_id(db: &DatabaseConnection, id: i32) -> Result<AnimalView, ApiError> {
    let animal = animal::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(ApiError::NotFound(NOT_FOUND_ON_READ))?;
    let image_urls = image_urls_for(db, animal.id).await?;
    Ok(AnimalView { animal, image_urls })
}

/// Whether any photo, testimony or adoption request still points at the animal.
pub async fn has_dependents(db: &DatabaseConnection, id: i32) -> Result<bool, DbErr> {
    let images = animal_image::Entity::find()
        .filter(animal_image::Column::AnimalId.eq(id))
        .count(db)
        .await?;
    let testimonies = testimony::Entity::find()
        .filter(testimony::Column::AnimalId.eq(id))
        .count(db)
        .await?;
    let adoptions = adoption_request::Entity::find()
        .filter(adoption_request::Column::AnimalId.eq(id))
        .count(db)
        .await?;
    Ok(images > 0 || testimonies > 0 || adoptions > 0)
}

/// Removes an animal that nothing references. Dependents block the delete
/// instead of being cascaded.
pub async fn delete_by_id(db: &DatabaseConnection, id: i32) -> Result<(), ApiError> {
    if animal::Entity::find_by_id(id).one(db).await?.is_none() {
        return Err(ApiError::NotFound(NOT_FOUND_ON_WRITE));
    }

    if has_dependents(db, id).await? {
        return Err(ApiError::HasDependents);
    }

    animal::Entity::delete_by_id(id)
        .exec(db)
        .await
        .map_err(ApiError::Persistence)?;
    crate::metrics::increment_animals_deleted();
    Ok(())
}

/// Applies the form's fields and replaces all photos with the uploaded ones.
/// No uploaded files means the animal is left without photos.
pub async fn update_by_id(
    db: &DatabaseConnection,
    store: &dyn ImageStore,
    id: i32,
    form: &AnimalForm,
) -> Result<AnimalView, ApiError> {
    let existing = animal::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(ApiError::NotFound(NOT_FOUND_ON_WRITE))?;
    let patch = AnimalPatch::from_form(form)?;

    let stored = images::upload_all(store, &form.images).await?;

    match replace_animal(db, existing, patch, &stored).await {
        Ok((view, replaced)) => {
            crate::metrics::record_image_replacement(replaced.len(), view.image_urls.len());
            // Rows are gone already; remote copies are cleaned up best-effort.
            let replaced: Vec<StoredImage> = replaced
                .into_iter()
                .map(|image| StoredImage {
                    secure_url: image.image_url,
                    public_id: image.public_id,
                })
                .collect();
            images::discard(store, &replaced).await;
            Ok(view)
        }
        Err(e) => {
            images::discard(store, &stored).await;
            Err(ApiError::Persistence(e))
        }
    }
}

async fn replace_animal(
    db: &DatabaseConnection,
    existing: animal::Model,
    patch: AnimalPatch,
    stored: &[StoredImage],
) -> Result<(AnimalView, Vec<animal_image::Model>), DbErr> {
    let txn = db.begin().await?;

    let result = async {
        let id = existing.id;
        let animal = if patch.is_empty() {
            existing
        } else {
            let mut active = existing.into_active_model();
            patch.apply(&mut active, id);
            active.update(&txn).await?
        };

        let replaced = animal_image::Entity::find()
            .filter(animal_image::Column::AnimalId.eq(id))
            .all(&txn)
            .await?;
        animal_image::Entity::delete_many()
            .filter(animal_image::Column::AnimalId.eq(id))
            .exec(&txn)
            .await?;

        let image_urls = insert_images(&txn, id, stored).await?;
        Ok::<_, DbErr>((AnimalView { animal, image_urls }, replaced))
    }
    .await;

    match result {
        Ok(out) => {
            txn.commit().await?;
            Ok(out)
        }
        Err(e) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::warn!("Rollback failed: {}", rollback_err);
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(fields: &[(&str, &str)]) -> AnimalForm {
        AnimalForm {
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            images: Vec::new(),
        }
    }

    #[test]
    fn code_pads_id_and_uppercases_initial() {
        assert_eq!(identification_code("dog", 7), "RD0007");
        assert_eq!(identification_code("Cat", 123), "RC0123");
        assert_eq!(identification_code("ñandú", 1), "RÑ0001");
        assert_eq!(identification_code("dog", 12345), "RD12345");
    }

    #[test]
    fn empty_form_is_rejected() {
        let err = NewAnimal::from_form(&AnimalForm::default()).unwrap_err();
        assert!(matches!(err, ApiError::EmptyForm));
    }

    #[test]
    fn reports_first_missing_required_field() {
        let err = NewAnimal::from_form(&form(&[("name", "Rex"), ("birth_date", "2020-01-01")]))
            .unwrap_err();
        assert_eq!(err.to_string(), "El campo type es requerido");

        let err = NewAnimal::from_form(&form(&[("name", " "), ("type", "dog")])).unwrap_err();
        assert_eq!(err.to_string(), "El campo name es requerido");
    }

    #[test]
    fn optional_fields_stay_unset_and_status_defaults() {
        let new_animal = NewAnimal::from_form(&form(&[
            ("name", "Rex"),
            ("type", "dog"),
            ("birth_date", "2020-01-01"),
            ("color", "brown"),
        ]))
        .unwrap();

        assert_eq!(new_animal.status, AdoptionStatus::NotAdopted);
        assert_eq!(new_animal.vaccinated, None);
        assert_eq!(new_animal.publication_date, None);
        assert_eq!(new_animal.birth_date, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
    }

    #[test]
    fn parses_client_formatted_dates_and_flags() {
        let new_animal = NewAnimal::from_form(&form(&[
            ("name", "Lola"),
            ("type", "dog"),
            ("birth_date", "Tue, 12 Dec 2023 00:00:00 GMT"),
            ("vaccinated", "True"),
            ("castrated", "0"),
            ("status", "adopted"),
        ]))
        .unwrap();

        assert_eq!(new_animal.birth_date, NaiveDate::from_ymd_opt(2023, 12, 12).unwrap());
        assert_eq!(new_animal.vaccinated, Some(true));
        assert_eq!(new_animal.castrated, Some(false));
        assert_eq!(new_animal.status, AdoptionStatus::Adopted);
    }

    #[test]
    fn malformed_values_are_validation_errors() {
        let base = [("name", "Rex"), ("type", "dog")];
        for (field, value) in [
            ("birth_date", "yesterday"),
            ("vaccinated", "maybe"),
            ("status", "LOST"),
        ] {
            let mut fields = base.to_vec();
            if field != "birth_date" {
                fields.push(("birth_date", "2020-01-01"));
            }
            fields.push((field, value));
            let err = NewAnimal::from_form(&form(&fields)).unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)), "{field}={value}");
        }
    }

    #[test]
    fn patch_rejects_unknown_fields() {
        let err = AnimalPatch::from_form(&form(&[("name", "Rex"), ("id", "99")])).unwrap_err();
        assert_eq!(err.to_string(), "Unknown field: id");

        let err = AnimalPatch::from_form(&form(&[("identification_code", "RX0001")])).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn patch_blank_optional_text_clears_value() {
        let patch = AnimalPatch::from_form(&form(&[("size", ""), ("gender", "female")])).unwrap();
        assert_eq!(patch.size, Some(None));
        assert_eq!(patch.gender, Some(Some("female".to_string())));
        assert!(!patch.is_empty());
        assert!(AnimalPatch::from_form(&form(&[])).unwrap().is_empty());
    }

    #[test]
    fn patch_type_change_recomputes_code() {
        let patch = AnimalPatch::from_form(&form(&[("type", "cat")])).unwrap();
        let mut active = <animal::ActiveModel as Default>::default();
        patch.apply(&mut active, 7);
        assert_eq!(active.identification_code, Set(Some("RC0007".to_string())));
        assert_eq!(active.animal_type, Set("cat".to_string()));
    }
}
