use axum::extract::Multipart;

use super::error::ApiError;
use crate::images::ImageUpload;

/// Multipart part name that carries photos.
pub const IMAGES_FIELD: &str = "images";

/// Text fields and photos of one multipart request, in arrival order.
#[derive(Debug, Default)]
pub struct AnimalForm {
    pub fields: Vec<(String, String)>,
    pub images: Vec<ImageUpload>,
}

impl AnimalForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = AnimalForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::validation(e.body_text()))?
        {
            let name = field.name().unwrap_or("").to_string();

            if let Some(file_name) = field.file_name().map(str::to_string) {
                if name != IMAGES_FIELD {
                    tracing::debug!("Ignoring file part {}", name);
                    continue;
                }
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation(e.body_text()))?;
                // Browsers send an empty part when no file was picked.
                if data.is_empty() && file_name.is_empty() {
                    continue;
                }
                form.images.push(ImageUpload {
                    file_name,
                    content_type,
                    data: data.to_vec(),
                });
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::validation(e.body_text()))?;
                form.fields.push((name, value));
            }
        }

        Ok(form)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.images.is_empty()
    }

    /// Last value sent for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}
