//! Remote storage for animal photos.

pub mod cloudinary;

use async_trait::async_trait;

/// A file received from a client, not yet stored anywhere.
#[derive(Clone, Debug)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Where the remote store put an uploaded file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredImage {
    pub secure_url: String,
    pub public_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ImageStoreError {
    #[error("request to image store failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("image store rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected image store response: {0}")]
    MalformedResponse(String),
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload(&self, image: &ImageUpload) -> Result<StoredImage, ImageStoreError>;

    async fn destroy(&self, public_id: &str) -> Result<(), ImageStoreError>;
}

/// Uploads every file in order and stops at the first failure. Files that were
/// already stored when a later one fails are destroyed before returning.
pub async fn upload_all(
    store: &dyn ImageStore,
    uploads: &[ImageUpload],
) -> Result<Vec<StoredImage>, ImageStoreError> {
    let mut stored = Vec::with_capacity(uploads.len());
    for upload in uploads {
        match store.upload(upload).await {
            Ok(image) => {
                crate::metrics::increment_images_uploaded();
                stored.push(image);
            }
            Err(e) => {
                crate::metrics::increment_image_upload_failures();
                tracing::error!("Upload of {} failed: {}", upload.file_name, e);
                discard(store, &stored).await;
                return Err(e);
            }
        }
    }
    Ok(stored)
}

/// Best-effort removal of stored files; failures are only logged.
pub async fn discard(store: &dyn ImageStore, images: &[StoredImage]) {
    for image in images {
        if let Err(e) = store.destroy(&image.public_id).await {
            tracing::warn!("Failed to destroy image {}: {}", image.public_id, e);
        }
    }
}
