use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::{ImageStore, ImageStoreError, ImageUpload, StoredImage};

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

#[derive(Clone, Debug)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: Option<String>,
}

/// Cloudinary upload API client using signed requests.
#[derive(Clone)]
pub struct CloudinaryClient {
    client: Client,
    config: CloudinaryConfig,
    base_url: String,
}

impl CloudinaryClient {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            base_url: API_BASE.to_string(),
        }
    }

    /// Points the client at another host, e.g. a local stand-in for the API.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/{}/image/{}", self.base_url, self.config.cloud_name, action)
    }

    /// Signs `params` the way the upload API expects: sorted `key=value` pairs
    /// joined with `&`, the API secret appended, then hashed.
    fn sign(&self, params: &[(&str, String)]) -> String {
        sign_params(params, &self.config.api_secret)
    }

    async fn post(
        &self,
        action: &str,
        form: reqwest::multipart::Form,
    ) -> Result<Value, ImageStoreError> {
        let res = self
            .client
            .post(self.endpoint(action))
            .multipart(form)
            .send()
            .await?;

        let status = res.status();
        let body: Value = res
            .json()
            .await
            .map_err(|e| ImageStoreError::MalformedResponse(e.to_string()))?;

        if !status.is_success() {
            let message = body["error"]["message"]
                .as_str()
                .unwrap_or("unknown error")
                .to_string();
            return Err(ImageStoreError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl ImageStore for CloudinaryClient {
    async fn upload(&self, image: &ImageUpload) -> Result<StoredImage, ImageStoreError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let mut params = vec![("timestamp", timestamp)];
        if let Some(folder) = &self.config.folder {
            params.push(("folder", folder.clone()));
        }
        let signature = self.sign(&params);

        let mime_type = image.content_type.clone().unwrap_or_else(|| {
            mime_guess::from_path(&image.file_name)
                .first_or_octet_stream()
                .to_string()
        });
        let part = reqwest::multipart::Part::bytes(image.data.clone())
            .file_name(image.file_name.clone())
            .mime_str(&mime_type)?;

        let mut form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }

        let body = self.post("upload", form).await?;

        let secure_url = body["secure_url"]
            .as_str()
            .ok_or_else(|| ImageStoreError::MalformedResponse("No secure_url in response".into()))?
            .to_string();
        let public_id = body["public_id"]
            .as_str()
            .ok_or_else(|| ImageStoreError::MalformedResponse("No public_id in response".into()))?
            .to_string();

        tracing::debug!("Uploaded {} as {}", image.file_name, public_id);
        Ok(StoredImage {
            secure_url,
            public_id,
        })
    }

    async fn destroy(&self, public_id: &str) -> Result<(), ImageStoreError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let params = vec![
            ("public_id", public_id.to_string()),
            ("timestamp", timestamp),
        ];
        let signature = self.sign(&params);

        let mut form = reqwest::multipart::Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }

        let body = self.post("destroy", form).await?;
        match body["result"].as_str() {
            Some("ok") | Some("not found") => Ok(()),
            other => Err(ImageStoreError::MalformedResponse(format!(
                "destroy returned {:?}",
                other
            ))),
        }
    }
}

fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CloudinaryClient {
        CloudinaryClient::new(CloudinaryConfig {
            cloud_name: "shelter".into(),
            api_key: "key".into(),
            api_secret: "secret".into(),
            folder: None,
        })
    }

    #[test]
    fn signature_ignores_parameter_order() {
        let a = sign_params(
            &[("timestamp", "1700000000".into()), ("folder", "animals".into())],
            "secret",
        );
        let b = sign_params(
            &[("folder", "animals".into()), ("timestamp", "1700000000".into())],
            "secret",
        );
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn signature_covers_the_secret() {
        let params = [("timestamp", "1700000000".to_string())];
        assert_ne!(sign_params(&params, "secret"), sign_params(&params, "other"));
    }

    #[test]
    fn signature_hashes_sorted_pairs_then_secret() {
        let expected = {
            let mut hasher = Sha256::new();
            hasher.update(b"folder=animals&timestamp=42secret");
            hex::encode(hasher.finalize())
        };
        let got = sign_params(
            &[("timestamp", "42".into()), ("folder", "animals".into())],
            "secret",
        );
        assert_eq!(got, expected);
    }

    #[test]
    fn endpoints_include_cloud_name() {
        let c = client();
        assert_eq!(
            c.endpoint("upload"),
            "https://api.cloudinary.com/v1_1/shelter/image/upload"
        );
        let local = client().with_base_url("http://localhost:9000");
        assert_eq!(local.endpoint("destroy"), "http://localhost:9000/shelter/image/destroy");
    }
}
