use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use sha2::{Digest, Sha256};

use crate::core::config::Settings;

#[derive(Debug, Clone)]
pub(crate) struct StorageService {
    client: Client,
    bucket: String,
    public_base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoredObject {
    pub(crate) key: String,
    pub(crate) url: String,
    pub(crate) size: i64,
}

impl StorageService {
    pub(crate) async fn from_settings(settings: &Settings) -> anyhow::Result<Option<Self>> {
        let s3 = settings.s3();
        if s3.access_key.is_empty() || s3.secret_key.is_empty() || s3.bucket.is_empty() {
            return Ok(None);
        }

        let creds = Credentials::new(
            s3.access_key.clone(),
            s3.secret_key.clone(),
            None,
            None,
            "elearning-static",
        );

        let config = aws_config::defaults(BehaviorVersion::latest())
            .endpoint_url(s3.endpoint.clone())
            .region(aws_config::Region::new(s3.region.clone()))
            .credentials_provider(creds)
            .load()
            .await;

        let client = Client::from_conf(
            aws_sdk_s3::config::Builder::from(&config).force_path_style(true).build(),
        );

        let public_base_url = if settings.storage().public_base_url.is_empty() {
            format!("{}/{}", s3.endpoint.trim_end_matches('/'), s3.bucket)
        } else {
            settings.storage().public_base_url.trim_end_matches('/').to_string()
        };

        Ok(Some(Self { client, bucket: s3.bucket.clone(), public_base_url }))
    }

    /// Uploads bytes under a content-addressed key and returns its public URL.
    pub(crate) async fn upload(
        &self,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> anyhow::Result<StoredObject> {
        let size = bytes.len() as i64;
        let key = object_key(filename, &bytes);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await?;

        let url = format!("{}/{}", self.public_base_url, key);
        Ok(StoredObject { key, url, size })
    }
}

/// `uploads/<sha256>.<ext>`; identical files share a key.
pub(crate) fn object_key(filename: &str, bytes: &[u8]) -> String {
    let hash_hex = hex::encode(Sha256::digest(bytes));
    match file_extension(filename) {
        Some(extension) => format!("uploads/{hash_hex}.{extension}"),
        None => format!("uploads/{hash_hex}"),
    }
}

pub(crate) fn file_extension(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}
