use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Client;
use sha2::{Digest, Sha256};

use crate::config::StorageConfig;
use crate::constants::storage::UNSIGNED_PAYLOAD;

const SIGNING_ALGORITHM: &str = "GOOG4-HMAC-SHA256";
const SERVICE: &str = "storage";
const REQUEST_TYPE: &str = "goog4_request";

type HmacSha256 = Hmac<Sha256>;

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Client for the Cloud Storage XML/interoperability API, authenticated with
/// HMAC service-account credentials. Writes and deletes sign the request
/// headers; reads hand out V4 query-signed URLs instead of proxying bytes.
#[derive(Clone)]
pub struct GcsClient {
    client: Client,
    config: StorageConfig,
}

impl GcsClient {
    #[must_use]
    pub fn new(config: StorageConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }

    /// `gs://` URI for an object, as consumed by the generative-model API.
    #[must_use]
    pub fn object_uri(&self, object: &str) -> String {
        format!("gs://{}/{}", self.config.bucket, object)
    }

    fn host(&self) -> Result<String> {
        let parsed = url::Url::parse(&self.config.endpoint)
            .with_context(|| format!("Invalid storage endpoint: {}", self.config.endpoint))?;
        let host = parsed
            .host_str()
            .context("Storage endpoint has no host")?
            .to_string();
        Ok(match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host,
        })
    }

    fn object_path(&self, object: &str) -> String {
        format!("/{}/{}", self.config.bucket, urlencoding::encode(object))
    }

    fn credential_scope(&self, date: &str) -> String {
        format!("{date}/{}/{SERVICE}/{REQUEST_TYPE}", self.config.region)
    }

    fn signing_key(&self, date: &str) -> Vec<u8> {
        let key = hmac_sha256(
            format!("GOOG4{}", self.config.hmac_secret).as_bytes(),
            date.as_bytes(),
        );
        let key = hmac_sha256(&key, self.config.region.as_bytes());
        let key = hmac_sha256(&key, SERVICE.as_bytes());
        hmac_sha256(&key, REQUEST_TYPE.as_bytes())
    }

    /// Sign a PUT/DELETE request with header-based V4 authentication.
    fn authorization_header(
        &self,
        method: &str,
        path: &str,
        host: &str,
        timestamp: &str,
        date: &str,
    ) -> String {
        let signed_headers = "host;x-goog-content-sha256;x-goog-date";
        let canonical_request = format!(
            "{method}\n{path}\n\nhost:{host}\nx-goog-content-sha256:{UNSIGNED_PAYLOAD}\nx-goog-date:{timestamp}\n\n{signed_headers}\n{UNSIGNED_PAYLOAD}"
        );

        let scope = self.credential_scope(date);
        let string_to_sign = format!(
            "{SIGNING_ALGORITHM}\n{timestamp}\n{scope}\n{}",
            sha256_hex(canonical_request.as_bytes())
        );

        let signature = hex::encode(hmac_sha256(
            &self.signing_key(date),
            string_to_sign.as_bytes(),
        ));

        format!(
            "{SIGNING_ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
            self.config.hmac_access_key
        )
    }

    pub async fn put_object(&self, object: &str, content_type: &str, bytes: Vec<u8>) -> Result<()> {
        let host = self.host()?;
        let path = self.object_path(object);
        let now = Utc::now();
        let timestamp = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();

        let authorization = self.authorization_header("PUT", &path, &host, &timestamp, &date);

        let url = format!("{}{path}", self.config.endpoint);
        let response = self
            .client
            .put(&url)
            .header("Host", &host)
            .header("x-goog-content-sha256", UNSIGNED_PAYLOAD)
            .header("x-goog-date", &timestamp)
            .header("Authorization", authorization)
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await
            .context("Failed to reach object storage")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Object storage upload error: {} - {}",
                status,
                body
            ));
        }

        Ok(())
    }

    /// Delete an object. A 404 is treated as success so a row whose blob is
    /// already gone can still be cleaned up.
    pub async fn delete_object(&self, object: &str) -> Result<()> {
        let host = self.host()?;
        let path = self.object_path(object);
        let now = Utc::now();
        let timestamp = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();

        let authorization = self.authorization_header("DELETE", &path, &host, &timestamp, &date);

        let url = format!("{}{path}", self.config.endpoint);
        let response = self
            .client
            .delete(&url)
            .header("Host", &host)
            .header("x-goog-content-sha256", UNSIGNED_PAYLOAD)
            .header("x-goog-date", &timestamp)
            .header("Authorization", authorization)
            .send()
            .await
            .context("Failed to reach object storage")?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Object storage delete error: {} - {}",
                status,
                body
            ));
        }

        Ok(())
    }

    /// Time-limited V4 query-signed GET URL for an object. URLs are never
    /// persisted; callers regenerate them on every read.
    pub fn signed_url(&self, object: &str) -> Result<String> {
        self.signed_url_at(object, Utc::now())
    }

    fn signed_url_at(&self, object: &str, now: DateTime<Utc>) -> Result<String> {
        let host = self.host()?;
        let path = self.object_path(object);
        let timestamp = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let expires = self.config.signed_url_lifetime_minutes * 60;

        let scope = self.credential_scope(&date);
        let credential = format!("{}/{scope}", self.config.hmac_access_key);

        // Query parameters in canonical (sorted) order, values percent-encoded.
        let canonical_query = format!(
            "X-Goog-Algorithm={SIGNING_ALGORITHM}\
             &X-Goog-Credential={}\
             &X-Goog-Date={timestamp}\
             &X-Goog-Expires={expires}\
             &X-Goog-SignedHeaders=host",
            urlencoding::encode(&credential)
        );

        let canonical_request = format!(
            "GET\n{path}\n{canonical_query}\nhost:{host}\n\nhost\n{UNSIGNED_PAYLOAD}"
        );

        let string_to_sign = format!(
            "{SIGNING_ALGORITHM}\n{timestamp}\n{scope}\n{}",
            sha256_hex(canonical_request.as_bytes())
        );

        let signature = hex::encode(hmac_sha256(
            &self.signing_key(&date),
            string_to_sign.as_bytes(),
        ));

        Ok(format!(
            "{}{path}?{canonical_query}&X-Goog-Signature={signature}",
            self.config.endpoint
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_client() -> GcsClient {
        GcsClient::new(StorageConfig {
            bucket: "test-bucket".to_string(),
            region: "us-central1".to_string(),
            endpoint: "https://storage.googleapis.com".to_string(),
            hmac_access_key: "GOOGTESTACCESSKEY".to_string(),
            hmac_secret: "test-secret".to_string(),
            signed_url_lifetime_minutes: 120,
        })
    }

    #[test]
    fn object_uri_shape() {
        let client = test_client();
        assert_eq!(
            client.object_uri("user-1-report.pdf"),
            "gs://test-bucket/user-1-report.pdf"
        );
    }

    #[test]
    fn signed_url_carries_v4_query_params() {
        let client = test_client();
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let url = client.signed_url_at("abc-report.pdf", now).unwrap();

        assert!(url.starts_with("https://storage.googleapis.com/test-bucket/abc-report.pdf?"));
        assert!(url.contains("X-Goog-Algorithm=GOOG4-HMAC-SHA256"));
        assert!(url.contains("X-Goog-Date=20260301T120000Z"));
        assert!(url.contains("X-Goog-Expires=7200"));
        assert!(url.contains("X-Goog-SignedHeaders=host"));
        assert!(url.contains("X-Goog-Signature="));
    }

    #[test]
    fn signed_url_is_deterministic_for_fixed_time() {
        let client = test_client();
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let a = client.signed_url_at("abc-report.pdf", now).unwrap();
        let b = client.signed_url_at("abc-report.pdf", now).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn object_names_are_percent_encoded() {
        let client = test_client();
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let url = client.signed_url_at("abc-with space.txt", now).unwrap();
        assert!(url.contains("/test-bucket/abc-with%20space.txt?"));
    }
}
