//! Azure Blob client implementation
//!
//! Implements the `BlobService` and `BlobClient` traits from bfs-core over
//! the Blob REST API: `Get Blob Properties` (HEAD) and ranged `Get Blob`.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, HeaderMap, HeaderValue};
use reqwest::{Method, Response, StatusCode};
use url::Url;

use bfs_core::{
    BackendError, BlobClient, BlobProperties, BlobService, Credentials, Error, Metadata, Result,
    StorageOptions,
};

use crate::auth::SharedKeySigner;

/// REST API version sent with every request
pub const API_VERSION: &str = "2021-08-06";

const META_PREFIX: &str = "x-ms-meta-";
const ERROR_CODE_HEADER: &str = "x-ms-error-code";

/// How requests are authorized
#[derive(Debug)]
enum RequestAuth {
    Anonymous,
    SharedKey(SharedKeySigner),
    Sas(String),
}

/// Entry point to one storage account
pub struct AzureBlobService {
    http: reqwest::Client,
    base_url: Url,
    auth: Arc<RequestAuth>,
}

impl AzureBlobService {
    /// Create a service for the account described by `options`
    ///
    /// Fails on an unusable blob endpoint or malformed credentials. No
    /// request is sent.
    pub fn new(options: &StorageOptions) -> Result<Self> {
        let base_url = Url::parse(&options.account_blob_url).map_err(|e| {
            Error::Config(format!(
                "Invalid blob endpoint '{}': {e}",
                options.account_blob_url
            ))
        })?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "Blob endpoint must be an http(s) URL, got '{}'",
                options.account_blob_url
            )));
        }

        let auth = match &options.credentials {
            Credentials::Anonymous => RequestAuth::Anonymous,
            Credentials::SharedKey {
                account_name,
                account_key,
            } => RequestAuth::SharedKey(SharedKeySigner::new(account_name, account_key)?),
            Credentials::SasToken(token) => RequestAuth::Sas(token.clone()),
        };

        let http = reqwest::Client::builder()
            .user_agent(concat!("blobfs/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {e}")))?;

        tracing::debug!(
            endpoint = %base_url,
            credentials = ?options.credentials_kind,
            "Created blob service"
        );

        Ok(Self {
            http,
            base_url,
            auth: Arc::new(auth),
        })
    }

    /// URL of `blob` in `container`, with the SAS token attached if any
    fn blob_url(&self, container: &str, blob: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                Error::Config(format!("Blob endpoint '{}' cannot hold paths", self.base_url))
            })?;
            segments.pop_if_empty().push(container);
            segments.extend(blob.split('/'));
        }
        if let RequestAuth::Sas(token) = &*self.auth {
            url.set_query(Some(token));
        }
        Ok(url)
    }
}

impl BlobService for AzureBlobService {
    fn blob_client(&self, container: &str, blob: &str) -> Result<Arc<dyn BlobClient>> {
        let url = self.blob_url(container, blob)?;
        Ok(Arc::new(AzureBlobClient {
            http: self.http.clone(),
            url,
            auth: self.auth.clone(),
        }))
    }
}

/// Handle to a single blob
pub struct AzureBlobClient {
    http: reqwest::Client,
    url: Url,
    auth: Arc<RequestAuth>,
}

impl AzureBlobClient {
    async fn send(
        &self,
        method: Method,
        extra_headers: HeaderMap,
    ) -> std::result::Result<Response, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert("x-ms-version", HeaderValue::from_static(API_VERSION));
        headers.insert("x-ms-date", header_value(&http_date())?);
        headers.extend(extra_headers);

        if let RequestAuth::SharedKey(signer) = &*self.auth {
            let authorization = signer.authorization(&method, &self.url, &headers);
            headers.insert(AUTHORIZATION, header_value(&authorization)?);
        }

        let response = self
            .http
            .request(method, self.url.clone())
            .headers(headers)
            .send()
            .await
            .map_err(|e| BackendError::transport(format!("Request failed: {e}")))?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response).await)
        }
    }
}

#[async_trait]
impl BlobClient for AzureBlobClient {
    fn url(&self) -> String {
        // Never echo the SAS signature into error messages
        let mut url = self.url.clone();
        url.set_query(None);
        url.to_string()
    }

    async fn get_properties(&self) -> std::result::Result<BlobProperties, BackendError> {
        let response = self.send(Method::HEAD, HeaderMap::new()).await?;
        let headers = response.headers();

        let size = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .ok_or_else(|| {
                BackendError::new(
                    Some(response.status()),
                    "Response is missing a valid Content-Length header",
                )
            })?;

        // Header names are normalized to lowercase, and so are the keys
        let mut metadata = Metadata::new();
        for (name, value) in headers {
            if let Some(key) = name.as_str().strip_prefix(META_PREFIX)
                && let Ok(value) = value.to_str()
            {
                metadata.insert(key.to_string(), value.to_string());
            }
        }

        tracing::debug!(url = %self.url(), size, "Fetched blob properties");
        Ok(BlobProperties { size, metadata })
    }

    async fn download_range(
        &self,
        offset: u64,
        out: &mut [u8],
    ) -> std::result::Result<usize, BackendError> {
        if out.is_empty() {
            return Ok(0);
        }
        let last = offset + out.len() as u64 - 1;

        let mut headers = HeaderMap::new();
        headers.insert("x-ms-range", header_value(&format!("bytes={offset}-{last}"))?);
        let response = self.send(Method::GET, headers).await?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| BackendError::transport(format!("Failed to read response body: {e}")))?;

        // A 200 means the range was ignored and the whole blob was sent
        let data = if status == StatusCode::PARTIAL_CONTENT {
            &body[..]
        } else {
            let start = usize::try_from(offset).unwrap_or(usize::MAX).min(body.len());
            &body[start..]
        };

        let n = data.len().min(out.len());
        out[..n].copy_from_slice(&data[..n]);
        Ok(n)
    }
}

fn header_value(value: &str) -> std::result::Result<HeaderValue, BackendError> {
    HeaderValue::from_str(value)
        .map_err(|e| BackendError::transport(format!("Invalid header value: {e}")))
}

/// RFC 1123 date as required by `x-ms-date`
fn http_date() -> String {
    jiff::Timestamp::now()
        .strftime("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

async fn error_from_response(response: Response) -> BackendError {
    let status = response.status();
    let code = response
        .headers()
        .get(ERROR_CODE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.text().await.unwrap_or_default();

    let mut message = match code {
        Some(code) => format!("{code} ({status})"),
        None => status.to_string(),
    };
    if let Some(detail) = xml_message(&body) {
        message.push_str(": ");
        message.push_str(detail);
    }
    BackendError::new(Some(status), message)
}

/// Text of the `<Message>` element of an error body
fn xml_message(body: &str) -> Option<&str> {
    let start = body.find("<Message>")? + "<Message>".len();
    let end = body[start..].find("</Message>")? + start;
    let message = body[start..end].trim();
    (!message.is_empty()).then_some(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bfs_core::AzureBackend;

    fn options(url: &str) -> StorageOptions {
        let mut options = StorageOptions::new(AzureBackend::Azurite);
        options.configure_anonymous("devstoreaccount1").unwrap();
        options.with_blob_endpoint(url)
    }

    #[test]
    fn test_blob_url_encodes_segments() {
        let service = AzureBlobService::new(&options("http://127.0.0.1:10000/acct/")).unwrap();
        let url = service.blob_url("container", "dir/my file.txt").unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:10000/acct/container/dir/my%20file.txt"
        );
    }

    #[test]
    fn test_blob_url_without_trailing_slash() {
        let service =
            AzureBlobService::new(&options("https://acct.blob.core.windows.net")).unwrap();
        let url = service.blob_url("c", "b").unwrap();
        assert_eq!(url.as_str(), "https://acct.blob.core.windows.net/c/b");
    }

    #[test]
    fn test_sas_token_attached_but_hidden() {
        let mut options = StorageOptions::new(AzureBackend::Azure);
        options
            .configure_sas_credentials("acct", "sv=2022-11-02&sig=secret")
            .unwrap();
        let service = AzureBlobService::new(&options).unwrap();

        let url = service.blob_url("c", "b").unwrap();
        assert_eq!(url.query(), Some("sv=2022-11-02&sig=secret"));

        let client = service.blob_client("c", "b").unwrap();
        assert_eq!(client.url(), "https://acct.blob.core.windows.net/c/b");
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        assert!(matches!(
            AzureBlobService::new(&options("not a url")),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            AzureBlobService::new(&options("ftp://host/acct/")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_xml_message() {
        let body = "<?xml version=\"1.0\"?><Error><Code>AuthorizationFailure</Code>\
                    <Message>This request is not authorized.</Message></Error>";
        assert_eq!(xml_message(body), Some("This request is not authorized."));
        assert_eq!(xml_message(""), None);
        assert_eq!(xml_message("<Message> </Message>"), None);
    }

    #[test]
    fn test_http_date_format() {
        let date = http_date();
        assert!(date.ends_with(" GMT"));
        assert_eq!(date.len(), "Mon, 02 Jan 2023 03:04:05 GMT".len());
    }
}
