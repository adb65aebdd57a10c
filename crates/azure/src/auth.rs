//! Shared Key request signing
//!
//! Implements the Blob service Shared Key scheme: an HMAC-SHA256 over a
//! canonical description of the request, keyed with the decoded account key.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use reqwest::Method;
use reqwest::header::HeaderMap;
use sha2::Sha256;
use url::Url;

use bfs_core::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Standard headers that take part in the signature, in order
const SIGNED_HEADERS: [&str; 11] = [
    "content-encoding",
    "content-language",
    "content-length",
    "content-md5",
    "content-type",
    "date",
    "if-modified-since",
    "if-match",
    "if-none-match",
    "if-unmodified-since",
    "range",
];

/// Signs requests for one storage account
#[derive(Clone)]
pub struct SharedKeySigner {
    account_name: String,
    mac: HmacSha256,
}

impl SharedKeySigner {
    /// `account_key` is the base64 key shown in the portal
    pub fn new(account_name: &str, account_key: &str) -> Result<Self> {
        let key = STANDARD
            .decode(account_key.trim())
            .map_err(|e| Error::Config(format!("Account key is not valid base64: {e}")))?;
        let mac = HmacSha256::new_from_slice(&key)
            .map_err(|e| Error::Config(format!("Invalid account key: {e}")))?;
        Ok(Self {
            account_name: account_name.to_string(),
            mac,
        })
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    /// Canonical request description that gets signed
    pub fn string_to_sign(&self, method: &Method, url: &Url, headers: &HeaderMap) -> String {
        let mut out = String::new();
        out.push_str(method.as_str());
        out.push('\n');

        for name in SIGNED_HEADERS {
            let value = header_str(headers, name);
            // A zero length is signed as an empty string
            let value = if name == "content-length" && value == "0" {
                ""
            } else {
                value
            };
            out.push_str(value);
            out.push('\n');
        }

        out.push_str(&canonicalized_headers(headers));
        out.push_str(&self.canonicalized_resource(url));
        out
    }

    /// Value for the `Authorization` header
    pub fn authorization(&self, method: &Method, url: &Url, headers: &HeaderMap) -> String {
        let string_to_sign = self.string_to_sign(method, url, headers);
        let mut mac = self.mac.clone();
        mac.update(string_to_sign.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());
        format!("SharedKey {}:{signature}", self.account_name)
    }

    fn canonicalized_resource(&self, url: &Url) -> String {
        let mut resource = format!("/{}{}", self.account_name, url.path());

        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.to_lowercase(), v.into_owned()))
            .collect();
        params.sort();

        let mut i = 0;
        while i < params.len() {
            let name = &params[i].0;
            let mut values = Vec::new();
            while i < params.len() && &params[i].0 == name {
                values.push(params[i].1.as_str());
                i += 1;
            }
            resource.push_str(&format!("\n{name}:{}", values.join(",")));
        }
        resource
    }
}

impl std::fmt::Debug for SharedKeySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedKeySigner")
            .field("account_name", &self.account_name)
            .finish_non_exhaustive()
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

fn canonicalized_headers(headers: &HeaderMap) -> String {
    let mut ms_headers: Vec<(&str, &str)> = headers
        .iter()
        .filter(|(name, _)| name.as_str().starts_with("x-ms-"))
        .map(|(name, value)| (name.as_str(), value.to_str().unwrap_or("").trim()))
        .collect();
    ms_headers.sort();

    ms_headers
        .into_iter()
        .map(|(name, value)| format!("{name}:{value}\n"))
        .collect()
}
