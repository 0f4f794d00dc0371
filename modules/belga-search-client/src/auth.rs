//! Shared-secret HMAC auth for the Belga picture APIs. Every request is
//! signed over `/path?query + nonce`; a one-time `authorizeUser` call
//! trades the password for the id and auth tokens used afterwards.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use uuid::Uuid;

use crate::error::{Result, SearchError};

type HmacSha256 = Hmac<Sha256>;

/// Hex HMAC-SHA256 over `/path + nonce`.
pub fn sign(secret: &str, path: &str, nonce: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| panic!("hmac accepts any key length"));
    mac.update(format!("/{}+{}", path.trim_start_matches('/'), nonce).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(rename = "idToken")]
    id_token: Option<String>,
    #[serde(rename = "authToken")]
    auth_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HmacCredentials {
    username: String,
    password: String,
    id_token: Option<String>,
    auth_token: Option<String>,
}

impl HmacCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            id_token: None,
            auth_token: None,
        }
    }

    pub fn is_authorized(&self) -> bool {
        self.id_token.is_some() && self.auth_token.is_some()
    }

    /// Signed headers for a request path. Before `authorize` runs, only
    /// the password may sign (the bootstrap call itself).
    pub fn headers(&self, path: &str, bootstrap: bool) -> Result<Vec<(&'static str, String)>> {
        let (id_secret, auth_secret) = if bootstrap {
            (self.password.as_str(), self.password.as_str())
        } else {
            match (self.id_token.as_deref(), self.auth_token.as_deref()) {
                (Some(id), Some(auth)) => (id, auth),
                _ => return Err(SearchError::NotAuthenticated("belga picture api")),
            }
        };
        let nonce = Uuid::new_v4().simple().to_string();
        Ok(vec![
            ("X-Date", nonce.clone()),
            (
                "X-Identification",
                format!("{}:{}", self.username, sign(id_secret, path, &nonce)),
            ),
            (
                "X-Authorization",
                format!("{}:{}", self.username, sign(auth_secret, path, &nonce)),
            ),
        ])
    }

    /// Trade the password for the request tokens.
    pub async fn authorize(&mut self, http: &reqwest::Client, base_url: &str) -> Result<()> {
        let path = format!("/authorizeUser?l={}", self.username);
        let headers = self.headers(&path, true)?;
        let mut request = http.get(format!("{}{}", base_url.trim_end_matches('/'), path));
        for (name, value) in headers {
            request = request.header(name, value);
        }
        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        let tokens: TokenResponse = resp.json().await?;
        self.id_token = tokens.id_token;
        self.auth_token = tokens.auth_token;
        tracing::debug!(username = %self.username, "belga picture api authorized");
        Ok(())
    }
}

/// Query-string encoding matching what the API signs: commas stay
/// literal, spaces become %20.
pub fn encode_query(pairs: &[(&str, String)]) -> String {
    let mut out = String::new();
    for (i, (key, value)) in pairs.iter().enumerate() {
        if i > 0 {
            out.push('&');
        }
        out.push_str(key);
        out.push('=');
        out.push_str(&encode_component(value));
    }
    out
}

fn encode_component(value: &str) -> String {
    let mut out = String::new();
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b',' | b':'
            | b'/' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_hex_and_deterministic() {
        let a = sign("secret", "/searchImages?s=0", "nonce-1");
        let b = sign("secret", "searchImages?s=0", "nonce-1");
        assert_eq!(a, b, "leading slash is normalized");
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, sign("secret", "/searchImages?s=0", "nonce-2"));
        assert_ne!(a, sign("other", "/searchImages?s=0", "nonce-1"));
    }

    #[test]
    fn unauthorized_credentials_refuse_to_sign() {
        let creds = HmacCredentials::new("user", "pass");
        assert!(!creds.is_authorized());
        assert!(creds.headers("/searchImages", false).is_err());
        let headers = creds.headers("/authorizeUser?l=user", true).unwrap();
        assert_eq!(headers[0].0, "X-Date");
        assert!(headers[1].1.starts_with("user:"));
        assert!(headers[2].1.starts_with("user:"));
    }

    #[test]
    fn query_encoding_keeps_commas_and_escapes_spaces() {
        let qs = encode_query(&[
            ("s", "0".to_string()),
            ("c", "AFP,BELGA".to_string()),
            ("t", "foo AND bar".to_string()),
        ]);
        assert_eq!(qs, "s=0&c=AFP,BELGA&t=foo%20AND%20bar");
    }
}
