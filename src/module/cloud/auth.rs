//! OAuth session handling for the Drive uploaders.
//!
//! The cached credential lives in a token file compatible with the layout
//! written by the google-auth tooling, so a token authorized elsewhere can be
//! dropped onto the board as-is.

use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use super::CloudError;
use crate::module::util::conf::Cloud;

/// Drive scope requested during authorization.
pub const SCOPE: &str = "https://www.googleapis.com/auth/drive";

/// Cached credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    #[serde(rename = "token")]
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    pub scopes: Vec<String>,
    pub expiry: DateTime<Utc>,
}

impl Credential {
    /// Usable without a refresh, with a minute of slack for request latency.
    pub fn valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry > now + Duration::seconds(60)
    }
}

/// Client secrets file for an installed application.
#[derive(Debug, Deserialize)]
struct InstalledSecrets {
    installed: ClientSecrets,
}

#[derive(Debug, Clone, Deserialize)]
struct ClientSecrets {
    client_id: String,
    client_secret: String,
    auth_uri: String,
    token_uri: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: i64,
}

/// Returns a usable credential or fails the run.
///
/// Loads the cached token, refreshes it when expired, and falls back to the
/// interactive consent flow when there is nothing to refresh. Any change is
/// written back to the token file.
pub fn login(conf: &Cloud) -> Result<Credential, CloudError> {
    let cached = load(Path::new(&conf.token_file));

    if let Some(cred) = &cached {
        if cred.valid_at(Utc::now()) {
            return Ok(cred.clone());
        }
    }

    let cred = match cached {
        Some(cred) if cred.refresh_token.is_some() => refresh(cred)?,
        _ => authorize(Path::new(&conf.credentials_file))?,
    };
    save(Path::new(&conf.token_file), &cred)?;
    Ok(cred)
}

/// Reads the token cache. An unreadable or malformed file is treated the same
/// as a missing one.
fn load(path: &Path) -> Option<Credential> {
    let raw = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(cred) => Some(cred),
        Err(e) => {
            log::warn!("Ignoring unreadable token file {}: {}", path.display(), e);
            None
        }
    }
}

fn save(path: &Path, cred: &Credential) -> Result<(), CloudError> {
    fs::write(path, serde_json::to_string_pretty(cred)?)?;
    Ok(())
}

/// Exchanges the refresh token for a fresh access token.
fn refresh(mut cred: Credential) -> Result<Credential, CloudError> {
    let refresh_token = cred
        .refresh_token
        .clone()
        .ok_or_else(|| CloudError::Token("no refresh token in cache".to_string()))?;

    let client = reqwest::blocking::Client::new();
    let res = client
        .post(&cred.token_uri)
        .form(&[
            ("client_id", cred.client_id.as_str()),
            ("client_secret", cred.client_secret.as_str()),
            ("refresh_token", refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ])
        .send()?;
    let token = parse_token_response(res)?;

    cred.access_token = token.access_token;
    cred.expiry = Utc::now() + Duration::seconds(token.expires_in);
    if token.refresh_token.is_some() {
        cred.refresh_token = token.refresh_token;
    }
    log::info!("Access token refreshed");
    Ok(cred)
}

/// Interactive installed-app consent flow over a loopback listener.
///
/// Prints the consent URL, waits for the single browser redirect, and
/// exchanges the authorization code for tokens.
fn authorize(secrets_path: &Path) -> Result<Credential, CloudError> {
    let raw = fs::read_to_string(secrets_path)?;
    let secrets = serde_json::from_str::<InstalledSecrets>(&raw)?.installed;

    let listener = TcpListener::bind("127.0.0.1:0")?;
    let redirect_uri = format!("http://127.0.0.1:{}/", listener.local_addr()?.port());

    let consent = Url::parse_with_params(
        &secrets.auth_uri,
        &[
            ("client_id", secrets.client_id.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", SCOPE),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ],
    )
    .map_err(|e| CloudError::Token(format!("bad auth_uri in client secrets: {}", e)))?;
    println!("Visit this URL to authorize the device:\n{}", consent);

    let code = wait_for_code(&listener)?;

    let client = reqwest::blocking::Client::new();
    let res = client
        .post(&secrets.token_uri)
        .form(&[
            ("client_id", secrets.client_id.as_str()),
            ("client_secret", secrets.client_secret.as_str()),
            ("code", code.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ])
        .send()?;
    let token = parse_token_response(res)?;
    log::info!("Interactive authorization complete");

    Ok(Credential {
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        token_uri: secrets.token_uri,
        client_id: secrets.client_id,
        client_secret: secrets.client_secret,
        scopes: vec![SCOPE.to_string()],
        expiry: Utc::now() + Duration::seconds(token.expires_in),
    })
}

/// Blocks until the browser redirect arrives and extracts the `code` query
/// parameter from the request line.
fn wait_for_code(listener: &TcpListener) -> Result<String, CloudError> {
    let (mut stream, _) = listener.accept()?;
    let mut line = String::new();
    BufReader::new(&stream).read_line(&mut line)?;

    let code = parse_redirect(&line)
        .ok_or_else(|| CloudError::Token(format!("no code in redirect: {}", line.trim())))?;
    let _ = stream.write_all(
        b"HTTP/1.1 200 OK\r\ncontent-type: text/plain\r\n\r\nAuthorization complete. You can close this tab.\r\n",
    );
    Ok(code)
}

/// Parses `GET /?code=...&scope=... HTTP/1.1`.
fn parse_redirect(request_line: &str) -> Option<String> {
    let target = request_line.split_whitespace().nth(1)?;
    let url = Url::parse(&format!("http://localhost{}", target)).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.into_owned())
}

fn parse_token_response(res: reqwest::blocking::Response) -> Result<TokenResponse, CloudError> {
    let status = res.status();
    if !status.is_success() {
        return Err(CloudError::Api {
            status,
            body: res.text().unwrap_or_default(),
        });
    }
    Ok(res.json()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn cred(expiry: DateTime<Utc>) -> Credential {
        Credential {
            access_token: "at".to_string(),
            refresh_token: Some("rt".to_string()),
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
            client_id: "cid".to_string(),
            client_secret: "cs".to_string(),
            scopes: vec![SCOPE.to_string()],
            expiry,
        }
    }

    #[test]
    fn validity_includes_skew() {
        let now = Utc::now();
        assert!(cred(now + Duration::hours(1)).valid_at(now));
        assert!(!cred(now + Duration::seconds(30)).valid_at(now));
        assert!(!cred(now - Duration::hours(1)).valid_at(now));
    }

    #[test]
    fn load_ignores_garbage_token_file() {
        fs::create_dir_all("/tmp/fieldcamtest").unwrap();
        let path = "/tmp/fieldcamtest/garbage_token.json";
        fs::write(path, "not json at all").unwrap();
        assert!(load(Path::new(path)).is_none());
        assert!(load(Path::new("/tmp/fieldcamtest/no_such_token.json")).is_none());
    }

    #[test]
    fn save_then_load_keeps_google_auth_field_names() {
        fs::create_dir_all("/tmp/fieldcamtest").unwrap();
        let path = Path::new("/tmp/fieldcamtest/token_roundtrip.json");
        let now = Utc::now();
        save(path, &cred(now)).unwrap();

        // The access token must serialize under the google-auth name.
        let raw = fs::read_to_string(path).unwrap();
        assert!(raw.contains("\"token\""));

        let loaded = load(path).unwrap();
        assert_eq!(loaded.access_token, "at");
        assert_eq!(loaded.refresh_token.as_deref(), Some("rt"));
    }

    #[test]
    fn redirect_code_extraction() {
        assert_eq!(
            parse_redirect("GET /?code=4%2FabcDEF&scope=drive HTTP/1.1").as_deref(),
            Some("4/abcDEF")
        );
        assert!(parse_redirect("GET /favicon.ico HTTP/1.1").is_none());
        assert!(parse_redirect("").is_none());
    }
}
