use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Port for the local OAuth callback server
pub const CALLBACK_PORT: u16 = 8080;

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const VALIDATE_ENDPOINT: &str =
    "https://www.googleapis.com/youtube/v3/channels?part=id&mine=true";

// Treat a token as expired slightly early so an in-flight request
// never races the real expiry.
const EXPIRY_SKEW_SECS: u64 = 60;

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs()
}

/// OAuth 2.0 token as persisted on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    /// Access token for API requests
    pub access_token: String,
    /// Refresh token for obtaining new access tokens
    pub refresh_token: String,
    /// Token type (usually "Bearer")
    pub token_type: String,
    /// Expiry time as Unix timestamp (seconds since epoch)
    pub expires_at: u64,
}

impl StoredToken {
    /// Whether the token is expired or expires within the skew window
    pub fn is_expired(&self) -> bool {
        unix_now() + EXPIRY_SKEW_SECS >= self.expires_at
    }

    /// Load a token file. A missing file means "no token yet" and is
    /// not an error; an unreadable or unparseable file is.
    pub fn load(path: &str) -> Result<Option<Self>, Box<dyn std::error::Error>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(format!("Failed to read token file '{}': {}", path, e).into()),
        };
        let token: StoredToken = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse token file '{}': {}", path, e))?;
        Ok(Some(token))
    }

    /// Persist the token, owner read/write only on Unix
    pub fn save(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .map_err(|e| format!("Failed to write token file '{}': {}", path, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(path, permissions).map_err(|e| {
                format!("Failed to set permissions on token file '{}': {}", path, e)
            })?;
        }

        Ok(())
    }

    /// Build a stored token from a token-endpoint reply. Refresh
    /// replies omit the refresh token, so a previously held one can be
    /// carried over through `prior_refresh_token`.
    fn from_response(
        response: TokenResponse,
        prior_refresh_token: Option<String>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let refresh_token = response
            .refresh_token
            .or(prior_refresh_token)
            .ok_or("Token response contains no refresh token")?;

        Ok(Self {
            access_token: response.access_token,
            refresh_token,
            token_type: response.token_type.unwrap_or_else(|| "Bearer".to_string()),
            expires_at: unix_now() + response.expires_in,
        })
    }
}

/// Reply shape of the Google token endpoint
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
    refresh_token: Option<String>,
    token_type: Option<String>,
}

/// OAuth client configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scope: String,
}

impl AuthConfig {
    /// Configuration with YouTube defaults
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri: format!("http://localhost:{}/oauth2callback", CALLBACK_PORT),
            scope: "https://www.googleapis.com/auth/youtube.force-ssl".to_string(),
        }
    }
}

/// Generate a PKCE verifier and its S256 challenge
fn generate_pkce() -> (String, String) {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use rand::Rng;
    use rand::distributions::Alphanumeric;
    use sha2::{Digest, Sha256};

    let verifier: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();

    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    let challenge = URL_SAFE_NO_PAD.encode(hasher.finalize());

    (verifier, challenge)
}

/// Authorization URL the user opens in a browser
fn auth_url(config: &AuthConfig, challenge: &str) -> String {
    format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&\
        code_challenge={}&code_challenge_method=S256&access_type=offline&prompt=consent",
        AUTH_ENDPOINT,
        urlencoding::encode(&config.client_id),
        urlencoding::encode(&config.redirect_uri),
        urlencoding::encode(&config.scope),
        urlencoding::encode(challenge),
    )
}

/// Runs the load / refresh / interactive-authorize cycle for a token
/// file and can probe whether a token actually works.
pub struct Authenticator {
    config: AuthConfig,
    client: reqwest::Client,
}

impl Authenticator {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Produce a usable token, persisting any change to `token_path`:
    /// a stored unexpired token is used as-is, an expired one is
    /// refreshed, and with no stored token the interactive browser
    /// flow runs.
    pub async fn authorize(
        &self,
        token_path: &str,
    ) -> Result<StoredToken, Box<dyn std::error::Error>> {
        match StoredToken::load(token_path)? {
            Some(token) if !token.is_expired() => Ok(token),
            Some(token) => {
                eprintln!("Access token expired, refreshing...");
                let refreshed = self.refresh(&token).await?;
                refreshed.save(token_path)?;
                eprintln!("Token refreshed and saved");
                Ok(refreshed)
            }
            None => {
                let token = self.interactive_flow().await?;
                token.save(token_path)?;
                eprintln!("New token generated and saved");
                Ok(token)
            }
        }
    }

    /// Exchange the refresh token for a new access token
    pub async fn refresh(
        &self,
        token: &StoredToken,
    ) -> Result<StoredToken, Box<dyn std::error::Error>> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", token.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self.token_request(&params, "refresh token").await?;
        StoredToken::from_response(response, Some(token.refresh_token.clone()))
    }

    /// Probe the channels endpoint to check the token is accepted
    pub async fn validate(
        &self,
        token: &StoredToken,
    ) -> Result<bool, Box<dyn std::error::Error>> {
        let response = self
            .client
            .get(VALIDATE_ENDPOINT)
            .bearer_auth(&token.access_token)
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    /// Interactive authorization: print the consent URL, wait for the
    /// browser redirect on the local callback server, exchange the code.
    pub async fn interactive_flow(&self) -> Result<StoredToken, Box<dyn std::error::Error>> {
        let (verifier, challenge) = generate_pkce();
        let url = auth_url(&self.config, &challenge);

        eprintln!("\nPlease visit the following URL to authorize the application:\n");
        eprintln!("{}\n", url);
        eprintln!("Waiting for authorization...");

        let code = wait_for_callback().await?;
        self.exchange_code(&code, &verifier).await
    }

    async fn exchange_code(
        &self,
        code: &str,
        verifier: &str,
    ) -> Result<StoredToken, Box<dyn std::error::Error>> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        let response = self.token_request(&params, "exchange authorization code").await?;
        StoredToken::from_response(response, None)
    }

    async fn token_request(
        &self,
        params: &[(&str, &str)],
        action: &str,
    ) -> Result<TokenResponse, Box<dyn std::error::Error>> {
        let response = self
            .client
            .post(TOKEN_ENDPOINT)
            .form(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            return Err(format!("Failed to {} (status {}): {}", action, status, body).into());
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| format!("Malformed token response: {}", e))?;
        Ok(token_response)
    }
}

/// Serve the OAuth callback on localhost until one authorization code
/// (or an upstream error) arrives, with a five-minute timeout.
async fn wait_for_callback() -> Result<String, Box<dyn std::error::Error>> {
    use std::sync::Arc;

    use axum::{
        Router,
        extract::Query,
        response::Html,
        routing::get,
    };
    use tokio::sync::{Mutex, oneshot};

    #[derive(Deserialize)]
    struct Callback {
        code: Option<String>,
        error: Option<String>,
    }

    let (tx, rx) = oneshot::channel::<Result<String, String>>();
    let tx = Arc::new(Mutex::new(Some(tx)));

    let handler = move |Query(params): Query<Callback>| async move {
        let outcome = match (params.code, params.error) {
            (_, Some(error)) => Err(error),
            (Some(code), None) => Ok(code),
            (None, None) => Err("no code received".to_string()),
        };

        let page = match &outcome {
            Ok(_) => Html(
                "<html><body><h1>Authorization Successful!</h1>\
                <p>You can close this window and return to the application.</p></body></html>"
                    .to_string(),
            ),
            Err(error) => Html(format!(
                "<html><body><h1>Authorization Failed</h1><p>Error: {}</p>\
                <p>You can close this window.</p></body></html>",
                error
            )),
        };

        // The sender is gone after the first hit; later requests just
        // get the page.
        if let Some(tx) = tx.lock().await.take() {
            let _ = tx.send(outcome);
        }

        page
    };

    let app = Router::new().route("/oauth2callback", get(handler));
    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", CALLBACK_PORT)).await?;
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    let outcome = tokio::time::timeout(tokio::time::Duration::from_secs(300), rx).await;

    // The server is done once the receiver resolves or the wait times
    // out; stop it before inspecting the outcome so no exit path
    // leaves the task running.
    server.abort();

    let outcome = outcome
        .map_err(|_| "OAuth authorization timeout (5 minutes)")?
        .map_err(|_| "OAuth callback server stopped before a code arrived")?;

    outcome.map_err(|error| format!("Authorization failed: {}", error).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_expiring_at(expires_at: u64) -> StoredToken {
        StoredToken {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            token_type: "Bearer".to_string(),
            expires_at,
        }
    }

    #[test]
    fn token_expiring_in_the_past_is_expired() {
        assert!(token_expiring_at(unix_now() - 10).is_expired());
    }

    #[test]
    fn token_expiring_within_skew_window_is_expired() {
        assert!(token_expiring_at(unix_now() + EXPIRY_SKEW_SECS / 2).is_expired());
    }

    #[test]
    fn token_expiring_well_after_skew_window_is_valid() {
        assert!(!token_expiring_at(unix_now() + 3600).is_expired());
    }

    #[test]
    fn token_file_round_trips() {
        let path = std::env::temp_dir().join(format!("yt-auth-roundtrip-{}.json", std::process::id()));
        let path = path.to_str().unwrap().to_string();

        let token = token_expiring_at(unix_now() + 3600);
        token.save(&path).unwrap();
        let loaded = StoredToken::load(&path).unwrap().unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.access_token, token.access_token);
        assert_eq!(loaded.refresh_token, token.refresh_token);
        assert_eq!(loaded.token_type, token.token_type);
        assert_eq!(loaded.expires_at, token.expires_at);
    }

    #[test]
    fn missing_token_file_is_not_an_error() {
        assert!(StoredToken::load("/nonexistent/yt_token.json").unwrap().is_none());
    }

    #[test]
    fn refresh_response_keeps_prior_refresh_token() {
        let response: TokenResponse = serde_json::from_str(
            r#"{"access_token": "new-access", "expires_in": 3599, "token_type": "Bearer"}"#,
        )
        .unwrap();

        let token = StoredToken::from_response(response, Some("old-refresh".to_string())).unwrap();
        assert_eq!(token.access_token, "new-access");
        assert_eq!(token.refresh_token, "old-refresh");
        assert!(!token.is_expired());
    }

    #[test]
    fn initial_response_without_refresh_token_is_an_error() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token": "a", "expires_in": 3599}"#).unwrap();
        assert!(StoredToken::from_response(response, None).is_err());
    }

    #[test]
    fn pkce_verifier_and_challenge_are_well_formed() {
        let (verifier, challenge) = generate_pkce();
        assert_eq!(verifier.len(), 64);
        // base64url-encoded SHA-256 digest without padding
        assert_eq!(challenge.len(), 43);
        assert!(!challenge.contains('='));

        let (other_verifier, _) = generate_pkce();
        assert_ne!(verifier, other_verifier);
    }

    #[test]
    fn auth_url_carries_encoded_parameters() {
        let config = AuthConfig::new("client id".to_string(), "secret".to_string());
        let url = auth_url(&config, "chal");
        assert!(url.starts_with(AUTH_ENDPOINT));
        assert!(url.contains("client_id=client%20id"));
        assert!(url.contains("code_challenge=chal"));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains("access_type=offline"));
    }
}
