use super::session::Session;
use super::AuthResponse;
use crate::config::Config;
use crate::errors::SubManagerError;
use crate::routes::{guard, Route};
use crate::token_store::TokenStore;
use crate::validation::{AuthForm, AuthMode, FieldErrors};
#[cfg(not(windows))]
use colorful::{Color, Colorful};
use reqwest::blocking::{RequestBuilder, Response};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::path::PathBuf;

/// Where the API lives when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

/// SubManager Client. Used to interact with the SubManager API.
#[derive(Debug, Clone)]
pub struct Client {
    /// Base URL of the API, including the `/api` prefix and without a trailing slash.
    pub api_url: String,
    /// Whether the client should print status lines.
    pub debug: bool,
    http: reqwest::blocking::Client,
    store: TokenStore,
}

/// SubManager Client options. Pass this into the `new()` function of the SubManager Client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL of the API, e.g. `http://localhost:8080/api`.
    pub api_url: String,
    /// File holding the `JWT` cookie between runs.
    pub token_path: PathBuf,
    /// Whether the client should print status lines.
    pub debug: bool,
}

impl From<&Config> for ClientOptions {
    fn from(config: &Config) -> Self {
        Self {
            api_url: config.api_url.clone(),
            token_path: config.token_path.clone(),
            debug: config.debug,
        }
    }
}

impl Client {
    /// Creates a new SubManager client.
    pub fn new(options: ClientOptions) -> Result<Self, SubManagerError> {
        // Verify that the URL is usable before any request is built
        let url = Url::parse(&options.api_url)
            .map_err(|_| SubManagerError::InvalidBaseUrl(options.api_url.clone()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(SubManagerError::InvalidBaseUrl(options.api_url));
        }

        let http = reqwest::blocking::Client::builder()
            .build()
            .or(Err(SubManagerError::RequestFailed))?;

        Ok(Self {
            api_url: options.api_url.trim_end_matches('/').to_string(),
            debug: options.debug,
            http,
            store: TokenStore::new(options.token_path),
        })
    }

    pub fn token_store(&self) -> &TokenStore {
        &self.store
    }

    /// Creates an account and logs in with it.
    pub fn register(&self, form: &AuthForm) -> Result<Session, SubManagerError> {
        self.authenticate(AuthMode::Register, form)
    }

    /// Logs in with existing credentials.
    pub fn login(&self, form: &AuthForm) -> Result<Session, SubManagerError> {
        self.authenticate(AuthMode::Login, form)
    }

    /// Validates the form, posts it, and stores the returned token as the session cookie.
    /// Invalid forms never reach the network.
    fn authenticate(&self, mode: AuthMode, form: &AuthForm) -> Result<Session, SubManagerError> {
        form.validate(mode)
            .into_result()
            .map_err(SubManagerError::Validation)?;

        let path = match mode {
            AuthMode::Register => "auth/register",
            AuthMode::Login => "auth/login",
        };

        self.print_progress("[AUTH] Authenticating...");

        let request = self.request(Method::POST, path, None)?.json(form);
        let result = self
            .api_call::<AuthResponse>(request)
            .and_then(|response| {
                response
                    .authentication_token
                    .filter(|token| !token.is_empty())
                    .ok_or(SubManagerError::MissingToken)
            });

        let token = match result {
            Ok(token) => token,
            Err(err) => {
                tracing::warn!(username = %form.username, error = %err, "authentication failed");
                self.print_status(&format!("\r[AUTH] Failed to authenticate: {}", err));
                return Err(err);
            }
        };

        self.store.save(&token)?;

        tracing::info!(username = %form.username, "authenticated");
        self.print_status("\r[AUTH] Successfully authenticated.");
        self.print_status(&format!("[AUTH] Welcome, {}.", form.username));

        Ok(Session::new(self.clone(), token))
    }

    /// Asks the server whether `token` is still valid. Any 2xx answer means it is.
    pub fn validate_token(&self, token: &str) -> Result<bool, SubManagerError> {
        let timestamp = cache_buster();
        let request = self
            .request(Method::GET, "auth/validateToken", None)?
            .query(&[("token", token), ("t", timestamp.as_str())]);

        let response = request.send().map_err(|err| {
            tracing::error!(error = %err, "token validation request failed");
            SubManagerError::RequestFailed
        })?;

        Ok(response.status().is_success())
    }

    /// Restores the session from the stored cookie.
    pub fn session(&self) -> Result<Session, SubManagerError> {
        match self.store.load()? {
            Some(token) => Ok(Session::new(self.clone(), token)),
            None => Err(SubManagerError::NotAuthenticated),
        }
    }

    pub fn is_logged_in(&self) -> Result<bool, SubManagerError> {
        Ok(self.store.load()?.is_some())
    }

    /// Clears the session cookie.
    pub fn logout(&self) -> Result<(), SubManagerError> {
        self.store.clear()?;
        tracing::info!("logged out");
        self.print_status("[AUTH] Logged out.");
        Ok(())
    }

    /// Resolves a navigation request against the stored cookie.
    pub fn route(&self, requested: Route) -> Result<Route, SubManagerError> {
        Ok(guard(requested, self.is_logged_in()?))
    }

    /// Starts a request to `path` (relative to the API root), with a bearer token when given.
    pub fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
    ) -> Result<RequestBuilder, SubManagerError> {
        let url = Url::parse(&format!(
            "{}/{}",
            self.api_url,
            path.trim_start_matches('/')
        ))
        .map_err(|_| SubManagerError::InvalidBaseUrl(self.api_url.clone()))?;

        tracing::debug!(%method, %url, "building request");

        let request = self.http.request(method, url);
        Ok(match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    /// Sends a request and maps non-success statuses to errors.
    pub fn send(&self, request: RequestBuilder) -> Result<Response, SubManagerError> {
        let response = request.send().map_err(|err| {
            tracing::error!(error = %err, "request failed");
            SubManagerError::RequestFailed
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        tracing::warn!(status = status.as_u16(), url = %response.url(), "API returned an error status");

        // Bean validation failures come back as a {field: message} map
        if status == StatusCode::BAD_REQUEST {
            if let Ok(fields) = response.json::<FieldErrors>() {
                if !fields.is_empty() {
                    return Err(SubManagerError::Validation(fields));
                }
            }
        }

        Err(SubManagerError::from_status(status))
    }

    /// Query an endpoint from the SubManager API and decode the JSON body.
    pub fn api_call<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, SubManagerError> {
        let response = self.send(request)?;

        response.json::<T>().map_err(|err| {
            tracing::error!(error = %err, "failed to decode response body");
            SubManagerError::FailedToDecode
        })
    }

    /// Prints a status line without a newline, to be overwritten by the next one.
    fn print_progress(&self, message: &str) {
        if !self.debug {
            return;
        }

        #[cfg(windows)]
        print!("{}", message);

        #[cfg(not(windows))]
        print!(
            "{}",
            message.gradient_with_color(Color::Cyan, Color::SpringGreen4)
        );
    }

    pub(crate) fn print_status(&self, message: &str) {
        if !self.debug {
            return;
        }

        #[cfg(windows)]
        println!("{}", message);

        #[cfg(not(windows))]
        println!(
            "{}",
            message.gradient_with_color(Color::Cyan, Color::SpringGreen4)
        );
    }
}

/// Value of the `t` query parameter that keeps responses out of caches.
pub(crate) fn cache_buster() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}
