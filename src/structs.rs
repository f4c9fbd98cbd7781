use serde::{Deserialize, Serialize};

pub mod client;
pub mod payment;
pub mod session;
pub mod subscription;

/// Data returned by the server after `register` or `login`.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// The JWT. Missing when the server refused the credentials without an error status.
    pub authentication_token: Option<String>,
}

/// Currency object returned by `GET /currency/`.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    pub currency_id: i64,
    pub name: String,
    pub short_name: String,
    /// Symbol shown next to prices, e.g. "zł".
    pub sign: String,
}

/// Claims read from the JWT payload. The signature is not checked client-side.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The username the token was issued to.
    pub sub: Option<String>,
    /// Issued-at, seconds since the epoch.
    pub iat: Option<i64>,
    /// Expiry, seconds since the epoch.
    pub exp: Option<i64>,
}
