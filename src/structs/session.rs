use base64::prelude::*;
use chrono::NaiveDate;
use reqwest::Method;
use serde::de::DeserializeOwned;

use super::client::{cache_buster, Client};
use super::payment::Payment;
use super::subscription::{Subscription, SubscriptionDraft, SubscriptionUpdate};
use super::{Claims, Currency};
use crate::errors::SubManagerError;

/// A logged-in user. Every call is sent with `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct Session {
    /// The JWT returned by `login()` or `register()`, or restored from the cookie.
    pub token: String,
    client: Client,
}

impl Session {
    pub fn new(client: Client, token: String) -> Self {
        Self { token, client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Asks the server whether the token is still accepted.
    pub fn heartbeat(&self) -> Result<bool, SubManagerError> {
        self.client.validate_token(&self.token)
    }

    /// Decodes the JWT payload. The signature is the server's business.
    pub fn claims(&self) -> Result<Claims, SubManagerError> {
        let payload = self
            .token
            .split('.')
            .nth(1)
            .ok_or(SubManagerError::FailedToDecode)?;

        let bytes = BASE64_URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .or(Err(SubManagerError::FailedToDecode))?;

        serde_json::from_slice(&bytes).or(Err(SubManagerError::FailedToDecode))
    }

    /// Whether the token's `exp` claim lies before `now` (seconds since the epoch).
    /// Tokens without an expiry never expire client-side.
    pub fn is_expired(&self, now: i64) -> Result<bool, SubManagerError> {
        Ok(self.claims()?.exp.is_some_and(|exp| exp <= now))
    }

    pub fn subscriptions(&self) -> Result<Vec<Subscription>, SubManagerError> {
        self.list("subscription")
    }

    pub fn subscription(&self, id: i64) -> Result<Subscription, SubManagerError> {
        let request = self.request(Method::GET, &format!("subscription/{}", id))?;
        self.client.api_call(request)
    }

    /// Creates a subscription. The draft is validated against `today` first.
    pub fn create_subscription(
        &self,
        draft: &SubscriptionDraft,
        today: NaiveDate,
    ) -> Result<Subscription, SubManagerError> {
        draft
            .validate(today)
            .into_result()
            .map_err(SubManagerError::Validation)?;

        let request = self.request(Method::POST, "subscription")?.json(draft);
        let created: Subscription = self.client.api_call(request)?;

        tracing::info!(id = created.subscription_id, title = %created.title, "subscription created");
        Ok(created)
    }

    /// Updates the editable fields of a subscription.
    pub fn update_subscription(
        &self,
        id: i64,
        update: &SubscriptionUpdate,
    ) -> Result<(), SubManagerError> {
        update
            .validate()
            .into_result()
            .map_err(SubManagerError::Validation)?;

        let request = self
            .request(Method::PUT, &format!("subscription/{}", id))?
            .json(update);
        self.client.send(request)?;

        tracing::info!(id, "subscription updated");
        Ok(())
    }

    pub fn delete_subscription(&self, id: i64) -> Result<(), SubManagerError> {
        let request = self.request(Method::DELETE, &format!("subscription/{}", id))?;
        self.client.send(request)?;

        tracing::info!(id, "subscription deleted");
        Ok(())
    }

    pub fn payments(&self) -> Result<Vec<Payment>, SubManagerError> {
        self.list("payment")
    }

    /// Marks a payment as paid on the server.
    /// Returns the payment the server scheduled next, or the processed one for inactive subscriptions.
    pub fn process_payment(&self, id: i64) -> Result<Payment, SubManagerError> {
        let request = self.request(Method::POST, &format!("payment/{}/process", id))?;
        let payment: Payment = self.client.api_call(request)?;

        tracing::info!(id, returned = payment.payment_id, "payment processed");
        Ok(payment)
    }

    pub fn currencies(&self) -> Result<Vec<Currency>, SubManagerError> {
        self.list("currency/")
    }

    fn request(
        &self,
        method: Method,
        path: &str,
    ) -> Result<reqwest::blocking::RequestBuilder, SubManagerError> {
        self.client.request(method, path, Some(&self.token))
    }

    /// `GET` of a collection, with the cache-busting `t` parameter.
    fn list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, SubManagerError> {
        let request = self
            .request(Method::GET, path)?
            .query(&[("t", cache_buster())]);
        self.client.api_call(request)
    }
}
