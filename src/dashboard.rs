//! Dashboard state: the snapshots a logged-in user works on.
//!
//! Every fetch updates only its own snapshot. Failures are logged and turned
//! into a user-visible message; the previous snapshot stays in place.

use std::thread;

use chrono::NaiveDate;

use crate::errors::SubManagerError;
use crate::overview::Overview;
use crate::structs::payment::{sort_for_display, Payment};
use crate::structs::session::Session;
use crate::structs::subscription::{Subscription, SubscriptionDraft, SubscriptionUpdate};

pub const CONNECTION_ERROR: &str = "Server connection error";

/// Result of [`Dashboard::process_payment`].
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// The user did not confirm; nothing was sent.
    Declined,
    /// The payment is paid. Holds the payment the server returned (usually the next one due).
    Processed(Payment),
}

#[derive(Debug)]
pub struct Dashboard {
    session: Session,
    pub subscriptions: Vec<Subscription>,
    pub payments: Vec<Payment>,
    /// Generic error shown after a failed fetch.
    pub message: Option<String>,
    /// Alert raised by a failed user action.
    pub alert: Option<String>,
    /// Set when the server rejected the token during a refresh.
    pub logged_out: bool,
}

impl Dashboard {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            subscriptions: Vec::new(),
            payments: Vec::new(),
            message: None,
            alert: None,
            logged_out: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Validates the token and reloads both snapshots.
    /// The three requests run concurrently and do not depend on each other.
    pub fn refresh(&mut self) {
        let session = &self.session;

        let (token, subscriptions, payments) = thread::scope(|scope| {
            let token = scope.spawn(|| session.heartbeat());
            let subscriptions = scope.spawn(|| session.subscriptions());
            let payments = scope.spawn(|| session.payments());

            (
                token.join().unwrap_or(Err(SubManagerError::RequestFailed)),
                subscriptions
                    .join()
                    .unwrap_or(Err(SubManagerError::RequestFailed)),
                payments.join().unwrap_or(Err(SubManagerError::RequestFailed)),
            )
        });

        self.message = None;

        match token {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!("token rejected by the server, logging out");
                if let Err(err) = self.session.client().logout() {
                    tracing::error!(error = %err, "failed to clear the session cookie");
                }
                self.logged_out = true;
            }
            Err(err) => tracing::error!(error = %err, "token validation failed"),
        }

        match subscriptions {
            Ok(subscriptions) => self.subscriptions = subscriptions,
            Err(err) => {
                tracing::error!(error = %err, "failed to load subscriptions");
                self.message = Some(CONNECTION_ERROR.to_string());
            }
        }

        match payments {
            Ok(payments) => self.payments = payments,
            Err(err) => {
                tracing::error!(error = %err, "failed to load payments");
                self.message = Some(CONNECTION_ERROR.to_string());
            }
        }
    }

    /// Creates a subscription, then reloads: the server schedules its payments.
    pub fn add_subscription(
        &mut self,
        draft: &SubscriptionDraft,
        today: NaiveDate,
    ) -> Result<Subscription, SubManagerError> {
        let created = self
            .session
            .create_subscription(draft, today)
            .map_err(|err| self.raise("Failed to add subscription", err))?;
        self.refresh();
        Ok(created)
    }

    pub fn edit_subscription(
        &mut self,
        id: i64,
        update: &SubscriptionUpdate,
    ) -> Result<(), SubManagerError> {
        self.session
            .update_subscription(id, update)
            .map_err(|err| self.raise("Failed to update subscription", err))?;
        self.refresh();
        Ok(())
    }

    /// Deletes a subscription. On success exactly that entry leaves the list;
    /// on failure the list is untouched and an alert is raised.
    pub fn delete_subscription(&mut self, id: i64) -> Result<(), SubManagerError> {
        self.session
            .delete_subscription(id)
            .map_err(|err| self.raise("Failed to delete subscription", err))?;

        self.subscriptions.retain(|s| s.subscription_id != id);
        self.alert = None;
        Ok(())
    }

    /// Marks an unprocessed payment as paid once `confirm` agrees.
    pub fn process_payment(
        &mut self,
        id: i64,
        confirm: impl FnOnce(&Payment) -> bool,
    ) -> Result<ProcessOutcome, SubManagerError> {
        let index = self
            .payments
            .iter()
            .position(|p| p.payment_id == id)
            .ok_or(SubManagerError::NotFound)?;

        if self.payments[index].is_processed() {
            return Err(SubManagerError::AlreadyProcessed(id));
        }
        if !confirm(&self.payments[index]) {
            return Ok(ProcessOutcome::Declined);
        }

        let returned = self
            .session
            .process_payment(id)
            .map_err(|err| self.raise("Failed to process payment", err))?;

        if returned.payment_id == id {
            self.payments[index] = returned.clone();
        } else {
            self.payments[index].mark_processed()?;
            if !self.payments.iter().any(|p| p.payment_id == returned.payment_id) {
                self.payments.push(returned.clone());
            }
        }

        self.alert = None;
        Ok(ProcessOutcome::Processed(returned))
    }

    /// Payments in display order.
    pub fn sorted_payments(&self) -> Vec<Payment> {
        let mut payments = self.payments.clone();
        sort_for_display(&mut payments);
        payments
    }

    pub fn overview(&self, year: i32, budget: f64) -> Overview {
        Overview::compute(&self.subscriptions, &self.payments, year, budget)
    }

    fn raise(&mut self, action: &str, err: SubManagerError) -> SubManagerError {
        tracing::error!(error = %err, "{}", action);
        self.alert = Some(format!("{}: {}", action, err.user_message()));
        err
    }
}
