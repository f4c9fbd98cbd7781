use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::subscription::Subscription;
use crate::dates::{parse_api_date, raw_date};
use crate::errors::SubManagerError;

/// Processing status of a payment. The only transition is `Unprocessed -> Paid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Paid,
    Unprocessed,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Paid => f.write_str("PAID"),
            PaymentStatus::Unprocessed => f.write_str("UNPROCESSED"),
        }
    }
}

/// Payment object returned by `GET /payment` and `POST /payment/{id}/process`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub payment_id: i64,
    pub status: PaymentStatus,
    /// Raw date as sent by the server. Use [`Payment::payment_date`] to read it.
    #[serde(default, deserialize_with = "raw_date")]
    pub date_of_payment: String,
    /// Older servers leave this out; the owning subscription's price is used instead.
    #[serde(default)]
    pub amount: Option<f64>,
    pub subscription_id: i64,
    #[serde(default)]
    pub subscription_title: Option<String>,
}

impl Payment {
    pub fn payment_date(&self) -> Option<NaiveDate> {
        parse_api_date(&self.date_of_payment)
    }

    pub fn is_processed(&self) -> bool {
        self.status == PaymentStatus::Paid
    }

    /// Finds the owning subscription in a snapshot.
    pub fn subscription<'a>(&self, subscriptions: &'a [Subscription]) -> Option<&'a Subscription> {
        subscriptions
            .iter()
            .find(|s| s.subscription_id == self.subscription_id)
    }

    /// The amount charged, falling back to the owning subscription's price, then to 0.
    pub fn amount_in(&self, subscriptions: &[Subscription]) -> f64 {
        self.amount
            .or_else(|| self.subscription(subscriptions).map(|s| s.price))
            .unwrap_or(0.0)
    }

    /// Title to display: the denormalized title, then the owning subscription's.
    pub fn title_in<'a>(&'a self, subscriptions: &'a [Subscription]) -> Option<&'a str> {
        self.subscription_title
            .as_deref()
            .or_else(|| self.subscription(subscriptions).map(|s| s.title.as_str()))
    }

    /// Marks the payment as paid. Paid payments cannot be processed again.
    pub fn mark_processed(&mut self) -> Result<(), SubManagerError> {
        if self.is_processed() {
            return Err(SubManagerError::AlreadyProcessed(self.payment_id));
        }
        self.status = PaymentStatus::Paid;
        Ok(())
    }
}

/// Display order: unprocessed before paid, newest first inside each group,
/// unparseable dates last inside their group. The sort is stable.
pub fn sort_for_display(payments: &mut [Payment]) {
    payments.sort_by(display_order);
}

fn display_order(a: &Payment, b: &Payment) -> Ordering {
    let rank = |p: &Payment| match p.status {
        PaymentStatus::Unprocessed => 0,
        PaymentStatus::Paid => 1,
    };

    rank(a)
        .cmp(&rank(b))
        .then_with(|| match (a.payment_date(), b.payment_date()) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}
