use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::dates::{parse_api_date, raw_date};
use crate::validation::FieldErrors;

pub const TITLE_MAX_LEN: usize = 75;
pub const DESCRIPTION_MAX_LEN: usize = 255;

/// Billing cycle of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cycle {
    #[default]
    Monthly,
    Yearly,
}

impl Cycle {
    /// The date one cycle after `date`. Month ends are clamped (Jan 31 -> Feb 29).
    pub fn advance(self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Cycle::Monthly => date.checked_add_months(Months::new(1)),
            Cycle::Yearly => date.checked_add_months(Months::new(12)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Cycle::Monthly => "MONTHLY",
            Cycle::Yearly => "YEARLY",
        }
    }
}

impl std::str::FromStr for Cycle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MONTHLY" => Ok(Cycle::Monthly),
            "YEARLY" => Ok(Cycle::Yearly),
            other => Err(format!("unknown billing cycle \"{}\"", other)),
        }
    }
}

impl std::fmt::Display for Cycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subscription object returned by `GET /subscription`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub subscription_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub cycle: Cycle,
    /// Raw date as sent by the server. Use [`Subscription::last_payment_date`] to read it.
    #[serde(default, deserialize_with = "raw_date")]
    pub date_of_last_payment: String,
    #[serde(default)]
    pub currency_id: i64,
}

impl Subscription {
    pub fn last_payment_date(&self) -> Option<NaiveDate> {
        parse_api_date(&self.date_of_last_payment)
    }

    /// When the next charge is due, one cycle after the last payment.
    pub fn next_payment_date(&self) -> Option<NaiveDate> {
        self.last_payment_date()
            .and_then(|date| self.cycle.advance(date))
    }

    /// What the subscription costs per month: yearly prices are spread over 12 months.
    pub fn monthly_equivalent(&self) -> f64 {
        match self.cycle {
            Cycle::Monthly => self.price,
            Cycle::Yearly => self.price / 12.0,
        }
    }
}

/// Body of `POST /subscription`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDraft {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub cycle: Cycle,
    /// Serialized as `yyyy-MM-dd`.
    pub date_of_last_payment: NaiveDate,
    pub currency_id: i64,
}

impl SubscriptionDraft {
    pub fn validate(&self, today: NaiveDate) -> FieldErrors {
        let mut errors = FieldErrors::new();

        check_title(&mut errors, &self.title);
        check_description(&mut errors, &self.description);
        check_price(&mut errors, self.price);

        if self.date_of_last_payment > today {
            errors.add(
                "dateOfLastPayment",
                "Date of last payment cannot be in the future",
            );
        }
        if self.currency_id <= 0 {
            errors.add("currencyId", "Currency ID must be valid");
        }

        errors
    }
}

/// Body of `PUT /subscription/{id}`. Only these fields are editable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionUpdate {
    pub title: String,
    pub description: String,
    pub price: f64,
}

impl SubscriptionUpdate {
    /// Prefills the edit form from an existing subscription.
    pub fn from_subscription(subscription: &Subscription) -> Self {
        Self {
            title: subscription.title.clone(),
            description: subscription.description.clone().unwrap_or_default(),
            price: subscription.price,
        }
    }

    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        check_title(&mut errors, &self.title);
        check_description(&mut errors, &self.description);
        check_price(&mut errors, self.price);

        errors
    }
}

fn check_title(errors: &mut FieldErrors, title: &str) {
    if title.trim().is_empty() {
        errors.add("title", "Title cannot be blank");
    } else if title.chars().count() > TITLE_MAX_LEN {
        errors.add("title", "Title must be at most 75 characters");
    }
}

fn check_description(errors: &mut FieldErrors, description: &str) {
    if description.chars().count() > DESCRIPTION_MAX_LEN {
        errors.add("description", "Description must be at most 255 characters");
    }
}

fn check_price(errors: &mut FieldErrors, price: f64) {
    // NaN fails this too
    if !(price > 0.0) {
        errors.add("price", "Price must be greater than zero");
    }
}
