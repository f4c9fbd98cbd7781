//! Dashboard aggregation.
//!
//! Everything here is a pure function of the two snapshots and the year, so
//! the numbers can be recomputed whenever either snapshot is replaced.
//! Malformed input is skipped, never reported.

use chrono::Datelike;
use serde::Serialize;

use crate::structs::payment::Payment;
use crate::structs::subscription::Subscription;

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Chart colour endpoints.
const SHADE_DARK: [f64; 3] = [51.0, 116.0, 24.0];
const SHADE_LIGHT: [f64; 3] = [93.0, 214.0, 44.0];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthTotal {
    pub month: &'static str,
    pub total: f64,
}

/// One slice of the subscriptions pie.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Share {
    pub name: String,
    /// Monthly-equivalent cost.
    pub value: f64,
    /// Share of the monthly total, 0..=100.
    pub percentage: f64,
    pub fill: String,
}

/// Spending compared with the budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetSplit {
    pub spent: f64,
    /// Never negative; overspending shows as 0 remaining.
    pub remaining: f64,
}

/// Everything the overview page shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub year: i32,
    pub active_subscriptions: usize,
    /// Sum of the monthly equivalents of all subscriptions.
    pub monthly_cost: f64,
    pub spent_this_year: f64,
    pub spent_all_time: f64,
    pub monthly_totals: Vec<MonthTotal>,
    pub shares: Vec<Share>,
    pub budget: BudgetSplit,
}

impl Overview {
    pub fn compute(
        subscriptions: &[Subscription],
        payments: &[Payment],
        year: i32,
        budget: f64,
    ) -> Self {
        let monthly_totals = monthly_totals(payments, subscriptions, year);
        let spent_this_year: f64 = monthly_totals.iter().map(|m| m.total).sum();
        let spent_all_time = payments
            .iter()
            .map(|p| p.amount_in(subscriptions))
            .sum();

        Self {
            year,
            active_subscriptions: subscriptions.len(),
            monthly_cost: monthly_cost(subscriptions),
            spent_this_year,
            spent_all_time,
            monthly_totals,
            shares: subscription_shares(subscriptions),
            budget: BudgetSplit {
                spent: spent_this_year,
                remaining: (budget - spent_this_year).max(0.0),
            },
        }
    }
}

/// Twelve totals, January first. Payments outside `year` or without a parseable date are skipped.
pub fn monthly_totals(
    payments: &[Payment],
    subscriptions: &[Subscription],
    year: i32,
) -> Vec<MonthTotal> {
    let mut totals = [0.0_f64; 12];

    for payment in payments {
        let Some(date) = payment.payment_date() else {
            continue;
        };
        if date.year() != year {
            continue;
        }
        totals[date.month0() as usize] += payment.amount_in(subscriptions);
    }

    MONTH_NAMES
        .into_iter()
        .zip(totals)
        .map(|(month, total)| MonthTotal { month, total })
        .collect()
}

pub fn monthly_equivalent(subscription: &Subscription) -> f64 {
    subscription.monthly_equivalent()
}

pub fn monthly_cost(subscriptions: &[Subscription]) -> f64 {
    subscriptions.iter().map(monthly_equivalent).sum()
}

/// Per-subscription slices of the monthly cost. No subscriptions, no slices.
pub fn subscription_shares(subscriptions: &[Subscription]) -> Vec<Share> {
    let total = monthly_cost(subscriptions);
    let colours = green_shades(subscriptions.len());

    subscriptions
        .iter()
        .zip(colours)
        .map(|(subscription, fill)| {
            let value = monthly_equivalent(subscription);
            let name = if subscription.title.trim().is_empty() {
                "Unknown".to_string()
            } else {
                subscription.title.clone()
            };

            Share {
                name,
                value,
                percentage: if total > 0.0 { value / total * 100.0 } else { 0.0 },
                fill,
            }
        })
        .collect()
}

/// `count` colours from dark to light green. A single colour sits halfway.
pub fn green_shades(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let ratio = if count == 1 {
                0.5
            } else {
                i as f64 / (count - 1) as f64
            };
            let channel = |c: usize| {
                (SHADE_DARK[c] + (SHADE_LIGHT[c] - SHADE_DARK[c]) * ratio).round() as u8
            };
            format!("rgb({}, {}, {})", channel(0), channel(1), channel(2))
        })
        .collect()
}
