//! Rust SDK for the SubManager subscription tracker.
//!
//! ```no_run
//! use submanager_client::{AuthForm, Client, ClientOptions, Dashboard};
//!
//! let client = Client::new(ClientOptions {
//!     api_url: "http://localhost:8080/api".to_string(),
//!     token_path: "cookie".into(),
//!     debug: true,
//! })?;
//!
//! let session = client.login(&AuthForm::login("alice", "Secret1!"))?;
//! let mut dashboard = Dashboard::new(session);
//! dashboard.refresh();
//!
//! let overview = dashboard.overview(2024, 4000.0);
//! println!("{} active subscriptions", overview.active_subscriptions);
//! # Ok::<(), submanager_client::SubManagerError>(())
//! ```

mod errors;
mod structs;

pub mod config;
pub mod dashboard;
pub mod dates;
pub mod overview;
pub mod routes;
pub mod token_store;
pub mod validation;

pub use config::Config;
pub use dashboard::{Dashboard, ProcessOutcome, CONNECTION_ERROR};
pub use errors::SubManagerError;
pub use overview::Overview;
pub use routes::{guard, Route};
pub use structs::client::{Client, ClientOptions, DEFAULT_API_URL};
pub use structs::payment::{sort_for_display, Payment, PaymentStatus};
pub use structs::session::Session;
pub use structs::subscription::{Cycle, Subscription, SubscriptionDraft, SubscriptionUpdate};
pub use structs::{AuthResponse, Claims, Currency};
pub use validation::{AuthForm, AuthMode, FieldErrors};
