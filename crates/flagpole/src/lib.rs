//! # Flagpole Client
//!
//! Client library for the Flagpole remote feature-flag service. It fetches
//! flag definitions ("rules") from the distribution endpoint, caches them
//! locally, evaluates their targeting rules against a caller-supplied
//! context and resolves a final value per flag key.
//!
//! # Overview
//!
//! The entry point is [`FlagManager`], built from a validated [`Config`].
//! Rules are loaded lazily on first access (cache first, then remote) and
//! every resolution is evaluated against the manager's current [`Context`].
//! Managers are cheap to derive: [`FlagManager::with_context`] and
//! [`FlagManager::with_defaults`] return configured copies without touching
//! the original.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use flagpole::{Config, Context, DefaultsCollection, FlagManager};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::builder("your-environment-token").build().unwrap();
//!     let manager = FlagManager::new(config).unwrap();
//!
//!     // Anonymous evaluation with a per-call default
//!     let flag = manager.single("new-checkout", Some(false.into())).await.unwrap();
//!     println!("enabled: {}", flag.is_enabled());
//!
//!     // Targeted evaluation with collection-level defaults
//!     let manager = manager
//!         .with_context(
//!             Context::new("user")
//!                 .with_identifier("user-123")
//!                 .with_attribute("country", ["US"]),
//!         )
//!         .with_defaults(DefaultsCollection::new().with("page-size", 25.0));
//!
//!     let flag = manager.single("page-size", None).await.unwrap();
//!     println!("page size: {:?}", flag.as_number());
//! }
//! ```
//!
//! # Error Handling
//!
//! Errors are represented by [`FlagpoleError`]. Only the very first,
//! uncached rule load can surface a fetch failure to callers that supply a
//! default for every flag they read; cache failures degrade to a remote
//! fetch and usage-reporting failures are always swallowed.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod manager;
pub mod model;

pub use config::{CacheBackend, Config, ConfigBuilder};
pub use error::FlagpoleError;
pub use fetch::{DEFAULT_API_URL, FetchedRules, HttpFetcher, RuleFetcher};
pub use manager::FlagManager;
pub use model::{
    Attribute, Condition, ConditionValue, Context, DefaultsCollection, Flag, FlagKind, FlagValue,
    Operator, Rule, RuleSet, Target, ValueEnvelope, ValuePayload,
};
