//! Mindvane — conversational intent routing and longitudinal user profiling.
//!
//! Two subsystems share this crate:
//!
//! - **Intent classification & response routing**: free-text input is
//!   classified into an intent (model-first, deterministic keyword fallback)
//!   and dispatched to exactly one response strategy. Strategies generate on
//!   a fixed quality tier and degrade to canned replies; no failure behind
//!   the text-generation boundary ever reaches the caller.
//! - **Profile aggregation**: a rolling window of a user's analyzed log
//!   entries is reduced to emotion trends, topic–emotion associations,
//!   posting patterns, and behavioral signals. The resulting document is
//!   persisted per user and further reduced to a context summary that
//!   strategies inject into their prompts.

pub mod config;
pub mod error;
pub mod intent;
pub mod llm;
pub mod profile;
pub mod respond;
pub mod store;

pub use config::Config;
pub use error::Error;
