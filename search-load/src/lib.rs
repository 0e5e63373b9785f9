//! Concurrent search load client.
//!
//! Sends the same field-scoped search many times at once, waits for every
//! answer, pauses, and does it again, so a caching search server shows its
//! cold and warm behaviour side by side.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod executor;
pub mod prompt;
pub mod query;
pub mod statistics;

pub use config::LoadConfig;
pub use dispatch::{DispatchBatch, Dispatcher, RoundReport};
pub use driver::{run_demonstration, DemonstrationReport};
pub use error::{InputError, RequestError};
pub use executor::RequestOutcome;
pub use query::{build_url, SearchField, SearchRequest, SearchTarget};
