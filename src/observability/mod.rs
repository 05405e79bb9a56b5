//! Observability for cqlschema
//!
//! Logging goes through `tracing`; this crate never installs a subscriber.
//! Every record carries an `event` field holding one of the `Event`
//! names below, so logs can be filtered on a fixed vocabulary.
//!
//! # Usage
//!
//! ```ignore
//! use cqlschema::observability::Event;
//!
//! tracing::debug!(event = Event::ValidationPassed.as_str(), "validation passed");
//! ```

mod events;

pub use events::Event;
