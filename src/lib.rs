//! Jsontape - HTTP client middleware that records JSON responses as fixtures
//!
//! Wrap a [`transport::Transport`] in an [`client::InterceptingClient`] with
//! the [`recorder::FixtureRecorder`] installed. Requests that accept
//! `application/json` are re-issued through the transport and their
//! successful bodies are written to `<documents>/<last-path-segment>.json`.
//! Results are delivered through a [`recording::Registry`].

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::cargo)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::multiple_crate_versions
)]

pub mod client;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod fixture;
pub mod interceptor;
pub mod recorder;
pub mod recording;
pub mod transport;

pub use error::{FailureKind, JsontapeError, RecordingError, Result};
pub use interceptor::Interceptor;
