//! Eligibility predicate deciding which requests get recorded
//!
//! Called for every request issued through an intercepting client, so it
//! only inspects the URI and headers and never allocates.

use hyper::header::{HeaderName, HeaderValue, ACCEPT};
use hyper::Request;

use crate::config::{Config, DEFAULT_ACCEPT, DEFAULT_MARKER_HEADER};
use crate::Result;

/// Configured eligibility predicate
#[derive(Debug, Clone)]
pub struct Eligibility {
    marker: HeaderName,
    accept: HeaderValue,
}

impl Eligibility {
    /// Create a predicate with an explicit marker header and `Accept` value
    #[must_use]
    pub fn new(marker: HeaderName, accept: HeaderValue) -> Self {
        Self { marker, accept }
    }

    /// Create a predicate from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the marker header or accept value is invalid
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.marker_header_name()?, config.accept_value()?))
    }

    /// Re-entry marker header name
    #[must_use]
    pub fn marker(&self) -> &HeaderName {
        &self.marker
    }

    /// Check whether a request should be claimed by the recorder
    ///
    /// True iff the request carries no re-entry marker, its scheme starts
    /// with `http`, and its first `Accept` header equals the configured value
    /// exactly.
    pub fn check<B>(&self, request: &Request<B>) -> bool {
        if request.headers().contains_key(&self.marker) {
            return false;
        }

        let Some(scheme) = request.uri().scheme_str() else {
            return false;
        };

        if !scheme.starts_with("http") {
            return false;
        }

        request
            .headers()
            .get(ACCEPT)
            .is_some_and(|accept| *accept == self.accept)
    }
}

impl Default for Eligibility {
    fn default() -> Self {
        Self::new(
            HeaderName::from_static(DEFAULT_MARKER_HEADER),
            HeaderValue::from_static(DEFAULT_ACCEPT),
        )
    }
}

/// Check a request against the default predicate
pub fn is_eligible<B>(request: &Request<B>) -> bool {
    Eligibility::default().check(request)
}
