//! Error types for the Freenom client

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when driving the Freenom client area
#[derive(Error, Debug)]
pub enum FreenomError {
    /// A caller-supplied argument was rejected before any request was sent
    #[error("invalid argument: {0}")]
    Validation(String),

    /// An authenticated operation was called before a successful login
    #[error("not logged in: call login() first")]
    NotLoggedIn,

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Response status was outside the accepted set for the operation
    #[error("unexpected response at {path}: {status} => {preview}")]
    UnexpectedStatus {
        /// Path the request was sent to
        path: String,
        /// The status code that was received
        status: StatusCode,
        /// First 500 characters of the response body
        preview: String,
    },

    /// A response that should carry a redirect target has no `Location` header
    #[error("response at {path} is missing a 'Location' header")]
    MissingRedirect {
        /// Path the request was sent to
        path: String,
    },

    /// The server served the login form without issuing a session cookie
    #[error("no session cookie was issued during login")]
    MissingSessionCookie,

    /// Expected HTML structure was absent or malformed
    #[error("failed to parse HTML for {what}")]
    Parse {
        /// What was being looked for
        what: &'static str,
    },

    /// Client initialization failed
    #[error("client initialization failed: {0}")]
    ClientInit(String),
}
