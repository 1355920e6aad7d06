//! Freenom Client Area Library
//!
//! This library automates an authenticated session against the Freenom
//! client area, which exposes no formal API: everything is read out of
//! server-rendered HTML and submitted through the same forms a browser
//! would use.
//!
//! # Features
//!
//! - Login/logout with CSRF token handling and cookie-backed session state
//! - Account details read from the details form
//! - Renewal listing with a per-domain renewability predicate
//! - Domain renewal submission returning the order number
//! - Fixed-interval retries for transient server errors
//! - Secure TLS using rustls (no OpenSSL dependencies)
//! - Well-typed errors using thiserror
//!
//! # Example
//!
//! ```no_run
//! use freenom_client::FreenomClient;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = FreenomClient::new()?;
//!
//! let name = client.login("me@example.com", "hunter2").await?;
//! println!("Logged in as {name}");
//!
//! let info = client.account_info().await?;
//! println!("{} {} <{}>", info.first_name, info.last_name, info.email);
//!
//! for domain in client.renewals().await? {
//!     if domain.is_renewable() {
//!         let order = client.renew_domain(domain.id, 12).await?;
//!         println!("Renewed {} (order #{order})", domain.name);
//!     }
//! }
//!
//! client.logout().await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod parser;
mod transport;
mod types;

pub use client::{FreenomClient, FreenomClientBuilder};
pub use error::FreenomError;
pub use types::{AccountInfo, DomainColor, RenewalDomain};
