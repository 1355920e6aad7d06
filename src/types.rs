//! Entities read out of the Freenom client area pages

use reqwest::Url;
use std::time::Duration;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Renewals within this duration of expiry are inside the renewal window.
const RENEWABLE_WINDOW: Duration = Duration::from_secs(14 * SECS_PER_DAY);

/// The literal message Freenom puts on rows that can be renewed right now.
const RENEWABLE_MESSAGE: &str = "Renewable";

/// A whole number of days as a [`Duration`].
///
/// `None` when the count is large enough to overflow the second count; day
/// counts come straight out of scraped HTML and are not trusted.
pub(crate) fn days(n: u64) -> Option<Duration> {
    n.checked_mul(SECS_PER_DAY).map(Duration::from_secs)
}

/// Basic account details as shown on the account details form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    /// First name on the account
    pub first_name: String,
    /// Last name on the account
    pub last_name: String,
    /// Email address on the account
    pub email: String,
    /// Phone number on the account
    pub phone: String,
}

/// Urgency coloring of a row on the renewals page
///
/// Freenom colors the remaining-time cell red when a domain is close to
/// expiry and green otherwise. `Unknown` is returned when the cell carries
/// neither class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DomainColor {
    /// The remaining-time cell carries the green text class
    Green,
    /// The remaining-time cell carries the red text class
    Red,
    /// Neither color class was present
    #[default]
    Unknown,
}

/// A registered domain listed on the renewals page
///
/// Constructed fresh on every renewals fetch; the numeric `id` is assigned
/// by Freenom and is stable across fetches for the same registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenewalDomain {
    /// Registered domain name
    pub name: String,
    /// Identifier assigned by Freenom, consumed by
    /// [`renew_domain`](crate::FreenomClient::renew_domain)
    pub id: u64,
    /// Absolute URL of the renewal page for this domain
    pub renewal_url: Url,
    /// Status label, such as `Active` or `Fraud`
    pub status: String,
    /// Time left until the domain expires, in whole days
    pub remaining: Duration,
    /// Status message describing the row
    pub message: String,
    /// Urgency coloring of the row
    pub color: DomainColor,
}

impl RenewalDomain {
    /// Whether this domain can be renewed right now
    ///
    /// True iff the domain expires within 14 days and the row message is
    /// exactly `Renewable`. Callers are expected to filter with this;
    /// [`renewals`](crate::FreenomClient::renewals) returns every row.
    #[must_use]
    pub fn is_renewable(&self) -> bool {
        self.remaining <= RENEWABLE_WINDOW && self.message == RENEWABLE_MESSAGE
    }
}
