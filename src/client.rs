//! Freenom session client implementation

use crate::error::FreenomError;
use crate::parser::ResponseParser;
use crate::transport::{DEFAULT_RETRY_DELAY, Transport};
use crate::types::{AccountInfo, RenewalDomain};
use reqwest::cookie::{CookieStore as _, Jar};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, LOCATION, ORIGIN, REFERER};
use reqwest::{Method, Response, StatusCode, Url};
use std::sync::Arc;
use std::time::Duration;
use zeroize::Zeroize;

const DEFAULT_BASE_URL: &str = "https://my.freenom.com/";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                                  (KHTML, like Gecko) Chrome/106.0.0.0 Safari/537.36";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif;q=0.9,image/webp;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE_EN: &str = "en-US,en;q=0.5";

const OK: &[StatusCode] = &[StatusCode::OK];
const FOUND: &[StatusCode] = &[StatusCode::FOUND];

const CLIENT_AREA_PATH: &str = "clientarea.php";
const LOGIN_PATH: &str = "dologin.php";
const LOGOUT_PATH: &str = "logout.php";
const ACCOUNT_DETAILS_PATH: &str = "clientarea.php?action=details";
const RENEWALS_PATH: &str = "domains.php?a=renewals";
const SUBMIT_RENEWALS_PATH: &str = "domains.php?submitrenewals=true";

/// The main Freenom client
///
/// Drives an authenticated browser-like session against the Freenom client
/// area: login, account details, renewal listing and renewal submission.
/// Redirects are never followed automatically; the login and renewal flows
/// read the `Location` header and issue the next request themselves, which
/// is also how an invalid session is told apart from a valid one.
///
/// The client owns one cookie-backed session and is not safe to use from
/// several tasks at once: CSRF tokens are bound to the page that served
/// them, so the server-side workflow is inherently sequential. Use one
/// client per account instead of sharing an instance.
///
/// # Example
///
/// ```no_run
/// use freenom_client::FreenomClient;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut client = FreenomClient::new()?;
/// let name = client.login("me@example.com", "hunter2").await?;
/// println!("Logged in as {name}");
///
/// for domain in client.renewals().await? {
///     if domain.is_renewable() {
///         let order = client.renew_domain(domain.id, 12).await?;
///         println!("Renewed {} (order #{order})", domain.name);
///     }
/// }
///
/// client.logout().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FreenomClient {
    transport: Transport,
    parser: ResponseParser,
    cookies: Arc<Jar>,
    base_url: Url,
    logged_in: bool,
}

impl FreenomClient {
    /// Create a client with default settings
    ///
    /// # Errors
    ///
    /// Returns `FreenomError::ClientInit` if the HTTP client cannot be
    /// initialized.
    pub fn new() -> Result<Self, FreenomError> {
        Self::builder().build()
    }

    /// Create a builder for configuring the client
    ///
    /// # Example
    ///
    /// ```no_run
    /// use freenom_client::FreenomClient;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = FreenomClient::builder()
    ///     .base_url("http://localhost:1234")?
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn builder() -> FreenomClientBuilder {
        FreenomClientBuilder::new()
    }

    /// Log in with an account email and password
    ///
    /// Walks the full login flow: the unauthenticated redirect off the
    /// client area, the login form (for the CSRF token and the session
    /// cookie), the credential submission and finally the authenticated
    /// landing page. Returns the display name taken from the landing page
    /// greeting.
    ///
    /// # Errors
    ///
    /// * `FreenomError::Validation` - email or password is empty; no request
    ///   is sent
    /// * `FreenomError::MissingRedirect` - an expected `Location` header was
    ///   absent
    /// * `FreenomError::MissingSessionCookie` - the login form came back
    ///   without a session cookie
    /// * `FreenomError::Parse` - the token or greeting could not be found
    pub async fn login(&mut self, email: &str, password: &str) -> Result<String, FreenomError> {
        if email.is_empty() {
            return Err(FreenomError::Validation("email is empty".to_string()));
        }
        if password.is_empty() {
            return Err(FreenomError::Validation("password is empty".to_string()));
        }

        // An unauthenticated visit to the client area answers with a
        // redirect to the login form.
        let first = self
            .transport
            .request(Method::GET, CLIENT_AREA_PATH, None, FOUND)
            .await?;
        let login_form_path = location_header(&first, CLIENT_AREA_PATH)?;

        let form_page = self
            .transport
            .request(Method::GET, &login_form_path, None, OK)
            .await?;
        let token = self.parser.csrf_token(&form_page.text().await?)?;

        // Serving the login form must have set at least one cookie; the
        // token is worthless without the session it belongs to.
        if self.cookies.cookies(&self.base_url).is_none() {
            return Err(FreenomError::MissingSessionCookie);
        }

        let mut form = vec![
            ("token".to_string(), token),
            ("username".to_string(), email.to_string()),
            ("password".to_string(), password.to_string()),
            ("rememberme".to_string(), "on".to_string()),
        ];
        let login_result = self
            .transport
            .request(Method::POST, LOGIN_PATH, Some(form.as_slice()), FOUND)
            .await;
        for (_, value) in &mut form {
            value.zeroize();
        }
        location_header(&login_result?, LOGIN_PATH)?;

        let landing = self
            .transport
            .request(Method::GET, CLIENT_AREA_PATH, None, OK)
            .await?;
        let name = self.parser.display_name(&landing.text().await?)?;

        self.logged_in = true;
        Ok(name)
    }

    /// Log out and invalidate the session cookie
    ///
    /// Idempotent cleanup: the local session state is dropped no matter how
    /// the request itself fares, and calling this while already logged out
    /// is not an error on the client side.
    pub async fn logout(&mut self) -> Result<(), FreenomError> {
        self.logged_in = false;
        self.transport
            .request(Method::GET, LOGOUT_PATH, None, FOUND)
            .await?;
        Ok(())
    }

    /// Fetch the basic account details
    ///
    /// # Errors
    ///
    /// `FreenomError::NotLoggedIn` before a successful [`login`](Self::login);
    /// otherwise transport and parse errors as described on [`FreenomError`].
    pub async fn account_info(&self) -> Result<AccountInfo, FreenomError> {
        self.ensure_logged_in()?;

        let response = self
            .transport
            .request(Method::GET, ACCOUNT_DETAILS_PATH, None, OK)
            .await?;
        self.parser.account_info(&response.text().await?)
    }

    /// Fetch every domain on the renewals page
    ///
    /// Returns the full listing, renewable or not; filter with
    /// [`RenewalDomain::is_renewable`] before acting on it.
    pub async fn renewals(&self) -> Result<Vec<RenewalDomain>, FreenomError> {
        self.ensure_logged_in()?;

        let response = self
            .transport
            .request(Method::GET, RENEWALS_PATH, None, OK)
            .await?;
        self.parser.renewals(&response.text().await?)
    }

    /// Renew a domain for the given number of months and return the order
    /// number from the confirmation page
    ///
    /// `id` comes from [`renewals`](Self::renewals). CSRF tokens are
    /// page-scoped, so a fresh one is fetched from the renewal page of this
    /// exact domain before submitting.
    ///
    /// # Errors
    ///
    /// * `FreenomError::Validation` - `id` is zero or `months` is outside
    ///   `1..=12`; no request is sent
    /// * `FreenomError::NotLoggedIn` - called before a successful login
    /// * `FreenomError::MissingRedirect` - the submission did not answer
    ///   with a confirmation redirect
    pub async fn renew_domain(&self, id: u64, months: u32) -> Result<u64, FreenomError> {
        if id == 0 {
            return Err(FreenomError::Validation(
                "domain id must be positive".to_string(),
            ));
        }
        if !(1..=12).contains(&months) {
            return Err(FreenomError::Validation(format!(
                "renewal period must be between 1 and 12 months, got {months}"
            )));
        }
        self.ensure_logged_in()?;

        let renewal_page_path = format!("domains.php?a=renewdomain&domain={id}");
        let token_page = self
            .transport
            .request(Method::GET, &renewal_page_path, None, OK)
            .await?;
        let token = self.parser.csrf_token(&token_page.text().await?)?;

        let form = vec![
            ("token".to_string(), token),
            ("renewalid".to_string(), id.to_string()),
            (format!("renewalperiod[{id}]"), format!("{months}M")),
            ("paymentmethod".to_string(), "credit".to_string()),
        ];
        let submission = self
            .transport
            .request(Method::POST, SUBMIT_RENEWALS_PATH, Some(form.as_slice()), FOUND)
            .await?;
        let confirmation_path = location_header(&submission, SUBMIT_RENEWALS_PATH)?;

        let confirmation = self
            .transport
            .request(Method::GET, &confirmation_path, None, OK)
            .await?;
        self.parser.order_number(&confirmation.text().await?)
    }

    fn ensure_logged_in(&self) -> Result<(), FreenomError> {
        if self.logged_in {
            Ok(())
        } else {
            Err(FreenomError::NotLoggedIn)
        }
    }
}

/// Read the `Location` header off a redirect response
fn location_header(response: &Response, path: &str) -> Result<String, FreenomError> {
    response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .ok_or_else(|| FreenomError::MissingRedirect {
            path: path.to_string(),
        })
}

/// Builder for configuring a Freenom client
///
/// The defaults match a real browser session against `my.freenom.com`; the
/// base URL and retry delay overrides exist mainly for tests against a mock
/// server. Whatever the configuration, the redirect policy is always
/// `Policy::none()` - the login flow depends on seeing redirects itself.
#[derive(Debug)]
pub struct FreenomClientBuilder {
    base_url: Option<Url>,
    user_agent: String,
    timeout: Duration,
    retry_delay: Duration,
}

impl FreenomClientBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            base_url: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Set a custom base URL, e.g. a mock server for testing
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn base_url(mut self, url: impl reqwest::IntoUrl) -> Result<Self, FreenomError> {
        self.base_url = Some(url.into_url()?);
        Ok(self)
    }

    /// Set the User-Agent header sent with every request
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the per-request timeout (default one minute)
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the fixed wait between retry attempts (default three seconds)
    pub fn retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Build the client with the configured settings
    ///
    /// # Errors
    ///
    /// Returns `FreenomError::ClientInit` if the user agent is empty, a
    /// header value is malformed or the HTTP client cannot be initialized.
    pub fn build(self) -> Result<FreenomClient, FreenomError> {
        if self.user_agent.is_empty() {
            return Err(FreenomError::ClientInit("user agent is empty".to_string()));
        }

        let base_url = self
            .base_url
            .unwrap_or_else(|| Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"));

        // Referer and Origin follow the configured base so that a mock
        // server sees the same header shape as the real site.
        let referer = base_url
            .join(CLIENT_AREA_PATH)
            .map_err(|e| FreenomError::ClientInit(e.to_string()))?;
        let origin = base_url.origin().ascii_serialization();

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_EN));
        headers.insert(
            REFERER,
            HeaderValue::from_str(referer.as_str())
                .map_err(|e| FreenomError::ClientInit(e.to_string()))?,
        );
        headers.insert(
            ORIGIN,
            HeaderValue::from_str(&origin).map_err(|e| FreenomError::ClientInit(e.to_string()))?,
        );

        let cookies = Arc::new(Jar::default());
        let client = reqwest::Client::builder()
            .user_agent(&self.user_agent)
            .default_headers(headers)
            .cookie_provider(Arc::clone(&cookies))
            .redirect(reqwest::redirect::Policy::none())
            .timeout(self.timeout)
            .use_rustls_tls()
            .build()
            .map_err(|e| FreenomError::ClientInit(e.to_string()))?;

        Ok(FreenomClient {
            transport: Transport::new(client, base_url.clone(), self.retry_delay),
            parser: ResponseParser::new(),
            cookies,
            base_url,
            logged_in: false,
        })
    }
}

impl Default for FreenomClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
