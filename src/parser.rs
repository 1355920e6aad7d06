//! Target-specific HTML extraction for Freenom client area pages
//!
//! Every lookup here is keyed to one known markup shape served by Freenom;
//! this is not a general HTML query layer. A missing element, attribute or
//! numeric field fails the whole extraction, never yielding a partial value.

use crate::error::FreenomError;
use crate::types::{AccountInfo, DomainColor, RenewalDomain, days};
use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

/// Literal prefix of the greeting heading on the client area landing page
const GREETING_PREFIX: &str = "Hello ";

/// Parser for Freenom HTML pages with cached selectors and regex patterns
#[derive(Debug, Default)]
pub(crate) struct ResponseParser {
    token_selector: OnceLock<Selector>,
    greeting_selector: OnceLock<Selector>,
    account_selectors: OnceLock<[Selector; 4]>,
    row_selector: OnceLock<Selector>,
    cell_selector: OnceLock<Selector>,
    strong_selector: OnceLock<Selector>,
    days_regex: OnceLock<Regex>,
}

impl ResponseParser {
    pub fn new() -> Self {
        Self::default()
    }

    fn token_selector(&self) -> &Selector {
        self.token_selector
            .get_or_init(|| Selector::parse(r#"input[name="token"]"#).unwrap())
    }

    fn greeting_selector(&self) -> &Selector {
        self.greeting_selector
            .get_or_init(|| Selector::parse("h1.splash").unwrap())
    }

    /// Selectors for the four account detail inputs, in field order
    fn account_selectors(&self) -> &[Selector; 4] {
        self.account_selectors.get_or_init(|| {
            [
                Selector::parse("input#firstname").unwrap(),
                Selector::parse("input#lastname").unwrap(),
                Selector::parse("input#email").unwrap(),
                Selector::parse("input#phonenumber").unwrap(),
            ]
        })
    }

    fn row_selector(&self) -> &Selector {
        self.row_selector
            .get_or_init(|| Selector::parse("table tr").unwrap())
    }

    fn cell_selector(&self) -> &Selector {
        self.cell_selector
            .get_or_init(|| Selector::parse("td").unwrap())
    }

    fn strong_selector(&self) -> &Selector {
        self.strong_selector
            .get_or_init(|| Selector::parse("strong").unwrap())
    }

    /// Matches the leading whole-day count of a remaining-time cell,
    /// e.g. the `14` of `14 Days`
    fn days_regex(&self) -> &Regex {
        self.days_regex
            .get_or_init(|| Regex::new(r"^(\d+)\s").unwrap())
    }

    /// Extract the CSRF token value from a page embedding a form
    pub fn csrf_token(&self, html: &str) -> Result<String, FreenomError> {
        let document = Html::parse_document(html);
        let field = document
            .select(self.token_selector())
            .next()
            .ok_or(FreenomError::Parse {
                what: "CSRF token field",
            })?;

        field
            .value()
            .attr("value")
            .map(str::to_owned)
            .ok_or(FreenomError::Parse {
                what: "CSRF token value",
            })
    }

    /// Extract the account display name from the landing page greeting
    pub fn display_name(&self, html: &str) -> Result<String, FreenomError> {
        let document = Html::parse_document(html);
        let heading = document
            .select(self.greeting_selector())
            .next()
            .ok_or(FreenomError::Parse {
                what: "greeting heading",
            })?;

        let text: String = heading.text().collect();
        let at = text.find(GREETING_PREFIX).ok_or(FreenomError::Parse {
            what: "greeting prefix",
        })?;

        Ok(text[at + GREETING_PREFIX.len()..].to_string())
    }

    /// Read the current values of the four account detail inputs
    pub fn account_info(&self, html: &str) -> Result<AccountInfo, FreenomError> {
        let document = Html::parse_document(html);
        let [first_name, last_name, email, phone] = self.account_selectors();

        Ok(AccountInfo {
            first_name: input_value(&document, first_name, "first name field")?,
            last_name: input_value(&document, last_name, "last name field")?,
            email: input_value(&document, email, "email field")?,
            phone: input_value(&document, phone, "phone field")?,
        })
    }

    /// Extract every row of the renewals table
    ///
    /// Each row must carry five cells: domain name, status, remaining time,
    /// message and the renewal action link. There are no best-effort rows; a
    /// single malformed row fails the whole listing.
    pub fn renewals(&self, html: &str) -> Result<Vec<RenewalDomain>, FreenomError> {
        let document = Html::parse_document(html);
        let mut renewals = Vec::new();

        for row in document.select(self.row_selector()) {
            let cells: Vec<ElementRef> = row.select(self.cell_selector()).collect();
            if cells.len() < 5 {
                return Err(FreenomError::Parse {
                    what: "renewal row cells",
                });
            }

            let name = element_text(&cells[0]);
            let status = element_text(&cells[1]);

            let remaining_cell =
                first_element_child(&cells[2]).ok_or(FreenomError::Parse {
                    what: "remaining time element",
                })?;
            let color = if has_class(&remaining_cell, "textred") {
                DomainColor::Red
            } else if has_class(&remaining_cell, "textgreen") {
                DomainColor::Green
            } else {
                DomainColor::Unknown
            };
            let remaining_text = element_text(&remaining_cell);
            let remaining = self
                .days_regex()
                .captures(&remaining_text)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<u64>().ok())
                .and_then(days)
                .ok_or(FreenomError::Parse {
                    what: "remaining day count",
                })?;

            let message_cell = first_element_child(&cells[3]).ok_or(FreenomError::Parse {
                what: "status message element",
            })?;
            let message = element_text(&message_cell);

            let link = first_element_child(&cells[4]).ok_or(FreenomError::Parse {
                what: "renewal link element",
            })?;
            let href = link.value().attr("href").ok_or(FreenomError::Parse {
                what: "renewal link target",
            })?;
            // The action link omits the scheme; Freenom serves everything
            // over https.
            let renewal_url =
                Url::parse(&format!("https://{href}")).map_err(|_| FreenomError::Parse {
                    what: "renewal link target",
                })?;
            let id = renewal_url
                .query_pairs()
                .find(|(key, _)| key.as_ref() == "domain")
                .and_then(|(_, value)| value.parse().ok())
                .ok_or(FreenomError::Parse {
                    what: "domain identifier",
                })?;

            renewals.push(RenewalDomain {
                name,
                id,
                renewal_url,
                status,
                remaining,
                message,
                color,
            });
        }

        Ok(renewals)
    }

    /// Extract the order number from a renewal confirmation page
    ///
    /// The number is the token after the last space of the first emphasized
    /// text element, e.g. `<strong>Your order number is 12345</strong>`.
    pub fn order_number(&self, html: &str) -> Result<u64, FreenomError> {
        let document = Html::parse_document(html);
        let emphasis = document
            .select(self.strong_selector())
            .next()
            .ok_or(FreenomError::Parse {
                what: "order confirmation",
            })?;

        let text: String = emphasis.text().collect();
        text.trim()
            .rsplit(' ')
            .next()
            .and_then(|raw| raw.parse().ok())
            .ok_or(FreenomError::Parse {
                what: "order number",
            })
    }
}

/// Read the current value attribute of a uniquely identified input
fn input_value(
    document: &Html,
    selector: &Selector,
    what: &'static str,
) -> Result<String, FreenomError> {
    document
        .select(selector)
        .next()
        .and_then(|el| el.value().attr("value"))
        .map(str::to_owned)
        .ok_or(FreenomError::Parse { what })
}

/// First element child of a node, skipping text and comment nodes
fn first_element_child<'a>(element: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    element.children().find_map(ElementRef::wrap)
}

fn has_class(element: &ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
