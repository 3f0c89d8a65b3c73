//! PIX code scraping from rendered invoice preview pages.
//!
//! The preview page does not expose the code through any API, so it is read
//! out of the HTML with three heuristics tried in order:
//!
//! 1. the dedicated PIX section container,
//! 2. the paragraph right after the "Código Pix copia e cola" heading,
//! 3. any paragraph carrying the PIX key marker.
//!
//! Every candidate goes through [`PixCode::parse`], so nothing without the
//! BR-Code header is ever returned.

use std::time::Duration;

use cobrador_core::PixCode;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument, warn};

use crate::error::{ExtractError, ExtractResult};

/// Containers that hold nothing but the copy-and-paste code.
const PIX_SECTION_SELECTOR: &str = "#pix-section, .pix-section, [data-pix-section]";

/// Heading text announcing the copy-and-paste code.
const PIX_HEADING_TEXT: &str = "Código Pix copia e cola";

const HEADING_SELECTOR: &str = "h1, h2, h3, h4, h5, h6";

/// GUI identifier embedded in every PIX key payload.
const PIX_KEY_MARKER: &str = "br.gov.bcb.pix";

/// Fetches invoice preview pages and pulls the PIX code out of them.
#[derive(Debug, Clone)]
pub struct InvoiceScraper {
    http_client: Client,
}

impl InvoiceScraper {
    /// Creates a scraper whose requests are bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(timeout: Duration) -> ExtractResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent("cobrador/0.1")
            .build()
            .map_err(|e| ExtractError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http_client })
    }

    /// Create a scraper with a pre-built `reqwest::Client` (for testing).
    #[must_use]
    pub fn with_http_client(http_client: Client) -> Self {
        Self { http_client }
    }

    /// Returns the PIX code embedded in the page at `page_url`, if any.
    ///
    /// A missing code and a failed fetch both yield `None`: scraping must
    /// never abort the batch.
    #[instrument(skip(self))]
    pub async fn extract_pix_code(&self, page_url: &str) -> Option<PixCode> {
        let html = match self.fetch_page(page_url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, "Failed to fetch invoice page");
                return None;
            }
        };

        let code = find_pix_code(&html);
        if code.is_none() {
            debug!("No PIX code found on invoice page");
        }
        code
    }

    async fn fetch_page(&self, page_url: &str) -> ExtractResult<String> {
        let response = self
            .http_client
            .get(page_url)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }
}

/// Runs the three heuristics over `html` and returns the first valid code.
#[must_use]
pub fn find_pix_code(html: &str) -> Option<PixCode> {
    let document = Html::parse_document(html);

    from_pix_section(&document)
        .or_else(|| from_heading(&document))
        .or_else(|| from_marked_paragraph(&document))
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

fn from_pix_section(document: &Html) -> Option<PixCode> {
    let selector = Selector::parse(PIX_SECTION_SELECTOR).ok()?;
    document
        .select(&selector)
        .find_map(|section| PixCode::parse(&element_text(&section)))
}

fn from_heading(document: &Html) -> Option<PixCode> {
    let selector = Selector::parse(HEADING_SELECTOR).ok()?;
    document
        .select(&selector)
        .filter(|heading| element_text(heading).contains(PIX_HEADING_TEXT))
        .find_map(|heading| {
            let next = heading.next_siblings().find_map(ElementRef::wrap)?;
            if next.value().name() != "p" {
                return None;
            }
            PixCode::parse(&element_text(&next))
        })
}

fn from_marked_paragraph(document: &Html) -> Option<PixCode> {
    let selector = Selector::parse("p").ok()?;
    document.select(&selector).find_map(|paragraph| {
        let text = element_text(&paragraph);
        if text.contains(PIX_KEY_MARKER) {
            PixCode::parse(&text)
        } else {
            None
        }
    })
}
