//! Payment code extraction for cobrador.
//!
//! Two sources of machine-payable codes:
//!
//! - [`InvoiceScraper`] reads the PIX copy-and-paste code out of a charge's
//!   invoice preview page.
//! - [`DocumentCodeExtractor`] asks a document-understanding model for the
//!   digitable line, amount and due date of a boleto file.

pub mod error;
pub mod extractor;
pub mod pix_scraper;

pub use error::{ExtractError, ExtractResult};
pub use extractor::{parse_answer, DocumentCodeExtractor, EXTRACTION_PROMPT};
pub use pix_scraper::{find_pix_code, InvoiceScraper};
