//! Parsers for the documents inside a filing.
//!
//! Everything here works on content already in memory; pair it with
//! [`FilingOperations`](crate::FilingOperations) to fetch the documents.
//!
//! - [`ownership`]: Forms 3, 4 and 5 (XML)
//! - [`items`]: item segmentation for 10-K, 10-Q and 8-K
//! - [`financial`]: statement line items, risk factors and MD&A from 10-K / 10-Q text
//! - [`events`]: 8-K event details
//! - [`header`]: SGML submission headers and shared value parsers
//! - [`xml`]: the element tree used by the ownership parser

pub mod events;
pub mod financial;
pub mod header;
pub mod items;
pub mod ownership;
pub mod xml;

pub use events::{CurrentEventParser, ParsedCurrentEvent};
pub use financial::{FinancialFormParser, ParsedFinancialForm};
pub use header::{FilingHeader, Severity};
pub use items::{ExtractedItem, FormType, ItemExtractor};
pub use ownership::{
    Form4Parser, Form5Parser, OwnershipFormParser, OwnershipParseOptions, ParsedOwnershipForm,
};
