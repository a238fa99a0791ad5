//! Candidate Enumerator.
//!
//! Produces candidates in source order without touching the source:
//! - [`listing`] - HTML listing pages (one candidate per linked element)
//! - [`sheet`] - spreadsheet rows (one candidate per filled slot)
//! - [`filters`] - keyword and recency filters applied while walking

pub mod filters;
pub mod listing;
pub mod sheet;

pub use filters::{matches_keywords, parse_marker, within_window};
pub use listing::{enumerate_listing, CompiledListing, ListingSpec};
pub use sheet::{enumerate_sheet, SheetLayout, SheetSlot, SlotColumns};
