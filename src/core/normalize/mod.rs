//! Pure parsers for locale-formatted input
//!
//! Every function returns `None` on unparseable input; callers that need an
//! error name the field themselves.

pub mod currency;
pub mod date;

pub use currency::parse_currency;
pub use date::{parse_date, parse_timestamp, parse_year};
