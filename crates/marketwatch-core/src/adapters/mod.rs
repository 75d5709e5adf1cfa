//! Quote provider adapters.
//!
//! | Adapter | Backing data |
//! |---------|--------------|
//! | [`YahooProvider`] | Yahoo Finance chart + quote endpoints |
//! | [`SyntheticProvider`] | Deterministic offline series |

mod synthetic;
mod yahoo;

pub use synthetic::SyntheticProvider;
pub use yahoo::{YahooProvider, YahooSession};
