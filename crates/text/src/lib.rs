//! Vietnamese text processing for voucher discovery
//!
//! Features:
//! - Canonical normalization with a diacritic-stripped secondary form
//! - Query parsing into intent, location, service, audience, price
//! - Location registry with region and neighbor metadata
//! - Curated Vietnamese lexicons for intents and service cues

pub mod lexicon;
pub mod locations;
pub mod normalizer;
pub mod parser;

pub use locations::{LocationMatch, LocationRegistry, LocationRow};
pub use normalizer::{fold_tokens, normalize, strip_diacritics, NormalizedText};
pub use parser::QueryParser;
