//! Streaming parsers for the lexicon source documents.
//!
//! Two independently structured XML resources feed the dictionary: the
//! primary lexical index (headwords, pos tags, definitions and
//! cross-references) and a secondary index carrying gender-bearing pos
//! annotations keyed by cross-reference id. Both parsers stream through
//! quick-xml and restrict themselves to a single language section.
//!
//! Error policy: a malformed document or an absent language section is
//! fatal. Everything below that (missing sub-elements, unresolvable
//! cross-references, empty derived keys) is logged, tallied in the
//! returned report, and never aborts the build.

pub mod lexical_index;
pub mod xref_index;

pub use lexical_index::{parse_lexical_index, BuildReport};
pub use xref_index::{parse_xref_index, XrefEntry, XrefIndex};

use quick_xml::events::BytesStart;
use thiserror::Error;

/// Fatal parse failures. Recoverable anomalies are logged and reported,
/// never returned as errors.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("no <part lang=\"{0}\"> section in source document")]
    MissingSection(String),
}

/// Fetch an attribute value by name, unescaped. Missing or undecodable
/// attributes read as None.
pub(crate) fn attr_value(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}
