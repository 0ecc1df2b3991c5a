//! Secondary lexicon index: raw pos annotations keyed by cross-reference
//! id, used downstream to derive grammatical gender.

use std::collections::HashMap;
use std::io::BufRead;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{attr_value, ParseError};

/// One raw secondary-lexicon entry. Indexed even when the pos child is
/// missing; consumers handle the absence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XrefEntry {
    pub id: String,
    pub pos: Option<String>,
}

/// Mapping from cross-reference id to its secondary entry, restricted to
/// one language section of the source document.
#[derive(Debug, Default, Clone)]
pub struct XrefIndex {
    entries: HashMap<String, XrefEntry>,
    /// Ids that appeared more than once; the later occurrence won.
    pub duplicate_ids: Vec<String>,
}

impl XrefIndex {
    /// An index with no entries, for runs without a secondary lexicon.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&XrefEntry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Last write wins on duplicate ids; the displaced id is recorded.
    fn insert(&mut self, entry: XrefEntry) {
        let id = entry.id.clone();
        if self.entries.insert(id.clone(), entry).is_some() {
            warn!("duplicate id '{}' in secondary lexicon, keeping the later entry", id);
            self.duplicate_ids.push(id);
        }
    }
}

/// Parse the secondary lexicon document into an id-keyed index.
///
/// Only `<entry>` elements inside a `<part>` whose `lang` attribute
/// matches contribute. A document without any matching part is a
/// structural failure.
pub fn parse_xref_index<R: BufRead>(reader: R, lang: &str) -> Result<XrefIndex, ParseError> {
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(true);

    let mut index = XrefIndex::default();
    let mut buf = Vec::new();

    let mut saw_section = false;
    let mut in_part = false;
    let mut in_pos = false;
    let mut current_id: Option<String> = None;
    let mut current_pos: Option<String> = None;

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.name().as_ref() {
                b"part" => {
                    in_part = attr_value(e, b"lang").as_deref() == Some(lang);
                    if in_part {
                        saw_section = true;
                    }
                }
                b"entry" if in_part => {
                    current_id = attr_value(e, b"id");
                    current_pos = None;
                    if current_id.is_none() {
                        warn!("secondary lexicon entry without an id attribute, skipping");
                    }
                }
                b"pos" if in_part && current_id.is_some() => in_pos = true,
                _ => {}
            },
            Event::Empty(ref e) => match e.name().as_ref() {
                // A present-but-empty section still counts as present.
                b"part" => {
                    if attr_value(e, b"lang").as_deref() == Some(lang) {
                        saw_section = true;
                    }
                }
                // A childless <entry id=".."/> is still indexed.
                b"entry" if in_part => {
                    if let Some(id) = attr_value(e, b"id") {
                        index.insert(XrefEntry { id, pos: None });
                    }
                }
                _ => {}
            },
            Event::Text(ref t) if in_pos => {
                if let Ok(text) = t.unescape() {
                    current_pos.get_or_insert_with(String::new).push_str(&text);
                }
            }
            Event::End(ref e) => match e.name().as_ref() {
                b"part" => in_part = false,
                b"pos" => in_pos = false,
                b"entry" if in_part => {
                    if let Some(id) = current_id.take() {
                        index.insert(XrefEntry {
                            id,
                            pos: current_pos.take(),
                        });
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !saw_section {
        return Err(ParseError::MissingSection(lang.to_string()));
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexes_entries_in_matching_part() {
        let xml = r#"<index>
            <part lang="heb">
                <entry id="792b"><pos>f.</pos></entry>
                <entry id="793a"><pos>m.</pos></entry>
            </part>
        </index>"#;
        let index = parse_xref_index(xml.as_bytes(), "heb").unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.get("792b").unwrap().pos.as_deref(), Some("f."));
        assert_eq!(index.get("793a").unwrap().pos.as_deref(), Some("m."));
        assert!(index.duplicate_ids.is_empty());
    }

    #[test]
    fn test_other_language_parts_excluded() {
        let xml = r#"<index>
            <part lang="arc"><entry id="a1"><pos>m.</pos></entry></part>
            <part lang="heb"><entry id="h1"><pos>f.</pos></entry></part>
        </index>"#;
        let index = parse_xref_index(xml.as_bytes(), "heb").unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.get("a1").is_none());
        assert!(index.get("h1").is_some());
    }

    #[test]
    fn test_duplicate_id_keeps_later_payload() {
        let xml = r#"<index>
            <part lang="heb">
                <entry id="792b"><pos>m.</pos></entry>
                <entry id="792b"><pos>f.</pos></entry>
            </part>
        </index>"#;
        let index = parse_xref_index(xml.as_bytes(), "heb").unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("792b").unwrap().pos.as_deref(), Some("f."));
        assert_eq!(index.duplicate_ids, vec!["792b".to_string()]);
    }

    #[test]
    fn test_entry_without_pos_still_indexed() {
        let xml = r#"<index>
            <part lang="heb">
                <entry id="900"></entry>
                <entry id="901"/>
            </part>
        </index>"#;
        let index = parse_xref_index(xml.as_bytes(), "heb").unwrap();
        assert_eq!(index.len(), 2);
        assert!(index.get("900").unwrap().pos.is_none());
        assert!(index.get("901").unwrap().pos.is_none());
    }

    #[test]
    fn test_missing_language_section_is_fatal() {
        let xml = r#"<index><part lang="arc"><entry id="a"><pos>m.</pos></entry></part></index>"#;
        let err = parse_xref_index(xml.as_bytes(), "heb").unwrap_err();
        assert!(matches!(err, ParseError::MissingSection(lang) if lang == "heb"));
    }

    #[test]
    fn test_malformed_document_is_fatal() {
        let xml = r#"<index><part lang="heb"><entry id="1"><pos>f.</pos></index>"#;
        assert!(parse_xref_index(xml.as_bytes(), "heb").is_err());
    }
}
