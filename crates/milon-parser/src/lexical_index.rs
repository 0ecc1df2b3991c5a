//! Primary dictionary builder: streams the lexical index document into a
//! `Dictionary` keyed by vowel-stripped headword.
//!
//! Per entry in the language section, the builder:
//! 1. Extracts id, headword (with transliteration), pos, definition and
//!    the optional cross-reference.
//! 2. Warns about each absent sub-element; the entry proceeds with the
//!    field unset.
//! 3. Derives gender from the cross-referenced secondary entry's pos
//!    annotation when the reference resolves.
//! 4. Seals the entry and inserts it under its normalized key, dropping
//!    only entries whose derived key is empty.

use std::io::BufRead;

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, error, info, warn};

use milon_core::{classify_gender, Dictionary, GenderSignal, LexicalEntry};

use crate::xref_index::XrefIndex;
use crate::{attr_value, ParseError};

/// Anomaly tally for one build. Every event here was already logged as it
/// happened; the report keeps the same events observable as data.
#[derive(Debug, Default, Clone)]
pub struct BuildReport {
    /// Entries seen in the language section.
    pub entries_scanned: usize,
    /// Entries that made it into the dictionary.
    pub entries_indexed: usize,
    /// Distinct normalized keys produced.
    pub distinct_keys: usize,
    /// Entry ids dropped because the derived key was empty.
    pub dropped_empty_key: Vec<String>,
    /// Entry ids retained with one or more absent source fields.
    pub incomplete: Vec<String>,
    /// Entry ids whose cross-reference was absent from the secondary index.
    pub unresolved_xrefs: Vec<String>,
    /// Entry ids whose secondary pos carried both gender signals.
    pub ambiguous_gender: Vec<String>,
}

/// Raw sub-element state collected while walking one `<entry>` subtree.
#[derive(Debug, Default)]
struct RawEntry {
    id: String,
    surface: Option<String>,
    xlit: Option<String>,
    pos: Option<String>,
    def: Option<String>,
    xref: Option<String>,
}

/// Parse the primary lexicon document into a dictionary, cross-referencing
/// `xrefs` for gender derivation.
///
/// Only a malformed document or an absent language section fails the
/// build; every per-entry anomaly is tallied in the report instead.
pub fn parse_lexical_index<R: BufRead>(
    reader: R,
    lang: &str,
    xrefs: &XrefIndex,
) -> Result<(Dictionary, BuildReport), ParseError> {
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(true);

    let mut dictionary = Dictionary::new();
    let mut report = BuildReport::default();
    let mut buf = Vec::new();

    let mut saw_section = false;
    let mut in_part = false;
    let mut current: Option<RawEntry> = None;
    // Which child element text is currently being read.
    let mut in_w = false;
    let mut in_pos = false;
    let mut in_def = false;

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
                    let id = attr_value(e, b"id").unwrap_or_default();
                    if id.is_empty() {
                        warn!("lexicon entry without an id attribute");
                    }
                    current = Some(RawEntry {
                        id,
                        ..RawEntry::default()
                    });
                }
                b"w" => {
                    if let Some(entry) = current.as_mut() {
                        entry.surface = Some(String::new());
                        entry.xlit = attr_value(e, b"xlit");
                        in_w = true;
                    }
                }
                b"pos" => {
                    if let Some(entry) = current.as_mut() {
                        entry.pos = Some(String::new());
                        in_pos = true;
                    }
                }
                b"def" => {
                    if let Some(entry) = current.as_mut() {
                        entry.def = Some(String::new());
                        in_def = true;
                    }
                }
                b"xref" => {
                    if let Some(entry) = current.as_mut() {
                        entry.xref = attr_value(e, b"twot");
                    }
                }
                _ => {}
            },
            Event::Empty(ref e) => match e.name().as_ref() {
                b"part" => {
                    if attr_value(e, b"lang").as_deref() == Some(lang) {
                        saw_section = true;
                    }
                }
                // A childless entry scans as all-fields-missing and is
                // dropped for lack of a key.
                b"entry" if in_part => {
                    let id = attr_value(e, b"id").unwrap_or_default();
                    report.entries_scanned += 1;
                    finish_entry(
                        RawEntry {
                            id,
                            ..RawEntry::default()
                        },
                        xrefs,
                        &mut dictionary,
                        &mut report,
                    );
                }
                // The cross-reference is usually a childless element.
                b"xref" => {
                    if let Some(entry) = current.as_mut() {
                        entry.xref = attr_value(e, b"twot");
                    }
                }
                _ => {}
            },
            Event::Text(ref t) => {
                if let Some(entry) = current.as_mut() {
                    if let Ok(text) = t.unescape() {
                        if in_w {
                            entry.surface.get_or_insert_with(String::new).push_str(&text);
                        } else if in_pos {
                            entry.pos.get_or_insert_with(String::new).push_str(&text);
                        } else if in_def {
                            entry.def.get_or_insert_with(String::new).push_str(&text);
                        }
                    }
                }
            }
            Event::End(ref e) => match e.name().as_ref() {
                b"part" => in_part = false,
                b"w" => in_w = false,
                b"pos" => in_pos = false,
                b"def" => in_def = false,
                b"entry" => {
                    if let Some(raw) = current.take() {
                        report.entries_scanned += 1;
                        finish_entry(raw, xrefs, &mut dictionary, &mut report);
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

    report.distinct_keys = dictionary.distinct_keys();
    info!(
        "scanned {} lexicon entries into {} distinct keys",
        report.entries_scanned, report.distinct_keys
    );
    Ok((dictionary, report))
}

/// Turn one raw entry into a sealed `LexicalEntry` and insert it.
fn finish_entry(raw: RawEntry, xrefs: &XrefIndex, dictionary: &mut Dictionary, report: &mut BuildReport) {
    let mut builder = LexicalEntry::builder(raw.id.as_str());
    if let Some(surface) = raw.surface {
        builder = builder.headword(surface);
    }
    if let Some(xlit) = raw.xlit {
        builder = builder.pronunciation(xlit);
    }
    if let Some(pos) = raw.pos {
        builder = builder.pos(pos);
    }
    if let Some(def) = raw.def {
        builder = builder.gloss(&def);
    }

    for field in builder.missing_fields() {
        warn!(
            "could not find {} for dictionary entry with id '{}'",
            field.as_str(),
            raw.id
        );
    }

    // Gender comes from the cross-referenced secondary entry, when the
    // reference resolves at all.
    if let Some(xref_id) = raw.xref.as_deref() {
        match xrefs.get(xref_id) {
            Some(secondary) => {
                let signal = secondary
                    .pos
                    .as_deref()
                    .map(classify_gender)
                    .unwrap_or(GenderSignal::Unknown);
                if signal == GenderSignal::Ambiguous {
                    error!(
                        "ambiguous gender signal '{}' on cross-reference '{}' for entry '{}'",
                        secondary.pos.as_deref().unwrap_or(""),
                        xref_id,
                        raw.id
                    );
                    report.ambiguous_gender.push(raw.id.clone());
                }
                builder = builder.gender(signal.resolve());
            }
            None => {
                debug!(
                    "cross-reference '{}' for entry '{}' not present in secondary index",
                    xref_id, raw.id
                );
                report.unresolved_xrefs.push(raw.id.clone());
            }
        }
    }

    let entry = builder.build();
    if !entry.is_complete() {
        report.incomplete.push(raw.id.clone());
    }
    if dictionary.insert(entry) {
        report.entries_indexed += 1;
    } else {
        error!("entry '{}' produced an empty normalized key, dropping it", raw.id);
        report.dropped_empty_key.push(raw.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xref_index::parse_xref_index;
    use milon_core::Gender;

    const SECONDARY: &str = r#"<index>
        <part lang="heb">
            <entry id="792b"><pos>f.</pos></entry>
            <entry id="793a"><pos>m.</pos></entry>
            <entry id="794x"><pos>m.f</pos></entry>
            <entry id="795d"><pos>du.</pos></entry>
        </part>
    </index>"#;

    fn secondary() -> XrefIndex {
        parse_xref_index(SECONDARY.as_bytes(), "heb").unwrap()
    }

    #[test]
    fn test_end_to_end_entry_with_female_xref() {
        let xml = r#"<index>
            <part lang="heb">
                <entry id="t1">
                    <w xlit="tohorah">טָהֳרָה</w>
                    <pos>n</pos>
                    <def>Purity</def>
                    <xref twot="792b"/>
                </entry>
            </part>
        </index>"#;
        let (dict, report) = parse_lexical_index(xml.as_bytes(), "heb", &secondary()).unwrap();

        let candidates = dict.candidates("טהרה").expect("vowel-stripped key present");
        assert_eq!(candidates.len(), 1);
        let entry = &candidates[0];
        assert_eq!(entry.surface.as_deref(), Some("טָהֳרָה"));
        assert_eq!(entry.pronunciation.as_deref(), Some("tohorah"));
        assert_eq!(entry.pos.as_deref(), Some("n"));
        assert_eq!(entry.gloss.as_deref(), Some("purity"));
        assert_eq!(entry.gender, Some(Gender::Female));
        assert!(entry.is_complete());

        assert_eq!(report.entries_scanned, 1);
        assert_eq!(report.entries_indexed, 1);
        assert_eq!(report.distinct_keys, 1);
        assert!(report.incomplete.is_empty());
    }

    #[test]
    fn test_missing_subelements_retained_as_incomplete() {
        let xml = r#"<index>
            <part lang="heb">
                <entry id="t2">
                    <w xlit="tov">טוֹב</w>
                </entry>
            </part>
        </index>"#;
        let (dict, report) = parse_lexical_index(xml.as_bytes(), "heb", &XrefIndex::empty()).unwrap();

        let entry = &dict.candidates("טוב").unwrap()[0];
        assert!(entry.pos.is_none());
        assert!(entry.gloss.is_none());
        assert_eq!(report.incomplete, vec!["t2".to_string()]);
        assert_eq!(report.entries_indexed, 1);
    }

    #[test]
    fn test_empty_normalized_key_drops_entry() {
        // The second headword is nothing but vowel points.
        let xml = r#"<index>
            <part lang="heb">
                <entry id="k1"><w xlit="a">אָב</w><pos>n</pos><def>father</def></entry>
                <entry id="k2"><w xlit="x">&#x5b8;&#x5b9;</w><pos>n</pos><def>ghost</def></entry>
            </part>
        </index>"#;
        let (dict, report) = parse_lexical_index(xml.as_bytes(), "heb", &XrefIndex::empty()).unwrap();

        assert_eq!(report.entries_scanned, 2);
        assert_eq!(report.entries_indexed, 1);
        assert_eq!(report.dropped_empty_key, vec!["k2".to_string()]);
        assert!(dict.candidates("אב").is_some());
    }

    #[test]
    fn test_gender_derivation_table() {
        let xml = r#"<index>
            <part lang="heb">
                <entry id="m"><w xlit="a">אָב</w><pos>n</pos><def>father</def><xref twot="793a"/></entry>
                <entry id="f"><w xlit="b">אֵם</w><pos>n</pos><def>mother</def><xref twot="792b"/></entry>
                <entry id="amb"><w xlit="c">דֶּרֶךְ</w><pos>n</pos><def>way</def><xref twot="794x"/></entry>
                <entry id="du"><w xlit="d">יָד</w><pos>n</pos><def>hand</def><xref twot="795d"/></entry>
                <entry id="none"><w xlit="e">לֵב</w><pos>n</pos><def>heart</def></entry>
            </part>
        </index>"#;
        let (dict, report) = parse_lexical_index(xml.as_bytes(), "heb", &secondary()).unwrap();

        let gender_of = |key: &str| dict.candidates(key).unwrap()[0].gender;
        assert_eq!(gender_of("אב"), Some(Gender::Male));
        assert_eq!(gender_of("אם"), Some(Gender::Female));
        assert_eq!(gender_of("דרך"), Some(Gender::Unknown));
        assert_eq!(gender_of("יד"), Some(Gender::Unknown));
        assert_eq!(gender_of("לב"), None);

        // Only the both-signals string is reported as ambiguous.
        assert_eq!(report.ambiguous_gender, vec!["amb".to_string()]);
        assert!(report.unresolved_xrefs.is_empty());
    }

    #[test]
    fn test_unresolved_xref_leaves_gender_unset() {
        let xml = r#"<index>
            <part lang="heb">
                <entry id="u1"><w xlit="a">אָב</w><pos>n</pos><def>father</def><xref twot="nope"/></entry>
            </part>
        </index>"#;
        let (dict, report) = parse_lexical_index(xml.as_bytes(), "heb", &secondary()).unwrap();

        assert_eq!(dict.candidates("אב").unwrap()[0].gender, None);
        assert_eq!(report.unresolved_xrefs, vec!["u1".to_string()]);
        assert_eq!(report.entries_indexed, 1);
    }

    #[test]
    fn test_shared_key_preserves_document_order() {
        let xml = r#"<index>
            <part lang="heb">
                <entry id="n1"><w xlit="tohorah">טָהֳרָה</w><pos>n</pos><def>purity</def></entry>
                <entry id="a1"><w xlit="teharah">טְהָרָה</w><pos>a</pos><def>pure</def></entry>
            </part>
        </index>"#;
        let (dict, _) = parse_lexical_index(xml.as_bytes(), "heb", &XrefIndex::empty()).unwrap();

        let candidates = dict.candidates("טהרה").unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].id, "n1");
        assert_eq!(candidates[1].id, "a1");
    }

    #[test]
    fn test_build_is_deterministic() {
        let xml = r#"<index>
            <part lang="heb">
                <entry id="n1"><w xlit="tohorah">טָהֳרָה</w><pos>n</pos><def>purity</def></entry>
                <entry id="a1"><w xlit="teharah">טְהָרָה</w><pos>a</pos><def>pure</def></entry>
                <entry id="b1"><w xlit="bayit">בַּיִת</w><pos>n</pos><def>house</def></entry>
            </part>
        </index>"#;
        let (first, _) = parse_lexical_index(xml.as_bytes(), "heb", &XrefIndex::empty()).unwrap();
        let (second, _) = parse_lexical_index(xml.as_bytes(), "heb", &XrefIndex::empty()).unwrap();

        let mut first_keys: Vec<&str> = first.keys().collect();
        let mut second_keys: Vec<&str> = second.keys().collect();
        first_keys.sort_unstable();
        second_keys.sort_unstable();
        assert_eq!(first_keys, second_keys);

        for key in first_keys {
            let first_ids: Vec<&str> = first.candidates(key).unwrap().iter().map(|e| e.id.as_str()).collect();
            let second_ids: Vec<&str> = second.candidates(key).unwrap().iter().map(|e| e.id.as_str()).collect();
            assert_eq!(first_ids, second_ids);
        }
    }

    #[test]
    fn test_entries_outside_language_section_ignored() {
        let xml = r#"<index>
            <part lang="arc">
                <entry id="x"><w xlit="a">אַרְיֵה</w><pos>n</pos><def>lion</def></entry>
            </part>
            <part lang="heb">
                <entry id="y"><w xlit="b">אָב</w><pos>n</pos><def>father</def></entry>
            </part>
        </index>"#;
        let (dict, report) = parse_lexical_index(xml.as_bytes(), "heb", &XrefIndex::empty()).unwrap();
        assert_eq!(report.entries_scanned, 1);
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn test_missing_language_section_is_fatal() {
        let xml = r#"<index><part lang="arc"></part></index>"#;
        let err = parse_lexical_index(xml.as_bytes(), "heb", &XrefIndex::empty()).unwrap_err();
        assert!(matches!(err, ParseError::MissingSection(lang) if lang == "heb"));
    }
}
