//! Property tests for XML tag derivation and CDATA wrapping.

use proptest::prelude::*;

use rulesets::renderer::xml::{cdata, derive_tag, is_valid_tag, markdown_to_xml, XmlOptions};

/// Undo `cdata`: concatenate the payload of every CDATA run
fn unwrap_cdata(wrapped: &str) -> String {
    let mut out = String::new();
    let mut rest = wrapped;
    while let Some(start) = rest.find("<![CDATA[") {
        let payload = &rest[start + "<![CDATA[".len()..];
        let end = payload.find("]]>").expect("unterminated CDATA run");
        out.push_str(&payload[..end]);
        rest = &payload[end + "]]>".len()..];
    }
    out
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: derived tags only use `[a-z0-9_]` with no edge or doubled underscores.
    #[test]
    fn property_derived_tags_are_normalized(heading in "\\PC{0,40}") {
        let tag = derive_tag(&heading);
        prop_assert!(tag.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
        prop_assert!(!tag.starts_with('_'));
        prop_assert!(!tag.ends_with('_'));
        prop_assert!(!tag.contains("__"));
    }

    /// PROPERTY: derivation is idempotent on its own output.
    #[test]
    fn property_derive_tag_is_idempotent(heading in "\\PC{0,40}") {
        let tag = derive_tag(&heading);
        prop_assert_eq!(derive_tag(&tag), tag);
    }

    /// PROPERTY: CDATA wrapping round-trips any text, `]]>` included.
    #[test]
    fn property_cdata_round_trips(text in "(\\PC|\\]\\]>){0,64}") {
        let wrapped = cdata(&text);
        prop_assert_eq!(unwrap_cdata(&wrapped), text);
    }

    /// PROPERTY: every emitted section tag is a valid, unique XML name.
    #[test]
    fn property_section_tags_are_valid_and_unique(
        headings in proptest::collection::vec("[A-Za-z0-9 ]{0,12}", 1..8),
    ) {
        let markdown: String = headings
            .iter()
            .map(|heading| format!("## {heading}\ncontent\n"))
            .collect();
        let options = XmlOptions { declaration: false, ..XmlOptions::default() };
        let xml = markdown_to_xml(&markdown, &options).contents;

        let tags: Vec<&str> = xml
            .lines()
            .filter_map(|line| line.strip_prefix("  <"))
            .filter_map(|rest| rest.split('>').next())
            .collect();
        prop_assert_eq!(tags.len(), headings.len());
        for tag in &tags {
            prop_assert!(is_valid_tag(tag), "invalid tag {}", tag);
        }
        let mut unique = tags.clone();
        unique.sort_unstable();
        unique.dedup();
        prop_assert_eq!(unique.len(), tags.len());
    }
}
