//! Property tests for frontmatter extraction and the default parser.

use proptest::prelude::*;

use rulesets::parser::{extract_frontmatter, parse_frontmatter, FrontmatterParser};
use rulesets::Source;

fn small_line() -> impl Strategy<Value = String> {
    // Printable and short; never exactly a delimiter line.
    proptest::string::string_regex("[A-Za-z0-9 _:#\\-]{0,40}")
        .unwrap()
        .prop_filter("not a delimiter", |s| s.trim() != "---")
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 96,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: header and body split the content without losing a byte.
    #[test]
    fn property_extract_frontmatter_is_lossless(
        yaml_lines in proptest::collection::vec(small_line(), 0..=8),
        body_lines in proptest::collection::vec(small_line(), 0..=12),
    ) {
        let mut content = String::from("---\n");
        for line in &yaml_lines {
            content.push_str(line);
            content.push('\n');
        }
        content.push_str("---\n");
        content.push_str(&body_lines.join("\n"));

        let extracted = extract_frontmatter(&content)
            .expect("constructed content has closed frontmatter");

        prop_assert_eq!(format!("{}{}", extracted.header, extracted.body), content.clone());
        prop_assert_eq!(extracted.yaml.lines().count(), yaml_lines.len());
        prop_assert_eq!(extracted.body, body_lines.join("\n"));
        prop_assert_eq!(extracted.end_line, 2 + yaml_lines.len());
    }

    /// PROPERTY: `parse_frontmatter` never panics on arbitrary small YAML input.
    #[test]
    fn property_parse_frontmatter_never_panics(yaml in "(?s).{0,256}") {
        let _ = parse_frontmatter(&yaml);
    }

    /// PROPERTY: the default parser keeps the body verbatim and never panics.
    #[test]
    fn property_parser_never_panics(content in "(?s).{0,256}") {
        let document = FrontmatterParser.parse_source(&Source::new("prop", content.clone()));
        prop_assert!(content.ends_with(&document.ast.body));
    }
}
