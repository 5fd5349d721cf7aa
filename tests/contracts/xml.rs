//! XML output contracts
//!
//! Sections keep document order; repeated headings get numbered tags and a
//! warning instead of colliding.

use crate::common::*;
use rulesets::{compile, CompileOptions, DiagnosticLevel, PassthroughProvider};

mod duplicate_headings {
    use super::*;

    #[test]
    fn contract_duplicate_headings_get_numbered_tags() {
        let env = TestEnv::new();
        env.write("rules/testing.md", DUPLICATE_HEADINGS_RULE);
        let options = CompileOptions::new().with_provider(PassthroughProvider::new("cursor"));

        let output = compile(&env.input("rules/testing.md", &["cursor"]), &options).unwrap();

        insta::assert_snapshot!(output.artifacts[0].contents, @r###"
        <?xml version="1.0" encoding="UTF-8"?>
        <ruleset>
          <preamble><![CDATA[Intro.]]></preamble>
          <testing><![CDATA[Write tests first.]]></testing>
          <testing_2><![CDATA[Keep them fast.]]></testing_2>
        </ruleset>
        "###);

        let warnings: Vec<_> = output
            .diagnostics
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Warning)
            .collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("<testing_2>"));
        assert_eq!(warnings[0].tag_path(), "renderer/xml");
    }

    #[test]
    fn contract_other_providers_keep_markdown() {
        let env = TestEnv::new();
        env.write("rules/testing.md", DUPLICATE_HEADINGS_RULE);
        let options = CompileOptions::new()
            .with_provider(PassthroughProvider::new("cursor"))
            .with_provider(PassthroughProvider::new("windsurf"));

        let output = compile(
            &env.input("rules/testing.md", &["cursor", "windsurf"]),
            &options,
        )
        .unwrap();

        let windsurf: Vec<_> = output.artifacts_for("windsurf").collect();
        assert_eq!(windsurf.len(), 1);
        assert_eq!(windsurf[0].contents, DUPLICATE_HEADINGS_RULE);
    }
}
