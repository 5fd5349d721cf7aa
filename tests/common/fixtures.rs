//! Shared source documents.

/// Plain Markdown rule, no templating
pub const PLAIN_RULE: &str = r#"---
description: Coding style
---
# Style

Prefer small functions.
"#;

/// Rule that pulls in the `header` partial
pub const PARTIAL_RULE: &str = r#"---
description: Uses a partial
rule:
  template: true
---
{{> header}}
Body for {{provider.id}}.
"#;

/// Rule with two sections sharing a heading, rendered as XML for cursor
pub const DUPLICATE_HEADINGS_RULE: &str = r#"---
cursor:
  outputFormat: xml
---
Intro.

## Testing
Write tests first.

## Testing
Keep them fast.
"#;
