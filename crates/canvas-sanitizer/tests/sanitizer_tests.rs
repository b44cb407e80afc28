//! End-to-end sanitizer behaviour: pass ordering, profiles, configuration,
//! reporting and idempotence.

use canvas_sanitizer::{
    census, passes, sanitize, DeclCensus, Fix, ImportedName, Profile, SanitizeWarning, Sanitizer,
    SanitizerConfig,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn entry(text: &str) -> canvas_sanitizer::Sanitized {
    sanitize(text, Profile::Entry)
}

fn fix_names(fixes: &[Fix]) -> Vec<String> {
    fixes
        .iter()
        .map(|f| {
            serde_json::to_value(f).expect("serialize")["fix"]
                .as_str()
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}

const FENCED_COUNTER: &str = r#"```tsx
import React, { useState } from "react";

export default function App() {
  const [count, setCount] = useState(0);
  return <button onClick={() => setCount(count + 1)}>Clicked {count}</button>;
}
```

This component renders a counter button.
"#;

const SIBLING_HELPERS: &str = r#"import { cn } from "@/lib/utils";

function Avatar({ name }) {
  return <span className={cn("avatar")}>{name[0]}</span>;
}

const Greeting = ({ name }) => <h1>Hello, {name}</h1>;

export default function Profile() {
  return (
    <div>
      <Avatar name="Ada" />
      <Greeting name="Ada" />
    </div>
  );
}
"#;

// ─────────────────────────────────────────────────────────────────────
// Scenarios
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_fenced_entry_with_trailing_sentence() {
    let out = entry(FENCED_COUNTER);
    assert_eq!(
        out.text,
        "\nexport default function App() {\n  const [count, setCount] = useState(0);\n  return <button onClick={() => setCount(count + 1)}>Clicked {count}</button>;\n}\n"
    );
    assert_eq!(
        fix_names(&out.fixes),
        vec!["stripped_fences", "removed_imports", "removed_trailing_prose"]
    );
    assert!(out.warnings.is_empty());

    let bindings: Vec<(&str, &ImportedName, &str)> = out
        .external_bindings
        .iter()
        .map(|b| (b.local.as_str(), &b.imported, b.source.as_str()))
        .collect();
    assert_eq!(
        bindings,
        vec![
            ("React", &ImportedName::Default, "react"),
            ("useState", &ImportedName::Named("useState".into()), "react"),
        ]
    );
}

#[test]
fn test_prose_on_the_closing_line_is_removed() {
    let out = entry("export default function App() {\n  return <p>ok</p>;\n} This is the component you asked for.\n");
    assert_eq!(out.text, "export default function App() {\n  return <p>ok</p>;\n}\n");
    assert_eq!(fix_names(&out.fixes), vec!["removed_trailing_prose"]);
}

#[test]
fn test_sibling_helpers_are_nested_in_order() {
    let out = entry(SIBLING_HELPERS);
    assert_eq!(
        out.fixes,
        vec![Fix::NestedHelpers {
            names: vec!["Avatar".into(), "Greeting".into()]
        }]
    );

    let body = out
        .text
        .find("export default function Profile() {")
        .expect("main export kept");
    let avatar = out.text.find("function Avatar").expect("Avatar kept");
    let greeting = out.text.find("const Greeting").expect("Greeting kept");
    assert!(body < avatar && avatar < greeting);
    assert!(out.text.starts_with("import { cn } from \"@/lib/utils\";"));

    let after = census(&out.text);
    assert_eq!(after, DeclCensus { total: 3, top_level: 1 });
}

// ─────────────────────────────────────────────────────────────────────
// Pass Interplay
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_every_pass_on_one_file() {
    let text = r#"```tsx
import { useState } from "react";
import type { Item } from "./types";

const Row = ({ item }: RowProps) => <li>{item.label}</li>;

export default function List({ items }: ListProps): JSX.Element {
  const [open, setOpen] = useState<boolean>(false);
  return <ul>{items.map((item: Item) => <Row item={item} />)}</ul>;
}

export { Row };
```

**Note:** rows are keyed by index.
"#;
    let out = entry(text);
    assert_eq!(
        fix_names(&out.fixes),
        vec![
            "stripped_fences",
            "removed_imports",
            "removed_reexports",
            "stripped_type_annotations",
            "removed_trailing_prose",
            "nested_helpers",
        ]
    );
    assert!(out.text.contains("export default function List({ items }) {"));
    assert!(out.text.contains("items.map((item) => <Row item={item} />)"));
    assert!(!out.text.contains("export { Row }"));
    assert!(!out.text.contains("Note"));
}

#[test]
fn test_module_profile_keeps_imports_and_named_exports() {
    let text = "import { cn } from \"clsx\";\nexport const Button = ({ label }: Props) => <button>{label}</button>;\nexport { Button as Primary };\n";
    let out = sanitize(text, Profile::Module);
    assert_eq!(out.text, text);
    assert!(out.is_clean());
}

#[test]
fn test_module_profile_still_strips_fences_and_prose() {
    let text = "```ts\nexport const sum = (a, b) => a + b;\n```\nThis adds two numbers together.\n";
    let out = sanitize(text, Profile::Module);
    assert_eq!(out.text, "export const sum = (a, b) => a + b;\n");
}

#[test]
fn test_clean_input_is_untouched() {
    let text = "export default function App() {\n  return <p>ok</p>;\n}\n";
    let out = entry(text);
    assert_eq!(out.text, text);
    assert!(out.is_clean());
}

#[test]
fn test_refused_type_strip_is_reported() {
    let text = "const handler: Wrapper<function> = make();\nexport default function App() { return null; }\n";
    let out = entry(text);
    assert_eq!(out.text, text);
    assert!(matches!(
        out.warnings.as_slice(),
        [SanitizeWarning::TypeStripRefused { .. }]
    ));
}

// ─────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_disabled_pass_does_not_run() {
    let config = SanitizerConfig {
        nest_helpers: false,
        ..SanitizerConfig::default()
    };
    let out = Sanitizer::new(config).run(SIBLING_HELPERS, Profile::Entry);
    assert_eq!(out.text, SIBLING_HELPERS);
}

#[test]
fn test_custom_alias_prefixes() {
    let text = "import { Card } from \"#ui/card\";\nexport default function App() { return <Card />; }\n";
    let default_out = entry(text);
    assert_eq!(default_out.external_bindings.len(), 1);

    let out = Sanitizer::default()
        .with_alias_prefixes(["#ui/"])
        .run(text, Profile::Entry);
    assert_eq!(out.text, text);
}

#[test]
fn test_config_from_json() {
    let config: SanitizerConfig =
        serde_json::from_str(r#"{ "strip_trailing_prose": false }"#).expect("valid config");
    assert!(!config.strip_trailing_prose);
    assert!(config.strip_fences);

    let err = serde_json::from_str::<SanitizerConfig>(r#"{ "strip_everything": true }"#);
    assert!(err.is_err());
}

#[test]
fn test_report_serialization() {
    let value = serde_json::to_value(Fix::RemovedImports { count: 2 }).expect("serialize");
    assert_eq!(value, serde_json::json!({ "fix": "removed_imports", "count": 2 }));

    let warning = SanitizeWarning::TypeStripRefused {
        before: DeclCensus { total: 2, top_level: 2 },
        after: DeclCensus { total: 1, top_level: 1 },
    };
    assert_eq!(
        warning.to_string(),
        "type stripping refused: declarations 2/2 became 1/1"
    );
    let value = serde_json::to_value(&warning).expect("serialize");
    assert_eq!(value["warning"], "type_strip_refused");
}

// ─────────────────────────────────────────────────────────────────────
// Determinism & Idempotence
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_sanitize_is_deterministic() {
    let first = entry(FENCED_COUNTER);
    for _ in 0..100 {
        assert_eq!(entry(FENCED_COUNTER), first);
    }
}

#[test]
fn test_scenarios_are_idempotent() {
    for text in [FENCED_COUNTER, SIBLING_HELPERS] {
        let once = entry(text).text;
        assert_eq!(entry(&once).text, once);
    }
}

const IMPORTS: &[&str] = &[
    "import React from \"react\";\n",
    "import { useState, useEffect } from \"react\";\n",
    "import { cn } from \"@/lib/utils\";\n",
    "import type { Props } from \"./types\";\n",
    "import \"./styles.css\";\n",
    "import * as Icons from \"lucide-react\";\n",
];

const DECLARATIONS: &[&str] = &[
    "function Badge({ label }: BadgeProps) {\n  return <span>{label}</span>;\n}\n",
    "const Row = ({ item }: RowProps) => <li>{item}</li>;\n",
    "const LIMIT: number = 3;\n",
    "const palette = [\"red\", \"blue\"] as const;\n",
];

const MAIN: &str = "export default function App() {\n  return <div><Badge label=\"x\" /><Row item=\"y\" /></div>;\n}\n";

const TRAILERS: &[&str] = &[
    "",
    "\nThis renders the app shell.\n",
    "\n## Notes\n- Uses hooks\n",
    "\n1. Paste into App.tsx\n",
];

fn generated_file() -> impl Strategy<Value = String> {
    (
        any::<bool>(),
        proptest::sample::subsequence(IMPORTS, 0..=IMPORTS.len()),
        proptest::sample::subsequence(DECLARATIONS, 0..=DECLARATIONS.len()),
        any::<bool>(),
        proptest::sample::select(TRAILERS),
    )
        .prop_map(|(fenced, imports, declarations, reexport, trailer)| {
            let mut text = String::new();
            if fenced {
                text.push_str("```tsx\n");
            }
            text.extend(imports);
            text.push('\n');
            text.extend(declarations);
            text.push('\n');
            text.push_str(MAIN);
            if reexport {
                text.push_str("export { Badge };\n");
            }
            if fenced {
                text.push_str("```\n");
            }
            text.push_str(trailer);
            text
        })
}

proptest! {
    #[test]
    fn prop_sanitize_is_idempotent(text in generated_file()) {
        let once = sanitize(&text, Profile::Entry).text;
        let twice = sanitize(&once, Profile::Entry).text;
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn prop_sanitize_preserves_declarations(text in generated_file()) {
        // Fences read as template literals until they are stripped.
        let unfenced = passes::strip_fences(&text).unwrap_or_else(|| text.clone());
        let before = census(&unfenced);
        let out = sanitize(&text, Profile::Entry);
        let after = census(&out.text);
        prop_assert_eq!(after.total, before.total);
    }

    #[test]
    fn prop_sanitize_never_panics_on_noise(text in "[ -~\\n]{0,200}") {
        let _ = sanitize(&text, Profile::Entry);
        let _ = sanitize(&text, Profile::Module);
    }
}
