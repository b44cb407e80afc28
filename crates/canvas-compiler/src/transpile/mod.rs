//! Transpiler: lowers one module's markup and module syntax into plain
//! calls the loader can evaluate.
//!
//! ```text
//! <b x="1">hi</b>            → __jsx("b", { x: "1" }, "hi")
//! import D from "./d"        → const D = require("/d.tsx")
//! import { a } from "react"  → const { a } = require("react", true)
//! export default App         → exports.default = App
//! ```
//!
//! The rest of the pipeline depends only on two things: the output is a
//! deterministic function of the input, and every cross-module reference
//! becomes a `require(<resolved>)` call.

mod jsx;
mod lower;

use canvas_parser::parse_source;
use canvas_sanitizer::ExternalBinding;
use canvas_types::ast::Module;
use canvas_types::SourceFile;
use tracing::instrument;

use crate::emit::emit_js;
use crate::error::TranspileError;
use crate::resolver::{Resolution, ResolvedImport, Resolver};

pub use jsx::{decode_entities, jsx_text};

/// The loader function lowered modules call.
pub const REQUIRE: &str = "require";
/// The exports container of the module being evaluated.
pub const EXPORTS: &str = "exports";
/// Element factory bound by the markup prelude.
pub const JSX_FACTORY: &str = "__jsx";
/// Fragment marker bound by the markup prelude.
pub const FRAGMENT: &str = "__Fragment";
/// The shim the markup prelude requires.
pub const JSX_RUNTIME: &str = "react/jsx-runtime";

/// Everything a transpiler needs for one module.
pub struct TranspileInput<'a> {
    pub path: &'a str,
    pub text: &'a str,
    /// Resolves a specifier written in this module.
    pub resolve: &'a dyn Fn(&str) -> Resolution,
    /// Imports the sanitizer removed; re-linked as `require` calls.
    pub external_bindings: &'a [ExternalBinding],
}

impl<'a> TranspileInput<'a> {
    pub fn new(path: &'a str, text: &'a str, resolve: &'a dyn Fn(&str) -> Resolution) -> Self {
        Self {
            path,
            text,
            resolve,
            external_bindings: &[],
        }
    }

    pub fn with_bindings(mut self, bindings: &'a [ExternalBinding]) -> Self {
        self.external_bindings = bindings;
        self
    }
}

/// A lowered module, ready for the loader.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutableModule {
    pub path: String,
    /// Plain statements: no markup, imports or exports remain.
    pub body: Module,
    /// Every import, in order of first appearance.
    pub imports: Vec<ResolvedImport>,
    /// The module contained markup and starts with the runtime prelude.
    pub uses_markup: bool,
}

impl ExecutableModule {
    /// The lowered module as JavaScript text.
    pub fn to_js(&self) -> String {
        emit_js(&self.body)
    }
}

/// Lowers source text to an [`ExecutableModule`].
pub trait Transpiler {
    fn transpile(&self, input: &TranspileInput<'_>) -> Result<ExecutableModule, TranspileError>;
}

/// The built-in transpiler: workspace lexer, parser, then lowering.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsxTranspiler;

impl Transpiler for JsxTranspiler {
    #[instrument(level = "debug", skip_all, fields(path = input.path))]
    fn transpile(&self, input: &TranspileInput<'_>) -> Result<ExecutableModule, TranspileError> {
        let file = SourceFile::new(input.path, input.text);
        let parsed = parse_source(&file);
        let Some(module) = parsed.module else {
            return Err(TranspileError::from_diagnostics(input.path, &parsed.errors));
        };
        let lowerer = lower::Lowerer::new(input.path, input.resolve);
        Ok(lowerer.lower_module(module, input.external_bindings))
    }
}

/// Transpile a lone file. Package imports resolve to shims; project
/// imports keep their specifier.
pub fn transpile(text: &str, path: &str) -> Result<ExecutableModule, TranspileError> {
    let resolver = Resolver::default();
    let no_files: &[&str] = &[];
    let resolve = |specifier: &str| resolver.resolve(path, specifier, no_files);
    JsxTranspiler.transpile(&TranspileInput::new(path, text, &resolve))
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas_sanitizer::ImportedName;
    use pretty_assertions::assert_eq;

    fn project_resolve(specifier: &str) -> Resolution {
        let files: &[&str] = &["/App.tsx", "/Child.tsx", "/lib/math.ts"];
        Resolver::default().resolve("/App.tsx", specifier, files)
    }

    fn lower(text: &str) -> ExecutableModule {
        JsxTranspiler
            .transpile(&TranspileInput::new("/App.tsx", text, &project_resolve))
            .expect("transpiles")
    }

    const PRELUDE: &str =
        "const { jsx: __jsx, Fragment: __Fragment } = require(\"react/jsx-runtime\", true);\n";

    #[test]
    fn test_markup_lowering() {
        let module = lower("export default function App() {\n  return <div className=\"a\"><Child n={1} />text</div>;\n}\n");
        assert!(module.uses_markup);
        assert_eq!(
            module.to_js(),
            format!(
                "{PRELUDE}exports.default = App;\nfunction App() {{\n  return __jsx(\"div\", {{ className: \"a\" }}, __jsx(Child, {{ n: 1 }}), \"text\");\n}}\n"
            )
        );
    }

    #[test]
    fn test_fragment_and_spread() {
        let module = lower("const e = <><b {...p} hidden>x</b></>;");
        assert_eq!(
            module.to_js(),
            format!("{PRELUDE}const e = __jsx(__Fragment, null, __jsx(\"b\", {{ ...p, hidden: true }}, \"x\"));\n")
        );
    }

    #[test]
    fn test_imports_become_requires() {
        let module = lower(
            "import Child from \"./Child\";\nimport { add, sub as minus } from \"./lib/math\";\nimport * as R from \"react\";\nimport type { T } from \"./types\";\n",
        );
        assert_eq!(
            module.to_js(),
            "const Child = require(\"/Child.tsx\");\nconst { add, sub: minus } = require(\"/lib/math.ts\", true);\nconst R = require(\"react\", true);\n"
        );
        let specifiers: Vec<&str> = module.imports.iter().map(|i| i.specifier.as_str()).collect();
        assert_eq!(specifiers, vec!["./Child", "./lib/math", "react"]);
    }

    #[test]
    fn test_stylesheets_vanish() {
        let module = lower("import \"./styles.css\";\nconst a = 1;\n");
        assert_eq!(module.to_js(), "const a = 1;\n");
        assert!(module.imports.is_empty());
    }

    #[test]
    fn test_unresolved_import_is_recorded() {
        let module = lower("import Missing from \"./Missing\";\n");
        assert_eq!(module.imports[0].resolution, Resolution::Unresolved);
        assert_eq!(module.to_js(), "const Missing = require(\"./Missing\");\n");
    }

    #[test]
    fn test_named_exports() {
        let module = lower(
            "export const a = 1, { b } = o;\nexport function f() {}\nexport { a as c };\n",
        );
        assert_eq!(
            module.to_js(),
            "exports.f = f;\nconst a = 1, { b } = o;\nexports.a = a;\nexports.b = b;\nfunction f() {}\nexports.c = a;\n"
        );
    }

    #[test]
    fn test_anonymous_default_export() {
        let module = lower("export default () => null;");
        assert_eq!(module.to_js(), "exports.default = () => null;\n");
        let module = lower("export default function () { return 1; }");
        assert_eq!(
            module.to_js(),
            "exports.default = function() {\n  return 1;\n};\n"
        );
    }

    #[test]
    fn test_reexports() {
        let module = lower("export { add as plus } from \"./lib/math\";\nexport * as M from \"./lib/math\";\n");
        assert_eq!(
            module.to_js(),
            "const __reexport0 = require(\"/lib/math.ts\", true);\nexports.plus = __reexport0.add;\nexports.M = require(\"/lib/math.ts\", true);\n"
        );
        assert_eq!(module.imports.len(), 1);
    }

    #[test]
    fn test_export_star_copies_names() {
        let module = lower("export * from \"./lib/math\";");
        assert_eq!(
            module.to_js(),
            "const __reexport0 = require(\"/lib/math.ts\", true);\nfor (const __key in __reexport0) {\n  if (__key !== \"default\") {\n    exports[__key] = __reexport0[__key];\n  }\n}\n"
        );
    }

    #[test]
    fn test_sanitizer_bindings_are_relinked() {
        let bindings = vec![
            ExternalBinding {
                local: "React".into(),
                imported: ImportedName::Default,
                source: "react".into(),
            },
            ExternalBinding {
                local: "useS".into(),
                imported: ImportedName::Named("useState".into()),
                source: "react".into(),
            },
            ExternalBinding {
                local: "Icons".into(),
                imported: ImportedName::Namespace,
                source: "lucide-react".into(),
            },
        ];
        let module = JsxTranspiler
            .transpile(
                &TranspileInput::new("/App.tsx", "const a = useS(0);", &project_resolve)
                    .with_bindings(&bindings),
            )
            .unwrap();
        assert_eq!(
            module.to_js(),
            "const React = require(\"react\");\nconst { useState: useS } = require(\"react\", true);\nconst Icons = require(\"lucide-react\", true);\nconst a = useS(0);\n"
        );
    }

    #[test]
    fn test_invalid_source_is_an_error() {
        let err = transpile("const = 1;", "/Bad.tsx").unwrap_err();
        assert_eq!(err.path, "/Bad.tsx");
        assert!(err.message.starts_with("E150"));
        assert_eq!(err.span.map(|s| s.line), Some(1));
    }

    #[test]
    fn test_lowering_is_deterministic() {
        let text = "import { useState } from \"react\";\nexport default function App() {\n  const [n, set] = useState(0);\n  return <button onClick={() => set(n + 1)}>{n}</button>;\n}\n";
        let first = transpile(text, "/App.tsx").unwrap();
        for _ in 0..100 {
            assert_eq!(transpile(text, "/App.tsx").unwrap(), first);
        }
    }
}
