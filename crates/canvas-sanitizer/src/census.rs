//! Declaration census: how many `const`/`let`/`var`/`function` keywords a
//! text contains, overall and at the top level. Rewrites that must not
//! create or destroy declarations compare the census before and after.

use serde::Serialize;
use std::fmt;

use crate::scan::Scan;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeclCensus {
    pub total: usize,
    /// Keywords at brace depth 0.
    pub top_level: usize,
}

impl fmt::Display for DeclCensus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.total, self.top_level)
    }
}

/// Count declaration keywords in `text`. Strings, templates, comments and
/// JSX text do not count.
pub fn census(text: &str) -> DeclCensus {
    census_of(&Scan::new(text))
}

pub(crate) fn census_of(scan: &Scan) -> DeclCensus {
    let mut census = DeclCensus::default();
    for i in 0..scan.len() {
        // `as const` is an assertion, not a declaration.
        let asserted = i > 0 && scan.ident(i - 1) == Some("as");
        if scan.kind(i).is_declaration_keyword() && !asserted {
            census.total += 1;
            if scan.brace_depth(i) == 0 {
                census.top_level += 1;
            }
        }
    }
    census
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_nested_and_top_level() {
        let c = census("const a = 1;\nfunction f() { let b = 2; const g = () => { var c; }; }");
        assert_eq!(c, DeclCensus { total: 5, top_level: 2 });
    }

    #[test]
    fn test_ignores_words_in_strings_and_markup() {
        let c = census("const label = \"const let\";\nconst el = <p>function var</p>;");
        assert_eq!(c, DeclCensus { total: 2, top_level: 2 });
    }

    #[test]
    fn test_as_const_is_not_a_declaration() {
        let c = census("const sizes = [1, 2] as const;");
        assert_eq!(c, DeclCensus { total: 1, top_level: 1 });
    }

    #[test]
    fn test_display() {
        assert_eq!(DeclCensus { total: 3, top_level: 1 }.to_string(), "3/1");
    }
}
