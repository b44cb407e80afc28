//! The closed table of external packages the host provides.
//!
//! Generated code may import only these names from outside the project.
//! The runtime instantiates a value for each entry inside every execution
//! scope; this crate only needs the names to resolve and lower imports.

use serde::Serialize;
use std::fmt;

/// One host-provided external module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Shim {
    /// Core UI runtime handle: element factory, fragment marker and hooks.
    React,
    /// Automatic-runtime element factory used by lowered markup.
    JsxRuntime,
    /// Icon factory: every PascalCase export renders an `<svg>`.
    Icons,
    /// Class-name joiner.
    Clsx,
    /// Class-name joiner under its older package name.
    ClassNames,
    /// Variant class builder (`cva`).
    VariantClasses,
    /// Class-merge utility (`twMerge`).
    TailwindMerge,
    /// Project-style `cn` helper.
    Utils,
    /// Passthrough slot component.
    Slot,
    /// Routing facade.
    Router,
}

impl Shim {
    pub const ALL: [Shim; 10] = [
        Shim::React,
        Shim::JsxRuntime,
        Shim::Icons,
        Shim::Clsx,
        Shim::ClassNames,
        Shim::VariantClasses,
        Shim::TailwindMerge,
        Shim::Utils,
        Shim::Slot,
        Shim::Router,
    ];

    /// The import specifier this shim answers to.
    pub fn specifier(self) -> &'static str {
        match self {
            Shim::React => "react",
            Shim::JsxRuntime => "react/jsx-runtime",
            Shim::Icons => "lucide-react",
            Shim::Clsx => "clsx",
            Shim::ClassNames => "classnames",
            Shim::VariantClasses => "class-variance-authority",
            Shim::TailwindMerge => "tailwind-merge",
            Shim::Utils => "@/lib/utils",
            Shim::Slot => "@radix-ui/react-slot",
            Shim::Router => "react-router-dom",
        }
    }

    pub fn from_specifier(specifier: &str) -> Option<Shim> {
        match specifier {
            "react/jsx-dev-runtime" => Some(Shim::JsxRuntime),
            _ => Shim::ALL.into_iter().find(|s| s.specifier() == specifier),
        }
    }
}

impl fmt::Display for Shim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.specifier())
    }
}

/// Every shim specifier, in table order.
pub fn shim_names() -> Vec<&'static str> {
    Shim::ALL.iter().map(|s| s.specifier()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specifiers_round_trip() {
        for shim in Shim::ALL {
            assert_eq!(Shim::from_specifier(shim.specifier()), Some(shim));
        }
    }

    #[test]
    fn test_dev_runtime_alias() {
        assert_eq!(
            Shim::from_specifier("react/jsx-dev-runtime"),
            Some(Shim::JsxRuntime)
        );
    }

    #[test]
    fn test_unknown_package() {
        assert_eq!(Shim::from_specifier("framer-motion"), None);
        assert_eq!(Shim::from_specifier("React"), None);
    }

    #[test]
    fn test_names_are_unique() {
        let mut names = shim_names();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Shim::ALL.len());
    }
}
