//! Host implementations of the external packages in [`Shim`].
//!
//! Every execution scope builds its own [`ShimTable`]: shim values hold
//! script values and so never cross scopes. The set of packages is fixed by
//! [`Shim::ALL`].

mod classes;
mod icons;
mod react;
pub(crate) mod router;
mod slot;

use canvas_compiler::Shim;
use std::collections::BTreeMap;

use crate::env::Env;
use crate::value::Value;

pub(crate) use react::create_element;

/// Export containers of every shim, for one scope.
#[derive(Debug)]
pub struct ShimTable {
    containers: BTreeMap<Shim, Value>,
}

impl ShimTable {
    pub fn new() -> Self {
        let react = react::react_module();
        let class_helpers = classes::helpers();
        let containers = Shim::ALL
            .into_iter()
            .map(|shim| {
                let container = match shim {
                    Shim::React => react.clone(),
                    Shim::JsxRuntime => react::jsx_runtime(&react),
                    Shim::Icons => icons::icon_module(),
                    Shim::Clsx | Shim::ClassNames => class_helpers.joiner_module(),
                    Shim::VariantClasses => class_helpers.variants_module(),
                    Shim::TailwindMerge => class_helpers.merge_module(),
                    Shim::Utils => class_helpers.utils_module(),
                    Shim::Slot => slot::slot_module(),
                    Shim::Router => router::router_module(),
                };
                (shim, container)
            })
            .collect();
        Self { containers }
    }

    /// The export container for `specifier`, if it names a shim.
    pub fn container(&self, specifier: &str) -> Option<Value> {
        let shim = Shim::from_specifier(specifier)?;
        self.containers.get(&shim).cloned()
    }

    /// Put the names generated code commonly uses without importing
    /// (`React`, its hooks, `cn`, `clsx`) on `globals`.
    pub fn install_globals(&self, globals: &Env) {
        let Some(react) = self.containers.get(&Shim::React) else {
            return;
        };
        globals.define("React", react.clone(), true);
        for hook in react::HOOK_NAMES {
            globals.define(hook, react.get(hook), true);
        }
        if let Some(utils) = self.containers.get(&Shim::Utils) {
            globals.define("cn", utils.get("cn"), true);
        }
        if let Some(clsx) = self.containers.get(&Shim::Clsx) {
            globals.define("clsx", clsx.get("clsx"), true);
        }
    }
}

impl Default for ShimTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_shim_has_a_container() {
        let table = ShimTable::new();
        for shim in Shim::ALL {
            assert!(table.container(shim.specifier()).is_some(), "{shim}");
        }
        assert!(table.container("react/jsx-dev-runtime").is_some());
        assert!(table.container("framer-motion").is_none());
    }

    #[test]
    fn test_globals_are_installed() {
        let table = ShimTable::new();
        let globals = Env::new();
        table.install_globals(&globals);
        for name in ["React", "useState", "useEffect", "cn", "clsx"] {
            assert!(globals.get(name).is_some_and(|v| !v.is_nullish()), "{name}");
        }
    }

    #[test]
    fn test_tables_are_per_scope() {
        let a = ShimTable::new();
        let b = ShimTable::new();
        let (a, b) = (a.container("react").unwrap(), b.container("react").unwrap());
        assert!(!a.strict_eq(&b));
    }
}
