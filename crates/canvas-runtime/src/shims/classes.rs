//! Class-name helpers: the joiner (`clsx`/`classnames`), the conflict-aware
//! merge (`twMerge`), the `cn` composition of both, and variant builders
//! (`cva`).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::builtins::arg;
use crate::value::Value;

/// Shared helper functions, so every module exposing `clsx` hands out the
/// same function value.
pub(super) struct ClassHelpers {
    clsx: Value,
    merge: Value,
    cn: Value,
    cva: Value,
}

pub(super) fn helpers() -> ClassHelpers {
    ClassHelpers {
        clsx: Value::native("clsx", |_, _, args| Ok(Value::string(join(&args)))),
        merge: Value::native("twMerge", |_, _, args| Ok(Value::string(merge(&join(&args))))),
        cn: Value::native("cn", |_, _, args| Ok(Value::string(merge(&join(&args))))),
        cva: Value::native("cva", |_, _, args| Ok(variant_builder(arg(&args, 0), arg(&args, 1)))),
    }
}

impl ClassHelpers {
    pub(super) fn joiner_module(&self) -> Value {
        Value::object_from([
            ("default", self.clsx.clone()),
            ("clsx", self.clsx.clone()),
            ("classNames", self.clsx.clone()),
        ])
    }

    pub(super) fn merge_module(&self) -> Value {
        Value::object_from([("twMerge", self.merge.clone()), ("twJoin", self.clsx.clone())])
    }

    pub(super) fn variants_module(&self) -> Value {
        Value::object_from([("cva", self.cva.clone()), ("cx", self.clsx.clone())])
    }

    pub(super) fn utils_module(&self) -> Value {
        Value::object_from([("cn", self.cn.clone())])
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Joining
// ══════════════════════════════════════════════════════════════════════════════

/// `clsx` semantics: strings and numbers as-is, arrays flattened, object
/// keys whose values are truthy; falsy values skipped.
pub(crate) fn join(args: &[Value]) -> String {
    let mut out = Vec::new();
    for value in args {
        collect(value, &mut out);
    }
    out.join(" ")
}

fn collect(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) if !s.is_empty() => out.push(s.to_string()),
        Value::Number(n) if *n != 0.0 && !n.is_nan() => out.push(value.to_js_string()),
        Value::Array(items) => {
            for item in items.borrow().iter() {
                collect(item, out);
            }
        }
        Value::Object(map) => {
            for (key, flag) in map.borrow().iter() {
                if flag.is_truthy() {
                    out.push(key.clone());
                }
            }
        }
        _ => {}
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Merging
// ══════════════════════════════════════════════════════════════════════════════

static FONT_SIZE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^text-(xs|sm|base|lg|\d?xl|\[\d.*\])$").expect("font size regex"));
static BORDER_WIDTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^border(-[xytrbl])?(-\d+)?$").expect("border width regex"));
static SHADOW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^shadow(-(sm|md|lg|xl|2xl|inner|none))?$").expect("shadow regex"));
static ROUNDED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^rounded(-(none|sm|md|lg|xl|2xl|3xl|full))?$").expect("rounded regex"));

const DISPLAY: &[&str] = &[
    "block", "inline-block", "inline", "flex", "inline-flex", "grid", "inline-grid", "hidden",
    "contents", "table",
];
const POSITION: &[&str] = &["static", "fixed", "absolute", "relative", "sticky"];
const FONT_WEIGHT: &[&str] = &[
    "thin", "extralight", "light", "normal", "medium", "semibold", "bold", "extrabold", "black",
];

/// Utility prefixes whose value part is interchangeable, longest first.
const PREFIX_GROUPS: &[&str] = &[
    "min-w-", "max-w-", "min-h-", "max-h-", "gap-x-", "gap-y-", "space-x-", "space-y-",
    "px-", "py-", "pt-", "pr-", "pb-", "pl-", "mx-", "my-", "mt-", "mr-", "mb-", "ml-",
    "inset-", "top-", "right-", "bottom-", "left-", "grid-cols-", "col-span-", "justify-",
    "items-", "self-", "content-", "leading-", "tracking-", "opacity-", "z-", "gap-", "bg-",
    "ring-", "outline-", "duration-", "ease-", "cursor-", "overflow-", "w-", "h-", "p-", "m-",
    "size-", "flex-", "order-",
];

/// Groups a class in `group` overrides besides its own.
fn overrides(group: &str) -> &'static [&'static str] {
    match group {
        "p-" => &["px-", "py-", "pt-", "pr-", "pb-", "pl-"],
        "px-" => &["pr-", "pl-"],
        "py-" => &["pt-", "pb-"],
        "m-" => &["mx-", "my-", "mt-", "mr-", "mb-", "ml-"],
        "mx-" => &["mr-", "ml-"],
        "my-" => &["mt-", "mb-"],
        "inset-" => &["top-", "right-", "bottom-", "left-"],
        "gap-" => &["gap-x-", "gap-y-"],
        "size-" => &["w-", "h-"],
        _ => &[],
    }
}

/// The conflict group of one utility, without its variant prefix.
fn group_of(utility: &str) -> Option<String> {
    let utility = utility.strip_prefix('-').unwrap_or(utility);
    if DISPLAY.contains(&utility) {
        return Some("display".into());
    }
    if POSITION.contains(&utility) {
        return Some("position".into());
    }
    if FONT_SIZE.is_match(utility) {
        return Some("font-size".into());
    }
    if let Some(rest) = utility.strip_prefix("text-") {
        return Some(if matches!(rest, "left" | "center" | "right" | "justify") {
            "text-align".into()
        } else {
            "text-color".into()
        });
    }
    if let Some(weight) = utility.strip_prefix("font-") {
        return Some(if FONT_WEIGHT.contains(&weight) {
            "font-weight".into()
        } else {
            "font-family".into()
        });
    }
    if let Some(caps) = BORDER_WIDTH.captures(utility) {
        let side = caps.get(1).map_or("", |m| m.as_str());
        return Some(format!("border-width{side}"));
    }
    if utility.starts_with("border-") {
        return Some("border-color".into());
    }
    if SHADOW.is_match(utility) {
        return Some("shadow".into());
    }
    if ROUNDED.is_match(utility) {
        return Some("rounded".into());
    }
    PREFIX_GROUPS
        .iter()
        .find(|prefix| utility.starts_with(**prefix))
        .map(|prefix| (*prefix).to_string())
}

/// `twMerge`: later classes win over earlier ones in the same conflict
/// group (per variant prefix); exact duplicates collapse.
pub(crate) fn merge(classes: &str) -> String {
    let tokens: Vec<&str> = classes.split_whitespace().collect();
    let mut taken: Vec<String> = Vec::new();
    let mut kept: Vec<&str> = Vec::new();
    for token in tokens.iter().rev() {
        let (variants, utility) = match token.rfind(':') {
            Some(i) => (&token[..=i], &token[i + 1..]),
            None => ("", *token),
        };
        let utility = utility.strip_prefix('!').unwrap_or(utility);
        let claim = match group_of(utility) {
            Some(group) => format!("{variants}{group}"),
            None => (*token).to_string(),
        };
        if taken.contains(&claim) {
            continue;
        }
        if let Some(group) = group_of(utility) {
            for sub in overrides(&group) {
                taken.push(format!("{variants}{sub}"));
            }
        }
        taken.push(claim);
        kept.push(token);
    }
    kept.reverse();
    kept.join(" ")
}

// ══════════════════════════════════════════════════════════════════════════════
// Variants
// ══════════════════════════════════════════════════════════════════════════════

/// `cva(base, { variants, defaultVariants, compoundVariants })`.
fn variant_builder(base: Value, config: Value) -> Value {
    Value::native("variants", move |_, _, args| {
        Ok(Value::string(apply_variants(&base, &config, &arg(&args, 0))))
    })
}

fn apply_variants(base: &Value, config: &Value, props: &Value) -> String {
    let mut parts = vec![base.clone()];
    let variants = config.get("variants");
    let defaults = config.get("defaultVariants");
    let chosen = |name: &str| -> Value {
        match props.get(name) {
            Value::Undefined => defaults.get(name),
            value => value,
        }
    };
    if let Value::Object(map) = &variants {
        for (name, options) in map.borrow().iter() {
            let choice = chosen(name);
            if choice.is_nullish() {
                continue;
            }
            let key = match &choice {
                Value::Bool(b) => b.to_string(),
                other => other.to_js_string(),
            };
            parts.push(options.get(&key));
        }
    }
    if let Value::Array(compounds) = config.get("compoundVariants") {
        let compounds = compounds.borrow().clone();
        for compound in compounds {
            let Value::Object(conditions) = &compound else {
                continue;
            };
            let conditions = conditions.borrow().clone();
            let mut matched = true;
            for (name, expected) in &conditions {
                if name == "class" || name == "className" {
                    continue;
                }
                let actual = chosen(name);
                let hit = match expected {
                    Value::Array(options) => options.borrow().iter().any(|o| o.strict_eq(&actual)),
                    other => other.strict_eq(&actual),
                };
                if !hit {
                    matched = false;
                    break;
                }
            }
            if matched {
                parts.push(compound.get("class"));
                parts.push(compound.get("className"));
            }
        }
    }
    parts.push(props.get("class"));
    parts.push(props.get("className"));
    join(&parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::tests::run_in;
    use crate::evaluator::Interpreter;
    use crate::shims::ShimTable;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_join() {
        let args = [
            Value::string("a"),
            Value::Bool(false),
            Value::array(vec![Value::string("b"), Value::Null, Value::Number(0.0)]),
            Value::object_from([("c", Value::Bool(true)), ("d", Value::Bool(false))]),
        ];
        assert_eq!(join(&args), "a b c");
    }

    #[test]
    fn test_merge_later_wins() {
        assert_eq!(merge("px-2 py-1 p-4"), "p-4");
        assert_eq!(merge("p-4 px-2"), "p-4 px-2");
        assert_eq!(merge("text-sm text-red-500 text-lg"), "text-red-500 text-lg");
        assert_eq!(merge("bg-white hover:bg-gray-100 bg-black"), "hover:bg-gray-100 bg-black");
        assert_eq!(merge("block flex"), "flex");
        assert_eq!(merge("border border-2 border-red-500"), "border-2 border-red-500");
        assert_eq!(merge("font-bold font-medium font-mono"), "font-medium font-mono");
        assert_eq!(merge("custom custom other"), "custom other");
    }

    #[test]
    fn test_cn_and_cva_from_script() {
        let mut interp = Interpreter::default();
        let table = ShimTable::new();
        table.install_globals(interp.globals());
        interp.globals().define("cva", table.container("class-variance-authority").unwrap().get("cva"), false);
        let source = r#"
const button = cva("btn", {
  variants: {
    size: { sm: "h-8 px-2", lg: "h-12 px-6" },
    tone: { plain: "", danger: "bg-red-500" },
  },
  defaultVariants: { size: "sm" },
  compoundVariants: [{ size: "lg", tone: "danger", class: "shadow-lg" }],
});
const result = [button(), button({ size: "lg", tone: "danger", className: "w-full" }), cn("p-2", false && "x", "p-4")].join("|");
"#;
        let value = run_in(&mut interp, source).unwrap();
        assert_eq!(
            value.to_js_string(),
            "btn h-8 px-2|btn h-12 px-6 bg-red-500 shadow-lg w-full|p-4"
        );
    }
}
