use super::{compile_table, SCRIPT_TYPES};
use crate::rules::{Category, Rule};
use once_cell::sync::Lazy;

const SYNTAX: &[(&str, &str, &str)] = &[
    ("js-optional-chaining", r"[\w$\])]\?\.[A-Za-z_$\[(]", "Optional chaining"),
    ("js-nullish-coalescing", r"\?\?[^=]", "Nullish coalescing"),
    ("js-logical-assignment", r"(?:\|\||&&|\?\?)=", "Logical assignment operators"),
    ("js-private-fields", r"\bthis\.#[A-Za-z_$]", "Private class members"),
    ("js-class-static-block", r"\bstatic\s*\{", "Class static initialization blocks"),
    ("js-bigint", r"\b\d+n\b|\bBigInt\s*\(", "BigInt"),
    ("js-array-at", r"\.at\(\s*-?\d", "Array.prototype.at()"),
    ("js-dynamic-import", r"\bimport\s*\(", "Dynamic import()"),
    ("js-promise-allsettled", r"\bPromise\.allSettled\s*\(", "Promise.allSettled()"),
    ("js-promise-any", r"\bPromise\.any\s*\(", "Promise.any()"),
    ("js-object-hasown", r"\bObject\.hasOwn\s*\(", "Object.hasOwn()"),
    ("js-string-replaceall", r"\.replaceAll\s*\(", "String.prototype.replaceAll()"),
    ("js-array-findlast", r"\.findLast(?:Index)?\s*\(", "Array findLast()/findLastIndex()"),
];

pub static JS_SYNTAX: Lazy<Vec<Rule>> =
    Lazy::new(|| compile_table(SYNTAX, Category::Javascript, SCRIPT_TYPES, None));

#[cfg(test)]
mod tests {
    use super::*;

    fn detected(content: &str) -> Vec<String> {
        JS_SYNTAX
            .iter()
            .filter(|r| !r.matcher().find_all(content).unwrap().is_empty())
            .map(|r| r.name.clone())
            .collect()
    }

    #[test]
    fn test_operators() {
        let js = "const v = user?.profile ?? fallback; opts.retries ||= 3;";
        assert_eq!(
            detected(js),
            vec!["js-optional-chaining", "js-nullish-coalescing", "js-logical-assignment"]
        );
    }

    #[test]
    fn test_ternary_is_not_optional_chaining() {
        assert!(detected("const x = a ? .5 : 1;").is_empty());
    }

    #[test]
    fn test_builtins() {
        let js = "const last = items.at(-1); const m = await import('./mod.js'); s.replaceAll('a', 'b');";
        assert_eq!(
            detected(js),
            vec!["js-array-at", "js-dynamic-import", "js-string-replaceall"]
        );
    }
}
