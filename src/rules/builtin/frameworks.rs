use super::{compile_table, Framework, SCRIPT_TYPES};
use crate::rules::{Category, Rule};
use once_cell::sync::Lazy;

const REACT_RULES: &[(&str, &str, &str)] = &[
    ("react-hooks", r"\buse(?:State|Effect|Context|Reducer|Callback|Memo|Ref|LayoutEffect)\s*\(", "React hooks"),
    ("react-concurrent", r"\buse(?:Transition|DeferredValue|Id|SyncExternalStore)\s*\(", "React concurrent features"),
    ("react-suspense", r"<Suspense\b|\bReact\.lazy\s*\(", "Suspense and lazy components"),
    ("react-server-components", r#"^\s*["']use (?:client|server)["']"#, "Server component directives"),
];

const VUE_RULES: &[(&str, &str, &str)] = &[
    ("vue-script-setup", r"<script\b[^>]*\bsetup\b", "<script setup> SFCs"),
    ("vue-composition-api", r"\bdefineComponent\s*\(|\bsetup\s*\([^)]*\)\s*\{", "Composition API"),
    ("vue-compiler-macros", r"\bdefine(?:Props|Emits|Model|Expose)\s*[<(]", "Compiler macros"),
];

const ANGULAR_RULES: &[(&str, &str, &str)] = &[
    ("angular-signals", r"\b(?:signal|computed|effect)\s*(?:<[^>]*>)?\s*\(", "Angular signals"),
    ("angular-standalone", r"\bstandalone\s*:\s*true\b", "Standalone components"),
    ("angular-control-flow", r"@(?:if|for|switch)\s*\(", "Built-in control flow"),
];

const SVELTE_RULES: &[(&str, &str, &str)] = &[
    ("svelte-runes", r"\$(?:state|derived|effect|props|bindable)\s*\(", "Svelte 5 runes"),
    ("svelte-reactive-statements", r"(?m)^\s*\$:", "Reactive statements"),
];

pub static REACT: Lazy<Vec<Rule>> = Lazy::new(|| {
    compile_table(REACT_RULES, Category::Framework, SCRIPT_TYPES, Some(Framework::React))
});

pub static VUE: Lazy<Vec<Rule>> = Lazy::new(|| {
    compile_table(VUE_RULES, Category::Framework, SCRIPT_TYPES, Some(Framework::Vue))
});

pub static ANGULAR: Lazy<Vec<Rule>> = Lazy::new(|| {
    compile_table(ANGULAR_RULES, Category::Framework, SCRIPT_TYPES, Some(Framework::Angular))
});

pub static SVELTE: Lazy<Vec<Rule>> = Lazy::new(|| {
    compile_table(SVELTE_RULES, Category::Framework, SCRIPT_TYPES, Some(Framework::Svelte))
});
