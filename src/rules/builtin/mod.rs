//! Built-in rule groups.
//!
//! Each group is compiled once per process and cloned into registries;
//! cloning a [`Rule`] only bumps the matcher's reference count.

mod css;
mod frameworks;
mod html;
mod javascript;
mod web_apis;

use super::{Category, PatternRule, Rule};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub(crate) const SCRIPT_TYPES: &[&str] = &[
    "js", "jsx", "ts", "tsx", "mjs", "cjs", "vue", "svelte", "html", "htm",
];
pub(crate) const STYLE_TYPES: &[&str] = &[
    "css", "scss", "sass", "less", "vue", "svelte", "html", "htm",
];
pub(crate) const MARKUP_TYPES: &[&str] = &["html", "htm", "vue", "svelte", "jsx", "tsx"];

/// Frameworks with a dedicated rule group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    React,
    Vue,
    Angular,
    Svelte,
}

impl Framework {
    pub const ALL: [Framework; 4] = [
        Framework::React,
        Framework::Vue,
        Framework::Angular,
        Framework::Svelte,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::React => "react",
            Framework::Vue => "vue",
            Framework::Angular => "angular",
            Framework::Svelte => "svelte",
        }
    }
}

impl std::fmt::Display for Framework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Framework {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "react" => Ok(Framework::React),
            "vue" => Ok(Framework::Vue),
            "angular" => Ok(Framework::Angular),
            "svelte" => Ok(Framework::Svelte),
            _ => Err(format!(
                "Unknown framework: {}. Use react, vue, angular, or svelte",
                s
            )),
        }
    }
}

/// A named group of built-in rules that can be toggled as a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleGroup {
    ModernApis,
    Css,
    Html,
    JsSyntax,
    Legacy,
    Framework(Framework),
}

impl RuleGroup {
    pub fn rules(&self) -> &'static [Rule] {
        match self {
            RuleGroup::ModernApis => web_apis::MODERN_APIS.as_slice(),
            RuleGroup::Legacy => web_apis::LEGACY_APIS.as_slice(),
            RuleGroup::Css => css::CSS_FEATURES.as_slice(),
            RuleGroup::Html => html::HTML_FEATURES.as_slice(),
            RuleGroup::JsSyntax => javascript::JS_SYNTAX.as_slice(),
            RuleGroup::Framework(Framework::React) => frameworks::REACT.as_slice(),
            RuleGroup::Framework(Framework::Vue) => frameworks::VUE.as_slice(),
            RuleGroup::Framework(Framework::Angular) => frameworks::ANGULAR.as_slice(),
            RuleGroup::Framework(Framework::Svelte) => frameworks::SVELTE.as_slice(),
        }
    }
}

/// Compiles a static `(name, pattern, description)` table.
///
/// Built-in patterns are constants covered by tests, so a compile failure
/// here is a programming error.
pub(crate) fn compile_table(
    table: &[(&str, &str, &str)],
    category: Category,
    file_types: &[&str],
    framework: Option<Framework>,
) -> Vec<Rule> {
    table
        .iter()
        .map(|(name, pattern, description)| {
            let matcher = PatternRule::new(pattern).unwrap();
            let rule = Rule::new(*name, Arc::new(matcher), category)
                .with_description(*description)
                .with_file_types(file_types.iter().copied());
            match framework {
                Some(fw) => rule.with_framework(fw.as_str()),
                None => rule,
            }
        })
        .collect()
}
