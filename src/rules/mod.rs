//! Feature detection rules.
//!
//! A [`Rule`] is a named, stateless textual matcher plus metadata. Rules are
//! collected into a [`RuleRegistry`], which is frozen into an immutable
//! [`RuleSet`] once per scan.
//!
//! # Example
//!
//! ```
//! use baseline_scan::rules::{RuleOptions, RuleRegistry};
//!
//! let rules = RuleRegistry::from_options(&RuleOptions::default()).build();
//! let hits = rules.match_content(".layout { display: grid; }", "css");
//! assert_eq!(hits[0].feature, "css-grid");
//! ```

pub mod builtin;
mod pattern;
pub mod registry;

pub use builtin::Framework;
pub use pattern::{Match, MatchError, Matcher, PatternRule};
pub use registry::{FeatureHits, Preset, RegistryError, RuleOptions, RulePatch, RuleRegistry, RuleSet};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Coarse grouping of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Api,
    Css,
    Html,
    Javascript,
    Framework,
    Performance,
    Security,
    Accessibility,
    Seo,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Api => "api",
            Category::Css => "css",
            Category::Html => "html",
            Category::Javascript => "javascript",
            Category::Framework => "framework",
            Category::Performance => "performance",
            Category::Security => "security",
            Category::Accessibility => "accessibility",
            Category::Seo => "seo",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serializable rule shape shared with external rule catalogs and custom
/// rules in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub name: String,
    pub pattern: String,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// File extensions this rule applies to. Empty means every file.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_types: Vec<String>,
}

impl RuleDefinition {
    /// Compiles the pattern into a [`Rule`].
    pub fn compile(&self) -> Result<Rule, regex::Error> {
        let matcher = PatternRule::new(&self.pattern)?;
        let mut rule = Rule::new(&self.name, Arc::new(matcher), self.category)
            .with_file_types(self.file_types.iter().map(String::as_str));
        rule.framework = self.framework.clone();
        rule.description = self.description.clone();
        Ok(rule)
    }
}

/// A compiled detection rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub category: Category,
    pub framework: Option<String>,
    pub description: Option<String>,
    pub file_types: Vec<String>,
    matcher: Arc<dyn Matcher>,
}

impl Rule {
    pub fn new(name: impl Into<String>, matcher: Arc<dyn Matcher>, category: Category) -> Self {
        Self {
            name: name.into(),
            category,
            framework: None,
            description: None,
            file_types: Vec::new(),
            matcher,
        }
    }

    pub fn with_framework(mut self, framework: impl Into<String>) -> Self {
        self.framework = Some(framework.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_file_types<'a>(mut self, types: impl IntoIterator<Item = &'a str>) -> Self {
        self.file_types = types.into_iter().map(|t| t.to_ascii_lowercase()).collect();
        self
    }

    pub fn matcher(&self) -> &dyn Matcher {
        self.matcher.as_ref()
    }

    pub(crate) fn set_matcher(&mut self, matcher: Arc<dyn Matcher>) {
        self.matcher = matcher;
    }

    /// Returns true if this rule should run against files of `file_type`
    /// (an extension without the dot, case-insensitive).
    pub fn applies_to(&self, file_type: &str) -> bool {
        self.file_types.is_empty()
            || self
                .file_types
                .iter()
                .any(|t| t.eq_ignore_ascii_case(file_type))
    }

    /// Serializable view of this rule, for listing.
    pub fn definition(&self) -> RuleDefinition {
        RuleDefinition {
            name: self.name.clone(),
            pattern: self.matcher.pattern().to_string(),
            category: self.category,
            framework: self.framework.clone(),
            description: self.description.clone(),
            file_types: self.file_types.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_compiles_with_metadata() {
        let def = RuleDefinition {
            name: "custom-popover".to_string(),
            pattern: r"showPopover\s*\(".to_string(),
            category: Category::Api,
            framework: None,
            description: Some("Popover API".to_string()),
            file_types: vec!["JS".to_string()],
        };

        let rule = def.compile().unwrap();
        assert_eq!(rule.name, "custom-popover");
        assert_eq!(rule.description.as_deref(), Some("Popover API"));
        assert!(rule.applies_to("js"));
        assert!(!rule.applies_to("css"));
        assert_eq!(rule.definition(), RuleDefinition { file_types: vec!["js".to_string()], ..def });
    }

    #[test]
    fn test_definition_rejects_bad_pattern() {
        let def = RuleDefinition {
            name: "broken".to_string(),
            pattern: "(unclosed".to_string(),
            category: Category::Css,
            framework: None,
            description: None,
            file_types: vec![],
        };
        assert!(def.compile().is_err());
    }

    #[test]
    fn test_empty_file_types_apply_everywhere() {
        let rule = Rule::new(
            "anything",
            Arc::new(PatternRule::new("x").unwrap()),
            Category::Security,
        );
        assert!(rule.applies_to("css"));
        assert!(rule.applies_to(""));
    }

    #[test]
    fn test_category_serde_lowercase() {
        let json = serde_json::to_string(&Category::Javascript).unwrap();
        assert_eq!(json, "\"javascript\"");
        let parsed: Category = serde_json::from_str("\"seo\"").unwrap();
        assert_eq!(parsed, Category::Seo);
    }
}
