//! Rule registry and the immutable per-scan rule set.
//!
//! The registry is assembled from [`RuleOptions`] with a fixed precedence:
//! built-in defaults, then the preset, then explicit group toggles, then the
//! framework and category allow-lists, and finally custom rules. Later
//! entries replace earlier ones with the same name.

use super::builtin::{Framework, RuleGroup};
use super::{Category, Match, Matcher, PatternRule, Rule, RuleDefinition};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Unknown rule: {0}")]
    UnknownRule(String),

    #[error("Invalid pattern for rule {name}: {message}")]
    InvalidPattern { name: String, message: String },
}

/// Named starting points for the set of enabled rule groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Modern web APIs and CSS only.
    Minimal,
    /// Every language-level group, no frameworks.
    #[default]
    Recommended,
    /// Recommended without HTML and legacy API detection.
    Modern,
    /// Every group, including all frameworks.
    All,
}

impl std::str::FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "minimal" => Ok(Preset::Minimal),
            "recommended" | "default" => Ok(Preset::Recommended),
            "modern" => Ok(Preset::Modern),
            "all" => Ok(Preset::All),
            _ => Err(format!(
                "Unknown preset: {}. Use minimal, recommended, modern, or all",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct GroupToggles {
    modern_apis: bool,
    css: bool,
    html: bool,
    js_syntax: bool,
    legacy: bool,
    all_frameworks: bool,
}

impl Preset {
    fn toggles(self) -> GroupToggles {
        let recommended = GroupToggles {
            modern_apis: true,
            css: true,
            html: true,
            js_syntax: true,
            legacy: true,
            all_frameworks: false,
        };
        match self {
            Preset::Minimal => GroupToggles {
                modern_apis: true,
                css: true,
                ..GroupToggles::default()
            },
            Preset::Recommended => recommended,
            Preset::Modern => GroupToggles {
                html: false,
                legacy: false,
                ..recommended
            },
            Preset::All => GroupToggles {
                all_frameworks: true,
                ..recommended
            },
        }
    }
}

/// Rule selection options, usually the `[rules]` table of the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleOptions {
    pub preset: Preset,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modern_apis: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub css: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub js_syntax: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legacy: Option<bool>,

    /// Framework groups to enable, in merge order. Overrides the preset's
    /// framework selection when non-empty.
    pub frameworks: Vec<Framework>,

    /// When non-empty, only built-in rules in these categories are kept.
    pub categories: Vec<Category>,

    /// Merged last; always win over built-in rules of the same name.
    pub custom_rules: Vec<RuleDefinition>,
}

impl RuleOptions {
    /// Resolves presets and toggles into the ordered list of groups to merge.
    pub fn active_groups(&self) -> Vec<RuleGroup> {
        let mut toggles = self.preset.toggles();
        if let Some(v) = self.modern_apis {
            toggles.modern_apis = v;
        }
        if let Some(v) = self.css {
            toggles.css = v;
        }
        if let Some(v) = self.html {
            toggles.html = v;
        }
        if let Some(v) = self.js_syntax {
            toggles.js_syntax = v;
        }
        if let Some(v) = self.legacy {
            toggles.legacy = v;
        }

        let mut groups = Vec::new();
        if toggles.modern_apis {
            groups.push(RuleGroup::ModernApis);
        }
        if toggles.css {
            groups.push(RuleGroup::Css);
        }
        if toggles.html {
            groups.push(RuleGroup::Html);
        }
        if toggles.js_syntax {
            groups.push(RuleGroup::JsSyntax);
        }
        if toggles.legacy {
            groups.push(RuleGroup::Legacy);
        }

        let frameworks: Vec<Framework> = if !self.frameworks.is_empty() {
            self.frameworks.clone()
        } else if toggles.all_frameworks {
            Framework::ALL.to_vec()
        } else {
            Vec::new()
        };
        groups.extend(frameworks.into_iter().map(RuleGroup::Framework));

        groups
    }
}

/// Partial update applied by [`RuleRegistry::update`].
#[derive(Debug, Clone, Default)]
pub struct RulePatch {
    pub pattern: Option<String>,
    pub category: Option<Category>,
    pub framework: Option<String>,
    pub description: Option<String>,
    pub file_types: Option<Vec<String>>,
}

/// Mutable collection of rules, keyed by name, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: Vec<Rule>,
    index: HashMap<String, usize>,
    problems: Vec<String>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from options.
    pub fn from_options(options: &RuleOptions) -> Self {
        let mut registry = Self::new();

        for group in options.active_groups() {
            for rule in group.rules() {
                if !options.categories.is_empty() && !options.categories.contains(&rule.category) {
                    continue;
                }
                registry.add(rule.clone());
            }
        }

        let mut custom_names = HashSet::new();
        for def in &options.custom_rules {
            if !custom_names.insert(def.name.as_str()) {
                warn!(rule = %def.name, "duplicate custom rule, the last definition wins");
                registry
                    .problems
                    .push(format!("duplicate custom rule '{}'", def.name));
            }
            registry.add_definition(def);
        }

        debug!(rules = registry.len(), "rule registry assembled");
        registry
    }

    /// Adds a rule, replacing any rule with the same name in place.
    /// Returns the replaced rule.
    pub fn add(&mut self, rule: Rule) -> Option<Rule> {
        match self.index.get(&rule.name) {
            Some(&pos) => Some(std::mem::replace(&mut self.rules[pos], rule)),
            None => {
                self.index.insert(rule.name.clone(), self.rules.len());
                self.rules.push(rule);
                None
            }
        }
    }

    /// Compiles and adds a definition. A pattern that fails to compile is
    /// recorded as a problem and the rule is left out.
    pub fn add_definition(&mut self, def: &RuleDefinition) -> bool {
        match def.compile() {
            Ok(rule) => {
                self.add(rule);
                true
            }
            Err(e) => {
                warn!(rule = %def.name, error = %e, "invalid rule pattern, skipping");
                self.problems
                    .push(format!("rule '{}': invalid pattern: {}", def.name, e));
                false
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Rule> {
        let pos = self.index.remove(name)?;
        let removed = self.rules.remove(pos);
        for idx in self.index.values_mut() {
            if *idx > pos {
                *idx -= 1;
            }
        }
        Some(removed)
    }

    /// Applies a patch to an existing rule. The rule is left untouched if
    /// the new pattern does not compile.
    pub fn update(&mut self, name: &str, patch: RulePatch) -> Result<(), RegistryError> {
        let pos = *self
            .index
            .get(name)
            .ok_or_else(|| RegistryError::UnknownRule(name.to_string()))?;

        let matcher = match &patch.pattern {
            Some(pattern) => Some(PatternRule::new(pattern).map_err(|e| {
                RegistryError::InvalidPattern {
                    name: name.to_string(),
                    message: e.to_string(),
                }
            })?),
            None => None,
        };

        let rule = &mut self.rules[pos];
        if let Some(matcher) = matcher {
            rule.set_matcher(Arc::new(matcher));
        }
        if let Some(category) = patch.category {
            rule.category = category;
        }
        if let Some(framework) = patch.framework {
            rule.framework = Some(framework);
        }
        if let Some(description) = patch.description {
            rule.description = Some(description);
        }
        if let Some(types) = patch.file_types {
            rule.file_types = types.iter().map(|t| t.to_ascii_lowercase()).collect();
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.index.get(name).map(|&pos| &self.rules[pos])
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Checks structural invariants and returns human-readable problems.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = self.problems.clone();
        for rule in &self.rules {
            problems.extend(rule_problem(rule));
        }
        problems
    }

    /// Freezes the registry into a [`RuleSet`], leaving out rules that fail
    /// validation.
    pub fn build(self) -> RuleSet {
        let rules: Vec<Rule> = self
            .rules
            .into_iter()
            .filter(|rule| match rule_problem(rule) {
                Some(problem) => {
                    warn!(rule = %rule.name, "{}, excluding", problem);
                    false
                }
                None => true,
            })
            .collect();

        RuleSet {
            rules: rules.into(),
        }
    }
}

fn rule_problem(rule: &Rule) -> Option<String> {
    if rule.name.trim().is_empty() {
        return Some("rule with an empty name".to_string());
    }
    if rule.matcher().pattern().is_empty() {
        return Some(format!("rule '{}' has an empty pattern", rule.name));
    }
    if rule.matcher().matches_empty() {
        return Some(format!("rule '{}' matches the empty string", rule.name));
    }
    None
}

/// Matches produced by one rule against one piece of content.
#[derive(Debug, Clone)]
pub struct FeatureHits {
    pub feature: String,
    pub matches: Vec<Match>,
}

/// Immutable, cheaply cloneable set of active rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Arc<[Rule]>,
}

impl RuleSet {
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Runs every applicable rule against `content`.
    ///
    /// A rule whose matcher fails is logged and skipped; the remaining rules
    /// still run.
    pub fn match_content(&self, content: &str, file_type: &str) -> Vec<FeatureHits> {
        let mut hits = Vec::new();

        for rule in self.rules.iter().filter(|r| r.applies_to(file_type)) {
            match rule.matcher().find_all(content) {
                Ok(matches) if !matches.is_empty() => hits.push(FeatureHits {
                    feature: rule.name.clone(),
                    matches,
                }),
                Ok(_) => {}
                Err(e) => {
                    warn!(rule = %rule.name, error = %e, "rule failed, skipping");
                }
            }
        }

        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::MatchError;

    #[derive(Debug)]
    struct Exploding;

    impl Matcher for Exploding {
        fn pattern(&self) -> &str {
            "<exploding>"
        }

        fn find_all(&self, _content: &str) -> Result<Vec<Match>, MatchError> {
            Err(MatchError::Failed("boom".to_string()))
        }
    }

    fn custom(name: &str, pattern: &str) -> RuleDefinition {
        RuleDefinition {
            name: name.to_string(),
            pattern: pattern.to_string(),
            category: Category::Css,
            framework: None,
            description: None,
            file_types: vec![],
        }
    }

    #[test]
    fn test_preset_groups() {
        let minimal = RuleOptions {
            preset: Preset::Minimal,
            ..Default::default()
        };
        assert_eq!(
            minimal.active_groups(),
            vec![RuleGroup::ModernApis, RuleGroup::Css]
        );

        let all = RuleOptions {
            preset: Preset::All,
            ..Default::default()
        };
        assert_eq!(all.active_groups().len(), 9);
    }

    #[test]
    fn test_explicit_toggles_override_preset() {
        let options = RuleOptions {
            preset: Preset::Minimal,
            css: Some(false),
            js_syntax: Some(true),
            frameworks: vec![Framework::Vue],
            ..Default::default()
        };
        assert_eq!(
            options.active_groups(),
            vec![
                RuleGroup::ModernApis,
                RuleGroup::JsSyntax,
                RuleGroup::Framework(Framework::Vue)
            ]
        );
    }

    #[test]
    fn test_category_allow_list() {
        let options = RuleOptions {
            categories: vec![Category::Css],
            ..Default::default()
        };
        let registry = RuleRegistry::from_options(&options);
        assert!(!registry.is_empty());
        assert!(registry.iter().all(|r| r.category == Category::Css));
    }

    #[test]
    fn test_custom_rules_override_builtin() {
        let options = RuleOptions {
            custom_rules: vec![custom("css-grid", r"grid-area\s*:")],
            ..Default::default()
        };
        let registry = RuleRegistry::from_options(&options);
        let rule = registry.get("css-grid").unwrap();
        assert_eq!(rule.matcher().pattern(), r"grid-area\s*:");
        assert!(rule.file_types.is_empty());

        let set = registry.build();
        assert!(set.match_content("display: grid", "css").is_empty());
        assert_eq!(set.match_content("grid-area: main", "css")[0].feature, "css-grid");
    }

    #[test]
    fn test_custom_rules_bypass_category_allow_list() {
        let mut def = custom("seo-meta", r"<meta\s+name=");
        def.category = Category::Seo;
        let options = RuleOptions {
            categories: vec![Category::Css],
            custom_rules: vec![def],
            ..Default::default()
        };
        let registry = RuleRegistry::from_options(&options);
        assert!(registry.get("seo-meta").is_some());
    }

    #[test]
    fn test_duplicate_custom_rules_are_reported() {
        let options = RuleOptions {
            custom_rules: vec![custom("view-names", "one"), custom("view-names", "two")],
            ..Default::default()
        };
        let registry = RuleRegistry::from_options(&options);

        assert_eq!(registry.get("view-names").unwrap().matcher().pattern(), "two");
        let problems = registry.validate();
        assert_eq!(problems, vec!["duplicate custom rule 'view-names'".to_string()]);
    }

    #[test]
    fn test_add_replaces_in_place() {
        let mut registry = RuleRegistry::new();
        registry.add_definition(&custom("a", "aaa"));
        registry.add_definition(&custom("b", "bbb"));
        registry.add_definition(&custom("a", "zzz"));

        let names: Vec<_> = registry.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(registry.get("a").unwrap().matcher().pattern(), "zzz");
    }

    #[test]
    fn test_remove_keeps_index_consistent() {
        let mut registry = RuleRegistry::new();
        for name in ["a", "b", "c"] {
            registry.add_definition(&custom(name, name));
        }
        assert!(registry.remove("a").is_some());
        assert!(registry.remove("a").is_none());
        assert_eq!(registry.get("c").unwrap().name, "c");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_update_patches_rule() {
        let mut registry = RuleRegistry::from_options(&RuleOptions::default());
        registry
            .update(
                "fetch",
                RulePatch {
                    pattern: Some(r"\bky\.get\s*\(".to_string()),
                    description: Some("ky wrapper".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        let rule = registry.get("fetch").unwrap();
        assert_eq!(rule.description.as_deref(), Some("ky wrapper"));
        assert_eq!(rule.category, Category::Api);

        let err = registry.update(
            "fetch",
            RulePatch {
                pattern: Some("(".to_string()),
                ..Default::default()
            },
        );
        assert!(matches!(err, Err(RegistryError::InvalidPattern { .. })));
        assert_eq!(registry.get("fetch").unwrap().matcher().pattern(), r"\bky\.get\s*\(");

        assert!(matches!(
            registry.update("nope", RulePatch::default()),
            Err(RegistryError::UnknownRule(_))
        ));
    }

    #[test]
    fn test_validate_reports_problems() {
        let mut registry = RuleRegistry::new();
        registry.add_definition(&custom("bad", "(oops"));
        registry.add_definition(&custom("empty", ""));
        registry.add_definition(&custom("star", "x*"));
        registry.add_definition(&custom("boundary", r"\b"));
        registry.add_definition(&custom("fine", "grid"));

        let problems = registry.validate();
        assert_eq!(problems.len(), 4);
        assert!(problems[0].contains("'bad'"));
        assert!(problems[1].contains("empty pattern"));
        assert!(problems[2].contains("'star' matches the empty string"));
        assert!(problems[3].contains("'boundary' matches the empty string"));

        let set = registry.build();
        assert_eq!(set.len(), 1);
        assert_eq!(set.rules()[0].name, "fine");
    }

    #[test]
    fn test_failing_rule_is_isolated() {
        let mut registry = RuleRegistry::new();
        registry.add(Rule::new("broken", Arc::new(Exploding), Category::Api));
        registry.add_definition(&custom("grid", r"display:\s*grid"));
        let set = registry.build();

        let hits = set.match_content("display: grid", "css");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].feature, "grid");
    }

    #[test]
    fn test_file_type_filtering() {
        let set = RuleRegistry::from_options(&RuleOptions::default()).build();
        assert!(set.match_content("display: grid", "js").is_empty());
        assert_eq!(set.match_content("display: grid", "scss").len(), 1);
    }

    #[test]
    fn test_preset_from_str() {
        assert_eq!("ALL".parse::<Preset>(), Ok(Preset::All));
        assert_eq!("default".parse::<Preset>(), Ok(Preset::Recommended));
        assert!("everything".parse::<Preset>().is_err());
    }
}
