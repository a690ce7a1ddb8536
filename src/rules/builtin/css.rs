use super::{compile_table, STYLE_TYPES};
use crate::rules::{Category, Rule};
use once_cell::sync::Lazy;

const FEATURES: &[(&str, &str, &str)] = &[
    ("css-grid", r"display\s*:\s*(?:inline-)?grid\b", "CSS Grid layout"),
    ("css-subgrid", r"grid-template-(?:rows|columns)\s*:\s*subgrid\b", "CSS Subgrid"),
    ("css-flexbox", r"display\s*:\s*(?:inline-)?flex\b", "CSS Flexible Box layout"),
    ("css-flexbox-legacy", r"display\s*:\s*-(?:webkit|moz|ms)-(?:inline-)?(?:box|flexbox)\b", "Pre-standard flexbox syntax"),
    ("css-container-queries", r"@container\b|container-type\s*:", "Container queries"),
    ("css-has", r":has\(", ":has() relational selector"),
    ("css-custom-properties", r"var\(\s*--", "CSS custom properties"),
    ("css-cascade-layers", r"@layer\b", "Cascade layers"),
    ("css-aspect-ratio", r"\baspect-ratio\s*:", "aspect-ratio property"),
    ("css-clamp", r"\bclamp\(", "clamp() function"),
    ("css-backdrop-filter", r"\bbackdrop-filter\s*:", "backdrop-filter property"),
    ("css-scroll-snap", r"\bscroll-snap-type\s*:", "Scroll snap"),
    ("css-logical-properties", r"\b(?:margin|padding|border)-(?:inline|block)(?:-start|-end)?\s*:|\binset-(?:inline|block)\s*:", "Logical properties"),
    ("css-color-mix", r"\bcolor-mix\(", "color-mix() function"),
    ("css-anchor-positioning", r"\b(?:anchor-name|position-anchor)\s*:", "Anchor positioning"),
    ("css-text-wrap-balance", r"\btext-wrap\s*:\s*(?:balance|pretty)\b", "text-wrap balance/pretty"),
];

pub static CSS_FEATURES: Lazy<Vec<Rule>> =
    Lazy::new(|| compile_table(FEATURES, Category::Css, STYLE_TYPES, None));
