use super::{compile_table, MARKUP_TYPES};
use crate::rules::{Category, Rule};
use once_cell::sync::Lazy;

const FEATURES: &[(&str, &str, &str)] = &[
    ("html-dialog", r"<dialog\b", "<dialog> element"),
    ("html-popover", r"<[a-zA-Z][^>]*\spopover(?:\s|=|/?>)", "popover attribute"),
    ("html-details", r"<details\b", "<details> disclosure"),
    ("html-lazy-loading", r#"\bloading\s*=\s*["']?lazy"#, "Native lazy loading"),
    ("html-picture", r"<picture\b", "<picture> element"),
    ("html-template", r"<template\b", "<template> element"),
    ("html-inert", r"<[a-zA-Z][^>]*\sinert(?:\s|=|/?>)", "inert attribute"),
    ("html-date-input", r#"<input\b[^>]*\btype\s*=\s*["']?(?:date|datetime-local|month|week|time)\b"#, "Date and time inputs"),
];

pub static HTML_FEATURES: Lazy<Vec<Rule>> =
    Lazy::new(|| compile_table(FEATURES, Category::Html, MARKUP_TYPES, None));
