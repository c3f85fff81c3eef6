//! Named-placeholder templates.
//!
//! Stage skeletons are plain text with `{{name}}` slots. Filling a template
//! fails if any slot has no value, so a renamed placeholder can never leak
//! into a generated script.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{CodegenError, Result};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([a-z][a-z0-9_]*)\s*\}\}").expect("Invalid regex: template placeholder")
});

/// A template embedded in the binary.
#[derive(Debug, Clone, Copy)]
pub struct Template {
    name: &'static str,
    source: &'static str,
}

impl Template {
    pub const fn new(name: &'static str, source: &'static str) -> Self {
        Self { name, source }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Placeholder names referenced by the template.
    pub fn placeholders(&self) -> BTreeSet<&'static str> {
        PLACEHOLDER
            .captures_iter(self.source)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect()
    }

    /// Fill every placeholder from `vars`.
    pub fn render(&self, vars: &Vars) -> Result<String> {
        let mut out = String::with_capacity(self.source.len() * 2);
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(self.source) {
            let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let value = vars
                .get(key.as_str())
                .ok_or_else(|| CodegenError::MissingPlaceholder {
                    template: self.name.to_string(),
                    placeholder: key.as_str().to_string(),
                })?;
            out.push_str(&self.source[last..whole.start()]);
            out.push_str(value);
            last = whole.end();
        }
        out.push_str(&self.source[last..]);
        Ok(out)
    }
}

/// Values for template placeholders.
#[derive(Debug, Clone, Default)]
pub struct Vars {
    values: BTreeMap<String, String>,
}

impl Vars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// Indent every non-empty line of `block` by `levels` * 4 spaces.
pub fn indent(block: &str, levels: usize) -> String {
    let pad = " ".repeat(levels * 4);
    block
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
