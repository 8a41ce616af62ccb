// src/domains.rs
//! Domain list input

use anyhow::Context;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Read the domains to explore from a file (one per line)
pub fn from_file(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read domains file {:?}", path))?;
    Ok(parse(&content))
}

/// Trim and lowercase every line, drop blanks and `#` comments and repeated
/// domains. Order of first occurrence is kept.
pub fn parse(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    content
        .lines()
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter(|l| seen.insert(l.clone()))
        .collect()
}
