//! Structured-output parsing for generated text.
//!
//! The generation backend does not reliably honor any output format, so
//! every stage funnels its raw completion through an ordered strategy
//! cascade: strict JSON, relaxed YAML, delimiter-based line extraction,
//! regex salvage, and finally a fixed fallback. The first strategy that
//! yields a usable value wins; parsing never fails and never re-invokes
//! generation. All strategies are pure functions of the input text.

use std::sync::OnceLock;

use regex::Regex;

/// Which cascade tier produced a parsed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseTier {
    /// JSON literal matching the expected shape.
    Strict,
    /// YAML sequence/mapping.
    Relaxed,
    /// Bullet/numbered/comma line extraction.
    Lines,
    /// Regex salvage of known sub-patterns.
    Salvage,
    /// Fixed default; nothing usable in the raw text.
    Fallback,
}

/// A parsed value tagged with the tier that produced it.
#[derive(Debug, Clone)]
pub struct Parsed<T> {
    pub value: T,
    pub tier: ParseTier,
}

impl<T> Parsed<T> {
    pub fn used_fallback(&self) -> bool {
        self.tier == ParseTier::Fallback
    }
}

fn quoted_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""([^"]+)""#).unwrap())
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").unwrap())
}

fn monthly_purchases_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+,?\d*)\+?\s*bought in past month").unwrap())
}

/// Strip a surrounding markdown code fence and leading document
/// separator, leaving the payload text.
pub fn extract_code_block(text: &str) -> String {
    let inner = if let Some(start) = text.find("```json") {
        let start = start + 7;
        let end = text[start..].rfind("```").map(|p| p + start).unwrap_or(text.len());
        &text[start..end]
    } else if let Some(start) = text.find("```yaml") {
        let start = start + 7;
        let end = text[start..].rfind("```").map(|p| p + start).unwrap_or(text.len());
        &text[start..end]
    } else if let Some(start) = text.find("```") {
        let start = start + 3;
        let end = text[start..].rfind("```").map(|p| p + start).unwrap_or(text.len());
        &text[start..end]
    } else {
        text
    };

    inner.trim().trim_start_matches("---").trim().to_string()
}

fn clean_item(item: &str) -> String {
    item.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim_end_matches(|c| c == ',' || c == '.' || c == ';')
        .trim()
        .to_string()
}

/// Strip a leading list marker (`- `, `* `, `• `, `1. `, `1) `) from a
/// line, returning `None` when the line carries no marker.
fn strip_list_marker(line: &str) -> Option<&str> {
    let line = line.trim_start();
    for marker in ["- ", "* ", "• "] {
        if let Some(rest) = line.strip_prefix(marker) {
            return Some(rest);
        }
    }

    // Numbered markers: digits followed by '.' or ')'
    let digits: String = line.chars().take_while(|c| c.is_ascii_digit()).collect();
    if !digits.is_empty() {
        let rest = &line[digits.len()..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return Some(rest.trim_start());
        }
    }

    None
}

// =============================================================================
// STRING LISTS
// =============================================================================

/// Parse a flat list of strings (interest categories, gift categories,
/// search keywords). Always returns at least `fallback` when the text
/// yields nothing.
pub fn parse_string_list(raw: &str, fallback: &[&str]) -> Parsed<Vec<String>> {
    let cleaned = extract_code_block(raw);

    if let Some(items) = strict_string_list(&cleaned) {
        return Parsed {
            value: items,
            tier: ParseTier::Strict,
        };
    }

    if let Some(items) = relaxed_string_list(&cleaned) {
        return Parsed {
            value: items,
            tier: ParseTier::Relaxed,
        };
    }

    if let Some(items) = lines_string_list(&cleaned) {
        return Parsed {
            value: items,
            tier: ParseTier::Lines,
        };
    }

    let quoted = salvage_quoted(&cleaned);
    if !quoted.is_empty() {
        return Parsed {
            value: quoted,
            tier: ParseTier::Salvage,
        };
    }

    Parsed {
        value: fallback.iter().map(|s| s.to_string()).collect(),
        tier: ParseTier::Fallback,
    }
}

fn strict_string_list(text: &str) -> Option<Vec<String>> {
    let items: Vec<String> = serde_json::from_str(text).ok()?;
    let items: Vec<String> = items
        .iter()
        .map(|s| clean_item(s))
        .filter(|s| !s.is_empty())
        .collect();
    (!items.is_empty()).then_some(items)
}

fn relaxed_string_list(text: &str) -> Option<Vec<String>> {
    let items: Vec<String> = serde_yaml::from_str(text).ok()?;
    let items: Vec<String> = items
        .iter()
        .map(|s| clean_item(s))
        .filter(|s| !s.is_empty())
        .collect();
    (!items.is_empty()).then_some(items)
}

fn lines_string_list(text: &str) -> Option<Vec<String>> {
    let lines: Vec<&str> = text
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let mut items = Vec::new();
    for line in &lines {
        if let Some(rest) = strip_list_marker(line) {
            let item = clean_item(rest);
            if !item.is_empty() {
                items.push(item);
            }
        }
    }

    // A single unmarked line of comma-separated tokens is the most
    // common "Categories: a, b, c" answer.
    if items.is_empty() && lines.len() == 1 {
        let line = lines[0]
            .split_once(':')
            .map(|(_, rest)| rest)
            .unwrap_or(lines[0]);
        items = line
            .split(',')
            .map(clean_item)
            .filter(|s| !s.is_empty())
            .collect();
        if items.len() < 2 {
            return None;
        }
    }

    (!items.is_empty()).then_some(items)
}

// =============================================================================
// CATEGORY MAPS
// =============================================================================

/// Parse a category → items map (gift-idea generation output). Entry
/// order follows the source text where the format preserves it.
pub fn parse_category_map(raw: &str) -> Option<(Vec<(String, Vec<String>)>, ParseTier)> {
    let cleaned = extract_code_block(raw);

    if let Some(map) = strict_category_map(&cleaned) {
        return Some((map, ParseTier::Strict));
    }

    if let Some(map) = relaxed_category_map(&cleaned) {
        return Some((map, ParseTier::Relaxed));
    }

    if let Some(map) = lines_category_map(&cleaned) {
        return Some((map, ParseTier::Lines));
    }

    let salvaged = salvage_category_pairs(&cleaned);
    if !salvaged.is_empty() {
        return Some((salvaged, ParseTier::Salvage));
    }

    None
}

fn entries_from_json(value: serde_json::Value) -> Option<Vec<(String, Vec<String>)>> {
    let obj = value.as_object()?;
    let mut entries = Vec::new();
    for (category, items) in obj {
        let items = items.as_array()?;
        let items: Vec<String> = items
            .iter()
            .filter_map(|v| v.as_str())
            .map(clean_item)
            .filter(|s| !s.is_empty())
            .collect();
        if !items.is_empty() {
            entries.push((clean_item(category), items));
        }
    }
    (!entries.is_empty()).then_some(entries)
}

fn strict_category_map(text: &str) -> Option<Vec<(String, Vec<String>)>> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    entries_from_json(value)
}

fn relaxed_category_map(text: &str) -> Option<Vec<(String, Vec<String>)>> {
    let value: serde_yaml::Value = serde_yaml::from_str(text).ok()?;
    let mapping = value.as_mapping()?;
    let mut entries = Vec::new();
    for (k, v) in mapping {
        let category = clean_item(k.as_str()?);
        let items: Vec<String> = v
            .as_sequence()?
            .iter()
            .filter_map(|i| i.as_str())
            .map(clean_item)
            .filter(|s| !s.is_empty())
            .collect();
        if !items.is_empty() {
            entries.push((category, items));
        }
    }
    (!entries.is_empty()).then_some(entries)
}

fn lines_category_map(text: &str) -> Option<Vec<(String, Vec<String>)>> {
    let mut entries: Vec<(String, Vec<String>)> = Vec::new();
    let mut current: Option<String> = None;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if trimmed.ends_with(':') && strip_list_marker(trimmed).is_none() {
            current = Some(clean_item(&trimmed[..trimmed.len() - 1]));
            continue;
        }

        if let Some(rest) = strip_list_marker(trimmed) {
            let item = clean_item(rest);
            if item.is_empty() {
                continue;
            }
            match &current {
                Some(category) => {
                    if entries.last().map(|(c, _)| c != category).unwrap_or(true) {
                        entries.push((category.clone(), Vec::new()));
                    }
                    entries.last_mut().unwrap().1.push(item);
                }
                // "Category: item" packed into the bullet itself
                None => {
                    if let Some((category, item)) = item.split_once(':') {
                        let category = clean_item(category);
                        let item = clean_item(item);
                        if !category.is_empty() && !item.is_empty() {
                            if entries.last().map(|(c, _)| c != &category).unwrap_or(true) {
                                entries.push((category, Vec::new()));
                            }
                            entries.last_mut().unwrap().1.push(item);
                        }
                    }
                }
            }
        }
    }

    entries.retain(|(_, items)| !items.is_empty());
    (!entries.is_empty()).then_some(entries)
}

fn salvage_category_pairs(text: &str) -> Vec<(String, Vec<String>)> {
    let mut entries: Vec<(String, Vec<String>)> = Vec::new();
    for quoted in salvage_quoted(text) {
        if let Some((category, item)) = quoted.split_once(':') {
            let category = clean_item(category);
            let item = clean_item(item);
            if category.is_empty() || item.is_empty() {
                continue;
            }
            if entries.last().map(|(c, _)| c != &category).unwrap_or(true) {
                entries.push((category, Vec::new()));
            }
            entries.last_mut().unwrap().1.push(item);
        }
    }
    entries
}

// =============================================================================
// LABELED PAIRS
// =============================================================================

/// Parse `"Label: rationale"` pairs (finalist selection output).
pub fn parse_labeled_pairs(raw: &str) -> Option<(Vec<(String, String)>, ParseTier)> {
    let cleaned = extract_code_block(raw);

    if let Some(items) = strict_string_list(&cleaned) {
        let pairs = pairs_from_items(&items);
        if !pairs.is_empty() {
            return Some((pairs, ParseTier::Strict));
        }
    }

    if let Some(items) = relaxed_string_list(&cleaned) {
        let pairs = pairs_from_items(&items);
        if !pairs.is_empty() {
            return Some((pairs, ParseTier::Relaxed));
        }
    }

    let mut pairs = Vec::new();
    for line in cleaned.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let body = strip_list_marker(trimmed).unwrap_or(trimmed);
        if let Some((label, rationale)) = body.split_once(':') {
            let label = clean_item(label);
            let rationale = clean_item(rationale);
            if !label.is_empty() && !rationale.is_empty() {
                pairs.push((label, rationale));
            }
        }
    }
    if !pairs.is_empty() {
        return Some((pairs, ParseTier::Lines));
    }

    let pairs = pairs_from_items(&salvage_quoted(&cleaned));
    if !pairs.is_empty() {
        return Some((pairs, ParseTier::Salvage));
    }

    None
}

fn pairs_from_items(items: &[String]) -> Vec<(String, String)> {
    items
        .iter()
        .filter_map(|s| s.split_once(':'))
        .map(|(label, rationale)| (clean_item(label), clean_item(rationale)))
        .filter(|(label, rationale)| !label.is_empty() && !rationale.is_empty())
        .collect()
}

// =============================================================================
// SALVAGE HELPERS
// =============================================================================

/// Extract double-quoted substrings in order of appearance.
pub fn salvage_quoted(text: &str) -> Vec<String> {
    quoted_re()
        .captures_iter(text)
        .map(|c| clean_item(&c[1]))
        .filter(|s| !s.is_empty())
        .collect()
}

/// First numeric token in the text, if any. Used for price/rating fields
/// that arrive as prose ("4.5 out of 5 stars", "$23").
pub fn salvage_number(text: &str) -> Option<f64> {
    number_re().find(text)?.as_str().parse().ok()
}

/// Extract the count from an "N bought in past month" fragment.
pub fn salvage_monthly_purchases(text: &str) -> Option<u32> {
    let caps = monthly_purchases_re().captures(text)?;
    caps[1].replace(',', "").parse().ok()
}
