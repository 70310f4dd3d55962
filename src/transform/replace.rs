//! Regex search-and-replace driven by `search:replace` pairs

use regex::Regex;
use tracing::info;

use super::TransformError;

/// One compiled replacement rule
#[derive(Debug, Clone)]
pub struct Replacement {
    pattern: Regex,
    replace: String,
}

impl Replacement {
    pub fn new(search: &str, replace: &str) -> Result<Self, TransformError> {
        let pattern = Regex::new(search).map_err(|source| TransformError::Pattern {
            pattern: search.to_string(),
            source,
        })?;
        Ok(Self {
            pattern,
            replace: replace.to_string(),
        })
    }

    pub fn search(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn replace(&self) -> &str {
        &self.replace
    }
}

/// Parse `"a:b,c:d"` into compiled rules
///
/// Pairs missing either side are skipped; both sides are trimmed. Only the
/// first two `:`-separated fields of a pair are used.
pub fn parse_replacements(spec: &str) -> Result<Vec<Replacement>, TransformError> {
    let mut rules = Vec::new();
    for pair in spec.split(',') {
        let mut parts = pair.split(':');
        let (Some(search), Some(replace)) = (parts.next(), parts.next()) else {
            continue;
        };
        let (search, replace) = (search.trim(), replace.trim());
        if search.is_empty() || replace.is_empty() {
            continue;
        }
        rules.push(Replacement::new(search, replace)?);
    }

    if rules.is_empty() {
        return Err(TransformError::NoReplacements);
    }
    Ok(rules)
}

/// Apply every rule in order, each replacing all matches
pub fn replace_text(text: &str, rules: &[Replacement]) -> String {
    let mut modified = text.to_string();
    for rule in rules {
        modified = rule
            .pattern
            .replace_all(&modified, rule.replace.as_str())
            .into_owned();
        info!("Replaced {:?} -> {:?}", rule.search(), rule.replace());
    }
    modified
}
