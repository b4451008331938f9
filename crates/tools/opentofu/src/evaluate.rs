//! Version constraint evaluation.
//!
//! Specifiers use the range syntax common to release tooling:
//!
//! - `1.9.0` - exactly that version
//! - `1.9` - any 1.9.x
//! - `>=1.8.0 <1.9.0` or `>=1.8.0, <1.9.0` - comparator sets
//! - `~1.8`, `^1.6.0`, `1.x`, `*` - shorthand ranges
//! - `1.6.0 - 1.7.2` - inclusive hyphen range
//! - `1.6.x || >=1.9.0` - alternatives
//!
//! The best match is the highest satisfying version. Prereleases only match a
//! comparator that names a prerelease of the same version.

use semver::{Version, VersionReq};
use tracing::trace;

/// Picks the best version for a constraint.
pub trait VersionEvaluator: Send + Sync {
    /// Return the highest of `versions` satisfying `constraint`, if any.
    fn evaluate(&self, versions: &[&str], constraint: &str) -> Option<String>;
}

/// Semantic version evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SemverEvaluator;

impl VersionEvaluator for SemverEvaluator {
    fn evaluate(&self, versions: &[&str], constraint: &str) -> Option<String> {
        let alternatives = parse_constraint(constraint)?;

        let mut candidates: Vec<(Version, &str)> = versions
            .iter()
            .filter_map(|id| parse_version(id).map(|v| (v, *id)))
            .collect();
        candidates.sort_by(|a, b| b.0.cmp(&a.0));

        trace!(
            constraint,
            candidates = candidates.len(),
            "Evaluating versions"
        );

        candidates
            .into_iter()
            .find(|(version, _)| alternatives.iter().any(|req| req.matches(version)))
            .map(|(_, id)| id.to_string())
    }
}

/// Parse a manifest identifier, tolerating a leading `v`.
fn parse_version(id: &str) -> Option<Version> {
    Version::parse(id.trim().trim_start_matches('v')).ok()
}

/// Parse a constraint into its `||` alternatives.
///
/// Returns `None` if any alternative is not a valid range.
fn parse_constraint(constraint: &str) -> Option<Vec<VersionReq>> {
    constraint
        .split("||")
        .map(|alternative| {
            let normalized = normalize_comparators(alternative)?;
            VersionReq::parse(&normalized).ok()
        })
        .collect()
}

/// Rewrite one comparator set into `semver` crate syntax.
///
/// Operators separated from their version are joined, a hyphen range becomes
/// a `>=`/`<=` pair, and a bare version gets an explicit `=` so that it means
/// "this version" rather than a caret range.
fn normalize_comparators(set: &str) -> Option<String> {
    let tokens: Vec<&str> = set
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect();

    if tokens.is_empty() {
        return None;
    }

    if let [low, "-", high] = tokens.as_slice() {
        return Some(format!(">={}, <={}", strip_v(low), strip_v(high)));
    }

    let mut comparators = Vec::with_capacity(tokens.len());
    let mut pending_op: Option<&str> = None;

    for token in tokens {
        if is_operator(token) {
            pending_op = Some(token);
            continue;
        }

        let (attached, version) = split_operator(token);
        let version = strip_v(version);
        let comparator = match pending_op.take() {
            Some(op) => format!("{op}{attached}{version}"),
            None if !attached.is_empty() => format!("{attached}{version}"),
            None if is_wildcard(version) => version.to_string(),
            None => format!("={version}"),
        };
        comparators.push(comparator);
    }

    // Dangling operator
    if pending_op.is_some() {
        return None;
    }

    Some(comparators.join(", "))
}

fn is_operator(token: &str) -> bool {
    matches!(token, "=" | ">" | ">=" | "<" | "<=" | "~" | "^")
}

/// Split a token into its leading operator and the version after it.
fn split_operator(token: &str) -> (&str, &str) {
    let at = token
        .find(|c: char| !matches!(c, '=' | '>' | '<' | '~' | '^'))
        .unwrap_or(token.len());
    token.split_at(at)
}

fn is_wildcard(token: &str) -> bool {
    token
        .split('.')
        .any(|part| matches!(part, "*" | "x" | "X"))
}

fn strip_v(token: &str) -> &str {
    token.trim_start_matches('v')
}
