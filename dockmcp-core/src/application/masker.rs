// SPDX-License-Identifier: MIT
//! Output masking pipeline (spec.md §4.2).
//!
//! Stateless, deterministic, and declaration-order sensitive: rules never
//! see each other's output mid-pass, but each pass sees the prior pass's
//! output. Regexes are compiled once at startup — a malformed pattern is a
//! startup failure, never a per-request one.

use regex::Regex;
use thiserror::Error;

use crate::domain::policy::SecurityPolicy;

#[derive(Debug, Error)]
pub enum MaskerError {
    #[error("invalid masking pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

struct CompiledRule {
    regex: Regex,
    replacement: String,
}

struct HostPathMask {
    literal: String,
    replacement: String,
}

/// Stateless transformer shared read-only across all sessions.
pub struct Masker {
    rules: Vec<CompiledRule>,
    host_path_masks: Vec<HostPathMask>,
}

impl Masker {
    pub fn new(policy: &SecurityPolicy) -> Result<Self, MaskerError> {
        let mut rules = Vec::with_capacity(policy.output_masking.patterns.len());
        for rule in &policy.output_masking.patterns {
            let regex =
                Regex::new(&rule.match_pattern).map_err(|source| MaskerError::InvalidPattern {
                    pattern: rule.match_pattern.clone(),
                    source,
                })?;
            rules.push(CompiledRule {
                regex,
                replacement: rule.replacement.clone(),
            });
        }

        let host_path_masks = policy
            .host_path_masks
            .iter()
            .map(|m| HostPathMask {
                literal: m.match_literal.clone(),
                replacement: m.replacement.clone(),
            })
            .collect();

        Ok(Self {
            rules,
            host_path_masks,
        })
    }

    /// Runs `text` through every configured rule, in declaration order,
    /// regex rules first, then literal host-path substitutions.
    pub fn mask(&self, text: &str) -> String {
        let mut current = text.to_string();
        for rule in &self.rules {
            current = rule.regex.replace_all(&current, rule.replacement.as_str()).into_owned();
        }
        for mask in &self.host_path_masks {
            if mask.literal.is_empty() {
                continue;
            }
            current = current.replace(&mask.literal, &mask.replacement);
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::policy::{HostPathMask as PolicyHostPathMask, MaskingRule};

    fn policy_with_patterns(patterns: Vec<MaskingRule>) -> SecurityPolicy {
        let mut policy = SecurityPolicy::default();
        policy.output_masking.patterns = patterns;
        policy
    }

    #[test]
    fn no_match_is_identity() {
        let masker = Masker::new(&SecurityPolicy::default()).unwrap();
        assert_eq!(masker.mask("plain text, nothing to hide"), "plain text, nothing to hide");
    }

    #[test]
    fn regex_rule_redacts_match_and_hides_the_original() {
        let policy = policy_with_patterns(vec![MaskingRule {
            match_pattern: r"JWT Secret: \S+".to_string(),
            replacement: "JWT Secret: ***".to_string(),
        }]);
        let masker = Masker::new(&policy).unwrap();
        let out = masker.mask("line one\nJWT Secret: abc123\nline three");
        assert!(out.contains("JWT Secret: ***"));
        assert!(!out.contains("abc123"));
    }

    #[test]
    fn rules_apply_in_declaration_order_across_passes() {
        // Second rule only fires because the first rule's output created a
        // new substring for it to match.
        let policy = policy_with_patterns(vec![
            MaskingRule {
                match_pattern: "secret".to_string(),
                replacement: "TOKEN_abc".to_string(),
            },
            MaskingRule {
                match_pattern: "TOKEN_abc".to_string(),
                replacement: "***".to_string(),
            },
        ]);
        let masker = Masker::new(&policy).unwrap();
        assert_eq!(masker.mask("my secret value"), "my *** value");
    }

    #[test]
    fn host_path_masks_apply_after_regex_rules() {
        let mut policy = policy_with_patterns(vec![]);
        policy.host_path_masks = vec![PolicyHostPathMask {
            match_literal: "/Users/alice/project".to_string(),
            replacement: "~/project".to_string(),
        }];
        let masker = Masker::new(&policy).unwrap();
        assert_eq!(
            masker.mask("building at /Users/alice/project/src"),
            "building at ~/project/src"
        );
    }

    #[test]
    fn invalid_pattern_fails_at_construction() {
        let policy = policy_with_patterns(vec![MaskingRule {
            match_pattern: "(unclosed".to_string(),
            replacement: "x".to_string(),
        }]);
        assert!(Masker::new(&policy).is_err());
    }
}
