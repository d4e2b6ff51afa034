// SPDX-License-Identifier: MIT
//! Security policy domain model (spec.md §3, §4.1).
//!
//! `SecurityPolicy` is built once from configuration and is immutable for
//! the lifetime of the server — every decision method here is a pure
//! function of `(&self, inputs)`, so identical inputs always yield
//! identical outputs (spec.md §8, "Policy decisions are pure functions").

use serde::{Deserialize, Serialize};

use super::command_match::{template_matches, tokenize};
use super::glob::{any_match, glob_match};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyMode {
    Strict,
    Moderate,
    Permissive,
}

impl Default for PolicyMode {
    fn default() -> Self {
        PolicyMode::Strict
    }
}

/// Which broad operation categories are enabled at all, independent of
/// container/command/path scoping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(default)]
    pub logs: bool,
    #[serde(default)]
    pub inspect: bool,
    #[serde(default)]
    pub stats: bool,
    #[serde(default)]
    pub exec: bool,
    #[serde(default)]
    pub files: bool,
}

/// A named permission kind, used so handlers can ask
/// `policy.permission(Permission::Logs)` instead of matching on a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Logs,
    Inspect,
    Stats,
    Exec,
    Files,
}

/// An ordered `container-glob -> command templates` whitelist entry.
/// Kept as a `Vec` (not a map) because declaration order is authoritative
/// (spec.md §9, open questions).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecWhitelistEntry {
    pub container_pattern: String,
    pub templates: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DangerousExec {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub commands: Vec<ExecWhitelistEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedPathRule {
    pub pattern: String,
    /// Empty means the rule applies to every container.
    #[serde(default)]
    pub containers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskingRule {
    #[serde(rename = "match")]
    pub match_pattern: String,
    pub replacement: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputMasking {
    #[serde(default)]
    pub patterns: Vec<MaskingRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostPathMask {
    #[serde(rename = "match")]
    pub match_literal: String,
    pub replacement: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityPolicy {
    #[serde(default)]
    pub mode: PolicyMode,
    #[serde(default)]
    pub allowed_containers: Vec<String>,
    #[serde(default)]
    pub permissions: Permissions,
    #[serde(default)]
    pub exec_whitelist: Vec<ExecWhitelistEntry>,
    #[serde(default)]
    pub exec_dangerously: DangerousExec,
    #[serde(default)]
    pub blocked_paths: Vec<BlockedPathRule>,
    #[serde(default)]
    pub output_masking: OutputMasking,
    #[serde(default)]
    pub host_path_masks: Vec<HostPathMask>,
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self {
            mode: PolicyMode::default(),
            allowed_containers: Vec::new(),
            permissions: Permissions::default(),
            exec_whitelist: Vec::new(),
            exec_dangerously: DangerousExec::default(),
            blocked_paths: Vec::new(),
            output_masking: OutputMasking::default(),
            host_path_masks: Vec::new(),
        }
    }
}

/// Outcome of `Policy::exec_allowed`, carrying enough detail for both the
/// tool handler's audit event and the denial text shown to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecDecision {
    pub allowed: bool,
    pub dangerous: bool,
    /// The template string that matched, if any.
    pub matched_template: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathDecision {
    pub blocked: bool,
    pub rule_pattern: Option<String>,
    pub reason: String,
}

impl SecurityPolicy {
    pub fn container_allowed(&self, name: &str) -> bool {
        any_match(&self.allowed_containers, name)
    }

    pub fn permission(&self, p: Permission) -> bool {
        match p {
            Permission::Logs => self.permissions.logs,
            Permission::Inspect => self.permissions.inspect,
            Permission::Stats => self.permissions.stats,
            Permission::Exec => self.permissions.exec,
            Permission::Files => self.permissions.files,
        }
    }

    pub fn dangerous_mode(&self) -> bool {
        self.exec_dangerously.enabled
    }

    /// First whitelist template (if any) matching `command` in `container`,
    /// in declaration order.
    pub fn match_whitelist(&self, container: &str, command: &str) -> Option<String> {
        first_matching_template(&self.exec_whitelist, container, &tokenize(command))
    }

    /// First dangerous-mode template (if any) matching `command`, ignoring
    /// whether dangerous mode is actually enabled — callers gate on
    /// `dangerous_mode()` themselves.
    pub fn match_dangerous(&self, container: &str, command: &str) -> Option<String> {
        first_matching_template(&self.exec_dangerously.commands, container, &tokenize(command))
    }

    /// spec.md §4.1 `execAllowed`: tokenise, walk whitelist entries in
    /// declaration order, fall back to `exec_dangerously` only if dangerous
    /// mode is enabled and the whitelist produced no match.
    pub fn exec_allowed(&self, container: &str, command: &str) -> ExecDecision {
        if let Some(template) = self.match_whitelist(container, command) {
            return ExecDecision {
                allowed: true,
                dangerous: false,
                matched_template: Some(template),
                reason: "command allowed by whitelist".to_string(),
            };
        }

        if self.dangerous_mode() {
            if let Some(template) = self.match_dangerous(container, command) {
                return ExecDecision {
                    allowed: true,
                    dangerous: true,
                    matched_template: Some(template),
                    reason: "command allowed by dangerous-mode whitelist".to_string(),
                };
            }
        }

        ExecDecision {
            allowed: false,
            dangerous: false,
            matched_template: None,
            reason: format!("command not allowed for container {container}"),
        }
    }

    /// spec.md §4.1 `pathBlocked`.
    pub fn path_blocked(&self, container: &str, path: &str) -> PathDecision {
        for rule in &self.blocked_paths {
            let in_scope = rule.containers.is_empty() || any_match(&rule.containers, container);
            if in_scope && glob_match(&rule.pattern, path) {
                return PathDecision {
                    blocked: true,
                    rule_pattern: Some(rule.pattern.clone()),
                    reason: format!("path {path} is blocked by rule {}", rule.pattern),
                };
            }
        }
        PathDecision {
            blocked: false,
            rule_pattern: None,
            reason: String::new(),
        }
    }
}

fn first_matching_template(
    entries: &[ExecWhitelistEntry],
    container: &str,
    tokens: &[&str],
) -> Option<String> {
    for entry in entries {
        if !glob_match(&entry.container_pattern, container) {
            continue;
        }
        for template in &entry.templates {
            let template_tokens = tokenize(template);
            if template_matches(&template_tokens, tokens) {
                return Some(template.clone());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whitelist(container_pattern: &str, templates: &[&str]) -> ExecWhitelistEntry {
        ExecWhitelistEntry {
            container_pattern: container_pattern.to_string(),
            templates: templates.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn star_container_pattern_allows_every_name() {
        let mut policy = SecurityPolicy::default();
        policy.allowed_containers = vec!["*".to_string()];
        assert!(policy.container_allowed("anything"));

        policy.allowed_containers = vec![];
        assert!(!policy.container_allowed("anything"));
    }

    #[test]
    fn exec_allowed_matches_first_entry_in_declaration_order() {
        let mut policy = SecurityPolicy::default();
        policy.exec_whitelist = vec![
            whitelist("demo-api", &["npm test", "pytest **"]),
        ];
        let decision = policy.exec_allowed("demo-api", "pytest tests/unit -q");
        assert!(decision.allowed);
        assert!(!decision.dangerous);
        assert_eq!(decision.matched_template.as_deref(), Some("pytest **"));
    }

    #[test]
    fn exec_denied_when_no_template_matches() {
        let mut policy = SecurityPolicy::default();
        policy.exec_whitelist = vec![whitelist("demo-api", &["npm test"])];
        let decision = policy.exec_allowed("demo-api", "rm -rf /");
        assert!(!decision.allowed);
        assert!(!decision.dangerous);
    }

    #[test]
    fn dangerous_mode_only_applies_when_whitelist_misses_and_enabled() {
        let mut policy = SecurityPolicy::default();
        policy.exec_whitelist = vec![whitelist("*", &["npm test"])];
        policy.exec_dangerously = DangerousExec {
            enabled: true,
            commands: vec![whitelist("*", &["rm -rf /tmp/**"])],
        };

        // Whitelist hit wins even though dangerous entry could also match.
        let decision = policy.exec_allowed("demo-api", "npm test");
        assert!(decision.allowed && !decision.dangerous);

        let decision = policy.exec_allowed("demo-api", "rm -rf /tmp/scratch");
        assert!(decision.allowed && decision.dangerous);

        policy.exec_dangerously.enabled = false;
        let decision = policy.exec_allowed("demo-api", "rm -rf /tmp/scratch");
        assert!(!decision.allowed);
    }

    #[test]
    fn empty_whitelist_denies_every_command() {
        let policy = SecurityPolicy::default();
        let decision = policy.exec_allowed("demo-api", "echo hi");
        assert!(!decision.allowed);
    }

    #[test]
    fn blocked_path_rule_with_empty_containers_is_global() {
        let mut policy = SecurityPolicy::default();
        policy.blocked_paths = vec![BlockedPathRule {
            pattern: "/etc/**".to_string(),
            containers: vec![],
        }];
        assert!(policy.path_blocked("anything", "/etc/passwd").blocked);
        assert!(!policy.path_blocked("anything", "/workspace/app.py").blocked);
    }

    #[test]
    fn blocked_path_rule_scoped_to_containers() {
        let mut policy = SecurityPolicy::default();
        policy.blocked_paths = vec![BlockedPathRule {
            pattern: "/secrets/**".to_string(),
            containers: vec!["prod-*".to_string()],
        }];
        assert!(policy.path_blocked("prod-db", "/secrets/key").blocked);
        assert!(!policy.path_blocked("demo-api", "/secrets/key").blocked);
    }
}
