// SPDX-License-Identifier: MIT
//! Thin wrapper around [`SecurityPolicy`] exposing the handler-facing
//! decision surface (spec.md §4.1, §4.3 step 2-4). Tool handlers never call
//! `SecurityPolicy` methods directly — they go through here so the audit
//! `details` field and denial text stay consistent across all nine tools.

use std::sync::Arc;

use crate::domain::policy::{ExecDecision, Permission, SecurityPolicy};

#[derive(Debug, Clone)]
pub enum PolicyDenial {
    PermissionDenied { permission: Permission, reason: String },
    ContainerNotAllowed { container: String, reason: String },
    ExecNotAllowed { reason: String },
    PathBlocked { reason: String },
}

impl PolicyDenial {
    pub fn reason(&self) -> &str {
        match self {
            PolicyDenial::PermissionDenied { reason, .. } => reason,
            PolicyDenial::ContainerNotAllowed { reason, .. } => reason,
            PolicyDenial::ExecNotAllowed { reason } => reason,
            PolicyDenial::PathBlocked { reason } => reason,
        }
    }

    /// Structured detail for the `access_denied` audit event (SPEC_FULL §11).
    pub fn detail(&self) -> serde_json::Value {
        match self {
            PolicyDenial::PermissionDenied { permission, .. } => {
                serde_json::json!({"kind": "permission", "permission": format!("{permission:?}")})
            }
            PolicyDenial::ContainerNotAllowed { container, .. } => {
                serde_json::json!({"kind": "container", "container": container})
            }
            PolicyDenial::ExecNotAllowed { .. } => serde_json::json!({"kind": "exec_whitelist"}),
            PolicyDenial::PathBlocked { .. } => serde_json::json!({"kind": "blocked_path"}),
        }
    }
}

pub struct PolicyEngine {
    policy: Arc<SecurityPolicy>,
}

impl PolicyEngine {
    pub fn new(policy: Arc<SecurityPolicy>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SecurityPolicy {
        &self.policy
    }

    /// Steps 2-3 of the handler contract: permission, then container scope.
    pub fn authorize_container(
        &self,
        permission: Permission,
        container: &str,
    ) -> Result<(), PolicyDenial> {
        if !self.policy.permission(permission) {
            return Err(PolicyDenial::PermissionDenied {
                permission,
                reason: format!("permission {permission:?} is disabled by policy"),
            });
        }
        if !self.policy.container_allowed(container) {
            return Err(PolicyDenial::ContainerNotAllowed {
                container: container.to_string(),
                reason: format!("container {container} not in allowed list"),
            });
        }
        Ok(())
    }

    /// `exec_command`'s tool-level rule (spec.md §4.3): the client's
    /// `dangerously` flag selects which whitelist is consulted, it does not
    /// fall through from one to the other the way the bare `execAllowed`
    /// policy primitive does.
    pub fn authorize_exec(
        &self,
        container: &str,
        command: &str,
        dangerously: bool,
    ) -> Result<ExecDecision, PolicyDenial> {
        if dangerously {
            if !self.policy.dangerous_mode() {
                return Err(PolicyDenial::ExecNotAllowed {
                    reason: "dangerous mode is not enabled".to_string(),
                });
            }
            return match self.policy.match_dangerous(container, command) {
                Some(template) => Ok(ExecDecision {
                    allowed: true,
                    dangerous: true,
                    matched_template: Some(template),
                    reason: "command allowed by dangerous-mode whitelist".to_string(),
                }),
                None => Err(PolicyDenial::ExecNotAllowed {
                    reason: format!("command not allowed for container {container}"),
                }),
            };
        }

        match self.policy.match_whitelist(container, command) {
            Some(template) => Ok(ExecDecision {
                allowed: true,
                dangerous: false,
                matched_template: Some(template),
                reason: "command allowed by whitelist".to_string(),
            }),
            None => Err(PolicyDenial::ExecNotAllowed {
                reason: format!("command not allowed for container {container}"),
            }),
        }
    }

    pub fn authorize_path(&self, container: &str, path: &str) -> Result<(), PolicyDenial> {
        let decision = self.policy.path_blocked(container, path);
        if decision.blocked {
            return Err(PolicyDenial::PathBlocked {
                reason: decision.reason,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::policy::{DangerousExec, ExecWhitelistEntry, Permissions};

    fn engine() -> PolicyEngine {
        let mut policy = SecurityPolicy::default();
        policy.allowed_containers = vec!["demo-*".to_string()];
        policy.permissions = Permissions {
            logs: true,
            inspect: false,
            stats: false,
            exec: true,
            files: false,
        };
        policy.exec_whitelist = vec![ExecWhitelistEntry {
            container_pattern: "*".to_string(),
            templates: vec!["npm test".to_string()],
        }];
        policy.exec_dangerously = DangerousExec {
            enabled: true,
            commands: vec![ExecWhitelistEntry {
                container_pattern: "*".to_string(),
                templates: vec!["rm -rf /tmp/**".to_string()],
            }],
        };
        PolicyEngine::new(Arc::new(policy))
    }

    #[test]
    fn permission_checked_before_container_scope() {
        let err = engine()
            .authorize_container(Permission::Inspect, "demo-api")
            .unwrap_err();
        assert!(matches!(err, PolicyDenial::PermissionDenied { .. }));
    }

    #[test]
    fn container_outside_scope_is_denied() {
        let err = engine()
            .authorize_container(Permission::Logs, "prod-db")
            .unwrap_err();
        assert!(matches!(err, PolicyDenial::ContainerNotAllowed { .. }));
    }

    #[test]
    fn dangerously_flag_picks_the_dangerous_whitelist_only() {
        let e = engine();
        // npm test is only in the plain whitelist, not the dangerous one.
        assert!(e.authorize_exec("demo-api", "npm test", true).is_err());
        assert!(e.authorize_exec("demo-api", "npm test", false).is_ok());
        assert!(e
            .authorize_exec("demo-api", "rm -rf /tmp/x", true)
            .unwrap()
            .dangerous);
    }

    #[test]
    fn dangerously_flag_without_enabled_mode_is_denied() {
        let mut policy = SecurityPolicy::default();
        policy.exec_dangerously.enabled = false;
        let engine = PolicyEngine::new(Arc::new(policy));
        let err = engine.authorize_exec("demo-api", "rm -rf /tmp", true).unwrap_err();
        assert_eq!(err.reason(), "dangerous mode is not enabled");
    }
}
