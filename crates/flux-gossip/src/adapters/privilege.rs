//! Configuration-driven privilege checker.
//!
//! Maps `zelidauth` header values to privilege levels. Standalone nodes
//! use it in place of the session subsystem.

use crate::ports::{Privilege, PrivilegeChecker, RequestContext};
use async_trait::async_trait;
use std::collections::HashMap;

/// Header carrying the caller's session token.
pub const AUTH_HEADER: &str = "zelidauth";

/// Static token table.
#[derive(Debug, Clone, Default)]
pub struct StaticPrivilegeChecker {
    tokens: HashMap<String, Privilege>,
}

impl StaticPrivilegeChecker {
    /// Checker granting `tokens`.
    pub fn new(tokens: HashMap<String, Privilege>) -> Self {
        Self { tokens }
    }

    /// Grant `level` to `token`.
    pub fn grant(mut self, token: impl Into<String>, level: Privilege) -> Self {
        self.tokens.insert(token.into(), level);
        self
    }
}

#[async_trait]
impl PrivilegeChecker for StaticPrivilegeChecker {
    async fn check_privilege(&self, level: Privilege, ctx: &RequestContext) -> bool {
        ctx.header(AUTH_HEADER)
            .and_then(|token| self.tokens.get(token))
            .is_some_and(|granted| *granted >= level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_levels() {
        let checker = StaticPrivilegeChecker::default()
            .grant("team-token", Privilege::ZelTeam)
            .grant("user-token", Privilege::User);

        let team = RequestContext::with_header("ZelIDAuth", "team-token");
        assert!(checker.check_privilege(Privilege::ZelTeam, &team).await);
        assert!(checker.check_privilege(Privilege::User, &team).await);
        assert!(!checker.check_privilege(Privilege::Admin, &team).await);

        let user = RequestContext::with_header(AUTH_HEADER, "user-token");
        assert!(!checker.check_privilege(Privilege::ZelTeam, &user).await);

        assert!(!checker.check_privilege(Privilege::User, &RequestContext::default()).await);
    }
}
