//! Access Control Example
//!
//! A login pipeline whose members answer in the result slot: a refusal
//! writes its reason and stops the run, the audit step at the end writes
//! [`ACCESS_GRANTED`].
//!
//! ```text
//! Authentication ─► Authorization ─► IpWhitelist (admins only) ─► Audit
//! ```
//!
//! # Usage
//!
//! ```
//! use access_control::{ACCESS_GRANTED, AccessConfig, AuthRequest, access_chain};
//!
//! # fn main() -> Result<(), composable_chain_core::ChainError> {
//! let chain = access_chain(&AccessConfig::default());
//! let execution = chain.run(AuthRequest::new("alice", "secret123", "User", "203.0.113.7"))?;
//!
//! assert_eq!(execution.request.result()?, ACCESS_GRANTED);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod config;

pub use config::{AccessConfig, AccessConfigBuilder};

use composable_chain_core::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Message written by the audit step when every check passed.
pub const ACCESS_GRANTED: &str = "Access granted";

/// Checks passed so far in one run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessFact {
    /// Credentials were accepted
    Authenticated,
    /// Role was accepted
    Authorized,
    /// Source address was checked against the whitelist and accepted
    AddressVerified,
}

/// A login attempt. The result slot carries the decision message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthRequest {
    /// Login name, empty when absent
    pub username: String,
    /// Presented password, empty when absent
    pub password: String,
    /// Requested role
    pub role: String,
    /// Source address
    pub ip_address: String,
}

impl AuthRequest {
    /// Build a login attempt
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        role: impl Into<String>,
        ip_address: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            role: role.into(),
            ip_address: ip_address.into(),
        }
    }
}

impl Payload for AuthRequest {
    type Outcome = String;
    type Fact = AccessFact;
}

/// Whether a finished run granted access.
#[must_use]
pub fn is_granted(request: &Request<AuthRequest>) -> bool {
    request
        .prior_outcome()
        .is_some_and(|message| message == ACCESS_GRANTED)
}

fn deny(request: &mut Request<AuthRequest>, message: String) -> HandlerResult {
    tracing::warn!(user = %request.payload().username, reason = %message, "Access refused");
    request.set_result(message);
    HandlerResult::Handled
}

//
// ===== Handlers =====
//

/// Checks username and password.
#[derive(Debug, Clone)]
pub struct AuthenticationHandler {
    expected_password: String,
}

impl AuthenticationHandler {
    /// Accept logins presenting `expected_password`
    pub fn new(expected_password: impl Into<String>) -> Self {
        Self {
            expected_password: expected_password.into(),
        }
    }
}

impl Handler<AuthRequest> for AuthenticationHandler {
    fn name(&self) -> &str {
        "Authentication"
    }

    fn process(&self, request: &mut Request<AuthRequest>) -> Result<HandlerResult> {
        tracing::info!("Checking credentials");
        let login = request.payload();
        if login.username.is_empty() || login.password.is_empty() {
            return Ok(deny(
                request,
                "Authentication failed: Missing credentials".to_string(),
            ));
        }
        if login.password != self.expected_password {
            return Ok(deny(
                request,
                "Authentication failed: Invalid password".to_string(),
            ));
        }

        request.mark(AccessFact::Authenticated);
        tracing::info!("Authentication successful");
        Ok(HandlerResult::Continue)
    }
}

/// Checks the requested role.
#[derive(Debug, Clone)]
pub struct AuthorizationHandler {
    allowed_roles: BTreeSet<String>,
}

impl AuthorizationHandler {
    /// Allow the given roles
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_roles: roles.into_iter().map(Into::into).collect(),
        }
    }
}

impl Handler<AuthRequest> for AuthorizationHandler {
    fn name(&self) -> &str {
        "Authorization"
    }

    fn process(&self, request: &mut Request<AuthRequest>) -> Result<HandlerResult> {
        tracing::info!("Checking authorization");
        let role = &request.payload().role;
        if !self.allowed_roles.contains(role) {
            let message = format!("Authorization failed: Role '{role}' not allowed");
            return Ok(deny(request, message));
        }

        request.mark(AccessFact::Authorized);
        tracing::info!("Authorization successful");
        Ok(HandlerResult::Continue)
    }
}

/// Checks the source address, but only for one guarded role.
#[derive(Debug, Clone)]
pub struct IpWhitelistHandler {
    guarded_role: String,
    allowed: BTreeSet<String>,
}

impl IpWhitelistHandler {
    /// Restrict `guarded_role` to the given addresses
    pub fn new<I, S>(guarded_role: impl Into<String>, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            guarded_role: guarded_role.into(),
            allowed: addresses.into_iter().map(Into::into).collect(),
        }
    }
}

impl Handler<AuthRequest> for IpWhitelistHandler {
    fn name(&self) -> &str {
        "IpWhitelist"
    }

    fn can_handle(&self, request: &Request<AuthRequest>) -> bool {
        request.payload().role == self.guarded_role
    }

    fn process(&self, request: &mut Request<AuthRequest>) -> Result<HandlerResult> {
        let address = &request.payload().ip_address;
        tracing::info!(role = %self.guarded_role, ip = %address, "Checking IP whitelist");
        if !self.allowed.contains(address) {
            let message = format!("Access denied: IP '{address}' not whitelisted");
            return Ok(deny(request, message));
        }

        request.mark(AccessFact::AddressVerified);
        tracing::info!("IP check passed");
        Ok(HandlerResult::Continue)
    }
}

/// Records the successful login and grants access.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditHandler;

impl Handler<AuthRequest> for AuditHandler {
    fn name(&self) -> &str {
        "Audit"
    }

    fn process(&self, request: &mut Request<AuthRequest>) -> Result<HandlerResult> {
        let login = request.payload();
        tracing::info!(
            user = %login.username,
            role = %login.role,
            ip = %login.ip_address,
            "Logging successful access"
        );
        request.set_result(ACCESS_GRANTED.to_string());
        Ok(HandlerResult::Handled)
    }
}

/// The access pipeline.
#[must_use]
pub fn access_chain(config: &AccessConfig) -> Chain<AuthRequest> {
    Chain::with_config(ChainConfig::labelled("access-control"))
        .add_handler(AuthenticationHandler::new(config.password.clone()))
        .add_handler(AuthorizationHandler::new(config.allowed_roles.iter().cloned()))
        .add_handler(IpWhitelistHandler::new(
            config.admin_role.clone(),
            config.ip_whitelist.iter().cloned(),
        ))
        .add_handler(AuditHandler.logged("audit"))
}
