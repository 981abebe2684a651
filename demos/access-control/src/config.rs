//! Access control configuration.

use std::collections::BTreeSet;

/// Settings for the access pipeline.
///
/// # Default Values
///
/// - `password`: `"secret123"`
/// - `allowed_roles`: `Admin`, `User`
/// - `admin_role`: `"Admin"`
/// - `ip_whitelist`: `192.168.1.10`, `10.0.0.1`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessConfig {
    /// Password every user must present
    pub password: String,
    /// Roles allowed past authorization
    pub allowed_roles: BTreeSet<String>,
    /// Role whose requests are checked against the whitelist
    pub admin_role: String,
    /// Addresses admins may connect from
    pub ip_whitelist: BTreeSet<String>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            password: "secret123".to_string(),
            allowed_roles: ["Admin", "User"].into_iter().map(String::from).collect(),
            admin_role: "Admin".to_string(),
            ip_whitelist: ["192.168.1.10", "10.0.0.1"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl AccessConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> AccessConfigBuilder {
        AccessConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AccessConfig`].
#[derive(Debug, Clone)]
pub struct AccessConfigBuilder {
    config: AccessConfig,
}

impl AccessConfigBuilder {
    /// Set the expected password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = password.into();
        self
    }

    /// Replace the allowed roles.
    #[must_use]
    pub fn allowed_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.allowed_roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Set the role subject to the IP whitelist.
    #[must_use]
    pub fn admin_role(mut self, role: impl Into<String>) -> Self {
        self.config.admin_role = role.into();
        self
    }

    /// Replace the IP whitelist.
    #[must_use]
    pub fn ip_whitelist<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.ip_whitelist = addresses.into_iter().map(Into::into).collect();
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> AccessConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AccessConfig::default();
        assert_eq!(config.password, "secret123");
        assert!(config.allowed_roles.contains("User"));
        assert!(config.ip_whitelist.contains("10.0.0.1"));
    }

    #[test]
    fn test_builder_replaces_sets() {
        let config = AccessConfig::builder()
            .allowed_roles(["Auditor"])
            .ip_whitelist(Vec::<String>::new())
            .build();
        assert_eq!(config.allowed_roles.len(), 1);
        assert!(config.ip_whitelist.is_empty());
    }
}
