//! Harness connection configuration.
//!
//! Read once at startup from environment variables:
//! - `HARNESS_API_KEY` - Required. API key sent as `x-api-key`.
//! - `HARNESS_ACCOUNT_ID` - Required. Account id sent as `Harness-Account`.
//! - `HARNESS_ORG_ID` - Required. Target organization identifier.
//! - `HARNESS_PROJECT_ID` - Required. Target project identifier.
//! - `HARNESS_BASE_URL` - Optional. Defaults to `https://app.harness.io`.

use thiserror::Error;

use crate::types::DEFAULT_BASE_URL;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Harness configuration incomplete; missing environment variables: {}", .0.join(", "))]
    MissingEnvVars(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub api_key: String,
    pub account_id: String,
    pub org_id: String,
    pub project_id: String,
    pub base_url: String,
}

impl HarnessConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVars` naming every required variable
    /// that is unset, so the caller can report them all at once.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        let mut required = |key: &str| match std::env::var(key) {
            Ok(value) if !value.is_empty() => value,
            _ => {
                missing.push(key.to_string());
                String::new()
            }
        };

        let api_key = required("HARNESS_API_KEY");
        let account_id = required("HARNESS_ACCOUNT_ID");
        let org_id = required("HARNESS_ORG_ID");
        let project_id = required("HARNESS_PROJECT_ID");

        if !missing.is_empty() {
            return Err(ConfigError::MissingEnvVars(missing));
        }

        let base_url = std::env::var("HARNESS_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Ok(HarnessConfig {
            api_key,
            account_id,
            org_id,
            project_id,
            base_url,
        })
    }

    /// Path prefix shared by every resource collection endpoint.
    pub fn project_scope(&self) -> String {
        format!("/v1/orgs/{}/projects/{}", self.org_id, self.project_id)
    }
}
