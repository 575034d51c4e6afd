// Shared types for Harness YAML detection and deployment.
// YAML documents themselves are handled as serde_yaml::Value trees.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The five Harness resource kinds this server can detect and deploy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Pipeline,
    Connector,
    Service,
    Environment,
    Infrastructure,
}

impl ResourceKind {
    /// Detection probes top-level keys in this fixed order; the first key
    /// present wins, even when a document carries several of them.
    pub const DETECTION_ORDER: [ResourceKind; 5] = [
        ResourceKind::Pipeline,
        ResourceKind::Connector,
        ResourceKind::Service,
        ResourceKind::Environment,
        ResourceKind::Infrastructure,
    ];

    /// Top-level YAML key that marks a document as this kind.
    pub fn yaml_key(&self) -> &'static str {
        match self {
            ResourceKind::Pipeline => "pipeline",
            ResourceKind::Connector => "connector",
            ResourceKind::Service => "service",
            ResourceKind::Environment => "environment",
            ResourceKind::Infrastructure => "infrastructure",
        }
    }

    /// REST collection segment under the org/project scope. Infrastructure
    /// is nested under an environment; the request builder handles that.
    pub fn collection(&self) -> &'static str {
        match self {
            ResourceKind::Pipeline => "pipelines",
            ResourceKind::Connector => "connectors",
            ResourceKind::Service => "services",
            ResourceKind::Environment => "environments",
            ResourceKind::Infrastructure => "infrastructures",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.yaml_key())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pipeline" => Ok(ResourceKind::Pipeline),
            "connector" => Ok(ResourceKind::Connector),
            "service" => Ok(ResourceKind::Service),
            "environment" => Ok(ResourceKind::Environment),
            "infrastructure" => Ok(ResourceKind::Infrastructure),
            other => Err(format!("Unsupported YAML type: {}", other)),
        }
    }
}

/// Classification of one YAML block as a Harness document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YamlInfo {
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    pub is_valid: bool,
    pub yaml_content: String,
}

/// Terminal outcome of a deploy action. Validation failures, transport
/// errors and remote rejections all fold into this shape; nothing throws
/// past the deploy entry point.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl DeploymentResult {
    pub fn failure(message: impl Into<String>, identifier: Option<String>) -> Self {
        DeploymentResult {
            success: false,
            message: message.into(),
            identifier,
            details: None,
        }
    }
}

pub const DEFAULT_BASE_URL: &str = "https://app.harness.io";
pub const DEFAULT_CONNECTOR_TYPE: &str = "GitHttp";
pub const DEFAULT_ENVIRONMENT_TYPE: &str = "Production";
pub const DEFAULT_INFRASTRUCTURE_TYPE: &str = "KubernetesDirect";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_kind_parses_all_five() {
        for kind in ResourceKind::DETECTION_ORDER {
            assert_eq!(kind.yaml_key().parse::<ResourceKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_resource_kind_rejects_unknown() {
        let err = "secret".parse::<ResourceKind>().unwrap_err();
        assert!(err.contains("Unsupported YAML type"));
        assert!(err.contains("secret"));
    }

    #[test]
    fn test_deployment_result_serializes_camel_case() {
        let result = DeploymentResult {
            success: true,
            message: "ok".to_string(),
            identifier: Some("build".to_string()),
            details: None,
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"identifier\":\"build\""));
        assert!(!json.contains("details"));
    }
}
