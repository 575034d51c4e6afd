// Build kind-specific deploy requests and submit them to the Harness API.

use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::HarnessConfig;
use crate::sanitize::{validate_identifier, validate_name, IDENTIFIER_PATTERN, NAME_PATTERN};
use crate::tools::normalize::normalize_pipeline_yaml;
use crate::types::{
    DeploymentResult, ResourceKind, DEFAULT_CONNECTOR_TYPE, DEFAULT_ENVIRONMENT_TYPE,
    DEFAULT_INFRASTRUCTURE_TYPE,
};

/// User-confirmed inputs for one deploy action.
#[derive(Debug, Clone)]
pub struct DeploySpec {
    pub kind: ResourceKind,
    pub yaml_content: String,
    pub identifier: String,
    pub name: String,
    pub description: Option<String>,
    pub connector_type: Option<String>,
    pub environment_type: Option<String>,
    pub infrastructure_type: Option<String>,
    pub environment_id: Option<String>,
}

/// Local rejections raised before any network call.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Identifier and name are required")]
    MissingIdentifierOrName,
    #[error("Identifier must match pattern: {}", IDENTIFIER_PATTERN)]
    InvalidIdentifier,
    #[error("Name must match pattern: {}", NAME_PATTERN)]
    InvalidName,
    #[error("Environment ID is required for infrastructure deployment")]
    MissingEnvironmentId,
}

/// Fail-fast checks run before normalization and before any network call.
pub fn validate_spec(spec: &DeploySpec) -> Result<(), DeployError> {
    if spec.identifier.is_empty() || spec.name.is_empty() {
        return Err(DeployError::MissingIdentifierOrName);
    }
    if !validate_identifier(&spec.identifier) {
        return Err(DeployError::InvalidIdentifier);
    }
    if !validate_name(&spec.name) {
        return Err(DeployError::InvalidName);
    }
    if spec.kind == ResourceKind::Infrastructure
        && spec.environment_id.as_deref().map_or(true, str::is_empty)
    {
        return Err(DeployError::MissingEnvironmentId);
    }
    Ok(())
}

/// Resolves the endpoint path and request body for a deploy action.
/// Validates identifier/name against the platform patterns and the
/// kind-specific requirements; never touches the network.
pub fn build_deploy_request(
    config: &HarnessConfig,
    spec: &DeploySpec,
) -> Result<(String, Value), DeployError> {
    validate_spec(spec)?;

    let scope = config.project_scope();

    let (endpoint, body) = match spec.kind {
        ResourceKind::Pipeline => {
            // The platform wants the identity fields both in the envelope
            // and inside the YAML; normalization already rewrote the latter.
            let mut body = json!({
                "identifier": spec.identifier,
                "name": spec.name,
                "pipeline_yaml": spec.yaml_content,
            });
            insert_description(&mut body, spec.description.as_deref());
            (format!("{}/{}", scope, spec.kind.collection()), body)
        }
        ResourceKind::Connector => {
            let connector_spec =
                connector_spec_from_yaml(&spec.yaml_content, spec.connector_type.as_deref());
            let mut connector = json!({
                "identifier": spec.identifier,
                "name": spec.name,
                "org": config.org_id,
                "project": config.project_id,
                "spec": connector_spec,
            });
            insert_description(&mut connector, spec.description.as_deref());
            (
                format!("{}/{}", scope, spec.kind.collection()),
                json!({ "connector": connector }),
            )
        }
        ResourceKind::Service => {
            let mut body = json!({
                "identifier": spec.identifier,
                "name": spec.name,
                "yaml": spec.yaml_content,
            });
            insert_description(&mut body, spec.description.as_deref());
            (format!("{}/{}", scope, spec.kind.collection()), body)
        }
        ResourceKind::Environment => {
            let env_type = spec
                .environment_type
                .as_deref()
                .unwrap_or(DEFAULT_ENVIRONMENT_TYPE);
            let mut body = json!({
                "identifier": spec.identifier,
                "name": spec.name,
                "type": env_type,
                "yaml": spec.yaml_content,
            });
            insert_description(&mut body, spec.description.as_deref());
            (format!("{}/{}", scope, spec.kind.collection()), body)
        }
        ResourceKind::Infrastructure => {
            let environment_id = spec
                .environment_id
                .as_deref()
                .filter(|id| !id.is_empty())
                .ok_or(DeployError::MissingEnvironmentId)?;
            let infra_type = spec
                .infrastructure_type
                .as_deref()
                .unwrap_or(DEFAULT_INFRASTRUCTURE_TYPE);
            let mut body = json!({
                "identifier": spec.identifier,
                "name": spec.name,
                "type": infra_type,
                "yaml": spec.yaml_content,
            });
            insert_description(&mut body, spec.description.as_deref());
            (
                format!(
                    "{}/environments/{}/{}",
                    scope,
                    environment_id,
                    spec.kind.collection()
                ),
                body,
            )
        }
    };

    Ok((endpoint, body))
}

/// Submits one deploy action and folds every outcome into a
/// `DeploymentResult`. One POST, no retries, no internal timeout; any retry
/// or cancellation policy belongs to the caller.
pub async fn deploy_resource(config: &HarnessConfig, mut spec: DeploySpec) -> DeploymentResult {
    if let Err(err) = validate_spec(&spec) {
        warn!(kind = %spec.kind, identifier = %spec.identifier, "deploy rejected: {}", err);
        return DeploymentResult::failure(err.to_string(), Some(spec.identifier.clone()));
    }

    if spec.kind == ResourceKind::Pipeline {
        match normalize_pipeline_yaml(
            &spec.yaml_content,
            &spec.identifier,
            &spec.name,
            spec.description.as_deref(),
            &config.org_id,
            &config.project_id,
        ) {
            Some(normalized) => spec.yaml_content = normalized,
            None => debug!("submitting original pipeline YAML, normalization skipped"),
        }
    }

    let (endpoint, body) = match build_deploy_request(config, &spec) {
        Ok(request) => request,
        Err(err) => {
            warn!(kind = %spec.kind, identifier = %spec.identifier, "deploy rejected: {}", err);
            return DeploymentResult::failure(err.to_string(), Some(spec.identifier.clone()));
        }
    };

    let url = format!("{}{}", config.base_url, endpoint);
    info!(kind = %spec.kind, identifier = %spec.identifier, %url, "deploying resource");
    debug!(body = %body, "deploy request body");

    let client = reqwest::Client::new();
    let response = match client
        .post(&url)
        .header("x-api-key", &config.api_key)
        .header("Harness-Account", &config.account_id)
        .json(&body)
        .send()
        .await
    {
        Ok(response) => response,
        Err(err) => {
            warn!(kind = %spec.kind, "deploy request failed: {}", err);
            return DeploymentResult::failure(
                format!("Failed to deploy {}: {}", spec.kind, err),
                Some(spec.identifier.clone()),
            );
        }
    };

    let status = response.status();
    if !status.is_success() {
        let body_text = response.text().await.unwrap_or_default();
        warn!(kind = %spec.kind, status = status.as_u16(), "Harness API rejected the request");
        return DeploymentResult {
            success: false,
            message: format!(
                "Harness API error ({}): {}",
                status.as_u16(),
                remote_error_message(&body_text)
            ),
            identifier: Some(spec.identifier.clone()),
            details: Some(json!({ "status": status.as_u16(), "body": body_text })),
        };
    }

    match response.json::<Value>().await {
        Ok(details) => {
            info!(kind = %spec.kind, identifier = %spec.identifier, "deployed successfully");
            DeploymentResult {
                success: true,
                message: format!("{} \"{}\" deployed successfully", spec.kind, spec.name),
                identifier: Some(spec.identifier.clone()),
                details: Some(details),
            }
        }
        Err(err) => DeploymentResult::failure(
            format!("Failed to deploy {}: {}", spec.kind, err),
            Some(spec.identifier.clone()),
        ),
    }
}

/// Connector bodies carry the `spec` subtree of the source YAML; when the
/// YAML is unusable, fall back to a bare spec of the requested (or default)
/// connector type.
fn connector_spec_from_yaml(yaml_content: &str, connector_type: Option<&str>) -> Value {
    let fallback = json!({ "type": connector_type.unwrap_or(DEFAULT_CONNECTOR_TYPE) });

    let parsed: serde_yaml::Value = match serde_yaml::from_str(yaml_content) {
        Ok(parsed) => parsed,
        Err(_) => return fallback,
    };
    match parsed.get("connector").and_then(|c| c.get("spec")) {
        Some(connector_spec) => serde_json::to_value(connector_spec).unwrap_or(fallback),
        None => fallback,
    }
}

/// Pulls a `message` field out of a JSON error body, falling back to the
/// raw text when the body is not JSON.
fn remote_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|parsed| {
            parsed
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

fn insert_description(body: &mut Value, description: Option<&str>) {
    if let (Some(obj), Some(description)) = (body.as_object_mut(), description) {
        obj.insert("description".to_string(), Value::String(description.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_BASE_URL;

    fn test_config() -> HarnessConfig {
        HarnessConfig {
            api_key: "pat.key".to_string(),
            account_id: "acct".to_string(),
            org_id: "default".to_string(),
            project_id: "demo".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    fn spec(kind: ResourceKind) -> DeploySpec {
        DeploySpec {
            kind,
            yaml_content: "service:\n  name: svc\n".to_string(),
            identifier: "svc_1".to_string(),
            name: "Service One".to_string(),
            description: None,
            connector_type: None,
            environment_type: None,
            infrastructure_type: None,
            environment_id: None,
        }
    }

    #[test]
    fn test_pipeline_request_shape() {
        let mut s = spec(ResourceKind::Pipeline);
        s.yaml_content = "pipeline:\n  name: p\n".to_string();
        s.description = Some("desc".to_string());
        let (endpoint, body) = build_deploy_request(&test_config(), &s).unwrap();
        assert_eq!(endpoint, "/v1/orgs/default/projects/demo/pipelines");
        assert_eq!(body["identifier"], "svc_1");
        assert_eq!(body["name"], "Service One");
        assert_eq!(body["description"], "desc");
        assert_eq!(body["pipeline_yaml"], "pipeline:\n  name: p\n");
    }

    #[test]
    fn test_description_omitted_when_absent() {
        let (_, body) = build_deploy_request(&test_config(), &spec(ResourceKind::Service)).unwrap();
        assert!(body.get("description").is_none());
    }

    #[test]
    fn test_connector_request_extracts_spec() {
        let mut s = spec(ResourceKind::Connector);
        s.yaml_content = "\
connector:
  identifier: github
  spec:
    type: GitHttp
    url: https://github.com/acme/repo
"
        .to_string();
        let (endpoint, body) = build_deploy_request(&test_config(), &s).unwrap();
        assert_eq!(endpoint, "/v1/orgs/default/projects/demo/connectors");
        let connector = &body["connector"];
        assert_eq!(connector["org"], "default");
        assert_eq!(connector["project"], "demo");
        assert_eq!(connector["spec"]["url"], "https://github.com/acme/repo");
    }

    #[test]
    fn test_connector_spec_falls_back_to_type() {
        assert_eq!(
            connector_spec_from_yaml("not: a connector", None),
            json!({ "type": "GitHttp" })
        );
        assert_eq!(
            connector_spec_from_yaml("[broken", Some("DockerRegistry")),
            json!({ "type": "DockerRegistry" })
        );
    }

    #[test]
    fn test_service_request_shape() {
        let (endpoint, body) = build_deploy_request(&test_config(), &spec(ResourceKind::Service)).unwrap();
        assert_eq!(endpoint, "/v1/orgs/default/projects/demo/services");
        assert_eq!(body["yaml"], "service:\n  name: svc\n");
    }

    #[test]
    fn test_environment_type_defaults_to_production() {
        let (endpoint, body) =
            build_deploy_request(&test_config(), &spec(ResourceKind::Environment)).unwrap();
        assert_eq!(endpoint, "/v1/orgs/default/projects/demo/environments");
        assert_eq!(body["type"], "Production");

        let mut s = spec(ResourceKind::Environment);
        s.environment_type = Some("PreProduction".to_string());
        let (_, body) = build_deploy_request(&test_config(), &s).unwrap();
        assert_eq!(body["type"], "PreProduction");
    }

    #[test]
    fn test_infrastructure_requires_environment_id() {
        let err = build_deploy_request(&test_config(), &spec(ResourceKind::Infrastructure))
            .unwrap_err();
        assert!(err.to_string().contains("Environment ID is required"));
    }

    #[test]
    fn test_infrastructure_request_shape() {
        let mut s = spec(ResourceKind::Infrastructure);
        s.environment_id = Some("prod_env".to_string());
        let (endpoint, body) = build_deploy_request(&test_config(), &s).unwrap();
        assert_eq!(
            endpoint,
            "/v1/orgs/default/projects/demo/environments/prod_env/infrastructures"
        );
        assert_eq!(body["type"], "KubernetesDirect");
    }

    #[test]
    fn test_empty_identifier_rejected() {
        let mut s = spec(ResourceKind::Service);
        s.identifier = String::new();
        let err = build_deploy_request(&test_config(), &s).unwrap_err();
        assert_eq!(err.to_string(), "Identifier and name are required");
    }

    #[test]
    fn test_invalid_identifier_rejected_with_pattern() {
        let mut s = spec(ResourceKind::Service);
        s.identifier = "1bad id".to_string();
        let err = build_deploy_request(&test_config(), &s).unwrap_err();
        assert!(err.to_string().contains(IDENTIFIER_PATTERN));
    }

    #[test]
    fn test_invalid_name_rejected_with_pattern() {
        let mut s = spec(ResourceKind::Service);
        s.name = "bad name!".to_string();
        let err = build_deploy_request(&test_config(), &s).unwrap_err();
        assert!(err.to_string().contains(NAME_PATTERN));
    }

    #[test]
    fn test_remote_error_message_prefers_json_message() {
        assert_eq!(
            remote_error_message(r#"{"message":"duplicate identifier"}"#),
            "duplicate identifier"
        );
        assert_eq!(remote_error_message("<html>gateway timeout</html>"), "<html>gateway timeout</html>");
        assert_eq!(remote_error_message(r#"{"code":422}"#), r#"{"code":422}"#);
    }
}
