//! Harness MCP server: detect generated YAML in chat output and deploy it to a Harness project.

mod config;
mod sanitize;
mod tools;
mod types;

use rmcp::{
    handler::server::ServerHandler,
    model::{CallToolResult, Content},
    tool, tool_handler, tool_router,
    transport::stdio,
    ServiceExt,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::HarnessConfig;
use crate::tools::deploy::DeploySpec;
use crate::types::{DeploymentResult, ResourceKind};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct DetectParams {
    /// Free-form text (e.g. an AI response) possibly containing fenced yaml/yml blocks
    content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct SuggestParams {
    /// Raw title or description to derive platform-legal identifier/name defaults from
    raw: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct NormalizeParams {
    /// Pipeline YAML to normalize against Harness schema rules
    yaml_content: String,
    /// Identifier to force into the document
    identifier: String,
    /// Display name to force into the document
    name: String,
    /// Optional description to set on the pipeline
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct DeployParams {
    /// Resource type: pipeline, connector, service, environment, infrastructure
    resource_type: String,
    /// YAML document to deploy
    yaml_content: String,
    /// Resource identifier (pattern ^[a-zA-Z_][0-9a-zA-Z_$]{0,127}$)
    identifier: String,
    /// Resource display name (pattern ^[a-zA-Z_][0-9a-zA-Z\-_ ]{0,127}$)
    name: String,
    /// Optional description
    #[serde(default)]
    description: Option<String>,
    /// Connector spec type when the YAML carries none (default GitHttp)
    #[serde(default)]
    connector_type: Option<String>,
    /// Environment type (default Production)
    #[serde(default)]
    environment_type: Option<String>,
    /// Infrastructure type (default KubernetesDirect)
    #[serde(default)]
    infrastructure_type: Option<String>,
    /// Target environment identifier; required for infrastructure
    #[serde(default)]
    environment_id: Option<String>,
}

#[derive(Clone)]
struct HarnessMcpService {
    tool_router: rmcp::handler::server::tool::ToolRouter<Self>,
    config: Result<HarnessConfig, String>,
}

#[tool_router]
impl HarnessMcpService {
    fn new(config: Result<HarnessConfig, String>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            config,
        }
    }

    #[tool(description = "Detect Harness YAML documents (pipeline, connector, service, environment, infrastructure) in free-form text with fenced code blocks")]
    async fn detect_harness_yamls(
        &self,
        params: rmcp::handler::server::wrapper::Parameters<DetectParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let infos = tools::detect::detect_harness_yamls_in_content(&params.0.content);
        let out = serde_json::to_string_pretty(&infos).unwrap_or_else(|_| "[]".to_string());
        Ok(CallToolResult::success(vec![Content::text(out)]))
    }

    #[tool(description = "Derive platform-legal identifier and name defaults from a raw title, with validity flags")]
    async fn suggest_resource_identifiers(
        &self,
        params: rmcp::handler::server::wrapper::Parameters<SuggestParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let raw = params.0.raw;
        let identifier = sanitize::sanitize_identifier(&raw);
        let name = sanitize::sanitize_name(&raw);
        let out = serde_json::json!({
            "identifier": identifier,
            "name": name,
            "identifierValid": sanitize::validate_identifier(&identifier),
            "nameValid": sanitize::validate_name(&name),
        });
        Ok(CallToolResult::success(vec![Content::text(
            serde_json::to_string_pretty(&out).unwrap_or_default(),
        )]))
    }

    #[tool(description = "Normalize pipeline YAML against Harness schema rules (identity overrides, failure strategies, step types, approval executions); returns the original text when it cannot be normalized")]
    async fn normalize_pipeline_yaml(
        &self,
        params: rmcp::handler::server::wrapper::Parameters<NormalizeParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let config = match &self.config {
            Ok(config) => config,
            Err(message) => {
                return Ok(CallToolResult::error(vec![Content::text(message.clone())]))
            }
        };
        let p = params.0;
        let out = tools::normalize::normalize_pipeline_yaml(
            &p.yaml_content,
            &p.identifier,
            &p.name,
            p.description.as_deref(),
            &config.org_id,
            &config.project_id,
        )
        .unwrap_or(p.yaml_content);
        Ok(CallToolResult::success(vec![Content::text(out)]))
    }

    #[tool(description = "Deploy a Harness resource from YAML to the configured org/project; returns a deployment result with success flag and details")]
    async fn deploy_harness_resource(
        &self,
        params: rmcp::handler::server::wrapper::Parameters<DeployParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let p = params.0;

        let config = match &self.config {
            Ok(config) => config,
            Err(message) => {
                let result = DeploymentResult::failure(message.clone(), Some(p.identifier));
                return Ok(deployment_result_content(&result));
            }
        };

        let kind: ResourceKind = match p.resource_type.parse() {
            Ok(kind) => kind,
            Err(message) => {
                let result = DeploymentResult::failure(message, Some(p.identifier));
                return Ok(deployment_result_content(&result));
            }
        };

        let spec = DeploySpec {
            kind,
            yaml_content: p.yaml_content,
            identifier: p.identifier,
            name: p.name,
            description: p.description,
            connector_type: p.connector_type,
            environment_type: p.environment_type,
            infrastructure_type: p.infrastructure_type,
            environment_id: p.environment_id,
        };
        let result = tools::deploy::deploy_resource(config, spec).await;
        Ok(deployment_result_content(&result))
    }

    #[tool(description = "List the deployable Harness resource types with endpoints, body fields, defaults and naming rules")]
    async fn list_harness_resource_types(&self) -> Result<CallToolResult, rmcp::ErrorData> {
        let out = tools::reference::list_harness_resource_types_json();
        Ok(CallToolResult::success(vec![Content::text(out)]))
    }
}

fn deployment_result_content(result: &DeploymentResult) -> CallToolResult {
    let text = serde_json::to_string_pretty(result).unwrap_or_else(|_| result.message.clone());
    if result.success {
        CallToolResult::success(vec![Content::text(text)])
    } else {
        CallToolResult::error(vec![Content::text(text)])
    }
}

#[tool_handler]
impl ServerHandler for HarnessMcpService {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        let mut info = rmcp::model::ServerInfo::default();
        info.instructions = Some("MCP for Harness: detect YAML documents in chat output, sanitize names, normalize pipelines and deploy them to a Harness project.".to_string());
        info.capabilities = rmcp::model::ServerCapabilities::builder()
            .enable_tools()
            .build();
        info
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // stdout carries the MCP transport; logs go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match HarnessConfig::from_env() {
        Ok(config) => {
            info!(org = %config.org_id, project = %config.project_id, "Harness configuration loaded");
            Ok(config)
        }
        Err(err) => {
            warn!("{}; deploy tools will refuse until configured", err);
            Err(err.to_string())
        }
    };

    let service = HarnessMcpService::new(config);
    let transport = stdio();
    let server = service.serve(transport).await?;
    server.waiting().await?;
    Ok(())
}
