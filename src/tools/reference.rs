// Reference data for the deployable resource kinds (list_harness_resource_types).

use serde_json::{Map as JsonMap, Value};

pub fn list_harness_resource_types_json() -> String {
    let resource_types: JsonMap<String, Value> = default_resource_types();
    serde_json::to_string_pretty(&resource_types)
        .unwrap_or_else(|_| default_resource_types_raw().to_string())
}

fn default_resource_types() -> JsonMap<String, Value> {
    serde_json::from_str(default_resource_types_raw()).unwrap_or_default()
}

fn default_resource_types_raw() -> &'static str {
    r#"{
  "resource_types": {
    "pipeline": {
      "description": "CI/CD pipeline definition; YAML is normalized before submission",
      "endpoint": "/v1/orgs/{org}/projects/{project}/pipelines",
      "body_fields": ["identifier", "name", "description", "pipeline_yaml"],
      "detection_key": "pipeline"
    },
    "connector": {
      "description": "Connection to an external system (git, registry, cloud provider)",
      "endpoint": "/v1/orgs/{org}/projects/{project}/connectors",
      "body_fields": ["connector.identifier", "connector.name", "connector.description", "connector.org", "connector.project", "connector.spec"],
      "detection_key": "connector",
      "defaults": { "spec.type": "GitHttp" }
    },
    "service": {
      "description": "Deployable service definition",
      "endpoint": "/v1/orgs/{org}/projects/{project}/services",
      "body_fields": ["identifier", "name", "description", "yaml"],
      "detection_key": "service"
    },
    "environment": {
      "description": "Deployment target environment",
      "endpoint": "/v1/orgs/{org}/projects/{project}/environments",
      "body_fields": ["identifier", "name", "type", "description", "yaml"],
      "detection_key": "environment",
      "defaults": { "type": "Production" }
    },
    "infrastructure": {
      "description": "Infrastructure definition inside an environment; environment_id is required",
      "endpoint": "/v1/orgs/{org}/projects/{project}/environments/{environment_id}/infrastructures",
      "body_fields": ["identifier", "name", "type", "yaml", "description"],
      "detection_key": "infrastructure",
      "defaults": { "type": "KubernetesDirect" }
    }
  },
  "naming_rules": {
    "identifier_pattern": "^[a-zA-Z_][0-9a-zA-Z_$]{0,127}$",
    "name_pattern": "^[a-zA-Z_][0-9a-zA-Z\\-_ ]{0,127}$",
    "max_length": 127
  }
}"#
}
