// Find fenced YAML blocks in free text and classify them as Harness documents.

use regex::Regex;
use serde_yaml::Value;
use std::sync::OnceLock;

use crate::types::{ResourceKind, YamlInfo};

static YAML_FENCE_RE: OnceLock<Regex> = OnceLock::new();

/// Returns the inner text of every fenced code block tagged `yaml` or `yml`,
/// in order of appearance. Stateless; repeated calls on the same text yield
/// identical results.
pub fn extract_yaml_from_markdown(content: &str) -> Vec<String> {
    let re = YAML_FENCE_RE.get_or_init(|| {
        Regex::new(r"```(?:yaml|yml)\n([\s\S]*?)\n```").expect("fence pattern compiles")
    });
    re.captures_iter(content)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Classifies one YAML text blob. Probes the top-level keys in
/// `ResourceKind::DETECTION_ORDER`; the first key present decides the kind.
/// Malformed YAML and documents without a recognized key return `None` -
/// a negative classification, not an error.
pub fn detect_harness_yaml(yaml_content: &str) -> Option<YamlInfo> {
    let parsed: Value = serde_yaml::from_str(yaml_content).ok()?;
    let mapping = parsed.as_mapping()?;

    for kind in ResourceKind::DETECTION_ORDER {
        if let Some(section) = mapping.get(kind.yaml_key()) {
            return Some(YamlInfo {
                kind,
                name: string_field(section, "name"),
                identifier: string_field(section, "identifier"),
                is_valid: true,
                yaml_content: yaml_content.to_string(),
            });
        }
    }
    None
}

/// Scans free-form text for fenced YAML blocks and returns every block that
/// classifies as a Harness document, preserving relative order. Blocks that
/// do not classify are silently dropped.
pub fn detect_harness_yamls_in_content(content: &str) -> Vec<YamlInfo> {
    extract_yaml_from_markdown(content)
        .iter()
        .filter_map(|block| detect_harness_yaml(block))
        .collect()
}

fn string_field(section: &Value, key: &str) -> Option<String> {
    section.get(key).and_then(Value::as_str).map(str::to_string)
}
