//! Project template registry
//!
//! Static registry of upstream project templates. Built once at startup,
//! never mutated at runtime.

use std::sync::OnceLock;

use serde::Serialize;

/// A project template: one upstream script source plus its default variables.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectTemplate {
    /// Project identifier (registry key)
    pub id: String,

    /// Display name
    pub name: String,

    /// URL of the raw upstream script bundle
    pub script_url: String,

    /// URL of the upstream version source (latest revision metadata)
    pub version_url: String,

    /// Default variable keys offered for this project
    pub default_vars: Vec<String>,

    /// The variable key designated as the rotating secret
    pub secret_field: String,

    /// Optional source compatibility line prepended to the bundle before deploy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compat_prelude: Option<String>,
}

/// Immutable lookup table of project templates, keyed by project id.
#[derive(Debug)]
pub struct ProjectRegistry {
    templates: Vec<ProjectTemplate>,
}

impl ProjectRegistry {
    pub fn new(templates: Vec<ProjectTemplate>) -> Self {
        Self { templates }
    }

    /// Look up a template by project id.
    pub fn get(&self, project_id: &str) -> Option<&ProjectTemplate> {
        self.templates.iter().find(|t| t.id == project_id)
    }

    /// Iterate templates in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

static BUILTIN: OnceLock<ProjectRegistry> = OnceLock::new();

/// The built-in project registry.
pub fn builtin() -> &'static ProjectRegistry {
    BUILTIN.get_or_init(|| {
        ProjectRegistry::new(vec![
            ProjectTemplate {
                id: "cmliu".to_string(),
                name: "CMliu - EdgeTunnel".to_string(),
                script_url: "https://raw.githubusercontent.com/cmliu/edgetunnel/beta2.0/_worker.js"
                    .to_string(),
                version_url: "https://api.github.com/repos/cmliu/edgetunnel/commits/beta2.0"
                    .to_string(),
                default_vars: ["UUID", "PROXYIP", "PATH", "URL", "KEY", "ADMIN"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                secret_field: "UUID".to_string(),
                compat_prelude: None,
            },
            ProjectTemplate {
                id: "joey".to_string(),
                name: "Joey - CFNew".to_string(),
                script_url:
                    "https://raw.githubusercontent.com/byJoey/cfnew/main/%E5%B0%91%E5%B9%B4%E4%BD%A0%E7%9B%B8%E4%BF%A1%E5%85%89%E5%90%97"
                        .to_string(),
                version_url:
                    "https://api.github.com/repos/byJoey/cfnew/commits?path=%E5%B0%91%E5%B9%B4%E4%BD%A0%E7%9B%B8%E4%BF%A1%E5%85%89%E5%90%97&per_page=1"
                        .to_string(),
                default_vars: ["u", "d"].iter().map(|s| s.to_string()).collect(),
                secret_field: "u".to_string(),
                // The upstream source references `window`, which module workers lack.
                compat_prelude: Some("var window = globalThis;\n".to_string()),
            },
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let registry = builtin();
        assert_eq!(registry.len(), 2);

        let template = registry.get("cmliu").unwrap();
        assert_eq!(template.secret_field, "UUID");
        assert!(template.compat_prelude.is_none());

        let template = registry.get("joey").unwrap();
        assert_eq!(template.secret_field, "u");
        assert!(template.compat_prelude.is_some());

        assert!(registry.get("nope").is_none());
    }
}
