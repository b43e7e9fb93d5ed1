//! Deploy pipeline
//!
//! One run deploys the latest upstream bundle to every target of every
//! account assigned to the project. Failures are isolated per target; only
//! a failed bundle download aborts the whole run.

use chrono::Utc;
use tracing::{info, warn};

use crate::errors::ManagerError;
use crate::http::client::HttpClient;
use crate::http::sink::Binding;
use crate::models::account::{Account, Variable};
use crate::models::deploy::TargetResult;
use crate::models::version::VersionRecord;
use crate::registry::ProjectTemplate;
use crate::storage::repo::ConfigRepo;

/// Prepend the template's compatibility prelude to the bundle, when the
/// template defines one.
pub fn apply_compat_prelude(template: &ProjectTemplate, bundle: String) -> String {
    match &template.compat_prelude {
        Some(prelude) => format!("{prelude}{bundle}"),
        None => bundle,
    }
}

/// Merge the configured variables into a target's existing binding set.
///
/// Upsert-only: a non-empty variable replaces the binding with the same
/// name or is appended as a new plain-text binding. Variables with empty
/// values are skipped entirely, so existing bindings are never cleared.
pub fn merge_bindings(existing: Vec<Binding>, variables: &[Variable]) -> Vec<Binding> {
    let mut merged = existing;

    for variable in variables {
        if variable.value.is_empty() {
            continue;
        }
        match merged.iter_mut().find(|b| b.name == variable.key) {
            Some(binding) => *binding = Binding::plain_text(&variable.key, &variable.value),
            None => merged.push(Binding::plain_text(&variable.key, &variable.value)),
        }
    }

    merged
}

/// Run one full deploy of `template` across `accounts`.
///
/// The bundle and the latest revision are fetched concurrently. A failed
/// revision fetch is tolerated (the run proceeds, no version record is
/// written); a failed bundle fetch aborts with a single notice row. The
/// version record is persisted only when at least one target deployed
/// successfully and the revision is known.
pub async fn deploy_project(
    http: &HttpClient,
    repo: &ConfigRepo,
    template: &ProjectTemplate,
    variables: &[Variable],
    accounts: &[Account],
) -> Result<Vec<TargetResult>, ManagerError> {
    if accounts.is_empty() {
        return Ok(vec![TargetResult::notice(
            "no accounts configured".to_string(),
        )]);
    }

    let (bundle, revision) = tokio::join!(
        http.fetch_bundle(&template.script_url),
        http.fetch_latest_revision(&template.version_url),
    );

    let bundle = match bundle {
        Ok(bundle) => apply_compat_prelude(template, bundle),
        Err(e) => {
            warn!("Bundle download for {} failed: {}", template.id, e);
            return Ok(vec![TargetResult::notice(format!(
                "bundle download failed: {e}"
            ))]);
        }
    };

    let revision = match revision {
        Ok(revision) => Some(revision),
        Err(e) => {
            warn!("Revision fetch for {} failed: {}", template.id, e);
            None
        }
    };

    let mut results = Vec::new();

    for account in accounts {
        for target in account.targets_for(&template.id) {
            // A failed bindings read degrades to an empty set rather than
            // skipping the target.
            let existing = match http.fetch_bindings(account, target).await {
                Ok(bindings) => bindings,
                Err(e) => {
                    warn!(
                        "Bindings read for {}/{} failed, deploying without: {}",
                        account.alias, target, e
                    );
                    Vec::new()
                }
            };

            let bindings = merge_bindings(existing, variables);

            match http.push_version(account, target, &bundle, bindings).await {
                Ok(()) => {
                    info!("Deployed {} to {}/{}", template.id, account.alias, target);
                    results.push(TargetResult::ok(&account.alias, target));
                }
                Err(e) => {
                    warn!(
                        "Deploy of {} to {}/{} failed: {}",
                        template.id, account.alias, target, e
                    );
                    results.push(TargetResult::failed(&account.alias, target, e.to_string()));
                }
            }
        }
    }

    // A run where every push failed leaves the prior record in place so
    // the revision is retried on the next check.
    if results.iter().any(|r| r.success) {
        if let Some(revision) = revision {
            let record = VersionRecord {
                revision: revision.revision,
                deploy_date: Utc::now(),
            };
            repo.save_version(&template.id, &record).await?;
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variable(key: &str, value: &str) -> Variable {
        Variable {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    fn template_with_prelude(prelude: Option<&str>) -> ProjectTemplate {
        ProjectTemplate {
            id: "demo".to_string(),
            name: "Demo".to_string(),
            script_url: "http://127.0.0.1:9/bundle".to_string(),
            version_url: "http://127.0.0.1:9/commits".to_string(),
            default_vars: vec![],
            secret_field: "UUID".to_string(),
            compat_prelude: prelude.map(|s| s.to_string()),
        }
    }

    #[test]
    fn test_compat_prelude_prepended() {
        let template = template_with_prelude(Some("var window = globalThis;\n"));
        let out = apply_compat_prelude(&template, "export default {};".to_string());
        assert!(out.starts_with("var window = globalThis;\n"));
        assert!(out.ends_with("export default {};"));
    }

    #[test]
    fn test_no_prelude_leaves_bundle_untouched() {
        let template = template_with_prelude(None);
        let out = apply_compat_prelude(&template, "export default {};".to_string());
        assert_eq!(out, "export default {};");
    }

    #[test]
    fn test_merge_replaces_existing_binding() {
        let existing = vec![Binding::plain_text("UUID", "old")];
        let merged = merge_bindings(existing, &[variable("UUID", "new")]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text.as_deref(), Some("new"));
    }

    #[test]
    fn test_merge_appends_new_binding() {
        let existing = vec![Binding::plain_text("PATH", "/sub")];
        let merged = merge_bindings(existing, &[variable("UUID", "v1")]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].name, "UUID");
    }

    #[test]
    fn test_merge_skips_empty_values() {
        let existing = vec![Binding::plain_text("UUID", "keep")];
        let merged = merge_bindings(existing, &[variable("UUID", ""), variable("NEW", "")]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text.as_deref(), Some("keep"));
    }

    #[test]
    fn test_merge_preserves_foreign_binding_kinds() {
        let raw = r#"{"name":"KV","type":"kv_namespace","namespace_id":"abc"}"#;
        let kv: Binding = serde_json::from_str(raw).unwrap();
        let merged = merge_bindings(vec![kv], &[variable("UUID", "v1")]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].kind, "kv_namespace");
        assert_eq!(merged[0].rest["namespace_id"], "abc");
    }
}
