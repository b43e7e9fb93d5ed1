//! Secret rotation
//!
//! Rotation replaces the template's designated secret variable with a
//! fresh random value, persists the variable set, then deploys so every
//! target picks up the new secret.

use tracing::info;

use crate::errors::ManagerError;
use crate::http::client::HttpClient;
use crate::models::account::{Account, Variable};
use crate::models::deploy::TargetResult;
use crate::registry::ProjectTemplate;
use crate::storage::repo::ConfigRepo;
use crate::utils::generate_secret;

/// Rotate the secret variable in place and return the new value.
///
/// Exactly one entry for `secret_field` remains afterwards: the first
/// occurrence is replaced, duplicates are dropped, and the entry is
/// appended when absent.
pub fn rotate_secret(variables: &mut Vec<Variable>, secret_field: &str) -> String {
    let secret = generate_secret();

    let mut seen = false;
    variables.retain_mut(|variable| {
        if variable.key != secret_field {
            return true;
        }
        if seen {
            return false;
        }
        seen = true;
        variable.value = secret.clone();
        true
    });

    if !seen {
        variables.push(Variable {
            key: secret_field.to_string(),
            value: secret.clone(),
        });
    }

    secret
}

/// Rotate the project's secret, persist the variable set, and deploy.
/// The variable write happens before the deploy so a partial deploy still
/// converges on the new secret on the next run.
pub async fn rotate_and_deploy(
    http: &HttpClient,
    repo: &ConfigRepo,
    template: &ProjectTemplate,
    accounts: &[Account],
) -> Result<Vec<TargetResult>, ManagerError> {
    let mut variables = repo.load_variables(&template.id).await?;
    rotate_secret(&mut variables, &template.secret_field);
    repo.save_variables(&template.id, &variables).await?;

    info!(
        "Rotated secret {} for {}, redeploying",
        template.secret_field, template.id
    );

    super::deploy::deploy_project(http, repo, template, &variables, accounts).await
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

    #[test]
    fn test_rotation_replaces_value() {
        let mut variables = vec![variable("UUID", "old"), variable("PATH", "/sub")];
        let secret = rotate_secret(&mut variables, "UUID");

        assert_ne!(secret, "old");
        assert_eq!(variables.len(), 2);
        assert_eq!(variables[0].value, secret);
        assert_eq!(variables[1].value, "/sub");
    }

    #[test]
    fn test_rotation_appends_when_absent() {
        let mut variables = vec![variable("PATH", "/sub")];
        let secret = rotate_secret(&mut variables, "UUID");

        assert_eq!(variables.len(), 2);
        assert_eq!(variables[1].key, "UUID");
        assert_eq!(variables[1].value, secret);
    }

    #[test]
    fn test_rotation_collapses_duplicates() {
        let mut variables = vec![
            variable("UUID", "a"),
            variable("UUID", "b"),
            variable("UUID", "c"),
        ];
        let secret = rotate_secret(&mut variables, "UUID");

        let entries: Vec<_> = variables.iter().filter(|v| v.key == "UUID").collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].value, secret);
    }

    #[test]
    fn test_consecutive_rotations_differ() {
        let mut variables = vec![variable("u", "x")];
        let first = rotate_secret(&mut variables, "u");
        let second = rotate_secret(&mut variables, "u");
        assert_ne!(first, second);
    }
}
