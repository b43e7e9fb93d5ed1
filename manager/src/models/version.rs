//! Deployed-version records and upstream revision metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The last successfully deployed upstream revision, one per project.
/// Absent until the first successful deploy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Opaque revision identifier of the deployed upstream source
    pub revision: String,

    /// When the deploy that recorded this revision happened
    pub deploy_date: DateTime<Utc>,
}

/// Latest revision metadata reported by the upstream version source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteRevision {
    /// Opaque revision identifier
    pub revision: String,

    /// Commit timestamp, when the source reports one
    pub timestamp: Option<DateTime<Utc>>,

    /// Human-readable revision message
    #[serde(default)]
    pub message: String,
}

/// Result of comparing the persisted record against the upstream source.
#[derive(Debug, Clone, Serialize)]
pub struct VersionComparison {
    pub local: Option<VersionRecord>,
    pub remote: RemoteRevision,
}

impl VersionComparison {
    /// An update is needed when no local record exists or the upstream
    /// revision differs from the recorded one.
    pub fn needs_update(&self) -> bool {
        match &self.local {
            None => true,
            Some(local) => local.revision != self.remote.revision,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(revision: &str) -> RemoteRevision {
        RemoteRevision {
            revision: revision.to_string(),
            timestamp: None,
            message: "update".to_string(),
        }
    }

    #[test]
    fn test_needs_update_without_local_record() {
        let comparison = VersionComparison {
            local: None,
            remote: remote("abc"),
        };
        assert!(comparison.needs_update());
    }

    #[test]
    fn test_needs_update_on_revision_mismatch() {
        let comparison = VersionComparison {
            local: Some(VersionRecord {
                revision: "abc".to_string(),
                deploy_date: Utc::now(),
            }),
            remote: remote("def"),
        };
        assert!(comparison.needs_update());
    }

    #[test]
    fn test_up_to_date_when_revisions_match() {
        let comparison = VersionComparison {
            local: Some(VersionRecord {
                revision: "abc".to_string(),
                deploy_date: Utc::now(),
            }),
            remote: remote("abc"),
        };
        assert!(!comparison.needs_update());
    }
}
