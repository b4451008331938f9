//! Resolve a version specifier against the release manifest.

use std::sync::Arc;
use tracing::{debug, info};
use usetofu_core::config::LATEST;
use usetofu_core::{Error, Result};

use crate::evaluate::VersionEvaluator;
use crate::manifest::ManifestSource;

/// Constraint used for `latest`: any release after the first stable line.
pub const LATEST_CONSTRAINT: &str = ">1.0.0";

/// The manifest entry chosen for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    /// Concrete version identifier.
    pub version: String,
    /// Archive file names published for the version.
    pub files: Vec<String>,
}

/// Maps a specifier to a concrete release.
pub struct VersionResolver {
    source: Arc<dyn ManifestSource>,
    evaluator: Arc<dyn VersionEvaluator>,
}

impl VersionResolver {
    /// Create a resolver over a manifest source and evaluator.
    #[must_use]
    pub fn new(source: Arc<dyn ManifestSource>, evaluator: Arc<dyn VersionEvaluator>) -> Self {
        Self { source, evaluator }
    }

    /// Resolve `requested` to a manifest entry.
    ///
    /// `latest` is evaluated as [`LATEST_CONSTRAINT`]; any other specifier is
    /// handed to the evaluator unchanged.
    ///
    /// # Errors
    ///
    /// Manifest errors from the source, or [`Error::VersionNotFound`] when no
    /// release satisfies the specifier.
    pub async fn resolve(&self, requested: &str) -> Result<ResolvedVersion> {
        debug!(requested, "Resolving OpenTofu version");

        let manifest = self.source.fetch().await?;
        let ids = manifest.ids();

        let constraint = if requested == LATEST {
            LATEST_CONSTRAINT
        } else {
            requested
        };

        let matched = self
            .evaluator
            .evaluate(&ids, constraint)
            .ok_or_else(|| Error::version_not_found(requested))?;

        let entry = manifest
            .entry(&matched)
            .ok_or_else(|| Error::version_not_found(requested))?;

        info!(requested, version = %entry.id, "Resolved OpenTofu version");
        Ok(ResolvedVersion {
            version: entry.id.clone(),
            files: entry.files.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::SemverEvaluator;
    use crate::manifest::{ManifestEntry, VersionManifest};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedManifest(VersionManifest);

    #[async_trait]
    impl ManifestSource for FixedManifest {
        async fn fetch(&self) -> Result<VersionManifest> {
            Ok(self.0.clone())
        }
    }

    struct FailingManifest;

    #[async_trait]
    impl ManifestSource for FailingManifest {
        async fn fetch(&self) -> Result<VersionManifest> {
            Err(Error::version_status(503, "Service Unavailable"))
        }
    }

    /// Records constraints and answers with a canned id.
    struct RecordingEvaluator {
        answer: Option<String>,
        seen: Mutex<Vec<String>>,
    }

    impl RecordingEvaluator {
        fn answering(answer: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                answer: answer.map(str::to_string),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn constraints(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl VersionEvaluator for RecordingEvaluator {
        fn evaluate(&self, _versions: &[&str], constraint: &str) -> Option<String> {
            self.seen.lock().unwrap().push(constraint.to_string());
            self.answer.clone()
        }
    }

    fn manifest() -> Arc<FixedManifest> {
        let entry = |id: &str, files: &[&str]| ManifestEntry {
            id: id.to_string(),
            files: files.iter().map(ToString::to_string).collect(),
        };
        Arc::new(FixedManifest(VersionManifest {
            versions: vec![
                entry(
                    "1.10.2",
                    &[
                        "tofu_1.10.2_linux_amd64.tar.gz",
                        "tofu_1.10.2_linux_amd64.zip",
                    ],
                ),
                entry("1.9.0", &["tofu_1.9.0_linux_amd64.tar.gz"]),
                entry("1.6.0", &["tofu_1.6.0_linux_amd64.zip"]),
            ],
        }))
    }

    #[tokio::test]
    async fn test_latest_uses_baseline_constraint() {
        let evaluator = RecordingEvaluator::answering(Some("1.10.2"));
        let resolver = VersionResolver::new(manifest(), evaluator.clone());

        let resolved = resolver.resolve("latest").await.unwrap();

        assert_eq!(evaluator.constraints(), vec![">1.0.0"]);
        assert_eq!(resolved.version, "1.10.2");
        assert_eq!(resolved.files.len(), 2);
    }

    #[tokio::test]
    async fn test_specifier_passed_verbatim() {
        let evaluator = RecordingEvaluator::answering(Some("1.9.0"));
        let resolver = VersionResolver::new(manifest(), evaluator.clone());

        resolver.resolve(">= 1.8.0, <1.10").await.unwrap();

        assert_eq!(evaluator.constraints(), vec![">= 1.8.0, <1.10"]);
    }

    #[tokio::test]
    async fn test_no_match_is_not_found() {
        let evaluator = RecordingEvaluator::answering(None);
        let resolver = VersionResolver::new(manifest(), evaluator);

        let err = resolver.resolve("99.99.99").await.unwrap_err();
        assert!(matches!(&err, Error::VersionNotFound { requested } if requested == "99.99.99"));
    }

    #[tokio::test]
    async fn test_match_missing_from_entries_is_not_found() {
        let evaluator = RecordingEvaluator::answering(Some("2.0.0"));
        let resolver = VersionResolver::new(manifest(), evaluator);

        let err = resolver.resolve("2.0.0").await.unwrap_err();
        assert!(matches!(err, Error::VersionNotFound { .. }));
    }

    #[tokio::test]
    async fn test_source_errors_propagate() {
        let resolver =
            VersionResolver::new(Arc::new(FailingManifest), Arc::new(SemverEvaluator));

        let err = resolver.resolve("latest").await.unwrap_err();
        assert!(matches!(err, Error::VersionStatus { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_semver_exact_version() {
        let resolver = VersionResolver::new(manifest(), Arc::new(SemverEvaluator));

        let resolved = resolver.resolve("1.6.0").await.unwrap();
        assert_eq!(resolved.version, "1.6.0");
        assert_eq!(resolved.files, vec!["tofu_1.6.0_linux_amd64.zip"]);
    }
}
