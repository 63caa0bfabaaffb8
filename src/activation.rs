//! Activation Resolver
//!
//! Re-targets a previously observed item whose positional handles may have
//! shifted. Flow: attempt direct activation; on failure fetch fresh records
//! (bypassing the cache), find the best match for the target and retry once.
//! Every failed attempt invalidates the cache since the cached topology is no
//! longer trustworthy.

use crate::cache::SwrCache;
use crate::capability::CapabilityTable;
use crate::orchestrator::SourceOrchestrator;
use crate::reconcile::Reconciler;
use crate::selection::Selection;
use crate::types::UnifiedRecord;
use std::fmt;
use tracing::{debug, info};
use url::Url;

/// Criterion that matched a fresh record to the target, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchCriterion {
    Url,
    ExactTitle,
    CaseInsensitiveTitle,
    Position,
}

impl fmt::Display for MatchCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MatchCriterion::Url => "url",
            MatchCriterion::ExactTitle => "exact_title",
            MatchCriterion::CaseInsensitiveTitle => "case_insensitive_title",
            MatchCriterion::Position => "position",
        })
    }
}

/// How an activation attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// Stored handles were still valid.
    Direct,
    /// Direct activation failed; a fresh match was activated instead.
    Resolved {
        matched: UnifiedRecord,
        criterion: MatchCriterion,
    },
    /// Handles were not positive integers; no source was contacted.
    InvalidTarget(String),
    /// Direct activation failed and no fresh record matched.
    NotFound,
    /// A match was found but the retry failed too.
    RetryFailed { matched: UnifiedRecord },
}

impl ActivationOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, ActivationOutcome::Direct | ActivationOutcome::Resolved { .. })
    }
}

/// Normalize a URL for comparison: parse and drop one trailing slash,
/// falling back to plain trailing-slash stripping when parsing fails.
pub fn normalize_url(raw: &str) -> String {
    let raw = raw.trim();
    match Url::parse(raw) {
        Ok(parsed) => {
            let serialized = parsed.to_string();
            match serialized.strip_suffix('/') {
                Some(stripped) => stripped.to_string(),
                None => serialized,
            }
        }
        Err(_) => raw.strip_suffix('/').unwrap_or(raw).to_string(),
    }
}

/// Check that present handles are positive.
pub fn validate_handles(target: &UnifiedRecord) -> Result<(), String> {
    for (name, value) in [("window_index", target.window_index), ("tab_index", target.tab_index)] {
        if let Some(index) = value {
            if index < 1 {
                return Err(format!("{} must be a positive integer, got {}", name, index));
            }
        }
    }
    Ok(())
}

/// Find the fresh record that best matches `target`.
///
/// Only candidates from the same application (aliases included) are
/// considered. Criteria are tried in priority order; within a criterion the
/// first candidate in list order wins.
pub fn find_best_match<'a>(
    target: &UnifiedRecord,
    candidates: &'a [UnifiedRecord],
    capabilities: &CapabilityTable,
) -> Option<(&'a UnifiedRecord, MatchCriterion)> {
    let identity = capabilities.canonical_identity(&target.source_label);
    let same_app: Vec<&UnifiedRecord> = candidates
        .iter()
        .filter(|candidate| capabilities.canonical_identity(&candidate.source_label) == identity)
        .collect();

    if let Some(target_url) = target.url.as_deref().map(normalize_url) {
        let found = same_app.iter().copied().find(|candidate| {
            candidate
                .url
                .as_deref()
                .map_or(false, |url| normalize_url(url) == target_url)
        });
        if let Some(candidate) = found {
            return Some((candidate, MatchCriterion::Url));
        }
    }

    if let Some(candidate) = same_app.iter().copied().find(|c| c.title == target.title) {
        return Some((candidate, MatchCriterion::ExactTitle));
    }

    let folded_title = target.title.to_lowercase();
    if let Some(candidate) = same_app
        .iter()
        .copied()
        .find(|c| c.title.to_lowercase() == folded_title)
    {
        return Some((candidate, MatchCriterion::CaseInsensitiveTitle));
    }

    same_app
        .into_iter()
        .find(|c| {
            c.window_position() == target.window_position() && c.tab_position() == target.tab_position()
        })
        .map(|candidate| (candidate, MatchCriterion::Position))
}

/// Runs the direct → resolve → retry state machine for one target.
pub struct ActivationResolver<'a> {
    orchestrator: &'a SourceOrchestrator,
    reconciler: &'a Reconciler,
    capabilities: &'a CapabilityTable,
    cache: &'a SwrCache,
}

impl<'a> ActivationResolver<'a> {
    pub fn new(
        orchestrator: &'a SourceOrchestrator,
        reconciler: &'a Reconciler,
        capabilities: &'a CapabilityTable,
        cache: &'a SwrCache,
    ) -> Self {
        Self {
            orchestrator,
            reconciler,
            capabilities,
            cache,
        }
    }

    pub async fn activate(&self, target: &UnifiedRecord, selection: &Selection) -> ActivationOutcome {
        if let Err(reason) = validate_handles(target) {
            debug!(title = %target.title, reason = %reason, "Rejected activation target");
            return ActivationOutcome::InvalidTarget(reason);
        }

        debug!(title = %target.title, app = %target.source_label, "Activation: attempt direct");
        if self.orchestrator.activate(target).await {
            return ActivationOutcome::Direct;
        }
        self.invalidate_after_failure("direct");

        debug!(title = %target.title, selection = %selection.key(), "Activation: resolve");
        let fan_out = self.orchestrator.fetch_all(selection).await;
        let fresh = if fan_out.all_failed() {
            Vec::new()
        } else {
            self.reconciler.reconcile(fan_out.batches)
        };

        let Some((matched, criterion)) = find_best_match(target, &fresh, self.capabilities) else {
            info!(
                title = %target.title,
                app = %target.source_label,
                candidates = fresh.len(),
                "Activation target not found"
            );
            return ActivationOutcome::NotFound;
        };
        let matched = matched.clone();

        debug!(
            title = %matched.title,
            criterion = %criterion,
            window = matched.window_position(),
            tab = matched.tab_position(),
            "Activation: retry direct"
        );
        if self.orchestrator.activate(&matched).await {
            return ActivationOutcome::Resolved { matched, criterion };
        }
        self.invalidate_after_failure("retry");
        info!(title = %matched.title, app = %matched.source_label, "Activation retry failed");
        ActivationOutcome::RetryFailed { matched }
    }

    fn invalidate_after_failure(&self, stage: &str) {
        if self.cache.invalidate() {
            debug!(stage, "Invalidated cache after failed activation");
        }
    }
}
