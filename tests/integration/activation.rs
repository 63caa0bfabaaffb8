//! Direct, resolved and failed activation through the public API.

use super::support::{inventory, ScriptedSource};
use futures::FutureExt;
use std::sync::Arc;
use switchboard::activation::{ActivationOutcome, MatchCriterion};
use switchboard::{RawRecord, Selection, SourceId, UnifiedRecord};

fn target(raw: RawRecord) -> UnifiedRecord {
    UnifiedRecord::detached(raw, Default::default())
}

fn at_first_tab(record: &UnifiedRecord) -> bool {
    record.window_index == Some(1) && record.tab_index == Some(1)
}

#[tokio::test]
async fn test_direct_activation_skips_fetch() {
    let safari = Arc::new(ScriptedSource::dedicated("safari", &["Safari"]));
    let (api, _clock) = inventory(vec![safari.clone()]);

    let item = target(RawRecord::new("Docs", "Safari").at(2, 3));
    let outcome = api.activate_item_detailed(&item, &Selection::all()).await;

    assert_eq!(outcome, ActivationOutcome::Direct);
    assert_eq!(safari.fetch_count(), 0);
    assert_eq!(safari.activation_count(), 1);
}

#[tokio::test]
async fn test_shifted_tab_resolved_by_url() {
    let safari = Arc::new(
        ScriptedSource::dedicated("safari", &["Safari"])
            .with_records(vec![
                RawRecord::new("Something Else", "Safari").at(1, 2),
                RawRecord::new("Docs (edited)", "Safari")
                    .with_url("https://x.com/")
                    .at(1, 1),
            ])
            .accepting(at_first_tab),
    );
    let (api, _clock) = inventory(vec![safari.clone()]);

    let item = target(
        RawRecord::new("Docs", "Safari")
            .with_url("https://x.com")
            .at(5, 2),
    );
    let outcome = api.activate_item_detailed(&item, &Selection::of(["safari"])).await;

    match outcome {
        ActivationOutcome::Resolved { matched, criterion } => {
            assert_eq!(criterion, MatchCriterion::Url);
            assert_eq!(matched.window_index, Some(1));
            assert_eq!(matched.tab_index, Some(1));
            assert_eq!(matched.source_id, Some(SourceId::new("safari")));
        }
        other => panic!("expected resolved activation, got {:?}", other),
    }
    let attempts = safari.activations();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0].window_index, Some(5));
    assert_eq!(attempts[1].tab_index, Some(1));

    let stats = api.stats();
    assert_eq!(stats.activations, 1);
    assert_eq!(stats.activations_succeeded, 1);
    assert_eq!(stats.activations_resolved, 1);
}

#[tokio::test]
async fn test_resolve_falls_back_to_case_insensitive_title() {
    let safari = Arc::new(
        ScriptedSource::dedicated("safari", &["Safari"])
            .with_records(vec![RawRecord::new("inbox", "Safari").at(1, 1)])
            .accepting(at_first_tab),
    );
    let (api, _clock) = inventory(vec![safari]);

    let item = target(RawRecord::new("Inbox", "Safari").at(3, 3));
    let outcome = api.activate_item_detailed(&item, &Selection::all()).await;

    assert!(matches!(
        outcome,
        ActivationOutcome::Resolved {
            criterion: MatchCriterion::CaseInsensitiveTitle,
            ..
        }
    ));
}

#[tokio::test]
async fn test_non_positive_index_rejected_without_calls() {
    let safari = Arc::new(ScriptedSource::dedicated("safari", &["Safari"]));
    let (api, _clock) = inventory(vec![safari.clone()]);

    let item = target(RawRecord::new("Docs", "Safari").at(0, 1));
    let activated = api.activate_item(&item, &Selection::all()).await;

    assert!(!activated);
    assert_eq!(safari.fetch_count(), 0);
    assert_eq!(safari.activation_count(), 0);
}

#[tokio::test]
async fn test_missing_target_invalidates_cache() {
    let safari = Arc::new(
        ScriptedSource::dedicated("safari", &["Safari"])
            .with_records(vec![RawRecord::new("Docs", "Safari").at(1, 1)])
            .accepting(|_| false),
    );
    let (api, _clock) = inventory(vec![safari.clone()]);
    let selection = Selection::all();

    api.list_items(&selection).await;
    assert!(api.cached_key().is_some());

    let item = target(RawRecord::new("Closed Tab", "Safari").at(4, 4));
    let outcome = api.activate_item_detailed(&item, &selection).await;

    assert_eq!(outcome, ActivationOutcome::NotFound);
    assert_eq!(api.cached_key(), None);
    assert_eq!(safari.activation_count(), 1);
}

#[tokio::test]
async fn test_failed_retry_reports_match() {
    let safari = Arc::new(
        ScriptedSource::dedicated("safari", &["Safari"])
            .with_records(vec![RawRecord::new("Docs", "Safari").at(1, 1)])
            .accepting(|_| false),
    );
    let (api, _clock) = inventory(vec![safari.clone()]);

    let item = target(RawRecord::new("Docs", "Safari").at(2, 2));
    let outcome = api.activate_item_detailed(&item, &Selection::all()).await;

    match outcome {
        ActivationOutcome::RetryFailed { matched } => assert_eq!(matched.window_index, Some(1)),
        other => panic!("expected failed retry, got {:?}", other),
    }
    assert_eq!(safari.activation_count(), 2);
    assert_eq!(api.stats().activations_succeeded, 0);
}

#[tokio::test]
async fn test_failed_retry_invalidates_repopulated_cache() {
    let safari = Arc::new(
        ScriptedSource::dedicated("safari", &["Safari"])
            .with_records(vec![RawRecord::new("Docs", "Safari").at(1, 1)])
            .accepting(|_| false),
    );
    let (api, _clock) = inventory(vec![safari.clone()]);
    let selection = Selection::all();

    // Each activation call lists first, so the slot is full again by the
    // time the retry fails.
    let lister = api.clone();
    safari.set_activation_hook(move || {
        let api = lister.clone();
        async move {
            api.list_items(&Selection::all()).await;
        }
        .boxed()
    });

    let item = target(RawRecord::new("Docs", "Safari").at(2, 2));
    let outcome = api.activate_item_detailed(&item, &selection).await;

    assert!(matches!(outcome, ActivationOutcome::RetryFailed { .. }));
    assert_eq!(safari.activation_count(), 2);
    // Hook listing before direct, resolve fetch, hook listing before retry.
    assert_eq!(safari.fetch_count(), 3);
    assert_eq!(api.cached_key(), None);
}

#[tokio::test]
async fn test_resolve_bypasses_fresh_cache() {
    let safari = Arc::new(
        ScriptedSource::dedicated("safari", &["Safari"])
            .with_records(vec![RawRecord::new("Docs", "Safari").at(1, 1)])
            .accepting(at_first_tab),
    );
    let (api, _clock) = inventory(vec![safari.clone()]);
    let selection = Selection::all();

    api.list_items(&selection).await;
    assert_eq!(safari.fetch_count(), 1);

    // Stale handle: the resolve step must fetch even though the cache is fresh.
    let item = target(RawRecord::new("Docs", "Safari").at(1, 4));
    assert!(api.activate_item(&item, &selection).await);
    assert_eq!(safari.fetch_count(), 2);
}

#[tokio::test]
async fn test_activation_routes_to_universal_source_for_unowned_app() {
    let safari = Arc::new(ScriptedSource::dedicated("safari", &["Safari"]));
    let windows = Arc::new(ScriptedSource::universal("windows"));
    let (api, _clock) = inventory(vec![safari.clone(), windows.clone()]);

    let item = target(RawRecord::new("Shell", "Terminal").at(1, 1));
    assert!(api.activate_item(&item, &Selection::all()).await);
    assert_eq!(safari.activation_count(), 0);
    assert_eq!(windows.activation_count(), 1);
}

#[tokio::test]
async fn test_activation_routes_alias_to_dedicated_owner() {
    let chrome = Arc::new(ScriptedSource::dedicated("chrome", &["Google Chrome"]));
    let windows = Arc::new(ScriptedSource::universal("windows"));
    let (api, _clock) = inventory(vec![windows.clone(), chrome.clone()]);

    let item = target(RawRecord::new("Mail", "chrome").at(1, 1));
    assert!(api.activate_item(&item, &Selection::all()).await);
    assert_eq!(chrome.activation_count(), 1);
    assert_eq!(windows.activation_count(), 0);
}
