//! Fan-out, failure isolation and reconciliation through the public API.

use super::support::{inventory, ScriptedSource};
use std::sync::Arc;
use std::time::Duration;
use switchboard::capability::Category;
use switchboard::source::SourceKind;
use switchboard::{RawRecord, Selection, SourceId};

#[tokio::test]
async fn test_dedicated_record_wins_over_universal_duplicate() {
    let browser = Arc::new(
        ScriptedSource::dedicated("browser-a", &["Safari"]).with_records(vec![RawRecord::new(
            "Docs", "Safari",
        )
        .with_url("https://x.com/")
        .at(1, 1)]),
    );
    let windows = Arc::new(ScriptedSource::universal("windows").with_records(vec![
        RawRecord::new("Docs", "Safari").at(1, 1),
        RawRecord::new("Notes", "Pages"),
    ]));
    // Universal registered first; priority must not depend on order.
    let (api, _clock) = inventory(vec![windows.clone(), browser.clone()]);

    let records = api.list_items(&Selection::all()).await;

    assert_eq!(records.len(), 2);
    let docs = records.iter().find(|r| r.title == "Docs").unwrap();
    assert_eq!(docs.source_id, Some(SourceId::new("browser-a")));
    assert_eq!(docs.url.as_deref(), Some("https://x.com/"));
    assert_eq!(docs.capability.category, Category::Browsers);

    let notes = records.iter().find(|r| r.title == "Notes").unwrap();
    assert_eq!(notes.source_id, Some(SourceId::new("windows")));
    assert_eq!(notes.capability.category, Category::Productivity);

    // Dedicated output precedes universal output.
    assert_eq!(records[0].title, "Docs");
}

#[tokio::test]
async fn test_alias_selection_reaches_dedicated_source_and_excludes_it() {
    let chrome = Arc::new(
        ScriptedSource::dedicated("chrome", &["Google Chrome"])
            .with_records(vec![RawRecord::new("Mail", "Google Chrome").at(1, 1)]),
    );
    let windows = Arc::new(ScriptedSource::universal("windows").with_records(vec![
        RawRecord::new("Mail", "Google Chrome").at(1, 1),
        RawRecord::new("Shell", "Terminal").at(1, 1),
    ]));
    let (api, _clock) = inventory(vec![chrome.clone(), windows.clone()]);

    let selection = Selection::of(["chrome"]);
    let records = api.list_items(&selection).await;

    assert_eq!(chrome.fetch_count(), 1);
    let context = windows.last_context().unwrap();
    assert!(context.excluded.contains("google chrome"));
    assert_eq!(api.cached_key(), Some(selection.key()));
    assert_eq!(selection.key().to_string(), "chrome");

    // Terminal is filtered out of the universal output; Mail is de-duplicated.
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].source_id, Some(SourceId::new("chrome")));
}

#[tokio::test]
async fn test_excluded_application_dropped_when_universal_source_ignores_hint() {
    let chrome = Arc::new(
        ScriptedSource::dedicated("chrome", &["Google Chrome"])
            .with_records(vec![RawRecord::new("Mail", "Google Chrome").at(1, 1)]),
    );
    // Window titles differ from tab titles, so these are not exact duplicates.
    let windows = Arc::new(ScriptedSource::universal("windows").with_records(vec![
        RawRecord::new("Mail - Google Chrome", "Google Chrome").at(1, 1),
        RawRecord::new("Notes", "Pages"),
    ]));
    let (api, _clock) = inventory(vec![windows.clone(), chrome.clone()]);

    let records = api.list_items(&Selection::of(["chrome", "Pages"])).await;

    assert!(windows.last_context().unwrap().excluded.contains("google chrome"));
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].title, "Mail");
    assert_eq!(records[0].source_id, Some(SourceId::new("chrome")));
    assert_eq!(records[1].title, "Notes");
    assert_eq!(records[1].source_id, Some(SourceId::new("windows")));
}

#[tokio::test]
async fn test_all_selection_excludes_nothing() {
    let safari = Arc::new(ScriptedSource::dedicated("safari", &["Safari"]));
    let windows = Arc::new(ScriptedSource::universal("windows"));
    let (api, _clock) = inventory(vec![safari.clone(), windows.clone()]);

    api.list_items(&Selection::all()).await;

    assert_eq!(safari.fetch_count(), 1);
    assert!(windows.last_context().unwrap().excluded.is_empty());
}

#[tokio::test]
async fn test_dedicated_source_skipped_for_other_applications() {
    let safari = Arc::new(ScriptedSource::dedicated("safari", &["Safari"]));
    let windows = Arc::new(
        ScriptedSource::universal("windows")
            .with_records(vec![RawRecord::new("Shell", "Terminal").at(1, 1)]),
    );
    let (api, _clock) = inventory(vec![safari.clone(), windows.clone()]);

    let records = api.list_items(&Selection::of(["Terminal"])).await;

    assert_eq!(safari.fetch_count(), 0);
    assert_eq!(records.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_source_times_out_without_blocking_others() {
    let slow = Arc::new(
        ScriptedSource::dedicated("safari", &["Safari"])
            .with_records(vec![RawRecord::new("Late", "Safari").at(1, 1)])
            .with_delay(Duration::from_secs(30))
            .with_timeout(Duration::from_millis(100)),
    );
    let windows = Arc::new(
        ScriptedSource::universal("windows")
            .with_records(vec![RawRecord::new("Shell", "Terminal").at(1, 1)]),
    );
    let (api, _clock) = inventory(vec![slow.clone(), windows.clone()]);

    let records = api.list_items(&Selection::all()).await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "Shell");
    // Partial success is cached.
    assert!(api.cached_key().is_some());
    assert_eq!(api.stats().refresh_failures, 0);
}

#[tokio::test]
async fn test_failing_source_is_isolated() {
    let broken = Arc::new(ScriptedSource::dedicated("safari", &["Safari"]).failing());
    let windows = Arc::new(
        ScriptedSource::universal("windows")
            .with_records(vec![RawRecord::new("Docs", "Safari").at(1, 1)]),
    );
    let (api, _clock) = inventory(vec![broken.clone(), windows.clone()]);

    let records = api.list_items(&Selection::all()).await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].source_id, Some(SourceId::new("windows")));
}

#[tokio::test]
async fn test_sources_are_described_in_registration_order() {
    let safari = Arc::new(
        ScriptedSource::dedicated("safari", &["Safari"]).with_timeout(Duration::from_millis(750)),
    );
    let windows = Arc::new(ScriptedSource::universal("windows"));
    let (api, _clock) = inventory(vec![safari, windows]);

    let summaries = api.sources();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].id, "safari");
    assert_eq!(summaries[0].kind, SourceKind::Dedicated);
    assert_eq!(summaries[0].timeout_ms, 750);
    assert_eq!(summaries[1].kind, SourceKind::Universal);
    assert_eq!(summaries[1].timeout_ms, 5000);
}
