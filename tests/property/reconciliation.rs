//! Property-based tests for de-duplication and match resolution

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use switchboard::activation::find_best_match;
use switchboard::capability::CapabilityTable;
use switchboard::orchestrator::SourceBatch;
use switchboard::reconcile::{DedupKey, Reconciler};
use switchboard::source::SourceKind;
use switchboard::{RawRecord, SourceId, UnifiedRecord};

fn raw_record() -> impl Strategy<Value = RawRecord> {
    (
        prop::sample::select(vec!["Safari", "safari", "Google Chrome", "chrome", "Pages"]),
        prop::sample::select(vec!["Docs", "Mail", "Notes"]),
        prop::option::of(1i64..3),
        prop::option::of(1i64..3),
    )
        .prop_map(|(app, title, window, tab)| {
            let mut record = RawRecord::new(title, app);
            record.window_index = window;
            record.tab_index = tab;
            record
        })
}

fn batch(id: &str, kind: SourceKind, records: Vec<RawRecord>) -> SourceBatch {
    SourceBatch {
        source_id: SourceId::new(id),
        kind,
        records,
        error: None,
    }
}

/// Output never contains two records with the same identity, and every
/// dedicated record survives
#[test]
fn test_reconcile_output_is_duplicate_free() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                prop::collection::vec(raw_record(), 0..12),
                prop::collection::vec(raw_record(), 0..12),
            ),
            |(universal, dedicated)| {
                let table = Arc::new(CapabilityTable::builtin());
                let reconciler = Reconciler::new(Arc::clone(&table));
                let input_len = universal.len() + dedicated.len();

                let unified = reconciler.reconcile(vec![
                    batch("windows", SourceKind::Universal, universal),
                    batch("browser", SourceKind::Dedicated, dedicated.clone()),
                ]);

                prop_assert!(unified.len() <= input_len);
                let keys: HashSet<DedupKey> =
                    unified.iter().map(|record| DedupKey::of(record, &table)).collect();
                prop_assert_eq!(keys.len(), unified.len());

                let dedicated_keys: HashSet<DedupKey> = dedicated
                    .into_iter()
                    .map(|raw| {
                        DedupKey::of(&UnifiedRecord::detached(raw, Default::default()), &table)
                    })
                    .collect();
                let from_dedicated = unified
                    .iter()
                    .filter(|record| record.source_id == Some(SourceId::new("browser")))
                    .count();
                prop_assert_eq!(from_dedicated, dedicated_keys.len());
                Ok(())
            },
        )
        .unwrap();
}

/// A candidate identical to the target is always found, and any match
/// belongs to the target's application
#[test]
fn test_identical_candidate_always_matches() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(raw_record(), prop::collection::vec(raw_record(), 0..8)),
            |(target, others)| {
                let table = CapabilityTable::builtin();
                let target = UnifiedRecord::detached(target, Default::default());
                let mut candidates: Vec<UnifiedRecord> = others
                    .into_iter()
                    .map(|raw| UnifiedRecord::detached(raw, Default::default()))
                    .collect();
                candidates.push(target.clone());

                let found = find_best_match(&target, &candidates, &table);
                prop_assert!(found.is_some());
                if let Some((matched, _)) = found {
                    prop_assert!(table.same_application(&matched.source_label, &target.source_label));
                }
                Ok(())
            },
        )
        .unwrap();
}

/// Merging a record set with itself yields the same set, and de-duplicating
/// an already de-duplicated list changes nothing
#[test]
fn test_dedupe_is_idempotent() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                prop::collection::vec(raw_record(), 0..12),
                prop::sample::select(vec![SourceKind::Dedicated, SourceKind::Universal]),
            ),
            |(records, kind)| {
                let reconciler = Reconciler::new(Arc::new(CapabilityTable::builtin()));

                let once = reconciler.reconcile(vec![batch("browser", kind, records.clone())]);
                let doubled = reconciler.reconcile(vec![
                    batch("browser", kind, records.clone()),
                    batch("browser", kind, records),
                ]);
                prop_assert_eq!(&doubled, &once);

                let again = reconciler.dedupe(once.clone());
                prop_assert_eq!(&again, &once);

                let merged = reconciler.dedupe(once.iter().cloned().chain(once.iter().cloned()));
                prop_assert_eq!(&merged, &once);
                Ok(())
            },
        )
        .unwrap();
}
