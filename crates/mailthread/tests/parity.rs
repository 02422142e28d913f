//! Backend parity: the file, SQLite, and in-memory backends must produce the
//! same histories, the same cleanup results, and the same counters for the
//! same sequence of calls.

use std::collections::BTreeMap;

use proptest::prelude::*;

use mailthread::core::{retention, Record, ThreadMap};
use mailthread::storage::ThreadStorage;
use mailthread_testkit::{
    append_ops, fixed_now, record, record_days_ago, reply, thread_key, BackendHarness,
};

#[test]
fn cap_keeps_most_recent_records_in_append_order() {
    let harness = BackendHarness::new(2);
    let now = fixed_now();
    let [a, b, c, d] = ["A", "B", "C", "D"].map(|label| record(label, now));

    for (name, backend) in harness.backends() {
        let t1 = thread_key("t1");
        backend.append(&t1, a.clone()).unwrap();
        backend.append(&t1, b.clone()).unwrap();
        backend.append(&t1, c.clone()).unwrap();
        assert_eq!(backend.history(&t1).unwrap(), vec![b.clone(), c.clone()], "{name}");

        backend.append(&t1, d.clone()).unwrap();
        assert_eq!(backend.history(&t1).unwrap(), vec![c.clone(), d.clone()], "{name}");
    }
}

#[test]
fn cleanup_removes_idle_threads_whole() {
    let harness = BackendHarness::new(5);
    let now = fixed_now();
    let cutoff = retention::cutoff(now, 30);

    for (name, backend) in harness.backends() {
        backend.append(&thread_key("old"), record_days_ago("o1", now, 45)).unwrap();
        backend.append(&thread_key("old"), record_days_ago("o2", now, 40)).unwrap();
        backend.append(&thread_key("new"), record_days_ago("n1", now, 60)).unwrap();
        backend.append(&thread_key("new"), record_days_ago("n2", now, 1)).unwrap();

        assert_eq!(backend.cleanup_before(&cutoff).unwrap(), 1, "{name}");

        let remaining = backend.load_all().unwrap();
        assert!(!remaining.contains_key(&thread_key("old")), "{name}");
        // Kept in full, including the record older than the cutoff.
        assert_eq!(remaining[&thread_key("new")].len(), 2, "{name}");
    }
}

#[test]
fn record_exactly_at_cutoff_is_kept() {
    let harness = BackendHarness::new(5);
    let now = fixed_now();

    for (name, backend) in harness.backends() {
        backend.append(&thread_key("edge"), record_days_ago("e", now, 30)).unwrap();
        assert_eq!(
            backend.cleanup_before(&retention::cutoff(now, 30)).unwrap(),
            0,
            "{name}"
        );
    }
}

#[test]
fn cutoff_before_calendar_range_only_drops_empty_threads() {
    let harness = BackendHarness::new(5);
    let now = fixed_now();
    let mut threads = ThreadMap::new();
    threads.insert(thread_key("ancient"), vec![record_days_ago("a", now, 365 * 200)]);
    threads.insert(thread_key("fresh"), vec![record("f", now)]);

    for (name, backend) in harness.backends() {
        backend.save_all(&threads).unwrap();
        assert_eq!(backend.cleanup_older_than(u32::MAX).unwrap(), 0, "{name}");
        assert_eq!(backend.load_all().unwrap(), threads, "{name}");
    }
}

#[test]
fn stats_agree_across_backends() {
    let harness = BackendHarness::new(2);
    let now = fixed_now();

    for (_, backend) in harness.backends() {
        backend.append(&thread_key("a"), record("a1", now)).unwrap();
        backend.append(&thread_key("a"), reply("a2", now)).unwrap();
        backend.append(&thread_key("a"), record("a3", now)).unwrap();
        backend.append(&thread_key("b"), record("b1", now)).unwrap();
        backend.append(&thread_key("c"), reply("c1", now)).unwrap();
    }

    let counts: Vec<_> = harness
        .backends()
        .iter()
        .map(|(_, backend)| backend.stats().unwrap().counts)
        .collect();

    assert_eq!(counts[0], counts[1]);
    assert_eq!(counts[1], counts[2]);

    let c = &counts[0];
    assert_eq!(c.total_threads, 3);
    assert_eq!(c.total_records, 4);
    assert_eq!(c.threads_with_history, 1);
    assert_eq!(c.threads_at_cap, 1);
    assert_eq!(c.reply_records, 2);
    assert_eq!(c.inbound_records, 2);
    assert_eq!(c.avg_records_per_thread, 1.3);
}

#[test]
fn backend_identification_differs() {
    let harness = BackendHarness::new(2);
    let providers: Vec<_> = harness
        .backends()
        .iter()
        .map(|(_, backend)| backend.stats().unwrap().backend.provider())
        .collect();
    assert_eq!(providers, vec!["file", "sqlite", "memory"]);
}

#[test]
fn save_all_moves_state_between_backends() {
    let harness = BackendHarness::new(3);
    let now = fixed_now();
    harness.sqlite.append(&thread_key("t1"), record("a", now)).unwrap();
    harness.sqlite.append(&thread_key("t1"), reply("b", now)).unwrap();
    harness.sqlite.append(&thread_key("t2"), record("c", now)).unwrap();

    let snapshot = harness.sqlite.load_all().unwrap();
    harness.file.save_all(&snapshot).unwrap();
    harness.memory.save_all(&snapshot).unwrap();

    assert_eq!(harness.file.load_all().unwrap(), snapshot);
    assert_eq!(harness.memory.load_all().unwrap(), snapshot);
}

#[test]
fn load_all_on_empty_store_is_empty() {
    let harness = BackendHarness::new(3);
    for (name, backend) in harness.backends() {
        assert_eq!(backend.load_all().unwrap(), ThreadMap::new(), "{name}");
        assert!(backend.history(&thread_key("nobody")).unwrap().is_empty(), "{name}");
        assert_eq!(backend.stats().unwrap().counts.total_threads, 0, "{name}");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn parity_over_random_appends(ops in append_ops(4, 24), cap in 1usize..5) {
        let harness = BackendHarness::new(cap);
        let mut model: BTreeMap<String, Vec<Record>> = BTreeMap::new();

        for op in &ops {
            let key = thread_key(&op.thread);
            for (name, backend) in harness.backends() {
                let outcome = backend.append(&key, op.record.clone()).unwrap();
                prop_assert!(outcome.len <= cap, "{}", name);
            }
            let history = model.entry(op.thread.clone()).or_default();
            history.push(op.record.clone());
            if history.len() > cap {
                history.remove(0);
            }
        }

        for (thread, expected) in &model {
            let key = thread_key(thread);
            for (name, backend) in harness.backends() {
                let first = backend.history(&key).unwrap();
                let second = backend.history(&key).unwrap();
                prop_assert_eq!(&first, expected, "{}", name);
                prop_assert_eq!(&first, &second, "{}", name);
            }
        }

        let snapshots: Vec<_> = harness
            .backends()
            .iter()
            .map(|(_, backend)| backend.load_all().unwrap())
            .collect();
        prop_assert_eq!(&snapshots[0], &snapshots[1]);
        prop_assert_eq!(&snapshots[1], &snapshots[2]);

        let counts: Vec<_> = harness
            .backends()
            .iter()
            .map(|(_, backend)| backend.stats().unwrap().counts)
            .collect();
        prop_assert_eq!(&counts[0], &counts[1]);
        prop_assert_eq!(&counts[1], &counts[2]);
    }

    #[test]
    fn cleanup_parity(ops in append_ops(5, 20), age_minutes in 0i64..30) {
        let harness = BackendHarness::new(3);
        for op in &ops {
            for (_, backend) in harness.backends() {
                backend.append(&thread_key(&op.thread), op.record.clone()).unwrap();
            }
        }

        let cutoff = mailthread::Timestamp::from_datetime(
            fixed_now() + chrono::Duration::minutes(age_minutes),
        );
        let removed: Vec<_> = harness
            .backends()
            .iter()
            .map(|(_, backend)| backend.cleanup_before(&cutoff).unwrap())
            .collect();
        prop_assert_eq!(removed[0], removed[1]);
        prop_assert_eq!(removed[1], removed[2]);

        for (name, backend) in harness.backends() {
            for history in backend.load_all().unwrap().values() {
                prop_assert!(!retention::is_stale(history, &cutoff), "{}", name);
            }
        }
    }
}
