#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use deferkv::{CommitReport, StoreError, WriteError};

    use crate::helper::_store_helper::{ample, fixture, StoreCall};

    #[test]
    fn test_remove_without_pending_write() {
        let f = fixture();
        f.store.seed("test.remove.basic", "1");

        f.coalescer.remove("test.remove.basic").unwrap();
        // Idempotent on a missing key
        f.coalescer.remove("test.remove.basic").unwrap();

        assert_eq!(f.store.value("test.remove.basic"), None);
        assert!(f.scheduler.cancelled().is_empty());
    }

    #[test]
    fn test_remove_cancels_pending_write_and_resolves_it() {
        let f = fixture();
        f.store.seed("k", "0");
        let handle = f.coalescer.set("k", 1);
        let token = f.scheduler.last_token().unwrap();

        f.coalescer.remove("k").unwrap();

        assert_eq!(handle.try_result(), Some(Ok(())));
        assert_eq!(f.scheduler.cancelled(), vec![token]);
        assert_eq!(f.store.value("k"), None);
        assert!(!f.coalescer.has_pending());

        // A callback that fires anyway must not resurrect the value
        assert!(f.scheduler.fire_token(token, ample()));
        assert!(f.store.set_calls().is_empty());
    }

    #[test]
    fn test_late_callback_does_not_run_a_newer_entry_early() {
        let f = fixture();
        f.coalescer.set("k", 1);
        let stale = f.scheduler.last_token().unwrap();
        f.coalescer.remove("k").unwrap();

        let handle = f.coalescer.set("k", 2);
        f.scheduler.fire_token(stale, ample());
        assert!(!handle.is_settled());
        assert!(f.coalescer.is_pending("k"));

        f.scheduler.fire_next(ample());
        assert_eq!(handle.try_result(), Some(Ok(())));
        assert_eq!(f.store.value("k"), Some("2".to_string()));
    }

    #[test]
    fn test_remove_settles_pending_write_even_if_store_fails() {
        let f = fixture();
        f.store.fail_removals();
        let handle = f.coalescer.set("k", 1);

        let result = f.coalescer.remove("k");

        assert_eq!(result, Err(StoreError::Backend("removal refused".to_string())));
        assert_eq!(handle.try_result(), Some(Ok(())));
        assert!(!f.coalescer.has_pending());
    }

    #[test]
    fn test_commit_flushes_every_pending_write() {
        let f = fixture();
        let a = f.coalescer.set("test_5_1", 1);
        let b = f.coalescer.set("test_5_2", 2);
        let tokens: Vec<_> = f.scheduler.scheduled().into_iter().map(|(t, _)| t).collect();

        let report = f.coalescer.commit();

        assert_eq!(
            report,
            CommitReport {
                written: 2,
                removed: 0,
                failed: 0,
                remove_errors: vec![],
            }
        );
        assert_eq!(f.store.value("test_5_1"), Some("1".to_string()));
        assert_eq!(f.store.value("test_5_2"), Some("2".to_string()));
        assert_eq!(a.try_result(), Some(Ok(())));
        assert_eq!(b.try_result(), Some(Ok(())));

        let mut cancelled = f.scheduler.cancelled();
        cancelled.sort();
        assert_eq!(cancelled, tokens);
        assert!(!f.coalescer.has_pending());

        // Nothing is left for late callbacks to write
        for token in tokens {
            f.scheduler.fire_token(token, ample());
        }
        assert_eq!(f.store.set_calls().len(), 2);
    }

    #[test]
    fn test_commit_removes_absent_entries() {
        let f = fixture();
        f.store.seed("gone", "1");
        let handle = f.coalescer.remove_when_idle("gone");

        let report = f.coalescer.commit();

        assert_eq!(report.removed, 1);
        assert_eq!(handle.try_result(), Some(Ok(())));
        assert_eq!(f.store.value("gone"), None);
        assert!(f.store.set_calls().is_empty());
    }

    #[test]
    fn test_commit_returns_refused_removal_and_resolves_its_handle() {
        let f = fixture();
        f.store.seed("gone", "1");
        f.store.fail_removals();
        let gone = f.coalescer.remove_when_idle("gone");
        let kept = f.coalescer.set("kept", 2);

        let report = f.coalescer.commit();

        assert_eq!(
            report.remove_errors,
            vec![(
                "gone".to_string(),
                StoreError::Backend("removal refused".to_string())
            )]
        );
        assert_eq!(report.written, 1);
        assert_eq!(report.removed, 0);
        assert_eq!(report.failed, 0);
        assert_eq!(report.total(), 2);
        assert_eq!(gone.try_result(), Some(Ok(())));
        assert_eq!(kept.try_result(), Some(Ok(())));
        assert_eq!(f.store.value("gone"), Some("1".to_string()));
        assert!(!f.coalescer.has_pending());
    }

    #[test]
    fn test_idle_removal_refused_by_store_still_resolves() {
        let f = fixture();
        f.store.seed("gone", "1");
        f.store.fail_removals();
        let handle = f.coalescer.remove_when_idle("gone");

        f.scheduler.fire_next(ample());

        assert_eq!(handle.try_result(), Some(Ok(())));
        assert!(!f.coalescer.has_pending());
        assert_eq!(f.coalescer.stats().failed, 1);
        assert_eq!(f.coalescer.stats().removed, 0);
        assert_eq!(f.store.calls(), vec![StoreCall::Remove("gone".to_string())]);
    }

    #[test]
    fn test_commit_failure_stays_local_to_its_key() {
        let f = fixture();
        f.store.fail_writes_to("full");
        let mut unencodable = HashMap::new();
        unencodable.insert((0, 0), 0);

        let full = f.coalescer.set("full", "x");
        let bad = f.coalescer.set("bad", unencodable);
        let good = f.coalescer.set("good", "y");

        let report = f.coalescer.commit();

        assert_eq!(
            report,
            CommitReport {
                written: 1,
                removed: 0,
                failed: 2,
                remove_errors: vec![],
            }
        );
        assert!(matches!(full.try_result(), Some(Err(WriteError::StoreWrite { .. }))));
        assert!(matches!(bad.try_result(), Some(Err(WriteError::Serialization { .. }))));
        assert_eq!(good.try_result(), Some(Ok(())));
        assert_eq!(f.store.value("good"), Some("\"y\"".to_string()));
        assert!(!f.coalescer.has_pending());
    }

    #[test]
    fn test_commit_with_nothing_pending_is_a_no_op() {
        let f = fixture();
        assert_eq!(f.coalescer.commit(), CommitReport::default());
        assert!(f.store.calls().is_empty());
    }

    #[test]
    fn test_clear_empties_store_and_resolves_pending_writes() {
        let f = fixture();
        f.store.seed("old", "1");
        let a = f.coalescer.set("test_6_1", 1);
        let b = f.coalescer.set("test_6_2", 2);
        let tokens: Vec<_> = f.scheduler.scheduled().into_iter().map(|(t, _)| t).collect();

        f.coalescer.clear().unwrap();

        assert_eq!(f.store.len(), 0);
        assert_eq!(a.try_result(), Some(Ok(())));
        assert_eq!(b.try_result(), Some(Ok(())));
        assert!(!f.coalescer.has_pending());
        assert_eq!(f.store.calls(), vec![StoreCall::Clear]);

        let mut cancelled = f.scheduler.cancelled();
        cancelled.sort();
        assert_eq!(cancelled, tokens);

        assert_eq!(f.scheduler.fire_all(ample()), 0);
        assert_eq!(f.store.len(), 0);
    }

    #[test]
    fn test_clear_forgets_write_latency() {
        let f = fixture();
        f.coalescer.set("k", 1);
        f.scheduler.fire_next(ample());
        assert!(f.coalescer.last_write_latency("k").is_some());

        f.coalescer.clear().unwrap();

        assert_eq!(f.coalescer.last_write_latency("k"), None);
    }

    #[test]
    fn test_stats_count_flushed_and_dropped_entries() {
        let f = fixture();
        f.coalescer.set("a", 1);
        f.coalescer.set("b", 2);
        f.coalescer.commit();
        f.coalescer.set("c", 3);
        f.coalescer.remove("c").unwrap();
        f.coalescer.set("d", 4);
        f.coalescer.clear().unwrap();

        let stats = f.coalescer.stats();
        assert_eq!(stats.committed, 2);
        assert_eq!(stats.written, 2);
        assert_eq!(stats.cleared, 2);
    }
}
