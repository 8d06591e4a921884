#[cfg(test)]
mod tests {
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::Arc;

    use crate::clock::ManualClock;
    use crate::error::LockError;
    use crate::lock::DistributedLock;
    use crate::test_support::{Reply, ScriptedStore};

    fn lock_on(store: &Arc<ScriptedStore>) -> DistributedLock {
        DistributedLock::builder(store.clone(), "test_id")
            .table_name("locks")
            .duration(10)
            .clock(Arc::new(ManualClock::new(1000)))
            .build()
    }

    #[test]
    fn guard_acquires_on_enter_and_releases_on_drop() {
        let store = Arc::new(ScriptedStore::new());
        let mut lock = lock_on(&store);

        {
            let guard = lock.acquire_guard().unwrap();
            assert!(guard.is_held());
            assert_eq!(store.puts().len(), 1);
            assert!(store.deletes().is_empty());
        }

        assert_eq!(store.deletes().len(), 1);
        assert!(!lock.is_held());
    }

    #[test]
    fn explicit_guard_release_is_not_repeated_on_drop() {
        let store = Arc::new(ScriptedStore::new());
        let mut lock = lock_on(&store);

        let guard = lock.acquire_guard().unwrap();
        guard.release().unwrap();

        assert_eq!(store.deletes().len(), 1);
    }

    #[test]
    fn explicit_guard_release_surfaces_store_faults() {
        let store = Arc::new(ScriptedStore::new());
        store.script_deletes([Reply::Fault("access denied")]);
        let mut lock = lock_on(&store);

        let guard = lock.acquire_guard().unwrap();
        assert!(matches!(guard.release(), Err(LockError::Store(_))));
        assert_eq!(store.deletes().len(), 1);
    }

    #[test]
    fn with_lock_releases_after_the_body() {
        let store = Arc::new(ScriptedStore::new());
        let mut lock = lock_on(&store);

        let value = lock
            .with_lock(|| {
                assert_eq!(store.puts().len(), 1);
                assert!(store.deletes().is_empty());
                7
            })
            .unwrap();

        assert_eq!(value, 7);
        assert_eq!(store.deletes().len(), 1);
    }

    #[test]
    fn with_lock_returns_body_errors_after_release() {
        let store = Arc::new(ScriptedStore::new());
        let mut lock = lock_on(&store);

        let result: Result<(), &str> = lock.with_lock(|| Err("boom")).unwrap();

        assert_eq!(result, Err("boom"));
        assert_eq!(store.deletes().len(), 1);
    }

    #[test]
    fn with_lock_releases_when_the_body_panics() {
        let store = Arc::new(ScriptedStore::new());
        let mut lock = lock_on(&store);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            lock.with_lock::<(), _>(|| panic!("inside critical section"))
                .unwrap();
        }));

        assert!(outcome.is_err());
        assert_eq!(store.deletes().len(), 1);
        assert!(!lock.is_held());
    }

    #[test]
    fn with_lock_does_not_swallow_release_errors() {
        let store = Arc::new(ScriptedStore::new());
        store.script_deletes([Reply::Fault("throttled")]);
        let mut lock = lock_on(&store);

        let result = lock.with_lock(|| 1);

        assert!(matches!(result, Err(LockError::Store(_))));
    }

    #[test]
    fn with_lock_does_not_run_the_body_if_acquire_fails() {
        let store = Arc::new(ScriptedStore::new());
        store.script_puts([Reply::Fault("unreachable")]);
        let mut lock = lock_on(&store);

        let mut ran = false;
        let result = lock.with_lock(|| ran = true);

        assert!(result.is_err());
        assert!(!ran);
        assert!(store.deletes().is_empty());
    }
}
