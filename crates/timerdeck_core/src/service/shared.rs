//! Thread-shared handle to one timer store.
//!
//! # Responsibility
//! - Let several callers (FFI entry points, UI threads) use one store.
//! - Serialize submits: a submit arriving while another is persisting is
//!   refused with `SubmitError::Busy` rather than queued.
//!
//! # Invariants
//! - At most one `submit`/`submit_draft` runs at a time per store.
//! - Only an in-flight submit causes `Busy`; reads and form edits through
//!   `with` make a submit wait, never fail.
//! - A poisoned lock is recovered; the cache is only replaced after a
//!   successful write, so a panicking caller cannot leave it half-updated.

use super::timer_service::{SubmitError, SubmitOutcome, TimerService};
use crate::model::timer::TimerDefinition;
use crate::repo::timer_repo::TimerRepository;
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

struct Shared<R: TimerRepository> {
    service: Mutex<TimerService<R>>,
    submitting: AtomicBool,
}

/// Cloneable, thread-safe handle to a `TimerService`.
pub struct SharedTimerService<R: TimerRepository> {
    inner: Arc<Shared<R>>,
}

impl<R: TimerRepository> Clone for SharedTimerService<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: TimerRepository> SharedTimerService<R> {
    pub fn new(service: TimerService<R>) -> Self {
        Self {
            inner: Arc::new(Shared {
                service: Mutex::new(service),
                submitting: AtomicBool::new(false),
            }),
        }
    }

    /// Submits `candidate`, or returns `Busy` if a submit is in flight.
    pub fn submit(&self, candidate: &TimerDefinition) -> Result<SubmitOutcome, SubmitError> {
        let _slot = self.claim_submit()?;
        self.lock().submit(candidate)
    }

    /// Submits the current draft, or returns `Busy` if a submit is in flight.
    pub fn submit_draft(&self) -> Result<SubmitOutcome, SubmitError> {
        let _slot = self.claim_submit()?;
        self.lock().submit_draft()
    }

    /// Runs `f` with exclusive access, waiting for any in-flight submit.
    pub fn with<T>(&self, f: impl FnOnce(&mut TimerService<R>) -> T) -> T {
        f(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, TimerService<R>> {
        self.inner
            .service
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn claim_submit(&self) -> Result<SubmitSlot<'_>, SubmitError> {
        if self
            .inner
            .submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("event=timer_submit module=service status=busy");
            return Err(SubmitError::Busy);
        }
        Ok(SubmitSlot(&self.inner.submitting))
    }
}

/// Clears the in-flight flag when the submit ends, including on panic.
struct SubmitSlot<'a>(&'a AtomicBool);

impl Drop for SubmitSlot<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::SharedTimerService;
    use crate::kv::{KeyValueStore, MemoryKeyValueStore, StorageResult};
    use crate::model::timer::TimerDefinition;
    use crate::repo::timer_repo::KvTimerRepository;
    use crate::service::timer_service::{SubmitError, SubmitOutcome, TimerService};
    use std::sync::{mpsc, Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    fn shared() -> SharedTimerService<KvTimerRepository<MemoryKeyValueStore>> {
        let service =
            TimerService::open(KvTimerRepository::new(MemoryKeyValueStore::new())).unwrap();
        SharedTimerService::new(service)
    }

    /// Store whose writes park until the test lets them through.
    struct GatedStore {
        inner: MemoryKeyValueStore,
        entered: Arc<Barrier>,
        release: Arc<Barrier>,
    }

    impl KeyValueStore for GatedStore {
        fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
            self.inner.get_item(key)
        }

        fn set_item(&mut self, key: &str, value: &str) -> StorageResult<()> {
            self.entered.wait();
            self.release.wait();
            self.inner.set_item(key, value)
        }

        fn remove_item(&mut self, key: &str) -> StorageResult<()> {
            self.inner.remove_item(key)
        }
    }

    #[test]
    fn second_submit_during_a_write_is_busy() {
        let entered = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));
        let store = GatedStore {
            inner: MemoryKeyValueStore::new(),
            entered: Arc::clone(&entered),
            release: Arc::clone(&release),
        };
        let service = TimerService::open(KvTimerRepository::new(store)).unwrap();
        let shared = SharedTimerService::new(service);

        let writer = shared.clone();
        let first =
            thread::spawn(move || writer.submit(&TimerDefinition::new("Tea", "180", "Kitchen")));

        entered.wait();
        let second = shared.submit(&TimerDefinition::new("Break", "300", "Work"));
        assert_eq!(second, Err(SubmitError::Busy));
        release.wait();

        let first = first.join().unwrap().unwrap();
        assert!(first.is_accepted());
        let names: Vec<String> = shared.with(|service| {
            service
                .definitions()
                .iter()
                .map(|timer| timer.name.clone())
                .collect()
        });
        assert_eq!(names, vec!["Tea".to_string()]);
    }

    #[test]
    fn submit_waits_for_a_reader_instead_of_failing() {
        let store = shared();
        let (started, on_started) = mpsc::channel();

        let worker = store.clone();
        let submitter = store.with(|_| {
            let handle = thread::spawn(move || {
                started.send(()).unwrap();
                worker.submit(&TimerDefinition::new("Tea", "180", "Kitchen"))
            });
            on_started.recv().unwrap();
            thread::sleep(Duration::from_millis(50));
            handle
        });

        let outcome = submitter.join().unwrap().unwrap();
        assert!(matches!(outcome, SubmitOutcome::Accepted(_)));
        assert_eq!(store.with(|service| service.definitions().len()), 1);
    }

    #[test]
    fn busy_flag_is_cleared_after_each_submit() {
        let store = shared();

        let rejected = store.submit(&TimerDefinition::new("", "180", "Kitchen"));
        assert!(matches!(rejected, Ok(SubmitOutcome::Rejected(_))));
        let accepted = store.submit(&TimerDefinition::new("Tea", "180", "Kitchen"));
        assert!(matches!(accepted, Ok(SubmitOutcome::Accepted(_))));
    }

    #[test]
    fn clones_share_one_cache() {
        let store = shared();
        let other = store.clone();

        store
            .submit(&TimerDefinition::new("Tea", "180", "Kitchen"))
            .unwrap();
        let count = other.with(|service| service.definitions().len());
        assert_eq!(count, 1);
    }

    #[test]
    fn handle_is_usable_from_other_threads() {
        let store = shared();
        let worker = store.clone();

        std::thread::spawn(move || {
            worker
                .submit(&TimerDefinition::new("Break", "300", "Work"))
                .unwrap();
        })
        .join()
        .unwrap();

        assert_eq!(store.with(|service| service.definitions().len()), 1);
    }
}
