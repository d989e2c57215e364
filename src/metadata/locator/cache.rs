//! Memoization strategies for the per-module values a locator derives.
//!
//! The strategy is picked by type, not by a runtime flag: [`SingleThreaded`] for one caller,
//! [`LockedSimple`] to funnel every caller through one lock, [`Concurrent`] for lock-free
//! lookups with a dedicated gate around bulk resolution.

use std::{cell::RefCell, collections::HashMap, path::PathBuf};

use dashmap::DashMap;
use parking_lot::ReentrantMutex;

use crate::metadata::{locator::TargetFrameworkInfo, tables::ModuleId};

/// Storage and locking policy of a [`crate::metadata::locator::Locator`].
pub trait CacheStrategy: Default {
    /// The memoized target framework of `module`, computed by `compute` on first use.
    fn framework_info(
        &self,
        module: ModuleId,
        compute: impl FnOnce() -> Option<TargetFrameworkInfo>,
    ) -> Option<TargetFrameworkInfo>;

    /// The memoized reference directory of `module`, computed by `compute` on first use.
    fn framework_path(
        &self,
        module: ModuleId,
        compute: impl FnOnce() -> Option<PathBuf>,
    ) -> Option<PathBuf>;

    /// Run `work` inside the strategy's critical section for in-place resolution.
    fn serialize<T>(&self, work: impl FnOnce() -> T) -> T;
}

#[derive(Debug, Default)]
struct Memo {
    info: HashMap<ModuleId, Option<TargetFrameworkInfo>>,
    paths: HashMap<ModuleId, Option<PathBuf>>,
}

/// Plain maps for a single caller; not `Sync`.
#[derive(Debug, Default)]
pub struct SingleThreaded {
    memo: RefCell<Memo>,
}

impl CacheStrategy for SingleThreaded {
    fn framework_info(
        &self,
        module: ModuleId,
        compute: impl FnOnce() -> Option<TargetFrameworkInfo>,
    ) -> Option<TargetFrameworkInfo> {
        if let Some(known) = self.memo.borrow().info.get(&module) {
            return known.clone();
        }
        let value = compute();
        self.memo
            .borrow_mut()
            .info
            .entry(module)
            .or_insert(value)
            .clone()
    }

    fn framework_path(
        &self,
        module: ModuleId,
        compute: impl FnOnce() -> Option<PathBuf>,
    ) -> Option<PathBuf> {
        if let Some(known) = self.memo.borrow().paths.get(&module) {
            return known.clone();
        }
        let value = compute();
        self.memo
            .borrow_mut()
            .paths
            .entry(module)
            .or_insert(value)
            .clone()
    }

    fn serialize<T>(&self, work: impl FnOnce() -> T) -> T {
        work()
    }
}

/// One reentrant lock around every lookup, computation and resolution pass.
#[derive(Default)]
pub struct LockedSimple {
    memo: ReentrantMutex<RefCell<Memo>>,
}

impl std::fmt::Debug for LockedSimple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockedSimple").finish_non_exhaustive()
    }
}

impl CacheStrategy for LockedSimple {
    fn framework_info(
        &self,
        module: ModuleId,
        compute: impl FnOnce() -> Option<TargetFrameworkInfo>,
    ) -> Option<TargetFrameworkInfo> {
        let guard = self.memo.lock();
        if let Some(known) = guard.borrow().info.get(&module) {
            return known.clone();
        }
        // the lock stays held, the borrow does not
        let value = compute();
        let stored = guard.borrow_mut().info.entry(module).or_insert(value).clone();
        stored
    }

    fn framework_path(
        &self,
        module: ModuleId,
        compute: impl FnOnce() -> Option<PathBuf>,
    ) -> Option<PathBuf> {
        let guard = self.memo.lock();
        if let Some(known) = guard.borrow().paths.get(&module) {
            return known.clone();
        }
        let value = compute();
        let stored = guard.borrow_mut().paths.entry(module).or_insert(value).clone();
        stored
    }

    fn serialize<T>(&self, work: impl FnOnce() -> T) -> T {
        let _guard = self.memo.lock();
        work()
    }
}

/// Concurrent maps with get-or-insert semantics.
///
/// Two threads asking for the same module at once may both compute the value; the first one
/// stored wins. Both computations read the same immutable attribute data, so they agree.
/// In-place resolution passes are serialized by a single gate shared by all modules.
#[derive(Default)]
pub struct Concurrent {
    info: DashMap<ModuleId, Option<TargetFrameworkInfo>>,
    paths: DashMap<ModuleId, Option<PathBuf>>,
    gate: ReentrantMutex<()>,
}

impl std::fmt::Debug for Concurrent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Concurrent")
            .field("info", &self.info.len())
            .field("paths", &self.paths.len())
            .finish_non_exhaustive()
    }
}

impl CacheStrategy for Concurrent {
    fn framework_info(
        &self,
        module: ModuleId,
        compute: impl FnOnce() -> Option<TargetFrameworkInfo>,
    ) -> Option<TargetFrameworkInfo> {
        if let Some(known) = self.info.get(&module).map(|entry| entry.value().clone()) {
            return known;
        }
        let value = compute();
        self.info.entry(module).or_insert(value).value().clone()
    }

    fn framework_path(
        &self,
        module: ModuleId,
        compute: impl FnOnce() -> Option<PathBuf>,
    ) -> Option<PathBuf> {
        if let Some(known) = self.paths.get(&module).map(|entry| entry.value().clone()) {
            return known;
        }
        let value = compute();
        self.paths.entry(module).or_insert(value).value().clone()
    }

    fn serialize<T>(&self, work: impl FnOnce() -> T) -> T {
        let _guard = self.gate.lock();
        work()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        thread,
    };

    fn info() -> Option<TargetFrameworkInfo> {
        TargetFrameworkInfo::parse(".NETFramework,Version=v4.0")
    }

    fn memoizes<S: CacheStrategy>(strategy: &S, first: ModuleId, second: ModuleId) {
        let calls = AtomicUsize::new(0);
        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            info()
        };

        assert_eq!(strategy.framework_info(first, compute), info());
        assert_eq!(strategy.framework_info(first, compute), info());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // a missing framework is remembered too
        assert_eq!(strategy.framework_path(second, || None), None);
        assert_eq!(
            strategy.framework_path(second, || Some(PathBuf::from("/late"))),
            None
        );
        assert_eq!(strategy.serialize(|| 7), 7);
    }

    fn ids() -> (ModuleId, ModuleId) {
        let a = crate::test::ModuleBuilder::new().build().id();
        let b = crate::test::ModuleBuilder::new().build().id();
        (a, b)
    }

    #[test]
    fn strategies_memoize_per_module() {
        let (a, b) = ids();
        memoizes(&SingleThreaded::default(), a, b);
        memoizes(&LockedSimple::default(), a, b);
        memoizes(&Concurrent::default(), a, b);
    }

    #[test]
    fn locked_strategy_is_reentrant() {
        let (a, _) = ids();
        let strategy = LockedSimple::default();
        let nested = strategy.serialize(|| strategy.framework_info(a, info));
        assert_eq!(nested, info());
    }

    #[test]
    fn concurrent_get_or_insert() {
        let (a, _) = ids();
        let strategy = Arc::new(Concurrent::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let strategy = Arc::clone(&strategy);
                thread::spawn(move || strategy.framework_info(a, info))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), info());
        }
        assert_eq!(strategy.info.len(), 1);
    }
}
