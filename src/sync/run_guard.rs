use portable_atomic::{AtomicBool, Ordering};

/// Marks an exclusive operation as in progress. At most one [`RunGuard`] can
/// exist per flag, the flag is released when the guard is dropped.
#[derive(Debug, Default)]
pub struct RunFlag {
    running: AtomicBool,
}

impl RunFlag {
    pub const fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
        }
    }

    /// Acquire the flag, returns `None` if it is already held.
    pub fn try_acquire(&self) -> Option<RunGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| RunGuard { flag: self })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub struct RunGuard<'a> {
    flag: &'a RunFlag,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.running.store(false, Ordering::Release);
    }
}
