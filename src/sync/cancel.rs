use portable_atomic::{AtomicBool, Ordering};

/// Allows a long running operation to be canceled remotely. The operation
/// holds a [`CancelToken`] and checks it between units of work.
#[derive(Debug, Default)]
pub struct Cancel {
    canceled: AtomicBool,
}

impl Cancel {
    pub const fn new() -> Self {
        Self {
            canceled: AtomicBool::new(false),
        }
    }

    pub const fn get_token(&self) -> CancelToken<'_> {
        CancelToken { cancel: self }
    }

    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::Release);
    }

    /// Re-arm after a cancellation, so the same instance can be reused.
    pub fn reset(&self) {
        self.canceled.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CancelToken<'a> {
    cancel: &'a Cancel,
}

impl CancelToken<'_> {
    pub fn is_canceled(&self) -> bool {
        self.cancel.canceled.load(Ordering::Acquire)
    }
}
