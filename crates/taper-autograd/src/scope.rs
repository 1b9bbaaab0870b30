//! Gradient tracking scopes.

use std::cell::Cell;

thread_local! {
    static GRAD_ENABLED: Cell<bool> = const { Cell::new(true) };
}

/// Check if gradient tracking is currently enabled on this thread.
pub fn is_grad_enabled() -> bool {
    GRAD_ENABLED.with(|g| g.get())
}

/// Set whether gradient tracking is enabled, returning the prior state.
fn set_grad_enabled(enabled: bool) -> bool {
    GRAD_ENABLED.with(|g| {
        let prev = g.get();
        g.set(enabled);
        prev
    })
}

/// RAII guard that disables gradient tracking in its scope.
///
/// The prior state is restored on drop, including on unwinding, so
/// nested guards and early exits behave correctly. The flag is
/// thread-local: one thread's no-grad region cannot suppress tracking
/// in another thread.
///
/// # Example
/// ```
/// use taper_autograd::{is_grad_enabled, NoGradGuard};
///
/// assert!(is_grad_enabled());
/// {
///     let _guard = NoGradGuard::new();
///     assert!(!is_grad_enabled());
/// }
/// assert!(is_grad_enabled());
/// ```
pub struct NoGradGuard {
    prev: bool,
}

impl NoGradGuard {
    /// Enter a no-grad scope.
    pub fn new() -> Self {
        let prev = set_grad_enabled(false);
        Self { prev }
    }
}

impl Default for NoGradGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for NoGradGuard {
    fn drop(&mut self) {
        set_grad_enabled(self.prev);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_grad_guard_nesting() {
        assert!(is_grad_enabled());

        {
            let _guard = NoGradGuard::new();
            assert!(!is_grad_enabled());

            {
                let _inner = NoGradGuard::new();
                assert!(!is_grad_enabled());
            }
            // Inner guard dropped, still disabled because outer guard
            assert!(!is_grad_enabled());
        }

        // Outer guard dropped, restored to true
        assert!(is_grad_enabled());
    }

    #[test]
    fn test_restored_on_panic() {
        let result = std::panic::catch_unwind(|| {
            let _guard = NoGradGuard::new();
            panic!("inside no-grad scope");
        });
        assert!(result.is_err());
        assert!(is_grad_enabled());
    }
}
