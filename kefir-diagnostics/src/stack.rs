//! The thread-local bounded error stack.
//!
//! Every fallible optimizer operation both returns a `Result` and, for
//! diagnostics the driver wants attributed with context, pushes onto this
//! stack. It is the only hidden/global state in an otherwise stateless API
//! (`spec.md` §9, "Global state (error stack)").

use std::cell::RefCell;

use crate::error::KefirError;

/// Reference capacity named in `spec.md` §7.
pub const ERROR_STACK_CAPACITY: usize = 32;

/// A bounded LIFO-ish record of errors raised on the current thread.
///
/// On overflow, the oldest entry (index 0, "the original context") is kept,
/// the oldest-but-one entry is evicted to make room, and the overflow flag
/// is set so callers know the proximate cause and the original trigger are
/// both still present even though some history in between was dropped.
#[derive(Debug, Default)]
pub struct ErrorStack {
    entries: Vec<KefirError>,
    overflowed: bool,
}

impl ErrorStack {
    /// An empty stack.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            overflowed: false,
        }
    }

    /// Push a new error, evicting history if the stack is at capacity.
    pub fn push(&mut self, error: KefirError) {
        if self.entries.len() >= ERROR_STACK_CAPACITY {
            if self.entries.len() > 1 {
                self.entries.remove(1);
            }
            self.overflowed = true;
        }
        self.entries.push(error);
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[KefirError] {
        &self.entries
    }

    /// The most recently pushed error, i.e. the most proximate cause.
    pub fn last(&self) -> Option<&KefirError> {
        self.entries.last()
    }

    /// The first error ever pushed on this thread since the last [`clear`](Self::clear).
    pub fn first(&self) -> Option<&KefirError> {
        self.entries.first()
    }

    /// Whether this stack has ever evicted an entry.
    pub fn has_overflowed(&self) -> bool {
        self.overflowed
    }

    /// Drop all entries and reset the overflow flag.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.overflowed = false;
    }
}

thread_local! {
    static ERROR_STACK: RefCell<ErrorStack> = RefCell::new(ErrorStack::new());
}

/// Push an error onto the current thread's error stack.
pub fn push_error(error: KefirError) {
    ERROR_STACK.with(|stack| stack.borrow_mut().push(error));
}

/// Run `f` with read access to the current thread's error stack.
pub fn with_error_stack<R>(f: impl FnOnce(&ErrorStack) -> R) -> R {
    ERROR_STACK.with(|stack| f(&stack.borrow()))
}

/// Clear the current thread's error stack; called by the driver between
/// independent compilation units.
pub fn clear_error_stack() {
    ERROR_STACK.with(|stack| stack.borrow_mut().clear());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_preserves_first_and_last() {
        clear_error_stack();
        for i in 0..ERROR_STACK_CAPACITY + 5 {
            push_error(KefirError::not_found(format!("item-{i}")));
        }
        with_error_stack(|stack| {
            assert!(stack.has_overflowed());
            assert_eq!(stack.entries().len(), ERROR_STACK_CAPACITY);
            match stack.first().unwrap() {
                KefirError::NotFound { what } => assert_eq!(what, "item-0"),
                other => panic!("unexpected first entry: {other:?}"),
            }
            match stack.last().unwrap() {
                KefirError::NotFound { what } => {
                    assert_eq!(what, &format!("item-{}", ERROR_STACK_CAPACITY + 4))
                }
                other => panic!("unexpected last entry: {other:?}"),
            }
        });
        clear_error_stack();
    }

    #[test]
    fn no_overflow_under_capacity() {
        clear_error_stack();
        push_error(KefirError::invalid_parameter("x"));
        push_error(KefirError::internal("y"));
        with_error_stack(|stack| {
            assert!(!stack.has_overflowed());
            assert_eq!(stack.entries().len(), 2);
        });
        clear_error_stack();
    }
}
