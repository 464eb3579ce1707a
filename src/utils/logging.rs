//! Logging macros switched per module by a `const ENABLE_LOGS: bool`.
//!
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//!
//! use crate::{log_info, log_warn};
//!
//! log_warn!("Document {} has no usable date", file);
//! ```
//!
//! Missing-data conditions (undated records, unreadable manifests, absent
//! phase folders, skipped files) go through `log_warn!` and never abort a
//! render. Failed content loads go through `log_error!`. With the flag off,
//! format arguments are not evaluated.

/// Logs at `$level` when the calling module's `ENABLE_LOGS` is set.
#[doc(hidden)]
#[macro_export]
macro_rules! log_gated {
    ($level:expr, $($arg:tt)+) => {
        if ENABLE_LOGS {
            ::log::log!($level, $($arg)+);
        }
    };
}

/// Progress: manifests loaded or written, state database opened.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)+) => {
        $crate::log_gated!(::log::Level::Info, $($arg)+)
    };
}

/// Degraded but recoverable input.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)+) => {
        $crate::log_gated!(::log::Level::Warn, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)+) => {
        $crate::log_gated!(::log::Level::Error, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    mod muted {
        const ENABLE_LOGS: bool = false;

        pub fn warn_with(counter: &std::cell::Cell<u32>) {
            crate::log_warn!("evaluated {}", {
                counter.set(counter.get() + 1);
                counter.get()
            });
        }
    }

    mod enabled {
        const ENABLE_LOGS: bool = true;

        pub fn emit_all(file: &str) {
            crate::log_info!("Loaded {file}");
            crate::log_warn!("Skipping {} (no date)", file);
            crate::log_error!("Error loading content: {file}");
        }
    }

    #[test]
    fn muted_module_skips_argument_evaluation() {
        let counter = Cell::new(0);
        muted::warn_with(&counter);
        assert_eq!(counter.get(), 0);
    }

    #[test]
    fn enabled_module_logs_without_panicking() {
        enabled::emit_all("notes.html");
    }
}
