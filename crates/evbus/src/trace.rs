//! Diagnostic trace lines, compiled in only with the `debug-log` feature.
//!
//! With the feature enabled the macro forwards to [`log::debug!`] under the
//! `evbus` target; without it the invocation expands to nothing and its
//! arguments are not evaluated.

#[cfg(feature = "debug-log")]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        log::debug!(target: "evbus", $($arg)*)
    };
}

#[cfg(not(feature = "debug-log"))]
macro_rules! debug_log {
    ($($arg:tt)*) => {{}};
}

pub(crate) use debug_log;
