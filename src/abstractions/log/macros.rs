//! Macros for generating log messages.
//!
//! Each macro takes an optional leading threshold, `level!(threshold, "format", args…)`. With the
//! threshold omitted it defaults to 0, which is always emitted. All six delegate to `log_event!`,
//! which records the threshold as a structured field for the filtering layer to inspect.

#[doc(hidden)]
#[macro_export]
macro_rules! log_event {
    ($level:ident, $threshold:expr, $($arg:tt)+) => {{
        $crate::log::init_logger();
        tracing::event!(
            tracing::Level::$level,
            threshold = $threshold,
            message = format_args!($($arg)+)
        );
    }};
}

#[macro_export]
macro_rules! critical {
    ($threshold:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
        $crate::log::init_logger();
        tracing::event!(
            tracing::Level::ERROR,
            critical = true,
            threshold = $threshold,
            message = format_args!($fmt $(, $arg)*)
        );
    }};
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::critical!(0u8, $fmt $(, $arg)*)
    };
}

#[macro_export]
macro_rules! error {
    ($threshold:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::log_event!(ERROR, $threshold, $fmt $(, $arg)*)
    };
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::log_event!(ERROR, 0u8, $fmt $(, $arg)*)
    };
}

#[macro_export]
macro_rules! warning {
    ($threshold:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::log_event!(WARN, $threshold, $fmt $(, $arg)*)
    };
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::log_event!(WARN, 0u8, $fmt $(, $arg)*)
    };
}

#[macro_export]
macro_rules! info {
    ($threshold:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::log_event!(INFO, $threshold, $fmt $(, $arg)*)
    };
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::log_event!(INFO, 0u8, $fmt $(, $arg)*)
    };
}

#[macro_export]
macro_rules! debug {
    ($threshold:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::log_event!(DEBUG, $threshold, $fmt $(, $arg)*)
    };
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::log_event!(DEBUG, 0u8, $fmt $(, $arg)*)
    };
}

#[macro_export]
macro_rules! trace {
    ($threshold:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::log_event!(TRACE, $threshold, $fmt $(, $arg)*)
    };
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::log_event!(TRACE, 0u8, $fmt $(, $arg)*)
    };
}

// The following makes the macros importable directly from the `log` module.
pub use {critical, error, warning, info, debug, trace};
