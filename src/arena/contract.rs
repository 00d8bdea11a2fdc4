//! Fatal contract checks.
//!
//! Misuse of an arena is a bug in the caller, so it is reported and then the
//! thread panics (the release profile aborts). Checks run in every build.

use core::fmt;
use core::panic::Location;

/// Panics with `$msg` unless `$cond` holds.
macro_rules! contract {
    ($cond:expr, $($msg:tt)+) => {
        if !$cond {
            $crate::arena::contract::violation(stringify!($cond), format_args!($($msg)+));
        }
    };
}

pub(crate) use contract;

#[cold]
#[inline(never)]
#[track_caller]
pub(crate) fn violation(condition: &str, message: fmt::Arguments<'_>) -> ! {
    let location = Location::caller();
    tracing::error!(
        condition,
        file = location.file(),
        line = location.line(),
        "arena contract violated: {message}"
    );
    panic!("arena contract violated: {message} ({condition})");
}
