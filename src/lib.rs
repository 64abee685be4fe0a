//! Wrappers that run a callable at most once.
//!
//! This crate provides two wrapper types with the same contract:
//!
//! - [`OnceFn<F>`]: thread-safe; the fire transition is a single atomic operation,
//!   and [`OnceFn::wait`] can block until the delegate has finished.
//! - [`LocalOnceFn<F>`]: single-threaded, built on [`Cell`](core::cell::Cell).
//!
//! The first call to a wrapper moves the delegate out and invokes it with the
//! supplied arguments, returning `Some(output)`. Every later call returns `None`
//! without invoking anything. The wrapper is marked as fired *before* the
//! delegate runs, so re-entrant calls are suppressed as well.
//!
//! A delegate that fails still consumes its one invocation: an `Err` is handed
//! back to the first caller as `Some(Err(..))`, and a panic unwinds through the
//! first call and leaves the wrapper [`Phase::Poisoned`]. Neither is retried.
//!
//! # Calling convention
//!
//! Arguments are passed as a tuple through [`Invoke`]. A delegate that acts on a
//! receiver takes it as its first parameter and is called with
//! [`OnceFn::call_on`], which forwards the receiver through [`InvokeOn`].
//!
//! # Examples
//!
//! ## One-shot callback
//!
//! ```rust
//! use fire_once::once;
//!
//! let mut log: Vec<&str> = Vec::new();
//! let record = once(|log: &mut Vec<&str>, entry: &'static str| {
//!    log.push(entry);
//!    42
//! });
//!
//! assert_eq!(record.call_on(&mut log, ("x",)), Some(42));
//! assert_eq!(record.call_on(&mut log, ("y",)), None);
//! assert_eq!(log, ["x"]);
//! ```
//!
//! ## Shared initializer
//!
//! ```rust
//! use std::sync::Arc;
//! use fire_once::once;
//!
//! let init = Arc::new(once(|| println!("initializing")));
//! let handles: Vec<_> = (0..4)
//!    .map(|_| {
//!       let init = Arc::clone(&init);
//!       std::thread::spawn(move || init.call(()))
//!    })
//!    .collect();
//!
//! let fired = handles
//!    .into_iter()
//!    .filter_map(|h| h.join().unwrap())
//!    .count();
//! assert_eq!(fired, 1);
//! ```

/// Reasons a wrapper declined to invoke its delegate.
mod error;

/// Tuple-based forwarding of arguments and receivers.
mod invoke;

/// Single-threaded wrapper.
mod local;

/// Thread-safe wrapper.
mod once_fn;

/// Internal fire-state tracking.
mod state;

pub use error::FireError;
pub use invoke::{Invoke, InvokeOn};
pub use local::{once_local, LocalOnceFn};
pub use once_fn::{once, OnceFn};
pub use state::Phase;
