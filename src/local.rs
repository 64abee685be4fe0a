//! Single-threaded at-most-once wrapper.
//!
//! [`LocalOnceFn<F>`] has the same contract as [`OnceFn<F>`](crate::OnceFn) but
//! keeps its state in [`Cell`]s instead of an atomic. It is `!Sync`, so it
//! suits callbacks that never leave the thread that created them.

use core::any::type_name;
use core::cell::Cell;
use core::future::Future;
use core::{fmt, mem};

use crate::error::FireError;
use crate::invoke::{Invoke, InvokeOn};
use crate::state::Phase;

/// Wraps `target` in a single-threaded wrapper that runs it at most once.
#[inline]
#[must_use]
pub const fn once_local<F>(target: F) -> LocalOnceFn<F> {
   LocalOnceFn::new(target)
}

/// A callable that invokes its delegate at most once, for use on one thread.
///
/// Calling convention and failure semantics match [`OnceFn`](crate::OnceFn).
pub struct LocalOnceFn<F> {
   func: Cell<Option<F>>,
   phase: Cell<Phase>,
}

/// Held while the delegate runs. `finish()` marks the phase done; dropping it
/// unfinished marks it poisoned.
struct LocalGuard<'a> {
   phase: &'a Cell<Phase>,
}

impl LocalGuard<'_> {
   #[inline(always)]
   fn finish(self) {
      self.phase.set(Phase::Done);
      mem::forget(self);
   }
}

impl Drop for LocalGuard<'_> {
   #[inline]
   fn drop(&mut self) {
      tracing::debug!("local once-wrapper delegate did not complete, wrapper stays fired and poisoned");
      self.phase.set(Phase::Poisoned);
   }
}

impl<F> LocalOnceFn<F> {
   /// Creates an armed wrapper around `target`.
   #[inline]
   #[must_use]
   pub const fn new(target: F) -> Self {
      Self {
         func: Cell::new(Some(target)),
         phase: Cell::new(Phase::Armed),
      }
   }

   /// Returns the current lifecycle phase.
   #[inline]
   pub fn phase(&self) -> Phase {
      self.phase.get()
   }

   /// Checks whether the delegate has been claimed (or defused).
   #[inline]
   pub fn is_fired(&self) -> bool {
      self.phase().is_fired()
   }

   /// Checks whether the delegate has finished running.
   #[inline]
   pub fn is_done(&self) -> bool {
      self.phase().is_done()
   }

   /// Checks whether the delegate failed to run to completion.
   #[inline]
   pub fn is_poisoned(&self) -> bool {
      self.phase() == Phase::Poisoned
   }

   /// Invokes the delegate with `args` if this is the first call.
   ///
   /// Returns `None` on every later call, including re-entrant ones.
   #[inline]
   pub fn call<Args>(&self, args: Args) -> Option<F::Output>
   where
      F: Invoke<Args>,
   {
      let (func, guard) = self.claim()?;
      let output = func.invoke(args);
      guard.finish();
      Some(output)
   }

   /// Invokes the delegate with an explicit `receiver` followed by `args` if
   /// this is the first call.
   #[inline]
   pub fn call_on<Recv, Args>(&self, receiver: Recv, args: Args) -> Option<F::Output>
   where
      F: InvokeOn<Recv, Args>,
   {
      let (func, guard) = self.claim()?;
      let output = func.invoke_on(receiver, args);
      guard.finish();
      Some(output)
   }

   /// Like [`call`](Self::call), but reports why the delegate was not invoked.
   pub fn try_call<Args>(&self, args: Args) -> Result<F::Output, FireError>
   where
      F: Invoke<Args>,
   {
      match self.claim() {
         Some((func, guard)) => {
            let output = func.invoke(args);
            guard.finish();
            Ok(output)
         }
         None => Err(self.refusal()),
      }
   }

   /// Like [`call_on`](Self::call_on), but reports why the delegate was not invoked.
   pub fn try_call_on<Recv, Args>(&self, receiver: Recv, args: Args) -> Result<F::Output, FireError>
   where
      F: InvokeOn<Recv, Args>,
   {
      match self.claim() {
         Some((func, guard)) => {
            let output = func.invoke_on(receiver, args);
            guard.finish();
            Ok(output)
         }
         None => Err(self.refusal()),
      }
   }

   /// Invokes an asynchronous delegate if this is the first call and awaits
   /// its future. The wrapper stays running until the future completes.
   ///
   /// The delegate is claimed on the first poll, not when `call_async` is
   /// called; a future that is never polled never fires. Dropping the future
   /// after it claimed the delegate leaves the wrapper [`Phase::Poisoned`].
   pub async fn call_async<Args>(&self, args: Args) -> Option<<F::Output as Future>::Output>
   where
      F: Invoke<Args>,
      F::Output: Future,
   {
      let (func, guard) = self.claim()?;
      let output = func.invoke(args).await;
      guard.finish();
      Some(output)
   }

   /// Fires the wrapper without invoking the delegate, dropping it.
   ///
   /// Returns `true` if this call disarmed the wrapper.
   pub fn defuse(&self) -> bool {
      match self.claim() {
         Some((func, guard)) => {
            drop(func);
            guard.finish();
            true
         }
         None => false,
      }
   }

   /// Consumes the wrapper, returning the delegate if it never fired.
   #[inline]
   pub fn into_inner(self) -> Option<F> {
      self.func.into_inner()
   }

   #[inline]
   fn claim(&self) -> Option<(F, LocalGuard<'_>)> {
      // Taking the delegate out is the fire transition; it happens before the
      // delegate runs, so re-entrant calls find the slot empty.
      let Some(func) = self.func.take() else {
         tracing::trace!(delegate = type_name::<F>(), "local once-wrapper already fired, call suppressed");
         return None;
      };
      tracing::trace!(delegate = type_name::<F>(), "local once-wrapper firing");
      self.phase.set(Phase::Running);
      Some((func, LocalGuard { phase: &self.phase }))
   }

   #[cold]
   fn refusal(&self) -> FireError {
      match self.phase() {
         Phase::Poisoned => FireError::Poisoned,
         _ => FireError::AlreadyFired,
      }
   }
}

impl<F> From<F> for LocalOnceFn<F> {
   #[inline]
   fn from(target: F) -> Self {
      Self::new(target)
   }
}

impl<F> fmt::Debug for LocalOnceFn<F> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("LocalOnceFn")
         .field("delegate", &type_name::<F>())
         .field("phase", &self.phase())
         .finish()
   }
}
