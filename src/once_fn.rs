//! Thread-safe at-most-once wrapper.
//!
//! [`OnceFn<F>`] owns a delegate and hands it to exactly one caller. The claim is
//! a single atomic read-modify-write performed *before* the delegate runs, so
//! concurrent callers and re-entrant calls from inside the delegate all observe
//! the wrapper as fired and return without invoking anything.

use core::any::type_name;
use core::cell::UnsafeCell;
use core::future::Future;
use core::sync::atomic::Ordering;
use core::{fmt, mem};

use crate::error::FireError;
use crate::invoke::{Invoke, InvokeOn};
use crate::state::{FireGuard, FireState, Phase};

/// Wraps `target` so that it runs at most once.
///
/// The returned wrapper forwards the arguments of its first call to `target`
/// and ignores every later call. See [`OnceFn`] for the calling convention.
///
/// ```rust
/// use fire_once::once;
///
/// let add = once(|a: i32, b: i32| a + b);
/// assert_eq!(add.call((2, 3)), Some(5));
/// assert_eq!(add.call((10, 20)), None);
/// ```
#[inline]
#[must_use]
pub const fn once<F>(target: F) -> OnceFn<F> {
   OnceFn::new(target)
}

/// A callable that invokes its delegate at most once, safe to share across threads.
///
/// Arguments are passed as a tuple: `call(())` for a nullary delegate,
/// `call((a,))` for one argument, `call((a, b))` for two, and so on up to eight.
/// A delegate that needs a receiver takes it as its first parameter and is
/// invoked through [`call_on`](Self::call_on); alternatively, capture the
/// receiver in the closure before wrapping it.
///
/// The first call returns `Some(output)`; every later call returns `None`. A
/// delegate that fails (returns `Err` or panics) still consumes the single
/// invocation and is never retried.
pub struct OnceFn<F> {
   func: UnsafeCell<mem::MaybeUninit<F>>,
   state: FireState,
}

impl<F> OnceFn<F> {
   /// Creates an armed wrapper around `target`.
   #[inline]
   #[must_use]
   pub const fn new(target: F) -> Self {
      Self {
         func: UnsafeCell::new(mem::MaybeUninit::new(target)),
         state: FireState::new(),
      }
   }

   /// Returns the current lifecycle phase. Never blocks.
   #[inline]
   pub fn phase(&self) -> Phase {
      self.state.phase(Ordering::Acquire)
   }

   /// Checks whether the delegate has been claimed (or defused).
   #[inline]
   pub fn is_fired(&self) -> bool {
      self.state.is_fired(Ordering::Relaxed)
   }

   /// Checks whether the delegate has finished running.
   #[inline]
   pub fn is_done(&self) -> bool {
      self.state.is_done(Ordering::Acquire)
   }

   /// Checks whether the delegate failed to run to completion.
   #[inline]
   pub fn is_poisoned(&self) -> bool {
      self.phase() == Phase::Poisoned
   }

   /// Invokes the delegate with `args` if this is the first call.
   ///
   /// Returns `Some(output)` on the first call and `None` on every call after
   /// it, including calls made concurrently or from inside the delegate. A
   /// panic in the delegate propagates to this caller only.
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
   ///
   /// The receiver is forwarded unchanged as the delegate's first parameter.
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

   /// Invokes an asynchronous delegate with `args` if this is the first call,
   /// and awaits the future it returns.
   ///
   /// Like any `async fn`, this does nothing until first polled: the delegate
   /// is claimed on the first poll, not when `call_async` is called. Of several
   /// pending calls, the one polled first fires, and a future that is never
   /// polled never fires.
   ///
   /// The wrapper stays [`Phase::Running`] until the future completes, so
   /// [`wait`](Self::wait) observes the end of the asynchronous work. If the
   /// future is dropped after claiming but before completing, the wrapper
   /// finishes as [`Phase::Poisoned`]; the delegate is not retried.
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
   /// Returns `true` if this call disarmed the wrapper, `false` if it had
   /// already fired.
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
   pub fn into_inner(self) -> Option<F> {
      let (func, guard) = self.claim()?;
      guard.finish();
      Some(func)
   }

   /// Blocks the current thread until the delegate has finished.
   ///
   /// Returns immediately if it already has. If the wrapper is still armed,
   /// this waits for some other caller to fire it.
   ///
   /// Calling this from inside the delegate deadlocks.
   #[inline]
   pub fn wait(&self) {
      if !self.is_done() {
         self.state.wait();
      }
   }

   /// Waits asynchronously until the delegate has finished.
   ///
   /// Yields to the tokio scheduler first; with `async-tokio-mt` it then falls
   /// back to `block_in_place`, which requires the multi-threaded runtime.
   #[cfg(any(feature = "async-tokio", feature = "async-tokio-mt"))]
   pub async fn wait_async(&self) {
      if !self.is_done() {
         self.state.wait_async().await;
      }
   }

   /// Claims the delegate for the caller that wins the fire transition.
   #[inline]
   fn claim(&self) -> Option<(F, FireGuard<'_>)> {
      let Some(guard) = self.state.try_fire() else {
         tracing::trace!(delegate = type_name::<F>(), "once-wrapper already fired, call suppressed");
         return None;
      };
      tracing::trace!(delegate = type_name::<F>(), "once-wrapper firing");
      // SAFETY: Only the single winner of `try_fire` reaches this point, and
      // FIRED is never cleared, so the delegate is read out exactly once.
      let func = unsafe { (*self.func.get()).assume_init_read() };
      Some((func, guard))
   }

   #[cold]
   fn refusal(&self) -> FireError {
      match self.phase() {
         Phase::Poisoned => FireError::Poisoned,
         _ => FireError::AlreadyFired,
      }
   }
}

// --- Trait Implementations ---

// SAFETY:
// The delegate is never shared by reference: exactly one caller moves it out
// and invokes it on its own thread. Sharing `&OnceFn<F>` therefore only needs
// `F: Send`.
unsafe impl<F: Send> Sync for OnceFn<F> {}

impl<F> From<F> for OnceFn<F> {
   /// Creates an armed wrapper around the given delegate.
   #[inline]
   fn from(target: F) -> Self {
      Self::new(target)
   }
}

impl<F> fmt::Debug for OnceFn<F> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("OnceFn")
         .field("delegate", &type_name::<F>())
         .field("phase", &self.phase())
         .finish()
   }
}

impl<F> Drop for OnceFn<F> {
   #[inline]
   fn drop(&mut self) {
      if !self.state.is_fired(Ordering::Relaxed) {
         // SAFETY: The wrapper never fired, so the delegate is still initialized,
         // and `&mut self` rules out a concurrent claim.
         unsafe { self.func.get_mut().assume_init_drop() };
      }
   }
}
