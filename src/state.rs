//! Internal fire-state tracking for [`OnceFn`](crate::OnceFn).
//!
//! The state is packed into a single `AtomicU8`:
//! - Bit 0: FIRED - the delegate has been claimed by a caller
//! - Bit 1: DONE - the delegate has returned or unwound
//! - Bit 2: POISONED - the delegate did not run to completion
//! - Bit 3: WAITING - at least one thread is parked in `wait`
//!
//! FIRED is set with one `fetch_or`, so exactly one caller ever observes the
//! armed state. No bit is ever cleared except WAITING.

use core::mem;
use core::sync::atomic::{AtomicU8, Ordering};

use parking_lot_core::{DEFAULT_PARK_TOKEN, DEFAULT_UNPARK_TOKEN};

/// Observable lifecycle of a once-wrapper.
///
/// Every phase except [`Phase::Armed`] counts as fired: the delegate will not be
/// invoked again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
   /// Never invoked.
   Armed,
   /// Claimed by a caller; the delegate is executing.
   Running,
   /// The delegate returned (or was defused).
   Done,
   /// The delegate did not run to completion: it panicked, or the future
   /// returned by an asynchronous delegate was dropped before finishing.
   Poisoned,
}

impl Phase {
   /// Returns `true` for every phase past [`Phase::Armed`].
   #[inline]
   pub const fn is_fired(self) -> bool {
      !matches!(self, Phase::Armed)
   }

   /// Returns `true` once the delegate has finished, successfully or not.
   #[inline]
   pub const fn is_done(self) -> bool {
      matches!(self, Phase::Done | Phase::Poisoned)
   }
}

/// Atomic state of a thread-safe once-wrapper.
#[repr(transparent)]
pub(crate) struct FireState(AtomicU8);

impl FireState {
   const FIRED: u8 = 1;
   const DONE: u8 = 2;
   const POISONED: u8 = 4;
   const WAITING: u8 = 8;

   #[inline]
   pub(crate) const fn new() -> Self {
      Self(AtomicU8::new(0))
   }

   #[inline]
   pub(crate) fn phase(&self, ordering: Ordering) -> Phase {
      let state = self.0.load(ordering);
      if state & Self::POISONED != 0 {
         Phase::Poisoned
      } else if state & Self::DONE != 0 {
         Phase::Done
      } else if state & Self::FIRED != 0 {
         Phase::Running
      } else {
         Phase::Armed
      }
   }

   #[inline]
   pub(crate) fn is_fired(&self, ordering: Ordering) -> bool {
      self.0.load(ordering) & Self::FIRED != 0
   }

   #[inline]
   pub(crate) fn is_done(&self, ordering: Ordering) -> bool {
      self.0.load(ordering) & Self::DONE != 0
   }

   /// Claims the delegate. Returns a guard for the single winning caller and
   /// `None` for everyone else, including re-entrant calls from the delegate.
   #[inline]
   pub(crate) fn try_fire(&self) -> Option<FireGuard<'_>> {
      // Acquire keeps the read of the delegate below the claim.
      let prev = self.0.fetch_or(Self::FIRED, Ordering::Acquire);
      if prev & Self::FIRED == 0 {
         Some(FireGuard { state: self })
      } else {
         None
      }
   }

   /// Marks the delegate as finished and wakes any parked waiters.
   #[inline]
   fn set_finished(&self, poisoned: bool) {
      let mut new_state = Self::FIRED | Self::DONE;
      if poisoned {
         new_state |= Self::POISONED;
      }
      // Release publishes the delegate's side effects to threads that observe
      // DONE with Acquire in `wait`.
      let prev = self.0.swap(new_state, Ordering::Release);
      if prev & Self::WAITING != 0 {
         self.notify_all();
      }
   }

   #[inline]
   fn notify_all(&self) {
      // SAFETY: The address passed to unpark must match the address used for park.
      // Both use the address of the inner AtomicU8.
      unsafe {
         parking_lot_core::unpark_all(self.0.as_ptr() as usize, DEFAULT_UNPARK_TOKEN);
      }
   }

   /// Parks until `state` no longer matches `expected_state`.
   #[inline]
   fn park(&self, expected_state: u8) {
      // SAFETY: See `notify_all`.
      unsafe {
         // The validate closure runs under the queue lock, so a `set_finished` that
         // races with us either fails validation or sees WAITING and unparks.
         let _ = parking_lot_core::park(
            self.0.as_ptr() as usize,
            || self.0.load(Ordering::Acquire) == expected_state,
            || {},
            |_, _| {},
            DEFAULT_PARK_TOKEN,
            None,
         );
      }
   }

   /// Blocks until DONE is set.
   pub(crate) fn wait(&self) {
      loop {
         let state = self.0.load(Ordering::Acquire);
         if state & Self::DONE != 0 {
            return;
         }
         if state & Self::WAITING == 0 {
            let new_state = state | Self::WAITING;
            if self
               .0
               .compare_exchange_weak(state, new_state, Ordering::Relaxed, Ordering::Relaxed)
               .is_err()
            {
               std::hint::spin_loop();
               continue;
            }
            self.park(new_state);
         } else {
            self.park(state);
         }
      }
   }

   /// Waits for DONE without blocking the executor for as long as possible.
   ///
   /// Yields to the scheduler first, then falls back to `block_in_place` on
   /// the multi-threaded runtime.
   #[cfg(any(feature = "async-tokio", feature = "async-tokio-mt"))]
   pub(crate) async fn wait_async(&self) {
      #[allow(clippy::never_loop)]
      loop {
         for _ in 0..64 {
            if self.is_done(Ordering::Acquire) {
               return;
            }
            tokio::task::yield_now().await;
         }

         #[cfg(feature = "async-tokio-mt")]
         {
            return tokio::task::block_in_place(|| self.wait());
         }
      }
   }
}

/// Held by the caller that fired the delegate.
///
/// Must be `finish()`ed once the delegate has completed, which marks the state
/// DONE. Dropping it unfinished (an unwinding panic, or a cancelled future)
/// marks it DONE | POISONED. The fired state is never rolled back.
pub(crate) struct FireGuard<'a> {
   state: &'a FireState,
}

impl FireGuard<'_> {
   /// Marks the delegate as completed, consumes the guard, and wakes waiters.
   #[inline(always)]
   pub(crate) fn finish(self) {
      self.state.set_finished(false);
      mem::forget(self); // Prevent Drop from poisoning the state
   }
}

impl Drop for FireGuard<'_> {
   /// Called only if the delegate did not complete.
   #[inline]
   fn drop(&mut self) {
      tracing::debug!("once-wrapper delegate did not complete, wrapper stays fired and poisoned");
      self.state.set_finished(true);
   }
}
