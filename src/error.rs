/// Reason a wrapper declined to invoke its delegate.
///
/// Returned only by the `try_call*` family; plain `call` reports the same
/// situations as `None`. Delegate failures themselves are never wrapped in
/// this type: they reach the first caller unchanged.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FireError {
   /// The delegate was already invoked (or defused) by an earlier call.
   #[error("delegate has already been invoked")]
   AlreadyFired,

   /// The delegate did not complete its only invocation: it panicked, or its
   /// future was dropped part-way. It is not retried.
   #[error("delegate did not complete its only invocation")]
   Poisoned,
}
