//! Arity-generic invocation of `FnOnce` delegates.
//!
//! Rust closures cannot be generic over their argument count, so the wrappers
//! take their arguments as a tuple and forward them through [`Invoke`]. A
//! receiver, when the delegate needs one, is passed explicitly and becomes the
//! delegate's first parameter through [`InvokeOn`].

/// A callable that can be consumed with the argument tuple `Args`.
///
/// Implemented for every `FnOnce` taking up to eight arguments, so
/// `|a: i32, b: i32| a + b` is `Invoke<(i32, i32)>` and `|| ()` is `Invoke<()>`.
pub trait Invoke<Args> {
   /// Value produced by the delegate.
   type Output;

   /// Consumes the delegate, calling it with the unpacked `args`.
   fn invoke(self, args: Args) -> Self::Output;
}

/// A callable that can be consumed with an explicit receiver followed by the
/// argument tuple `Args`.
///
/// The receiver is forwarded unchanged as the first parameter, which is how a
/// method-like delegate observes the object it was called "on".
pub trait InvokeOn<Recv, Args> {
   /// Value produced by the delegate.
   type Output;

   /// Consumes the delegate, calling it with `receiver` and the unpacked `args`.
   fn invoke_on(self, receiver: Recv, args: Args) -> Self::Output;
}

macro_rules! impl_invoke {
   ($($arg:ident),*) => {
      impl<Func, Out, $($arg,)*> Invoke<($($arg,)*)> for Func
      where
         Func: FnOnce($($arg),*) -> Out,
      {
         type Output = Out;

         #[inline(always)]
         #[allow(non_snake_case, clippy::unused_unit)]
         fn invoke(self, ($($arg,)*): ($($arg,)*)) -> Out {
            self($($arg),*)
         }
      }

      impl<Func, Out, Recv, $($arg,)*> InvokeOn<Recv, ($($arg,)*)> for Func
      where
         Func: FnOnce(Recv, $($arg),*) -> Out,
      {
         type Output = Out;

         #[inline(always)]
         #[allow(non_snake_case, clippy::unused_unit)]
         fn invoke_on(self, receiver: Recv, ($($arg,)*): ($($arg,)*)) -> Out {
            self(receiver, $($arg),*)
         }
      }
   };
}

impl_invoke!();
impl_invoke!(A1);
impl_invoke!(A1, A2);
impl_invoke!(A1, A2, A3);
impl_invoke!(A1, A2, A3, A4);
impl_invoke!(A1, A2, A3, A4, A5);
impl_invoke!(A1, A2, A3, A4, A5, A6);
impl_invoke!(A1, A2, A3, A4, A5, A6, A7);
impl_invoke!(A1, A2, A3, A4, A5, A6, A7, A8);

#[cfg(test)]
mod tests {
   use super::{Invoke, InvokeOn};

   #[test]
   fn forwards_tuple_arguments_in_order() {
      let concat = |a: &str, b: &str, c: &str| format!("{a}{b}{c}");
      assert_eq!(concat.invoke(("x", "y", "z")), "xyz");
   }

   #[test]
   fn zero_arity_takes_unit() {
      let answer = || 42;
      assert_eq!(answer.invoke(()), 42);
   }

   #[test]
   fn receiver_becomes_first_parameter() {
      let mut log = Vec::new();
      let push = |log: &mut Vec<u8>, a: u8, b: u8| {
         log.push(a);
         log.push(b);
         log.len()
      };
      assert_eq!(push.invoke_on(&mut log, (1, 2)), 2);
      assert_eq!(log, [1, 2]);
   }
}
