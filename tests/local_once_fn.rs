use std::cell::{Cell, OnceCell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::time::Duration;

use fire_once::{once_local, FireError, LocalOnceFn, Phase};

struct DropCounter(Rc<Cell<usize>>);

impl Drop for DropCounter {
   fn drop(&mut self) {
      self.0.set(self.0.get() + 1);
   }
}

#[test]
fn test_new_is_armed() {
   let w = once_local(|| ());
   assert_eq!(w.phase(), Phase::Armed);
   assert!(!w.is_fired());
}

#[test]
fn test_log_scenario() {
   let log = RefCell::new(Vec::new());
   let w = once_local(|| {
      log.borrow_mut().push("x");
      42
   });

   assert_eq!(w.call(()), Some(42));
   assert_eq!(w.call(()), None);
   assert_eq!(*log.borrow(), ["x"]);
}

#[test]
fn test_sum_scenario() {
   let add = once_local(|a: i64, b: i64| a + b);
   assert_eq!(add.call((2, 3)), Some(5));
   assert_eq!(add.call((10, 20)), None);
}

#[test]
fn test_receiver_forwarded() {
   struct Widget {
      clicks: u32,
   }

   let on_click = once_local(|w: &mut Widget| {
      w.clicks += 1;
   });
   let mut widget = Widget { clicks: 0 };
   for _ in 0..3 {
      on_click.call_on(&mut widget, ());
   }
   assert_eq!(widget.clicks, 1);
}

#[test]
fn test_instances_are_independent() {
   let count = Cell::new(0);
   let bump = || count.set(count.get() + 1);
   let a = once_local(bump);
   let b = once_local(bump);

   a.call(());
   a.call(());
   assert_eq!(count.get(), 1);
   b.call(());
   assert_eq!(count.get(), 2);
}

#[test]
fn test_panic_is_not_retried() {
   let count = Cell::new(0);
   let w = once_local(|| {
      count.set(count.get() + 1);
      panic!("delegate failure");
   });

   assert!(panic::catch_unwind(AssertUnwindSafe(|| w.call(()))).is_err());
   assert_eq!(w.phase(), Phase::Poisoned);
   assert_eq!(w.call(()), None);
   assert_eq!(w.try_call(()), Err(FireError::Poisoned));
   assert_eq!(count.get(), 1);
}

#[test]
fn test_err_result_consumes_invocation() {
   let count = Cell::new(0);
   let w = once_local(|| {
      count.set(count.get() + 1);
      Err::<(), _>("init error")
   });

   assert_eq!(w.call(()), Some(Err("init error")));
   assert_eq!(w.call(()), None); // No retry, no error
   assert_eq!(count.get(), 1);
   assert_eq!(w.phase(), Phase::Done);
}

#[test]
fn test_drop_unfired_drops_delegate() {
   let drops = Rc::new(Cell::new(0));
   {
      let guard = DropCounter(Rc::clone(&drops));
      let _w = once_local(move || drop(guard));
      assert_eq!(drops.get(), 0);
   }
   assert_eq!(drops.get(), 1);
}

#[test]
fn test_no_double_drop_after_fire() {
   let drops = Rc::new(Cell::new(0));
   {
      let guard = DropCounter(Rc::clone(&drops));
      let w = once_local(move || {
         let _guard = &guard;
      });
      w.call(());
      assert_eq!(drops.get(), 1);
   }
   assert_eq!(drops.get(), 1);
}

/// Runs a teardown closure from `Drop`.
struct TeardownOnDrop<'a, F: Fn()> {
   teardown: &'a F,
}

impl<F: Fn()> Drop for TeardownOnDrop<'_, F> {
   fn drop(&mut self) {
      (self.teardown)();
   }
}

#[test]
fn test_teardown_during_unrelated_unwind_is_done() {
   let called = once_local(|| 5);
   let defused = once_local(|| ());
   let result = Cell::new(None);
   let disarmed = Cell::new(false);
   let teardown = || {
      result.set(Some(called.call(())));
      disarmed.set(defused.defuse());
   };

   let unwound = panic::catch_unwind(AssertUnwindSafe(|| {
      let _hook = TeardownOnDrop { teardown: &teardown };
      panic!("unrelated");
   }));
   assert!(unwound.is_err());

   assert_eq!(result.get(), Some(Some(5)));
   assert!(disarmed.get());
   assert_eq!(called.phase(), Phase::Done);
   assert_eq!(called.try_call(()), Err(FireError::AlreadyFired));
   assert_eq!(defused.phase(), Phase::Done);
}

#[tokio::test]
async fn test_dropped_async_call_is_poisoned() {
   let w = once_local(|| std::future::pending::<()>());
   {
      let fut = w.call_async(());
      let _ = tokio::time::timeout(Duration::from_millis(10), fut).await;
   }
   assert_eq!(w.phase(), Phase::Poisoned);
   assert_eq!(w.call_async(()).await, None);
   assert_eq!(w.try_call(()).map(|_| ()), Err(FireError::Poisoned));
}

#[test]
fn test_try_call() {
   let w = once_local(|s: &str| s.len());
   assert_eq!(w.try_call(("abc",)), Ok(3));
   assert_eq!(w.try_call(("abcd",)), Err(FireError::AlreadyFired));

   let m = once_local(|v: &mut Vec<char>, c: char| v.push(c));
   let mut v = Vec::new();
   assert_eq!(m.try_call_on(&mut v, ('a',)), Ok(()));
   assert_eq!(m.try_call_on(&mut v, ('b',)), Err(FireError::AlreadyFired));
   assert_eq!(v, ['a']);
}

#[test]
fn test_reentrant_call_is_suppressed() {
   let slot: Rc<OnceCell<LocalOnceFn<Box<dyn FnOnce() -> &'static str>>>> =
      Rc::new(OnceCell::new());
   let inner = Rc::new(Cell::new(None));

   let delegate: Box<dyn FnOnce() -> &'static str> = Box::new({
      let slot = Rc::clone(&slot);
      let inner = Rc::clone(&inner);
      move || {
         let wrapper = slot.get().unwrap();
         assert_eq!(wrapper.phase(), Phase::Running);
         inner.set(Some(wrapper.call(())));
         "outer"
      }
   });
   assert!(slot.set(once_local(delegate)).is_ok());

   assert_eq!(slot.get().unwrap().call(()), Some("outer"));
   assert_eq!(inner.get(), Some(None));
}

#[test]
fn test_defuse_and_into_inner() {
   let w = once_local(|| panic!("Should not be called"));
   assert!(w.defuse());
   assert!(!w.defuse());
   assert_eq!(w.call(()), None);
   assert!(w.into_inner().is_none());

   let w = once_local(|x: u8| x);
   let f = w.into_inner().expect("never fired");
   assert_eq!(f(3), 3);
}

#[test]
fn test_debug() {
   let w = LocalOnceFn::from(|| ());
   assert!(format!("{:?}", w).contains("Armed"));
   w.call(());
   assert!(format!("{:?}", w).contains("Done"));
}

#[tokio::test]
async fn test_call_async() {
   let w = once_local(|n: u32| async move { n + 1 });
   assert_eq!(w.call_async((1,)).await, Some(2));
   assert_eq!(w.call_async((1,)).await, None);
   assert!(w.is_done());
}
