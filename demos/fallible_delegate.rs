use fire_once::{once, FireError};

fn main() {
   let connect = once(|fail: bool| {
      println!("Attempting connection (fail={})...", fail);
      if fail {
         Err("Connection refused")
      } else {
         Ok("Connected")
      }
   });

   // The first attempt fails and consumes the only invocation
   match connect.call((true,)) {
      Some(Err(e)) => println!("Caught error: {}", e),
      other => panic!("Should have failed, got {:?}", other),
   }

   // No retry: later calls are silent, even with different arguments
   assert_eq!(connect.call((false,)), None);
   assert_eq!(connect.try_call((false,)), Err(FireError::AlreadyFired));
   println!("Second attempt was suppressed");
}
