use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use fire_once::once;

static COUNTER: AtomicUsize = AtomicUsize::new(0);

fn main() {
   let announce = Arc::new(once(|thread_id: usize| {
      // This closure runs only once
      COUNTER.fetch_add(1, Ordering::Relaxed);
      println!("Thread {} won the race", thread_id);
      std::thread::sleep(std::time::Duration::from_millis(50));
   }));

   let threads: Vec<_> = (0..5)
      .map(|id| {
         let announce = Arc::clone(&announce);
         std::thread::spawn(move || {
            if announce.call((id,)).is_none() {
               // Losers can still wait for the winner to finish
               announce.wait();
               println!("Thread {} skipped", id);
            }
         })
      })
      .collect();

   for t in threads {
      t.join().unwrap();
   }

   assert!(announce.is_done());
   assert_eq!(COUNTER.load(Ordering::Relaxed), 1); // Delegate ran only once
}
