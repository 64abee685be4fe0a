use std::sync::Arc;

use fire_once::once;
use tokio::time::{sleep, Duration};

#[tokio::main]
async fn main() {
   let shutdown = Arc::new(once(|reason: String| async move {
      // Teardown runs only once no matter how many tasks request it
      println!("Shutting down: {}", reason);
      sleep(Duration::from_millis(50)).await;
   }));

   let tasks: Vec<_> = ["signal", "error", "timeout"]
      .into_iter()
      .map(|reason| {
         let shutdown = Arc::clone(&shutdown);
         tokio::spawn(async move {
            if shutdown.call_async((reason.to_string(),)).await.is_none() {
               shutdown.wait_async().await;
               println!("Teardown already handled, {} ignored", reason);
            }
         })
      })
      .collect();

   for t in tasks {
      t.await.unwrap();
   }

   assert!(shutdown.is_done());
}
