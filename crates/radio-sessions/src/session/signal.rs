use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

/// Single-slot wake-up flag. Stays set until cleared, so a skip that
/// arrives while the track is still downloading ends its play window
/// right away.
#[derive(Default)]
pub(crate) struct SkipSignal {
    is_set: AtomicBool,
    notify: Notify,
}

impl SkipSignal {
    pub(crate) fn set(&self) {
        self.is_set.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub(crate) fn clear(&self) {
        self.is_set.store(false, Ordering::SeqCst);
    }

    pub(crate) fn is_set(&self) -> bool {
        self.is_set.load(Ordering::SeqCst)
    }

    pub(crate) async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking the flag so a concurrent `set` is not lost.
            notified.as_mut().enable();

            if self.is_set() {
                return;
            }

            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SkipSignal;
    use std::sync::Arc;
    use std::time::Duration;

    #[actix_rt::test]
    async fn should_return_immediately_when_already_set() {
        let signal = SkipSignal::default();
        signal.set();

        tokio::time::timeout(Duration::from_millis(100), signal.wait())
            .await
            .expect("wait should return");
    }

    #[actix_rt::test]
    async fn should_wake_waiter_when_set() {
        let signal = Arc::new(SkipSignal::default());

        let waiter = actix_rt::spawn({
            let signal = Arc::clone(&signal);
            async move { signal.wait().await }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        signal.set();

        tokio::time::timeout(Duration::from_millis(200), waiter)
            .await
            .expect("waiter should wake up")
            .unwrap();
    }

    #[actix_rt::test]
    async fn should_block_again_after_clear() {
        let signal = SkipSignal::default();
        signal.set();
        signal.clear();

        let result = tokio::time::timeout(Duration::from_millis(50), signal.wait()).await;

        assert!(result.is_err());
    }
}
