use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

// Increment counter by one until this StreamCounter is dropped
pub struct StreamCounter {
    counter: Arc<AtomicU64>,
}

impl StreamCounter {
    pub fn new(counter: Arc<AtomicU64>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);

        StreamCounter { counter }
    }
}

impl Drop for StreamCounter {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_live_guards() {
        let counter = Arc::new(AtomicU64::new(0));
        let a = StreamCounter::new(counter.clone());
        let b = StreamCounter::new(counter.clone());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        drop(a);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        drop(b);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
