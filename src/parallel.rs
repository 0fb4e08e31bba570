use crossbeam_channel::{SendError, Sender, bounded};
use std::thread;

/// The sending side of a worker pool started by [`run_pool`].
pub struct WorkPool<T: Send + 'static> {
    tx: Sender<T>,
}

/// Run `work_fn` on `thread_count` scoped threads, feeding them whatever
/// `body_fn` sends into the pool. Returns once all sent work is done.
pub fn run_pool<'env, T, W, B>(thread_count: usize, chan_size: usize, work_fn: W, body_fn: B)
where
    T: Send + 'static,
    W: Fn(T) + Send + Clone + 'env,
    B: FnOnce(WorkPool<T>) + 'env,
{
    thread::scope(|s| {
        let (tx, rx) = bounded(chan_size);

        for _ in 0..thread_count.max(1) {
            let thread_rx = rx.clone();
            let thread_work = work_fn.clone();
            s.spawn(move || {
                while let Ok(val) = thread_rx.recv() {
                    thread_work(val);
                }
            });
        }

        // Dropping the pool closes the channel, which lets the workers exit.
        body_fn(WorkPool { tx });
    });
}

impl<T: Send + 'static> WorkPool<T> {
    pub fn send(&self, value: T) -> Result<(), SendError<T>> {
        self.tx.send(value)
    }
}

/// A default thread count: one per available core.
pub fn default_threads() -> usize {
    thread::available_parallelism().map_or(1, |n| n.get())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn every_item_is_processed() {
        let seen = Mutex::new(Vec::new());
        run_pool(
            4,
            2,
            |slug: String| seen.lock().unwrap().push(slug.to_uppercase()),
            |pool| {
                for slug in ["a", "b", "c", "d", "e"] {
                    pool.send(slug.to_string()).unwrap();
                }
            },
        );

        let mut seen = seen.into_inner().unwrap();
        seen.sort();
        assert_eq!(seen, ["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn zero_threads_still_runs() {
        let count = Mutex::new(0);
        run_pool(
            0,
            1,
            |n: u32| *count.lock().unwrap() += n,
            |pool| {
                pool.send(2).unwrap();
                pool.send(3).unwrap();
            },
        );
        assert_eq!(*count.lock().unwrap(), 5);
    }
}
