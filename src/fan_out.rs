use std::thread;

use parking_lot::Mutex;

struct Queue {
    next: usize,
    stopped: bool,
}

/// Apply `f` to every item on at most `limit` threads, keeping the results in input order.
///
/// Once any call fails no new calls are started, and an error is returned.
pub fn try_map_bounded<T, R, E, F>(items: &[T], limit: usize, f: F) -> Result<Vec<R>, E>
where
    T: Sync,
    R: Send,
    E: Send,
    F: Fn(&T) -> Result<R, E> + Sync,
{
    let workers = limit.min(items.len());
    if workers <= 1 {
        return items.iter().map(f).collect();
    }

    let queue = Mutex::new(Queue {
        next: 0,
        stopped: false,
    });
    let results = Mutex::new(
        std::iter::repeat_with(|| None)
            .take(items.len())
            .collect::<Vec<Option<Result<R, E>>>>(),
    );

    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                let index = {
                    let mut queue = queue.lock();
                    if queue.stopped || queue.next >= items.len() {
                        break;
                    }
                    queue.next += 1;
                    queue.next - 1
                };

                let result = f(&items[index]);
                let failed = result.is_err();
                results.lock()[index] = Some(result);
                if failed {
                    queue.lock().stopped = true;
                }
            });
        }
    });

    // Slots are only left empty after a failure, which is itself in the list.
    results.into_inner().into_iter().flatten().collect()
}
