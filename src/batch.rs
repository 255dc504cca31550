use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};

/// Largest number of items committed in one transaction.
pub const MAX_BATCH_SIZE: usize = 50;
/// Longest an item waits in a partial batch.
pub const MAX_BATCH_LATENCY: Duration = Duration::from_secs(2);

enum Event<T> {
    Item(T),
    Expired,
    Closed,
}

/// Groups a stream of items into ordered batches.
///
/// A batch is emitted when it reaches `max_size`, when `max_latency` has
/// elapsed since its first item was buffered, or when the input closes.
/// Every item lands in exactly one batch, in arrival order.
pub fn batch<T: Send + 'static>(
    input: mpsc::Receiver<T>,
    max_size: usize,
    max_latency: Duration,
) -> mpsc::Receiver<Vec<T>> {
    let max_size = max_size.max(1);
    let (tx, rx) = mpsc::channel(1);

    tokio::spawn(async move {
        let mut input = input;
        let mut buffer: Vec<T> = Vec::with_capacity(max_size);
        let mut deadline: Option<Instant> = None;

        loop {
            let event = match deadline {
                Some(at) => tokio::select! {
                    biased;
                    item = input.recv() => item.map_or(Event::Closed, Event::Item),
                    _ = time::sleep_until(at) => Event::Expired,
                },
                None => input.recv().await.map_or(Event::Closed, Event::Item),
            };

            match event {
                Event::Item(item) => {
                    if buffer.is_empty() {
                        deadline = Some(Instant::now() + max_latency);
                    }
                    buffer.push(item);
                    if buffer.len() < max_size {
                        continue;
                    }
                    log::trace!("[batch] flush: reason=size len={}", buffer.len());
                }
                Event::Expired => {
                    log::trace!("[batch] flush: reason=latency len={}", buffer.len());
                }
                Event::Closed => {
                    if !buffer.is_empty() {
                        log::trace!("[batch] flush: reason=closed len={}", buffer.len());
                        let _ = tx.send(buffer).await;
                    }
                    break;
                }
            }

            deadline = None;
            let full = std::mem::replace(&mut buffer, Vec::with_capacity(max_size));
            if tx.send(full).await.is_err() {
                log::debug!("[batch] receiver_dropped: stopping");
                break;
            }
        }
    });

    rx
}
