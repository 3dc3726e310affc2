use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::io::domain::publisher::Publisher;

/// In-process topic with a depth-one queue: a slow subscriber sees the
/// latest message, never a backlog. Mirrors the transport's bounded
/// upstream queue.
pub struct ChannelPublisher<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
}

/// Creates a connected publisher/subscriber pair.
pub fn topic<T: Send>() -> (ChannelPublisher<T>, Receiver<T>) {
    let (tx, rx) = crossbeam_channel::bounded(1);
    (
        ChannelPublisher {
            tx,
            rx: rx.clone(),
        },
        rx,
    )
}

impl<T: Send> Publisher<T> for ChannelPublisher<T> {
    fn publish(&self, msg: T) {
        match self.tx.try_send(msg) {
            Ok(()) => {}
            Err(TrySendError::Full(msg)) => {
                // Latest wins: evict the stale message and retry once.
                let _ = self.rx.try_recv();
                let _ = self.tx.try_send(msg);
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}
