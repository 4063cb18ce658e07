use tokio::sync::{Mutex, MutexGuard};

/// Serializes mutations against one store instance.
///
/// Slots are granted in request order (tokio's mutex is fair), and a slot is
/// released when its guard drops, so a failed or panicking task never stalls
/// the tasks queued behind it.
///
/// Scope is this instance only. Another process, or another store pointed
/// at the same root, is not coordinated and can race.
#[derive(Debug, Default)]
pub struct WriteQueue {
    tail: Mutex<()>,
}

/// Exclusive write slot; released on drop.
#[derive(Debug)]
pub struct WriteSlot<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl WriteQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for every earlier write, then hold the slot.
    pub async fn acquire(&self) -> WriteSlot<'_> {
        WriteSlot {
            _guard: self.tail.lock().await,
        }
    }

    /// Wait until every write requested before this call has finished.
    pub async fn settled(&self) {
        drop(self.tail.lock().await);
    }
}
