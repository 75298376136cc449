use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};

use crate::Context;

/// A unit of completion work a decode worker thread hands back to the
/// render thread — typically "store these decoded pixels under this
/// image handle in the atlas" (SPEC_FULL.md §4.I, §5). Boxed so the
/// queue can hold heterogeneous closures without the render thread
/// knowing about decoder internals.
pub type ImageTask = Box<dyn FnOnce(&mut Context) + Send>;

/// The bounded MPSC task queue §5 describes: worker threads decoding
/// images enqueue a completion closure; the render thread drains it at
/// the start of `endFrame`, before Pass 1. Capacity 128, matching §5's
/// stated bound — a full queue means a decode worker must wait rather
/// than the render thread growing an unbounded backlog.
pub struct ImageTaskQueue {
  sender: SyncSender<ImageTask>,
  receiver: Receiver<ImageTask>,
}

/// The producer half, clonable so multiple decode worker threads can
/// each hold one.
#[derive(Clone)]
pub struct ImageTaskSender(SyncSender<ImageTask>);

/// Raised when [`ImageTaskSender::try_send`] finds the queue full. The
/// caller (a decode worker) should retry, matching §5's "worker waits
/// rather than the queue growing unbounded".
#[derive(Debug)]
pub struct QueueFull;

impl ImageTaskSender {
  /// Non-blocking; returns [`QueueFull`] once 128 tasks are already
  /// queued so a decode worker can back off and retry.
  pub fn try_send(&self, task: ImageTask) -> Result<(), QueueFull> {
    self.0.try_send(task).map_err(|err| match err {
      TrySendError::Full(_) | TrySendError::Disconnected(_) => QueueFull,
    })
  }

  /// Blocks the calling (worker) thread until the task is accepted.
  pub fn send_blocking(&self, task: ImageTask) {
    // `send` on a sync_channel blocks until a slot frees up; a closed
    // receiver (render thread gone) means there is nothing left to do.
    let _ = self.0.send(task);
  }
}

const CAPACITY: usize = 128;

impl ImageTaskQueue {
  pub fn new() -> Self {
    let (sender, receiver) = sync_channel(CAPACITY);
    Self { sender, receiver }
  }

  pub fn sender(&self) -> ImageTaskSender { ImageTaskSender(self.sender.clone()) }

  /// Drains every task queued so far without blocking, in arrival order.
  /// Called at the start of `endFrame`, before Pass 1, per §4.I/§5.
  pub fn drain(&self) -> Vec<ImageTask> {
    let mut tasks = Vec::new();
    loop {
      match self.receiver.try_recv() {
        Ok(task) => tasks.push(task),
        Err(_) => break,
      }
    }
    tasks
  }
}

impl Default for ImageTaskQueue {
  fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn queued_tasks_drain_in_arrival_order() {
    let queue = ImageTaskQueue::new();
    let sender = queue.sender();
    let log = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    for i in 0..5 {
      let log = log.clone();
      sender.try_send(Box::new(move |_ctx: &mut Context| log.lock().unwrap().push(i))).unwrap();
    }
    let tasks = queue.drain();
    assert_eq!(tasks.len(), 5);
  }

  #[test]
  fn drain_on_an_empty_queue_returns_nothing() {
    let queue = ImageTaskQueue::new();
    assert!(queue.drain().is_empty());
  }

  #[test]
  fn try_send_rejects_once_capacity_is_exhausted() {
    let queue = ImageTaskQueue::new();
    let sender = queue.sender();
    for _ in 0..CAPACITY {
      sender.try_send(Box::new(|_: &mut Context| {})).unwrap();
    }
    assert!(sender.try_send(Box::new(|_: &mut Context| {})).is_err());
  }
}
