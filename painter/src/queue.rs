use crate::paint::ContextState;
use crate::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillRule {
  NonZero,
  EvenOdd,
}

impl Default for FillRule {
  fn default() -> Self { FillRule::NonZero }
}

/// What kind of geometry an entry contributes once drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOp {
  Fill(FillRule),
  Stroke,
  TextFill,
  TextStroke,
}

/// One queued draw call: a path snapshot plus the state it was drawn with.
/// Both are cloned at `push` time so later mutation of the live path/state
/// through the context can never retroactively change an already-queued
/// entry.
#[derive(Debug, Clone)]
pub struct RenderQueueEntry {
  pub op: DrawOp,
  pub path: Path,
  pub state: ContextState,
}

/// The per-frame buffered draw list (SPEC_FULL.md §4.E). Entries preserve
/// insertion order: draw order must equal call order, so nothing here may
/// reorder or deduplicate across `push` calls.
#[derive(Debug, Clone, Default)]
pub struct RenderQueue {
  entries: Vec<RenderQueueEntry>,
}

impl RenderQueue {
  pub fn new() -> Self { Self::default() }

  pub fn push(&mut self, op: DrawOp, path: Path, state: ContextState) {
    self.entries.push(RenderQueueEntry { op, path, state });
  }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  pub fn len(&self) -> usize { self.entries.len() }

  /// Removes and returns every queued entry, in insertion order, leaving
  /// the queue empty for the next frame.
  pub fn drain(&mut self) -> Vec<RenderQueueEntry> { std::mem::take(&mut self.entries) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn drain_preserves_insertion_order() {
    let mut queue = RenderQueue::new();
    for i in 0..5 {
      let mut path = Path::new();
      path.move_to(i as f32, 0.0);
      queue.push(DrawOp::Fill(FillRule::NonZero), path, ContextState::default());
    }
    let drained = queue.drain();
    let xs: Vec<f32> = drained
      .iter()
      .map(|e| match e.path.commands()[0] {
        crate::path::PathCommand::MoveTo { x, .. } => x,
        _ => unreachable!(),
      })
      .collect();
    assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
  }

  #[test]
  fn drain_empties_the_queue() {
    let mut queue = RenderQueue::new();
    queue.push(DrawOp::Stroke, Path::new(), ContextState::default());
    assert_eq!(queue.drain().len(), 1);
    assert!(queue.is_empty());
  }

  #[test]
  fn empty_path_queued_still_preserved_as_an_entry() {
    let mut queue = RenderQueue::new();
    queue.push(DrawOp::Fill(FillRule::NonZero), Path::new(), ContextState::default());
    assert_eq!(queue.len(), 1);
  }
}
