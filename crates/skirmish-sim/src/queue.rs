//! Frame-ordered command queue.
//!
//! Commands may arrive out of order. They are kept in a total order of
//! `(frame, arrival sequence)` and handed out once their frame is due.
//! Commands for a frame that has already been drained are rejected: there is
//! no rollback.

use std::collections::BTreeMap;

use thiserror::Error;

use skirmish_core::commands::Command;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("command for frame {frame} arrived after frame {drained} was stepped")]
    StaleFrame { frame: u64, drained: u64 },
}

#[derive(Debug, Default, Clone)]
pub struct CommandQueue {
    pending: BTreeMap<(u64, u64), Command>,
    next_seq: u64,
    last_drained: Option<u64>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, command: Command) -> Result<(), QueueError> {
        if let Some(drained) = self.last_drained {
            if command.frame <= drained {
                return Err(QueueError::StaleFrame {
                    frame: command.frame,
                    drained,
                });
            }
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.insert((command.frame, seq), command);
        Ok(())
    }

    /// Remove and return every command with `frame <= frame`, in total order.
    pub fn drain_up_to(&mut self, frame: u64) -> Vec<Command> {
        let later = match frame.checked_add(1) {
            Some(next) => self.pending.split_off(&(next, 0)),
            None => BTreeMap::new(),
        };
        let due = std::mem::replace(&mut self.pending, later);
        self.last_drained = Some(self.last_drained.map_or(frame, |d| d.max(frame)));
        due.into_values().collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Highest frame drained so far.
    pub fn last_drained(&self) -> Option<u64> {
        self.last_drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::commands::CommandKind;

    fn rotate(frame: u64, player: u8, target: f32) -> Command {
        Command::new(frame, player, CommandKind::Rotate { target })
    }

    #[test]
    fn test_drain_orders_by_frame_then_arrival() {
        let mut queue = CommandQueue::new();
        queue.enqueue(rotate(5, 0, 1.0)).unwrap();
        queue.enqueue(rotate(3, 1, 2.0)).unwrap();
        queue.enqueue(rotate(5, 2, 3.0)).unwrap();
        queue.enqueue(rotate(3, 0, 4.0)).unwrap();
        queue.enqueue(rotate(9, 0, 5.0)).unwrap();

        let drained = queue.drain_up_to(5);
        let order: Vec<(u64, u8)> = drained.iter().map(|c| (c.frame, c.player)).collect();
        assert_eq!(order, vec![(3, 1), (3, 0), (5, 0), (5, 2)]);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_stale_frame_rejected() {
        let mut queue = CommandQueue::new();
        assert!(queue.drain_up_to(10).is_empty());
        assert_eq!(
            queue.enqueue(rotate(10, 0, 0.0)),
            Err(QueueError::StaleFrame {
                frame: 10,
                drained: 10
            })
        );
        assert!(queue.enqueue(rotate(11, 0, 0.0)).is_ok());
        assert!(!queue.is_empty());
    }

    #[test]
    fn test_drain_at_max_frame() {
        let mut queue = CommandQueue::new();
        queue.enqueue(rotate(u64::MAX, 0, 0.0)).unwrap();
        assert_eq!(queue.drain_up_to(u64::MAX).len(), 1);
    }
}
