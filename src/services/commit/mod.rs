// Commit module
// Persists moved occurrences on worker threads and reports the outcome per ticket

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::models::occurrence::OccurrencePatch;
use crate::services::bridge::{BridgeError, CalendarBridge};

pub type CommitTicket = u64;

#[derive(Debug, Clone, PartialEq)]
pub struct CommitOutcome {
    pub ticket: CommitTicket,
    pub occurrence_id: String,
    pub result: Result<(), BridgeError>,
}

struct InFlight {
    ticket: CommitTicket,
    occurrence_id: String,
    deadline: Instant,
}

/// Fire-and-forget persistence of moves.
///
/// Each submit runs the bridge call on its own thread. Results are collected by
/// [`poll`](Self::poll), which also expires calls that outlive the timeout. A
/// late answer for an expired ticket is dropped.
pub struct CommitQueue {
    tx: Sender<(CommitTicket, Result<(), BridgeError>)>,
    rx: Receiver<(CommitTicket, Result<(), BridgeError>)>,
    in_flight: Vec<InFlight>,
    next_ticket: CommitTicket,
    timeout: Duration,
}

impl CommitQueue {
    pub fn new(timeout: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            in_flight: Vec::new(),
            next_ticket: 1,
            timeout,
        }
    }

    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    pub fn submit(
        &mut self,
        bridge: Arc<dyn CalendarBridge>,
        occurrence_id: &str,
        patch: OccurrencePatch,
        now: Instant,
    ) -> CommitTicket {
        let ticket = self.next_ticket;
        self.next_ticket += 1;

        self.in_flight.push(InFlight {
            ticket,
            occurrence_id: occurrence_id.to_string(),
            deadline: now + self.timeout,
        });

        let tx = self.tx.clone();
        let id = occurrence_id.to_string();
        thread::spawn(move || {
            let result = bridge.update_occurrence(&id, &patch);
            // Receiver gone means the screen was closed; nothing left to roll back
            let _ = tx.send((ticket, result));
        });

        log::debug!("Submitted commit {} for occurrence '{}'", ticket, occurrence_id);
        ticket
    }

    /// Collect finished and expired commits without blocking.
    pub fn poll(&mut self, now: Instant) -> Vec<CommitOutcome> {
        let mut outcomes = Vec::new();

        loop {
            match self.rx.try_recv() {
                Ok((ticket, result)) => {
                    if let Some(outcome) = self.finish(ticket, result) {
                        outcomes.push(outcome);
                    }
                }
                Err(TryRecvError::Empty) => break,
                // The queue holds a sender itself, so this cannot happen while it lives
                Err(TryRecvError::Disconnected) => break,
            }
        }

        let (expired, alive): (Vec<InFlight>, Vec<InFlight>) = std::mem::take(&mut self.in_flight)
            .into_iter()
            .partition(|commit| commit.deadline <= now);
        self.in_flight = alive;

        for commit in expired {
            log::warn!(
                "Commit {} for occurrence '{}' timed out",
                commit.ticket,
                commit.occurrence_id
            );
            outcomes.push(CommitOutcome {
                ticket: commit.ticket,
                occurrence_id: commit.occurrence_id,
                result: Err(BridgeError::Timeout),
            });
        }

        outcomes
    }

    /// Block until every in-flight commit has answered or `limit` elapses.
    pub fn drain_blocking(&mut self, limit: Duration) -> Vec<CommitOutcome> {
        let give_up = Instant::now() + limit;
        let mut outcomes = Vec::new();

        while !self.in_flight.is_empty() {
            let now = Instant::now();
            if now >= give_up {
                break;
            }
            match self.rx.recv_timeout(give_up - now) {
                Ok((ticket, result)) => {
                    if let Some(outcome) = self.finish(ticket, result) {
                        outcomes.push(outcome);
                    }
                }
                Err(_) => break,
            }
        }

        outcomes
    }

    fn finish(
        &mut self,
        ticket: CommitTicket,
        result: Result<(), BridgeError>,
    ) -> Option<CommitOutcome> {
        let index = self.in_flight.iter().position(|commit| commit.ticket == ticket)?;
        let commit = self.in_flight.remove(index);
        Some(CommitOutcome {
            ticket,
            occurrence_id: commit.occurrence_id,
            result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::bridge::MockCalendarBridge;
    use std::sync::{Condvar, Mutex};

    #[test]
    fn test_successful_commit_is_reported() {
        let mut bridge = MockCalendarBridge::new();
        bridge
            .expect_update_occurrence()
            .times(1)
            .returning(|_, _| Ok(()));

        let mut queue = CommitQueue::new(Duration::from_secs(5));
        let ticket = queue.submit(
            Arc::new(bridge),
            "a",
            OccurrencePatch::default(),
            Instant::now(),
        );

        let outcomes = queue.drain_blocking(Duration::from_secs(5));
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].ticket, ticket);
        assert_eq!(outcomes[0].occurrence_id, "a");
        assert_eq!(outcomes[0].result, Ok(()));
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_rejected_commit_is_reported() {
        let mut bridge = MockCalendarBridge::new();
        bridge
            .expect_update_occurrence()
            .returning(|_, _| Err(BridgeError::Rejected("conflict".to_string())));

        let mut queue = CommitQueue::new(Duration::from_secs(5));
        queue.submit(Arc::new(bridge), "a", OccurrencePatch::default(), Instant::now());

        let outcomes = queue.drain_blocking(Duration::from_secs(5));
        assert!(matches!(outcomes[0].result, Err(BridgeError::Rejected(_))));
    }

    #[test]
    fn test_slow_commit_times_out_once() {
        let gate = Arc::new((Mutex::new(false), Condvar::new()));
        let worker_gate = Arc::clone(&gate);

        let mut bridge = MockCalendarBridge::new();
        bridge.expect_update_occurrence().returning(move |_, _| {
            let (lock, cvar) = &*worker_gate;
            let mut open = lock.lock().unwrap();
            while !*open {
                open = cvar.wait(open).unwrap();
            }
            Ok(())
        });

        let start = Instant::now();
        let mut queue = CommitQueue::new(Duration::from_millis(100));
        queue.submit(Arc::new(bridge), "a", OccurrencePatch::default(), start);

        assert!(queue.poll(start).is_empty());
        let expired = queue.poll(start + Duration::from_millis(150));
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].result, Err(BridgeError::Timeout));

        // Release the worker; its late answer must not produce a second outcome
        {
            let (lock, cvar) = &*gate;
            *lock.lock().unwrap() = true;
            cvar.notify_all();
        }
        thread::sleep(Duration::from_millis(50));
        assert!(queue.poll(start + Duration::from_secs(1)).is_empty());
    }
}
