//! Isolated execution context for evaluator calls.
//!
//! A [`SearchWorker`] owns one OS thread running an [`Evaluator`]. The caller
//! and the thread share nothing but two channels: requests (bitboards and a
//! depth) go in, cell indices come out. Calls are strictly sequential.
//!
//! Threads cannot be killed, so termination is cooperative: [`terminate`]
//! raises the evaluator's [`CancelToken`] and drops the request channel. The
//! thread finishes (or abandons) its current evaluation, notices the closed
//! channel and exits. Any answer it still produces goes nowhere.
//!
//! [`terminate`]: SearchWorker::terminate

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, select, unbounded};
use log::{debug, trace};
use thiserror::Error;

use crate::bitboard::{Bitboard, decode};
use crate::board::Move;
use crate::engine::{CancelToken, Evaluator};

/// Failures of a worker call.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("search worker has been terminated")]
    Terminated,
    #[error("search worker stopped responding")]
    Disconnected,
    #[error("evaluator found no move at depth {0}")]
    NoMove(u32),
    #[error("evaluator answered cell index {0}, which is off the board")]
    OutOfRange(u8),
    #[error("failed to start search worker: {0}")]
    Spawn(#[from] std::io::Error),
}

struct Request {
    seq: u64,
    board: Bitboard,
    depth: u32,
}

struct Reply {
    seq: u64,
    depth: u32,
    answer: Option<u8>,
}

/// Handle to a running evaluator thread.
///
/// Dropping the handle terminates the worker.
pub struct SearchWorker {
    requests: Option<Sender<Request>>,
    replies: Receiver<Reply>,
    cancel: CancelToken,
    seq: u64,
}

impl SearchWorker {
    /// Start a worker thread serving `evaluator`.
    pub fn spawn(evaluator: Arc<dyn Evaluator>) -> Result<Self, WorkerError> {
        let (request_tx, request_rx) = unbounded::<Request>();
        let (reply_tx, reply_rx) = unbounded::<Reply>();
        let cancel = CancelToken::new();

        let token = cancel.clone();
        thread::Builder::new()
            .name("search-worker".into())
            .spawn(move || serve(evaluator.as_ref(), request_rx, reply_tx, token))?;

        Ok(Self {
            requests: Some(request_tx),
            replies: reply_rx,
            cancel,
            seq: 0,
        })
    }

    /// Evaluate `board` at `depth` and wait for the answer.
    pub fn call(&mut self, board: Bitboard, depth: u32) -> Result<Move, WorkerError> {
        let seq = self.send(board, depth)?;
        loop {
            let reply = self.replies.recv().map_err(|_| WorkerError::Disconnected)?;
            if reply.seq == seq {
                return check(reply);
            }
            trace!("dropping stale reply for depth {}", reply.depth);
        }
    }

    /// Like [`call`](Self::call), but give up waiting at `deadline`.
    ///
    /// Returns `Ok(None)` when the deadline passes first. The evaluation keeps
    /// running in the worker until it finishes or the worker is terminated;
    /// its late answer is ignored by later calls. Nothing is sent once the
    /// deadline has already passed.
    pub fn call_until(
        &mut self,
        board: Bitboard,
        depth: u32,
        deadline: Instant,
    ) -> Result<Option<Move>, WorkerError> {
        if self.is_terminated() {
            return Err(WorkerError::Terminated);
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        let seq = self.send(board, depth)?;
        let timer = crossbeam_channel::at(deadline);
        loop {
            select! {
                recv(self.replies) -> reply => {
                    let reply = reply.map_err(|_| WorkerError::Disconnected)?;
                    if reply.seq == seq {
                        return check(reply).map(Some);
                    }
                    trace!("dropping stale reply for depth {}", reply.depth);
                }
                recv(timer) -> _ => return Ok(None),
            }
        }
    }

    /// Tear the worker down. Returns `true` on the call that actually did it
    /// and `false` on every later call.
    pub fn terminate(&mut self) -> bool {
        match self.requests.take() {
            Some(requests) => {
                self.cancel.cancel();
                drop(requests);
                debug!("search worker terminated after {} request(s)", self.seq);
                true
            }
            None => false,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.requests.is_none()
    }

    fn send(&mut self, board: Bitboard, depth: u32) -> Result<u64, WorkerError> {
        let requests = self.requests.as_ref().ok_or(WorkerError::Terminated)?;
        self.seq += 1;
        requests
            .send(Request {
                seq: self.seq,
                board,
                depth,
            })
            .map_err(|_| WorkerError::Disconnected)?;
        Ok(self.seq)
    }
}

impl Drop for SearchWorker {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn check(reply: Reply) -> Result<Move, WorkerError> {
    let index = reply.answer.ok_or(WorkerError::NoMove(reply.depth))?;
    decode(index).ok_or(WorkerError::OutOfRange(index))
}

/// Worker thread body.
fn serve(
    evaluator: &dyn Evaluator,
    requests: Receiver<Request>,
    replies: Sender<Reply>,
    cancel: CancelToken,
) {
    for Request { seq, board, depth } in requests.iter() {
        if cancel.is_cancelled() {
            break;
        }
        let answer = evaluator.evaluate(board, depth, &cancel);
        trace!("depth {depth} answered {answer:?}");
        if replies.send(Reply { seq, depth, answer }).is_err() {
            break;
        }
    }
    debug!("search worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crossbeam_channel::bounded;

    /// Answers with the depth as the cell index, sleeping 200ms from depth 3 on.
    fn depth_echo() -> Arc<dyn Evaluator> {
        Arc::new(|_: Bitboard, depth: u32| {
            if depth >= 3 {
                thread::sleep(Duration::from_millis(200));
            }
            Some(depth as u8)
        })
    }

    /// Spins until cancelled, then reports on a channel.
    struct Spin {
        done: Sender<()>,
    }

    impl Evaluator for Spin {
        fn evaluate(&self, _: Bitboard, _: u32, cancel: &CancelToken) -> Option<u8> {
            while !cancel.is_cancelled() {
                thread::sleep(Duration::from_millis(1));
            }
            let _ = self.done.send(());
            None
        }
    }

    #[test]
    fn test_call_decodes_answer() {
        let mut worker = SearchWorker::spawn(depth_echo()).unwrap();
        assert_eq!(worker.call(Bitboard::default(), 0).unwrap(), Move::new(0, 0));
        assert_eq!(worker.call(Bitboard::default(), 2).unwrap(), Move::new(0, 2));
    }

    #[test]
    fn test_sequential_calls_share_one_worker() {
        let mut worker = SearchWorker::spawn(Arc::new(|_: Bitboard, depth: u32| {
            Some(depth as u8 + 8)
        }))
        .unwrap();
        for depth in 0..5 {
            let mv = worker.call(Bitboard::default(), depth).unwrap();
            assert_eq!(mv, Move::new(1, depth as usize));
        }
    }

    #[test]
    fn test_call_until_times_out() {
        let mut worker = SearchWorker::spawn(depth_echo()).unwrap();
        let start = Instant::now();
        let deadline = start + Duration::from_millis(20);

        let result = worker.call_until(Bitboard::default(), 5, deadline).unwrap();
        assert_eq!(result, None);
        assert!(start.elapsed() < Duration::from_millis(190));
    }

    #[test]
    fn test_call_until_past_deadline_sends_nothing() {
        let (tx, rx) = unbounded();
        let mut worker = SearchWorker::spawn(Arc::new(move |_: Bitboard, depth: u32| {
            let _ = tx.send(depth);
            Some(depth as u8)
        }))
        .unwrap();

        let deadline = Instant::now();
        assert_eq!(worker.call_until(Bitboard::default(), 0, deadline).unwrap(), None);
        worker.terminate();
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn test_closure_runs_on_after_terminate() {
        let (tx, rx) = bounded(1);
        let mut worker = SearchWorker::spawn(Arc::new(move |_: Bitboard, _: u32| -> Option<u8> {
            thread::sleep(Duration::from_millis(100));
            let _ = tx.send(());
            Some(0)
        }))
        .unwrap();

        let deadline = Instant::now() + Duration::from_millis(10);
        assert_eq!(worker.call_until(Bitboard::default(), 0, deadline).unwrap(), None);
        assert!(worker.terminate());

        // The closure never sees the cancel flag and finishes its evaluation.
        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
    }

    #[test]
    fn test_stale_reply_is_skipped() {
        let mut worker = SearchWorker::spawn(depth_echo()).unwrap();
        let deadline = Instant::now() + Duration::from_millis(10);
        assert_eq!(worker.call_until(Bitboard::default(), 4, deadline).unwrap(), None);

        // The late depth 4 answer arrives first and must not be returned.
        assert_eq!(worker.call(Bitboard::default(), 1).unwrap(), Move::new(0, 1));
    }

    #[test]
    fn test_terminate_is_idempotent() {
        let mut worker = SearchWorker::spawn(depth_echo()).unwrap();
        assert!(!worker.is_terminated());
        assert!(worker.terminate());
        assert!(!worker.terminate());
        assert!(worker.is_terminated());
        assert!(matches!(
            worker.call(Bitboard::default(), 0),
            Err(WorkerError::Terminated)
        ));
    }

    #[test]
    fn test_terminate_cancels_running_evaluation() {
        let (done_tx, done_rx) = bounded(1);
        let mut worker = SearchWorker::spawn(Arc::new(Spin { done: done_tx })).unwrap();

        let deadline = Instant::now() + Duration::from_millis(10);
        assert_eq!(worker.call_until(Bitboard::default(), 0, deadline).unwrap(), None);

        worker.terminate();
        assert!(done_rx.recv_timeout(Duration::from_secs(2)).is_ok());
    }

    #[test]
    fn test_drop_cancels_running_evaluation() {
        let (done_tx, done_rx) = bounded(1);
        {
            let mut worker = SearchWorker::spawn(Arc::new(Spin { done: done_tx })).unwrap();
            let deadline = Instant::now() + Duration::from_millis(10);
            let _ = worker.call_until(Bitboard::default(), 0, deadline);
        }
        assert!(done_rx.recv_timeout(Duration::from_secs(2)).is_ok());
    }

    #[test]
    fn test_no_move_and_out_of_range() {
        let mut worker =
            SearchWorker::spawn(Arc::new(|_: Bitboard, _: u32| -> Option<u8> { None })).unwrap();
        assert!(matches!(
            worker.call(Bitboard::default(), 3),
            Err(WorkerError::NoMove(3))
        ));

        let mut worker =
            SearchWorker::spawn(Arc::new(|_: Bitboard, _: u32| -> Option<u8> { Some(64) })).unwrap();
        assert!(matches!(
            worker.call(Bitboard::default(), 0),
            Err(WorkerError::OutOfRange(64))
        ));
    }
}
