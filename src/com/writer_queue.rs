//! Per-domain writer queues.
//!
//! Each domain owns one unbounded crossbeam channel. Any thread may push
//! [`QueuedCommand`]s into it; the domain owner pops and runs them with
//! [`WriterQueues::drain`], typically once per tick of its own loop. This turns
//! concurrent requests into a single stream of writes applied by one thread.
//!
//! # Caller contract
//!
//! Only the owner of a domain may call `drain` for it, and never from two
//! threads at once. Nothing here enforces that with a lock; breaking it means
//! writer closures run concurrently against state they assume they own.

use super::command::QueuedCommand;
use super::error::ComError;
use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, warn};
use rustc_hash::FxHashMap;
use std::sync::{PoisonError, RwLock};

struct DomainQueue {
    tx: Sender<QueuedCommand>,
    rx: Receiver<QueuedCommand>,
}

/// Cloneable producer side of one domain queue.
///
/// Handed out by [`WriterQueues::producer`] so that producer threads can push
/// without going through the registry.
#[derive(Clone)]
pub struct DomainProducer {
    domain: String,
    tx: Sender<QueuedCommand>,
}

impl DomainProducer {
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Pushes a command. Never blocks.
    pub fn push(&self, command: QueuedCommand) -> Result<(), ComError> {
        self.tx
            .send(command)
            .map_err(|_| ComError::QueueClosed(self.domain.clone()))
    }
}

/// All writer queues, keyed by domain name.
#[derive(Default)]
pub struct WriterQueues {
    queues: RwLock<FxHashMap<String, DomainQueue>>,
}

impl WriterQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the queue for `domain`. Returns `false` if it already existed,
    /// in which case nothing changes.
    pub fn register_domain(&self, domain: &str) -> bool {
        let mut queues = self.queues.write().unwrap_or_else(PoisonError::into_inner);
        if queues.contains_key(domain) {
            return false;
        }
        let (tx, rx) = unbounded();
        queues.insert(domain.to_string(), DomainQueue { tx, rx });
        debug!(target: "com", "Registered writer domain <{}>", domain);
        true
    }

    pub fn has_domain(&self, domain: &str) -> bool {
        self.queues
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(domain)
    }

    /// Registered domains, sorted.
    pub fn domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = self
            .queues
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        domains.sort();
        domains
    }

    pub fn producer(&self, domain: &str) -> Result<DomainProducer, ComError> {
        let queues = self.queues.read().unwrap_or_else(PoisonError::into_inner);
        let queue = queues
            .get(domain)
            .ok_or_else(|| ComError::UnknownDomain(domain.to_string()))?;
        Ok(DomainProducer {
            domain: domain.to_string(),
            tx: queue.tx.clone(),
        })
    }

    /// Pushes `command` into the queue of `domain`. Never blocks.
    pub fn enqueue(&self, domain: &str, command: QueuedCommand) -> Result<(), ComError> {
        self.producer(domain)?.push(command)
    }

    /// Number of commands currently waiting in `domain`.
    pub fn pending(&self, domain: &str) -> Result<usize, ComError> {
        Ok(self.receiver(domain)?.len())
    }

    /// Runs every command that is queued for `domain` at the moment of the
    /// call, in the order each producer pushed them, on the calling thread.
    ///
    /// Commands pushed while the drain is running may be left for the next
    /// pass. Errors returned by a command are logged and do not stop the
    /// drain. Returns the number of commands invoked.
    pub fn drain(&self, domain: &str) -> Result<usize, ComError> {
        let rx = self.receiver(domain)?;
        let available = rx.len();
        let mut invoked = 0;
        for _ in 0..available {
            let Ok(command) = rx.try_recv() else {
                break;
            };
            let name = command.name().to_string();
            if let Err(e) = command.invoke() {
                warn!(target: "com", "Queued call of <{}> in domain <{}> failed: {}", name, domain, e);
            }
            invoked += 1;
        }
        if invoked > 0 {
            debug!(target: "com", "Drained {} command(s) from domain <{}>", invoked, domain);
        }
        Ok(invoked)
    }

    fn receiver(&self, domain: &str) -> Result<Receiver<QueuedCommand>, ComError> {
        let queues = self.queues.read().unwrap_or_else(PoisonError::into_inner);
        queues
            .get(domain)
            .map(|queue| queue.rx.clone())
            .ok_or_else(|| ComError::UnknownDomain(domain.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::com::command::QueuedCommand;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<i32>>>, impl Fn(i32) + Send + Sync + Clone + 'static) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        (log, move |n: i32| sink.lock().unwrap().push(n))
    }

    #[test]
    fn test_register_domain_is_idempotent() {
        let queues = WriterQueues::new();
        assert!(queues.register_domain("physics"));
        assert!(!queues.register_domain("physics"));
        assert_eq!(queues.domains(), vec!["physics".to_string()]);
    }

    #[test]
    fn test_enqueue_unknown_domain() {
        let queues = WriterQueues::new();
        let (_, f) = recorder();
        let cmd = QueuedCommand::from_fn("rec", f, (1,)).unwrap();
        assert_eq!(
            queues.enqueue("nowhere", cmd).unwrap_err(),
            ComError::UnknownDomain("nowhere".into())
        );
        assert!(queues.drain("nowhere").is_err());
    }

    #[test]
    fn test_drain_preserves_order() {
        let queues = WriterQueues::new();
        queues.register_domain("physics");
        let (log, f) = recorder();
        for n in 0..10 {
            let cmd = QueuedCommand::from_fn("rec", f.clone(), (n,)).unwrap();
            queues.enqueue("physics", cmd).unwrap();
        }
        assert_eq!(queues.pending("physics").unwrap(), 10);
        assert_eq!(queues.drain("physics").unwrap(), 10);
        assert_eq!(*log.lock().unwrap(), (0..10).collect::<Vec<_>>());
        assert_eq!(queues.pending("physics").unwrap(), 0);
    }

    #[test]
    fn test_drain_empty_is_noop() {
        let queues = WriterQueues::new();
        queues.register_domain("physics");
        assert_eq!(queues.drain("physics").unwrap(), 0);
    }

    #[test]
    fn test_failing_command_does_not_stop_drain() {
        let queues = WriterQueues::new();
        queues.register_domain("physics");
        let (log, f) = recorder();
        let failing = QueuedCommand::from_fn(
            "fail",
            |_: i32| -> Result<(), ComError> { Err(ComError::invalid("nope")) },
            (0,),
        )
        .unwrap();
        queues.enqueue("physics", failing).unwrap();
        queues
            .enqueue("physics", QueuedCommand::from_fn("rec", f, (7,)).unwrap())
            .unwrap();
        assert_eq!(queues.drain("physics").unwrap(), 2);
        assert_eq!(*log.lock().unwrap(), vec![7]);
    }

    #[test]
    fn test_producer_handle() {
        let queues = WriterQueues::new();
        queues.register_domain("graphics");
        let producer = queues.producer("graphics").unwrap();
        assert_eq!(producer.domain(), "graphics");
        let (log, f) = recorder();
        producer
            .push(QueuedCommand::from_fn("rec", f, (3,)).unwrap())
            .unwrap();
        queues.drain("graphics").unwrap();
        assert_eq!(*log.lock().unwrap(), vec![3]);
    }
}
