//! An in-memory [`Transport`] used by tests and by the echo scenario.
//!
//! Two flavors are provided: [`MemoryTransport::pair`] wires up two
//! independent endpoints (one per peer), and [`MemoryTransport::echo`] wires
//! a single endpoint's writes directly back into its own reads, which is
//! exactly what the "echo round trip" testable property needs.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use crate::chunk::Chunk;
use crate::error::TransportError;

use super::{Transport, TransportFactory};

pub struct MemoryTransport {
    outbound: mpsc::Sender<Chunk>,
    inbound: Mutex<mpsc::Receiver<Chunk>>,
    closed: AtomicBool,
}

impl MemoryTransport {
    /// Builds two transports whose write side feeds the other's read side.
    pub fn pair(buffer: usize) -> (Self, Self) {
        let (a_to_b, b_from_a) = mpsc::channel(buffer);
        let (b_to_a, a_from_b) = mpsc::channel(buffer);
        (
            Self {
                outbound: a_to_b,
                inbound: Mutex::new(a_from_b),
                closed: AtomicBool::new(false),
            },
            Self {
                outbound: b_to_a,
                inbound: Mutex::new(b_from_a),
                closed: AtomicBool::new(false),
            },
        )
    }

    /// Builds a single transport whose writes are immediately readable back.
    pub fn echo(buffer: usize) -> Self {
        let (tx, rx) = mpsc::channel(buffer);
        Self {
            outbound: tx,
            inbound: Mutex::new(rx),
            closed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn read_chunk(&self) -> Result<Chunk, TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        let mut rx = self.inbound.lock().await;
        rx.recv().await.ok_or(TransportError::Closed)
    }

    async fn write_chunk(&self, chunk: &Chunk) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        self.outbound
            .send(chunk.clone())
            .await
            .map_err(|_| TransportError::Closed)
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }

    fn is_alive(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }
}

/// A scripted outcome for one [`TransportFactory::connect`] call.
enum FactoryOutcome {
    Succeed,
    Fail,
}

/// A [`TransportFactory`] driven by a scripted sequence of outcomes, falling
/// back to a default outcome once the script is exhausted. Used to exercise
/// the reconnection controller deterministically in tests.
pub struct MemoryTransportFactory {
    script: StdMutex<VecDeque<FactoryOutcome>>,
    default_succeeds: bool,
    buffer: usize,
}

impl MemoryTransportFactory {
    /// A factory that always succeeds, handing out fresh echo transports.
    pub fn always_succeeds(buffer: usize) -> Self {
        Self {
            script: StdMutex::new(VecDeque::new()),
            default_succeeds: true,
            buffer,
        }
    }

    /// A factory that always fails to connect.
    pub fn always_fails(buffer: usize) -> Self {
        Self {
            script: StdMutex::new(VecDeque::new()),
            default_succeeds: false,
            buffer,
        }
    }

    /// Fails the first `n` calls, then succeeds for every call after.
    pub fn fail_then_succeed(n: usize, buffer: usize) -> Self {
        let mut script = VecDeque::new();
        for _ in 0..n {
            script.push_back(FactoryOutcome::Fail);
        }
        Self {
            script: StdMutex::new(script),
            default_succeeds: true,
            buffer,
        }
    }
}

#[async_trait]
impl TransportFactory for MemoryTransportFactory {
    async fn connect(
        &self,
        _preferred_location: Option<&str>,
    ) -> Result<Box<dyn Transport>, TransportError> {
        let outcome = {
            let mut script = self.script.lock().expect("script mutex poisoned");
            script.pop_front().unwrap_or(if self.default_succeeds {
                FactoryOutcome::Succeed
            } else {
                FactoryOutcome::Fail
            })
        };
        match outcome {
            FactoryOutcome::Succeed => {
                Ok(Box::new(MemoryTransport::echo(self.buffer)))
            }
            FactoryOutcome::Fail => Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "memory factory scripted to fail",
            ))),
        }
    }
}
