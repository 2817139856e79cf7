use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::decoder;
use crate::models::TelemetryRecord;

/// Create the queue shared by the subscription context and the render loop.
pub fn ingress_queue() -> (IngressSender, IngressReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();

    (IngressSender { tx }, IngressReceiver { rx, pending: None })
}

/// Producer half. Cheap to clone; never blocks.
#[derive(Debug, Clone)]
pub struct IngressSender {
    tx: UnboundedSender<TelemetryRecord>,
}

impl IngressSender {
    /// Enqueue a record. A closed queue hands the record back.
    pub fn push(&self, record: TelemetryRecord) -> Result<(), TelemetryRecord> {
        self.tx.send(record).map_err(|e| e.0)
    }

    /// Decode a raw payload and enqueue it. Malformed payloads are dropped.
    pub fn ingest(&self, payload: &[u8]) -> bool {
        let record = match decoder::decode(payload) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Dropping telemetry payload: {}", e);
                return false;
            }
        };

        tracing::debug!(node_id = %record.node_id, "Receive telemetry");

        match self.push(record) {
            Ok(()) => true,
            Err(record) => {
                tracing::warn!(node_id = %record.node_id, "Ingress queue closed, dropping telemetry");
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half, owned by the render loop.
#[derive(Debug)]
pub struct IngressReceiver {
    rx: UnboundedReceiver<TelemetryRecord>,
    // Record taken off the channel by `ready` but not yet handed out.
    pending: Option<TelemetryRecord>,
}

impl IngressReceiver {
    /// Take the oldest record, or `None` when nothing is queued right now.
    pub fn try_pop(&mut self) -> Option<TelemetryRecord> {
        self.pending.take().or_else(|| self.rx.try_recv().ok())
    }

    /// Wait until a record is queued without consuming it.
    /// Returns `false` once every producer is gone and the queue is empty.
    pub async fn ready(&mut self) -> bool {
        if self.pending.is_some() {
            return true;
        }

        match self.rx.recv().await {
            Some(record) => {
                self.pending = Some(record);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.rx.len() + usize::from(self.pending.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
