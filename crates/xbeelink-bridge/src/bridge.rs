use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use xbeelink_frame::{
    DeliveryStatus, FrameIdAllocator, ModemStatus, Request, Response, ZbRx, ZbTxRequest,
};

use crate::command::Command;
use crate::config::BridgeConfig;
use crate::error::Result;
use crate::telemetry::Telemetry;
use crate::topic::{telemetry_topic, CommandTopic};

/// A message ready for the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Publication {
    pub topic: String,
    /// JSON-encoded record.
    pub payload: String,
}

/// What a received response means to the bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    /// A sensor record to publish.
    Publish(Publication),
    /// Outcome of an earlier command transmission.
    Delivery { frame_id: u8, status: DeliveryStatus },
    Modem(ModemStatus),
    /// A response type the bridge has no use for.
    Ignored { api_id: u8 },
    /// Data from a device that could not be decoded.
    Rejected { reason: String },
}

/// Sink for publications. Implemented by the bus client.
pub trait Publisher {
    fn publish(&mut self, publication: &Publication) -> Result<()>;
}

/// Publisher that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryPublisher {
    pub published: Vec<Publication>,
}

impl Publisher for MemoryPublisher {
    fn publish(&mut self, publication: &Publication) -> Result<()> {
        self.published.push(publication.clone());
        Ok(())
    }
}

/// Maps radio traffic to bus messages and bus commands to radio requests.
#[derive(Debug, Default)]
pub struct Bridge {
    config: BridgeConfig,
    frame_ids: FrameIdAllocator,
}

impl Bridge {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            frame_ids: FrameIdAllocator::new(),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Frame id of the most recent command request.
    pub fn last_frame_id(&self) -> Option<u8> {
        self.frame_ids.last()
    }

    pub fn handle_response(&self, response: &Response) -> BridgeEvent {
        match response {
            Response::ZbRx(rx) => self.telemetry_event(rx),
            Response::ZbTxStatus(status) => {
                let event = BridgeEvent::Delivery {
                    frame_id: status.frame_id(),
                    status: status.delivery_status(),
                };
                if !status.is_success() {
                    warn!(
                        frame_id = status.frame_id(),
                        status = %status.delivery_status(),
                        retries = status.retry_count(),
                        "delivery failed"
                    );
                }
                event
            }
            Response::ModemStatus(status) => {
                debug!(%status, "modem status");
                BridgeEvent::Modem(*status)
            }
            other => BridgeEvent::Ignored {
                api_id: other.api_id(),
            },
        }
    }

    fn telemetry_event(&self, rx: &ZbRx) -> BridgeEvent {
        let source = rx.address64();
        let telemetry = match Telemetry::decode(&rx.payload()) {
            Ok(telemetry) => telemetry,
            Err(err) => {
                warn!(%source, error = %err, "dropping undecodable record");
                return BridgeEvent::Rejected {
                    reason: err.to_string(),
                };
            }
        };
        let payload = match serde_json::to_string(&telemetry) {
            Ok(payload) => payload,
            Err(err) => {
                return BridgeEvent::Rejected {
                    reason: err.to_string(),
                }
            }
        };
        let topic = telemetry_topic(&self.config, source, &telemetry);
        debug!(%topic, "telemetry");
        BridgeEvent::Publish(Publication { topic, payload })
    }

    /// Handle a response and hand any publication to `publisher`.
    pub fn dispatch<P: Publisher + ?Sized>(
        &self,
        response: &Response,
        publisher: &mut P,
    ) -> Result<BridgeEvent> {
        let event = self.handle_response(response);
        if let BridgeEvent::Publish(publication) = &event {
            publisher.publish(publication)?;
        }
        Ok(event)
    }

    /// Build the transmission for a command message.
    ///
    /// An empty body is read as JSON `null`.
    pub fn command_request(&mut self, topic: &str, body: &str) -> Result<Request> {
        let target = CommandTopic::parse(topic, &self.config)?;
        let body = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(body)?
        };
        let command = Command::decode(&target.command, &body)?;
        let frame_id = self.frame_ids.next_id();
        debug!(address = %target.address, command = %target.command, frame_id, "command");
        Ok(ZbTxRequest::new(target.address, command.encode())
            .with_frame_id(frame_id)
            .with_radius(self.config.default_radius)
            .into())
    }
}

impl From<BridgeConfig> for Bridge {
    fn from(config: BridgeConfig) -> Self {
        Self::new(config)
    }
}

impl std::fmt::Display for BridgeEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Publish(p) => write!(f, "publish {} {}", p.topic, p.payload),
            Self::Delivery { frame_id, status } => write!(f, "delivery {frame_id}: {status}"),
            Self::Modem(status) => write!(f, "modem {status}"),
            Self::Ignored { api_id } => write!(f, "ignored api id 0x{api_id:02X}"),
            Self::Rejected { reason } => write!(f, "rejected: {reason}"),
        }
    }
}
