//! Telemetry ingestion and view synchronisation for a fleet of networked lighting nodes.

pub mod clock;
pub mod decoder;
pub mod error;
pub mod fault;
pub mod ingress;
pub mod models;
pub mod pipeline;
pub mod publisher;
pub mod scheduler;
pub mod signature;
pub mod store;
pub mod view;

pub use error::{DecodeError, PublishError};
pub use ingress::{IngressReceiver, IngressSender, ingress_queue};
pub use pipeline::Pipeline;
pub use publisher::{CommandPublisher, CommandSink, ControlCenter};
pub use scheduler::RenderScheduler;
