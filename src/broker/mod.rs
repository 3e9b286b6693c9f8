//! Bridge to the out-of-process elevated broker.
//!
//! The bind protocol is asynchronous and reconnect-prone; a ractor actor
//! serializes callers so only one bind is ever in flight and queued calls
//! drain in order once the remote handle arrives.

pub mod client;
pub mod transport;

pub use client::{BrokerCommand, BrokerEvents, BrokerHandle, spawn};
pub use transport::{BrokerTransport, RemoteBroker};
