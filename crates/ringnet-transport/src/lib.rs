//! # ringnet-transport
//!
//! Text-frame transport abstraction for the ringnet overlay.
//!
//! This crate provides:
//! - [`Transport`]/[`TransportConnection`], the traits `ringnet-core` is
//!   written against
//! - [`ws::WsTlsTransport`], a TLS WebSocket implementation of both
//! - [`factory::TransportFactory`], for building the listener from config

#![warn(missing_docs)]

pub mod connection;
pub mod error;
pub mod factory;
pub mod ws;

pub use connection::{Frame, Transport, TransportConnection, NORMAL_CLOSURE};
pub use error::TransportError;
pub use factory::{TransportFactory, TransportFactoryConfig};
pub use ws::WsTlsTransport;
