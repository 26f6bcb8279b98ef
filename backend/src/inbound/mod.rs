//! Inbound adapters that translate external requests into roster service
//! calls while keeping framework details at the edge.

pub mod http;
