//! Broker link: outbound queue, device link thread, loopback transport.

pub mod channels;
pub mod io_task;
pub mod transport;
