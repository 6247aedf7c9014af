#[allow(clippy::module_inception)]
mod connection;

pub use connection::Connection;
