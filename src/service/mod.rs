//! A line-oriented JSON front end: every request line gets exactly one response line.

mod protocol;
mod server;

pub use protocol::{Request, Response};
pub use server::{MAX_LINE_LEN, Service, handle_connection, serve};
