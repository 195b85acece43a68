//! Connection handling: the per-connection request driver and the response
//! writer handed to request handlers.

mod http_connection;
mod response_writer;

pub use http_connection::HttpConnection;
pub use response_writer::ResponseWriter;
