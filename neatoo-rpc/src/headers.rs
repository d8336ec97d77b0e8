//! The two HTTP headers that carry what the envelope deliberately keeps
//! out of the JSON body — §4.4, §6.

/// Carries the ambient [`neatoo_core::CorrelationId`] on both the request
/// and its response.
pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// Carries the server's negotiated [`neatoo_core::WireFormat`] on the
/// response so the client can adopt it for subsequent requests.
pub const FORMAT_HEADER: &str = "x-neatoo-format";
