// Filtered stream consumption: byte chunks -> lines -> frames -> dispatch.
//
// The supervisor owns the connection lifecycle and reconnects forever.
// Decoding and classification are pure and tested on their own.

pub mod classifier;
pub mod decoder;
pub mod supervisor;
