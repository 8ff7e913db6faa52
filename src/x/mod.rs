// X API v2 client: filtered stream, stream rules, and single-post lookup.
//
// Authentication is app-only (bearer token). Each submodule handles one
// area of the API surface.

pub mod client;
pub mod rules;
pub mod types;
