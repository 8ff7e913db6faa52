// xforward: forward posts from tracked X accounts into a Discord channel.
//
// This is the library root. Each module corresponds to one stage of the
// forwarding pipeline: rules -> stream -> classify -> format -> deliver.

pub mod config;
pub mod discord;
pub mod output;
pub mod status;
pub mod stream;
pub mod x;
