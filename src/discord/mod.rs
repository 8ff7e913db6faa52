// Discord delivery: embed formatting, webhook posting, and fire-and-forget
// dispatch of stream payloads.

pub mod dispatch;
pub mod embed;
pub mod traits;
pub mod webhook;
