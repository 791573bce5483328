//! Data models for the party backend.
//!
//! Field names serialize as camelCase to match what the browser screens expect.

mod meal;
mod member;
mod meta;
mod request;
mod schedule;
mod session;

pub use meal::*;
pub use member::*;
pub use meta::*;
pub use request::*;
pub use schedule::*;
pub use session::*;
