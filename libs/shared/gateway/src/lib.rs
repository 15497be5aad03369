pub mod client;
pub mod session;

pub use client::BackendClient;
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore};
