// Adapters layer: concrete implementations of the domain ports
// (hosted backend over HTTP, in-memory store for offline use and tests).

pub mod auth;
pub mod backend;
pub mod listings;
pub mod memory;
pub mod reviews;
pub mod storage;

pub use auth::{AuthSession, AuthUser, SignUpOutcome};
pub use backend::BackendClient;
pub use memory::InMemoryListingStore;
