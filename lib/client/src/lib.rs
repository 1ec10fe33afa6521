//! Browser-side session handling for study-sync.
//!
//! - [`ClientIdentityStore`]: where the signed-in identity is persisted
//! - [`Reconciler`]: decides at startup who is signed in
//! - [`RequestGateway`]: attaches and pre-validates the bearer credential,
//!   evicts the identity when the server says 401
//! - [`ApiClient`]: the typed REST client built on the two above
//!
//! Nothing here depends on a particular async runtime; the crate compiles
//! for `wasm32-unknown-unknown`.

pub mod api;
pub mod error;
pub mod gateway;
pub mod reconcile;
pub mod store;

pub use api::{ApiClient, HttpSessionProbe};
pub use error::ClientError;
pub use gateway::RequestGateway;
pub use reconcile::{Reconciler, Reconciliation, SessionProbe, take_delivered_identity};
pub use store::{
    ClientIdentityStore, IDENTITY_KEY, MemoryIdentityStore, Persisted, load_identity,
    storage_write_succeeded,
};
