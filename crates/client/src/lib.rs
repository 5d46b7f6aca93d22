//! BetterAngels client runtime.
//!
//! Everything that talks to the outside world lives here: configuration,
//! the authenticated session, the GraphQL transport and the reconciler
//! that saves draft collections through it. Pure draft logic is in
//! `betterangels-core`.

pub mod config;
pub mod context;
pub mod error;
pub mod graphql;
pub mod notifier;
pub mod remote;
pub mod session;
pub mod sync;
pub mod upload;
