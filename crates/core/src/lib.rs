//! Domain logic for BetterAngels sub-collection editing.
//!
//! Everything in this crate is pure and synchronous: draft collections of
//! locally edited entries, the partitioning of a draft into create/update/
//! delete sets, the editor contract, the mutation response union, and the
//! small state machines the client screens are built on. Network effects
//! live in `betterangels-client`.

pub mod draft;
pub mod editor;
pub mod error;
pub mod flags;
pub mod form;
pub mod modal;
pub mod mutation;
pub mod reconcile;
pub mod service_request;
pub mod task;
pub mod types;
