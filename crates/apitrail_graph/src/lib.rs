//! Entity graph reconstruction.
//!
//! Replaying the full patch history rebuilds the current state of every
//! API element together with its per-entity history: which build
//! introduced it, every change since, and whether it has been removed.
//! A removed element stays in the graph so its history remains
//! addressable. After replay, a linking pass connects members to the
//! type entities their signatures mention, in both directions.

mod entities;
mod links;
#[cfg(test)]
mod tests_support;
mod view;

use thiserror::Error;

pub use entities::{
    build_graph, ClassEntity, Entities, EnumEntity, EnumItemEntity, MemberEntity, TypeEntity,
};

/// Errors produced while replaying patch history.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A member or enum-item action arrived before any action introduced
    /// its owner. History produced by the differ is owner-first, so this
    /// indicates a corrupt or truncated manifest.
    #[error("action for {owner}.{member} references an owner that does not exist")]
    MissingOwner { owner: String, member: String },
}
