//! Decorator resolution: generic expansion, grouping and chain order.

pub mod chain;
pub mod expand;

pub use chain::{render_chain, resolve_decorators, DecoratorChain, DecoratorGroup, DecoratorLayer};
pub use expand::expand_open_decorators;
