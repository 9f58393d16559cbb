mod counter;
mod node;

pub use counter::Counter;
pub use node::{NodeKind, SizeTree};
