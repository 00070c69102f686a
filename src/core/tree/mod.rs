pub mod cfg;
pub mod class_table;
pub mod model;
pub mod node;
pub mod visit;

pub use class_table::*;
pub use model::*;
pub use node::*;
