pub mod config;
pub mod node;
pub mod path;
pub mod task;

pub use config::*;
pub use node::*;
pub use path::*;
pub use task::*;
