mod layout;
mod scene;

pub use layout::*;
pub use scene::*;
