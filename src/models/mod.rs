mod note;
mod owner;

pub use note::*;
pub use owner::OwnerId;
