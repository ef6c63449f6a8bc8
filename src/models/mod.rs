// Re-export all model types for ease of use

pub mod author;
pub mod book;
pub mod responses;

// Re-export commonly used types
pub use author::*;
pub use book::*;
pub use responses::*;
