pub mod letter;
pub mod mention;
pub mod metadata;

pub use letter::*;
pub use mention::*;
pub use metadata::*;
