pub mod input;
pub mod output;
pub mod profile;

pub use input::*;
pub use output::*;
pub use profile::*;
