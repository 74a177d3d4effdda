mod archive;
mod signature;
mod validation;

pub use archive::*;
pub use signature::*;
pub use validation::*;
