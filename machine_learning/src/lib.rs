pub mod arch;
pub mod error;
pub mod io;
pub mod specs;

pub use error::{MlErr, Result};
