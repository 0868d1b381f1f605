pub extern crate chrono;
pub extern crate serde;
pub extern crate serde_json;

mod diagram;
mod simplify;
mod types;

pub use diagram::*;
pub use simplify::*;
pub use types::*;
