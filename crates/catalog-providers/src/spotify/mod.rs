mod client;
mod parser;
mod types;


pub use client::*;
pub use parser::{Fallbacks, ParseError};
