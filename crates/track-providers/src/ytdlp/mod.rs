mod client;
mod parser;

pub use client::*;
pub use parser::ParseError;
