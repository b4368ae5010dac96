mod catalog;
mod filter;
mod manager;
mod provider;
mod session;
mod traits;
mod types;

pub use catalog::*;
pub use filter::*;
pub use manager::*;
pub use provider::*;
pub use session::*;
pub use traits::*;
pub use types::*;

#[cfg(test)]
mod test_mocks;

#[cfg(test)]
mod catalog_tests;
