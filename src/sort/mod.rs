pub mod comb;
pub mod core;
pub mod keys;
pub mod materialize;

#[cfg(test)]
mod tests;

pub use self::comb::*;
pub use self::core::*;
pub use self::keys::*;
pub use self::materialize::*;
