mod background;
mod controller;
mod handle;

pub use controller::*;
pub use handle::*;

#[cfg(test)]
mod test_support;
