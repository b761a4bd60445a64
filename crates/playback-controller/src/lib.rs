mod controller;
mod error;
mod events;
mod shuffle;
mod state;
mod traits;
mod track;

pub use controller::*;
pub use error::*;
pub use events::*;
pub use state::*;
pub use traits::*;
pub use track::*;
