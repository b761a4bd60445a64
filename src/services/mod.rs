mod console;
pub(crate) use console::*;

mod headless_output;
pub(crate) use headless_output::*;
