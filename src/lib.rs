pub mod commands;
pub mod llm;
pub mod loading;
pub mod logging;
pub mod palette;
pub mod review;
pub mod session;
pub mod tui;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;
