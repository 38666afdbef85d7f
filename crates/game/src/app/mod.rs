pub(crate) mod bootstrap;
mod gameplay;
pub(crate) mod loop_runner;
mod menu;
