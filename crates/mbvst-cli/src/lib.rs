pub mod cli;
pub mod config;

pub use cli::{Cli, Commands, GraphCommands, SolveArgs, SolveMethod};
pub use config::RunConfig;
