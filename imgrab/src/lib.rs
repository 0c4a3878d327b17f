pub mod commands;
pub mod handlers;

pub use commands::command_argument_builder;
pub use handlers::{handle_run, init_logging, partial_config_from_args};
