pub mod config;
pub mod prompt;
pub mod run;

pub use config::{DestinationDir, FileConfig, InputError, PageSource, PartialConfig, RunConfig};
pub use prompt::{Prompter, acquire_run_config};
pub use run::{
    ReportFormat, RunOptions, RunProgressCallback, RunReport, RunResultCallback, execute_run,
    generate_run_report, outcome_line, render_report,
};
