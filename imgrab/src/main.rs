use colored::Colorize;
use imgrab::{command_argument_builder, handle_run, init_logging};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let matches = command_argument_builder().get_matches();
    init_logging(matches.get_flag("verbose"));

    if let Err(e) = handle_run(&matches).await {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}
