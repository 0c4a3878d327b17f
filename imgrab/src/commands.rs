use clap::{arg, value_parser};
use std::path::PathBuf;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("imgrab")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("imgrab")
        .about("Fetch a web page and download every image it references")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet")
                .required(false)
                .help("Suppress the progress spinner and the text report (a JSON report is still written)"),
        )
        .arg(arg!(-v --"verbose" "Enable debug logging on stderr").required(false))
        .arg(
            arg!(-u --"url" <URL>)
                .required(false)
                .help("The page to scan; must start with http:// (prompted for if omitted)"),
        )
        .arg(
            arg!(-d --"dest" <PATH>)
                .required(false)
                .help("Directory to save images into, created if missing (prompted for if omitted)"),
        )
        .arg(
            arg!(-c --"config" <PATH>)
                .required(false)
                .help("JSON file with url, dest, timeout_secs and skip_missing_src; flags win")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            arg!(-t --"timeout" <SECONDS>)
                .required(false)
                .help("Per-request timeout in seconds (default: 30)")
                .value_parser(value_parser!(u64).range(1..)),
        )
        .arg(
            arg!(--"skip-missing-src")
                .required(false)
                .help("Skip <img> tags without a src attribute instead of aborting")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(--"no-prompt")
                .required(false)
                .help("Never prompt; fail if the URL or destination is missing or invalid")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(-f --"format" <FORMAT>)
                .required(false)
                .help("Report format: text, json")
                .value_parser(["text", "json"])
                .default_value("text"),
        )
}
