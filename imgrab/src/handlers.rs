use anyhow::{Context, bail};
use clap::ArgMatches;
use colored::Colorize;
use imgrab_core::{
    FileConfig, InputError, PartialConfig, Prompter, ReportFormat, RunConfig, RunOptions,
    RunReport, acquire_run_config, execute_run, outcome_line, render_report,
};
use imgrab_scanner::DownloadResult;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const VERBOSE_DIRECTIVES: &str = "warn,imgrab=debug,imgrab_core=debug,imgrab_scanner=debug";

/// Install the stderr log subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_logging(verbose: bool) {
    let default_directives = if verbose { VERBOSE_DIRECTIVES } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    // A subscriber may already be installed (tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Collect flag values, then fill gaps from the config file if one was given.
pub fn partial_config_from_args(args: &ArgMatches) -> Result<PartialConfig, InputError> {
    let flags = PartialConfig {
        url: args.get_one::<String>("url").cloned(),
        dest: args.get_one::<String>("dest").cloned(),
        timeout_secs: args.get_one::<u64>("timeout").copied(),
        skip_missing_src: args.get_flag("skip-missing-src"),
    };

    match args.get_one::<PathBuf>("config") {
        Some(config_path) => {
            let expanded = expand_path(config_path);
            debug!("Loading config file {}", expanded.display());
            Ok(flags.merge_file(FileConfig::load(&expanded)?))
        }
        None => Ok(flags),
    }
}

fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
}

pub fn report_format(args: &ArgMatches) -> ReportFormat {
    args.get_one::<String>("format")
        .and_then(|name| ReportFormat::from_name(name))
        .unwrap_or(ReportFormat::Text)
}

/// Status and outcome lines move to stderr when stdout carries the JSON report.
pub fn console_lines_to_stderr(format: ReportFormat) -> bool {
    format == ReportFormat::Json
}

fn print_console_line(line: String, to_stderr: bool) {
    if to_stderr {
        eprintln!("{}", line);
    } else {
        println!("{}", line);
    }
}

pub fn print_outcome(result: &DownloadResult, to_stderr: bool) {
    let marker = if result.is_success() {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    print_console_line(format!("{} {}", marker, outcome_line(result)), to_stderr);
}

/// Write the end-of-run report. `quiet` drops the text report; the JSON
/// report is always written and is the only thing written.
pub fn write_report<W: Write>(
    out: &mut W,
    report: &RunReport,
    format: ReportFormat,
    quiet: bool,
) -> io::Result<()> {
    match format {
        ReportFormat::Json => writeln!(out, "{}", render_report(report, format)),
        ReportFormat::Text if quiet => Ok(()),
        ReportFormat::Text => write!(out, "\n{}", render_report(report, format)),
    }
}

fn acquire_config(args: &ArgMatches, format: ReportFormat) -> anyhow::Result<RunConfig> {
    let partial = partial_config_from_args(args)?;

    if args.get_flag("no-prompt") {
        return Ok(partial.into_run_config()?);
    }

    // Keep stdout clean for the JSON report
    let prompt_output: Box<dyn Write> = if console_lines_to_stderr(format) {
        Box::new(io::stderr())
    } else {
        Box::new(io::stdout())
    };
    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), prompt_output);
    match acquire_run_config(partial, &mut prompter) {
        Ok(config) => Ok(config),
        Err(InputError::InputClosed) => {
            bail!("Input closed before a URL and destination were provided")
        }
        Err(e) => Err(e.into()),
    }
}

/// Acquire input, run the pipeline and print the report.
pub async fn handle_run(args: &ArgMatches) -> anyhow::Result<()> {
    let quiet = args.get_flag("quiet");
    let format = report_format(args);

    let config = acquire_config(args, format)?;
    let page = config.page.to_string();

    let options = RunOptions {
        config,
        show_progress_bars: !quiet,
    };

    let to_stderr = console_lines_to_stderr(format);
    let progress_callback = Arc::new(move |msg: String| {
        print_console_line(format!("{} {}", "→".blue(), msg), to_stderr);
    });
    let result_callback =
        Arc::new(move |result: &DownloadResult| print_outcome(result, to_stderr));

    let report = execute_run(options, Some(progress_callback), Some(result_callback))
        .await
        .with_context(|| format!("Run against {} failed", page))?;

    let stdout = io::stdout();
    write_report(&mut stdout.lock(), &report, format, quiet)
        .context("Failed to write the run report")?;

    Ok(())
}
