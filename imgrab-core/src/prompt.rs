// Interactive input acquisition

use crate::config::{DestinationDir, InputError, PageSource, PartialConfig, RunConfig};
use imgrab_scanner::DEFAULT_TIMEOUT_SECS;
use std::io::{BufRead, Write};
use tracing::debug;

pub const URL_PROMPT: &str = "Please enter a URL: ";
pub const URL_INVALID: &str = "Invalid URL, make sure URL is in the format 'http://'";
pub const DEST_PROMPT: &str = "Please enter directory to save images. ";
pub const DEST_INVALID: &str = "Invalid local path, please try again.";

/// Line-oriented prompts over any reader/writer pair.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_line(&mut self, prompt: &str) -> Result<String, InputError> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(InputError::InputClosed);
        }
        Ok(line.trim().to_string())
    }

    /// Ask until the answer is an `http://` URL.
    pub fn ask_page_source(&mut self) -> Result<PageSource, InputError> {
        loop {
            let answer = self.read_line(URL_PROMPT)?;
            match PageSource::parse(&answer) {
                Ok(page) => return Ok(page),
                Err(e) => {
                    debug!("Rejected page URL: {}", e);
                    writeln!(self.output, "{}", URL_INVALID)?;
                }
            }
        }
    }

    /// Ask until the answer is a directory that exists (or could be
    /// created) and is writable.
    pub fn ask_destination(&mut self) -> Result<DestinationDir, InputError> {
        loop {
            let answer = self.read_line(DEST_PROMPT)?;
            match DestinationDir::prepare(&answer) {
                Ok(dir) => return Ok(dir),
                Err(e) => {
                    debug!("Rejected destination directory: {}", e);
                    writeln!(self.output, "{}", DEST_INVALID)?;
                }
            }
        }
    }
}

/// Turn partial settings into a [`RunConfig`], prompting for whatever is
/// missing. Values supplied up front are validated once and not re-asked.
pub fn acquire_run_config<R: BufRead, W: Write>(
    partial: PartialConfig,
    prompter: &mut Prompter<R, W>,
) -> Result<RunConfig, InputError> {
    let missing_src = partial.missing_src_policy();

    let page = match partial.url.as_deref() {
        Some(url) => PageSource::parse(url)?,
        None => prompter.ask_page_source()?,
    };
    let destination = match partial.dest.as_deref() {
        Some(dest) => DestinationDir::prepare(dest)?,
        None => prompter.ask_destination()?,
    };

    Ok(RunConfig {
        page,
        destination,
        timeout_secs: partial.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        missing_src,
    })
}
