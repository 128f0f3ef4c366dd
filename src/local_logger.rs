use std::{
    env,
    sync::{Arc, Mutex},
    time::Duration,
};

use console::{Style, style};
use indicatif::{ProgressBar, ProgressStyle};
use lazy_static::lazy_static;
use log::Log;
use simplelog::{CombinedLogger, SharedLogger};
use std::io::Write;

use crate::logger::{GroupEvent, get_group_event};

/// Environment variable holding the log level filter, e.g. `debug`.
pub const LOG_LEVEL_ENV: &str = "MAPPING_UPLOAD_LOG";
const ACCENT_COLOR_CODE: u8 = 75; // #5FAFFF

lazy_static! {
    static ref SPINNER: Arc<Mutex<Option<ProgressBar>>> = Arc::new(Mutex::new(None));
    static ref IS_TTY: bool = std::io::IsTerminal::is_terminal(&std::io::stdout());
}

/// Hide the spinner temporarily, execute `f`, then redraw it.
fn suspend_progress_bar<F: FnOnce() -> R, R>(f: F) -> R {
    if *IS_TTY {
        if let Ok(mut spinner) = SPINNER.lock() {
            if let Some(spinner) = spinner.as_mut() {
                return spinner.suspend(f);
            }
        }
    }

    f()
}

pub struct LocalLogger {
    log_level: log::LevelFilter,
}

impl LocalLogger {
    pub fn new() -> Self {
        let log_level = env::var(LOG_LEVEL_ENV)
            .ok()
            .and_then(|log_level| log_level.parse::<log::LevelFilter>().ok())
            .unwrap_or(log::LevelFilter::Info);

        LocalLogger { log_level }
    }
}

impl Default for LocalLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Log for LocalLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.log_level
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        if let Some(group_event) = get_group_event(record) {
            match group_event {
                GroupEvent::Start(name) => start_spinner(&name),
                GroupEvent::End => finish_spinner(),
            }
            return;
        }

        suspend_progress_bar(|| print_record(record));
    }

    fn flush(&self) {
        // Best effort: there is nowhere left to report a broken stdout.
        let _ = std::io::stdout().flush();
    }
}

fn start_spinner(name: &str) {
    println!(
        "{}",
        style(format!("►►► {name} ")).bold().color256(ACCENT_COLOR_CODE)
    );

    if !*IS_TTY {
        return;
    }

    let template = format!(
        "  {{spinner:>.{ACCENT_COLOR_CODE}}} {{wide_msg:.{ACCENT_COLOR_CODE}.bold}}"
    );
    let spinner = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::with_template(&template) {
        spinner.set_style(spinner_style);
    }
    spinner.set_message(format!("{name}..."));
    spinner.enable_steady_tick(Duration::from_millis(100));
    if let Ok(mut current) = SPINNER.lock() {
        if let Some(previous) = current.replace(spinner) {
            previous.finish_and_clear();
        }
    }
}

fn finish_spinner() {
    if let Ok(mut spinner) = SPINNER.lock() {
        if let Some(spinner) = spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

/// Print a log record to the console with the appropriate style
fn print_record(record: &log::Record) {
    let error_style = Style::new().red();
    let info_style = Style::new().white();
    let warn_style = Style::new().yellow();
    let debug_style = Style::new().blue().dim();
    let trace_style = Style::new().black().dim();

    match record.level() {
        log::Level::Error => eprintln!("{}", error_style.apply_to(record.args())),
        log::Level::Warn => eprintln!("{}", warn_style.apply_to(record.args())),
        log::Level::Info => println!("{}", info_style.apply_to(record.args())),
        log::Level::Debug => println!(
            "{}",
            debug_style.apply_to(format!("[DEBUG::{}] {}", record.target(), record.args())),
        ),
        log::Level::Trace => println!(
            "{}",
            trace_style.apply_to(format!("[TRACE::{}] {}", record.target(), record.args()))
        ),
    }
}

impl SharedLogger for LocalLogger {
    fn level(&self) -> log::LevelFilter {
        self.log_level
    }

    fn config(&self) -> Option<&simplelog::Config> {
        None
    }

    fn as_log(self: Box<Self>) -> Box<dyn Log> {
        Box::new(*self)
    }
}

pub fn init_local_logger() -> anyhow::Result<()> {
    let logger: Box<dyn SharedLogger> = Box::new(LocalLogger::new());
    CombinedLogger::init(vec![logger])?;
    Ok(())
}

/// Clear any spinner left behind by a group that was interrupted by an error.
pub fn clean_logger() {
    finish_spinner();
}
