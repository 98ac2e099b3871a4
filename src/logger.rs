use eyre::{Result, WrapErr};
use slog::Drain;
use slog_atomic::{AtomicSwitch, AtomicSwitchCtrl};
use slog_term::{CompactFormat, TermDecorator};
use std::io;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};
use time::OffsetDateTime;

use slog::*;

use crate::helpers::datetime::Timezone;

pub const DEFAULT_LOG_LEVEL: u8 = 3;

pub struct Logger {
    log_level: AtomicU8,
    logger: slog::Logger,
    ctrl: AtomicSwitchCtrl,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_LEVEL)
    }
}

fn new_drain(level: Level) -> Fuse<Mutex<Fuse<LevelFilter<CompactFormat<TermDecorator>>>>> {
    // stderr, stdout is reserved for command output
    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::CompactFormat::new(decorator)
        .use_custom_timestamp(|w: &mut dyn io::Write| {
            write!(
                w,
                "{}",
                OffsetDateTime::now_utc()
                    .to_localtime()
                    .to_formatted_string()
            )
        })
        .build()
        .filter_level(level)
        .fuse();
    Mutex::new(drain).fuse()
}

fn level_from_u8(log_level: u8) -> Level {
    match log_level {
        0 => Level::Critical,
        1 => Level::Error,
        2 => Level::Warning,
        3 => Level::Info,
        4 => Level::Debug,
        5 => Level::Trace,
        _ => Level::Debug,
    }
}

fn drain_from_log_level(log_level: u8) -> AtomicSwitch {
    AtomicSwitch::new(new_drain(level_from_u8(log_level)))
}

impl Logger {
    pub fn new(log_level: u8) -> Self {
        let drain = drain_from_log_level(log_level);
        let ctrl = drain.ctrl();
        let logger = slog::Logger::root(drain, slog::o!("version" => env!("CARGO_PKG_VERSION")));
        Logger {
            log_level: AtomicU8::new(log_level),
            logger,
            ctrl,
        }
    }

    /// Routes the `log` facade (used by the library) into this logger
    pub fn set_global(&self) -> Result<&Self> {
        // slog_stdlog uses the logger from slog_scope, so set a logger there
        let guard = slog_scope::set_global_logger(self.logger.clone());
        // https://github.com/slog-rs/slog/issues/249
        guard.cancel_reset();
        // Let everything through, the drain does the filtering
        slog_stdlog::init_with_level(log::Level::Trace).wrap_err("log facade already set")?;
        Ok(self)
    }

    pub fn set_log_level(&self, log_level: u8) -> &Self {
        self.ctrl.set(drain_from_log_level(log_level));
        self.log_level.store(log_level, Ordering::Relaxed);
        self
    }

    pub fn log_level(&self) -> u8 {
        self.log_level.load(Ordering::Relaxed)
    }
}
