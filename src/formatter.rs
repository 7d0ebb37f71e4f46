//! Log line formatting with the simulation tick.
//!
//! Lines look like `12:04:31.50213 0x002A DEBUG ajaw::systems::golem: Golem hit entity=3v1 health=4`,
//! so that everything logged during the same tick can be grouped at a glance.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

static TICKS: AtomicU64 = AtomicU64::new(0);

/// Only the low 16 bits are printed.
const TICK_MASK: u64 = 0xFFFF;

const TIMESTAMP: &[FormatItem<'static>] = format_description!("[hour]:[minute]:[second].[subsecond digits:5]");

const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Counts one simulation tick. Called by [`Game::tick`](crate::game::Game::tick).
pub fn increment_tick() {
    TICKS.fetch_add(1, Ordering::Relaxed);
}

pub fn tick_count() -> u64 {
    TICKS.load(Ordering::Relaxed)
}

/// Formatter printing a timestamp and the current tick before the level, target and fields.
pub struct TickFormatter;

impl<S, N> FormatEvent<S, N> for TickFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
        let ansi = writer.has_ansi_escapes();
        let meta = event.metadata();
        let timestamp = OffsetDateTime::now_utc().format(&TIMESTAMP).map_err(|_| fmt::Error)?;
        let tick = tick_count() & TICK_MASK;

        if ansi {
            write!(writer, "{DIM}{timestamp} 0x{tick:04X}{RESET} ")?;
        } else {
            write!(writer, "{timestamp} 0x{tick:04X} ")?;
        }

        let (color, label) = level_style(meta.level());
        if ansi {
            write!(writer, "{color}{label:>5}{RESET} ")?;
        } else {
            write!(writer, "{label:>5} ")?;
        }

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, "{}:", span.name())?;
            }
            writer.write_char(' ')?;
        }

        if ansi {
            write!(writer, "{DIM}{}:{RESET} ", meta.target())?;
        } else {
            write!(writer, "{}: ", meta.target())?;
        }

        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn level_style(level: &Level) -> (&'static str, &'static str) {
    match *level {
        Level::TRACE => ("\x1b[35m", "TRACE"),
        Level::DEBUG => ("\x1b[34m", "DEBUG"),
        Level::INFO => ("\x1b[32m", "INFO"),
        Level::WARN => ("\x1b[33m", "WARN"),
        Level::ERROR => ("\x1b[31m", "ERROR"),
    }
}
