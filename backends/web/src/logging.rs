//! Tracing and panic output routed to the browser console.

use core::fmt::{self, Write as _};
use std::str::FromStr;
use std::sync::Once;

use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::prelude::*;
use wasm_bindgen::JsValue;

const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::INFO;

static INSTALLED: Once = Once::new();

/// Installs the console subscriber at `info` level (idempotent).
pub fn init() {
    init_with_level("info");
}

/// Installs the console subscriber with the given level filter (idempotent).
///
/// Unparseable levels fall back to `info`.
pub fn init_with_level(level: &str) {
    INSTALLED.call_once(|| {
        console_error_panic_hook::set_once();
        let level = LevelFilter::from_str(level).unwrap_or(DEFAULT_LOG_LEVEL);
        if tracing_subscriber::registry()
            .with(ConsoleLayer { level })
            .try_init()
            .is_err()
        {
            web_sys::console::warn_1(&JsValue::from_str(
                "weft: a global tracing subscriber is already installed",
            ));
        }
    });
}

// ============================================================================
// Tracing Layer
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct ConsoleLayer {
    level: LevelFilter,
}

impl<S> Layer<S> for ConsoleLayer
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !level_allows(self.level, *metadata.level()) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let line = JsValue::from_str(&format!(
            "{} {}: {}{}",
            metadata.level(),
            metadata.target(),
            visitor.message.unwrap_or_default(),
            visitor.fields
        ));

        match *metadata.level() {
            Level::ERROR => web_sys::console::error_1(&line),
            Level::WARN => web_sys::console::warn_1(&line),
            Level::INFO => web_sys::console::info_1(&line),
            Level::DEBUG => web_sys::console::log_1(&line),
            Level::TRACE => web_sys::console::debug_1(&line),
        }
    }
}

const fn level_allows(filter: LevelFilter, level: Level) -> bool {
    match filter {
        LevelFilter::OFF => false,
        LevelFilter::ERROR => matches!(level, Level::ERROR),
        LevelFilter::WARN => matches!(level, Level::ERROR | Level::WARN),
        LevelFilter::INFO => matches!(level, Level::ERROR | Level::WARN | Level::INFO),
        LevelFilter::DEBUG => matches!(
            level,
            Level::ERROR | Level::WARN | Level::INFO | Level::DEBUG
        ),
        LevelFilter::TRACE => true,
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
    fields: String,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        } else {
            let _ = write!(self.fields, " {}={value:?}", field.name());
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            let _ = write!(self.fields, " {}={value}", field.name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_filter_is_inclusive() {
        assert!(level_allows(LevelFilter::INFO, Level::WARN));
        assert!(level_allows(LevelFilter::INFO, Level::INFO));
        assert!(!level_allows(LevelFilter::INFO, Level::DEBUG));
        assert!(!level_allows(LevelFilter::OFF, Level::ERROR));
    }
}
