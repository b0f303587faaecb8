//! Internal logging helpers for structured granule events.

/// Single logging target for granule.
pub(crate) const LOG_TARGET: &str = "granule";

macro_rules! granule_log {
    ($level:expr, $event:expr, $fmt:expr $(, $args:expr)* $(,)?) => {{
        if log::log_enabled!(target: crate::logging::LOG_TARGET, $level) {
            log::log!(
                target: crate::logging::LOG_TARGET,
                $level,
                "event={} {}",
                $event,
                format_args!($fmt $(, $args)*)
            );
        }
    }};
}

pub(crate) use granule_log;
