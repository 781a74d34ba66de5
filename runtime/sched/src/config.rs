//! Scheduler adapter configuration.

use std::sync::OnceLock;

/// Tuning for spawned tasks, installed once per process.
#[derive(Debug, Clone)]
pub struct SchedConfig {
    /// Prefix for spawned task thread names (`<prefix>-<task id>`).
    pub name_prefix: String,
    /// Stack size for spawned tasks; `None` uses the host default.
    pub stack_size: Option<usize>,
}

impl Default for SchedConfig {
    fn default() -> Self {
        Self {
            name_prefix: "weft-task".to_string(),
            stack_size: None,
        }
    }
}

static CONFIG: OnceLock<SchedConfig> = OnceLock::new();

/// Installs the scheduler configuration.
///
/// Must be called before the first `spawn`; returns false if a
/// configuration (or the default, forced by an earlier spawn) was already
/// installed.
pub fn configure(cfg: SchedConfig) -> bool {
    CONFIG.set(cfg).is_ok()
}

pub(crate) fn current() -> &'static SchedConfig {
    CONFIG.get_or_init(SchedConfig::default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_default_prefix() {
        assert_eq!(SchedConfig::default().name_prefix, "weft-task");
        assert_eq!(SchedConfig::default().stack_size, None);
    }

    #[test]
    fn test_configure_then_spawn() {
        // A sibling test may already have forced the default config, in
        // which case this install is a no-op; spawning must work either way.
        configure(SchedConfig {
            name_prefix: "weft-cfg".to_string(),
            stack_size: Some(256 * 1024),
        });

        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        crate::spawn(move || {
            flag.store(true, Ordering::SeqCst);
        });
        while !ran.load(Ordering::SeqCst) {
            std::thread::yield_now();
        }
    }
}
