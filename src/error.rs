use thiserror::Error;

/// Plan-shape errors raised before any phase executes. Transport failures
/// during a run are never surfaced here; they land in the statistics.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("a `target` is required for single-target execution")]
    MissingTarget,

    #[error("`targets` (old and latest) are required for duet execution")]
    MissingTargets,

    #[error("exactly one of `target` or `targets` may be set")]
    AmbiguousMode,

    #[error("either `target` or `targets` must be set")]
    NoTargets,

    #[error("at least one scenario is required")]
    NoScenarios,
}
