//! Runtime configuration.

use strand_arena::StoreConfig;

/// Configuration for a [`Runtime`](crate::Runtime).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Sizing of the primary store (and the shadow store, when enabled).
    pub store: StoreConfig,
    /// Execute against a scratch mirror and merge dirty payloads back.
    ///
    /// Default: `false`.
    pub shadow: bool,
}

impl RuntimeConfig {
    /// Default configuration with shadow mode switched on.
    pub fn shadowed() -> Self {
        Self {
            shadow: true,
            ..Self::default()
        }
    }
}
