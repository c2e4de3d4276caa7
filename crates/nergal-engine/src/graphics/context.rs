use std::fmt;

use super::backend::GraphicsBackend;
use super::command::CommandBuffer;
use super::config::GraphicsConfig;
use super::interpreter::{InterpreterCache, UniformScratch};
use super::registry::ResourceRegistry;
use crate::logging::WarnThrottle;

/// Owns the resource registry, the native backend and the interpreter state.
///
/// One context exists per process. It is passed explicitly to whatever records
/// or submits work; resource creation happens immediately through it, while
/// drawing goes through a [`CommandBuffer`] and [`GraphicsContext::submit`].
pub struct GraphicsContext<B: GraphicsBackend> {
    pub(super) backend: B,
    pub(super) registry: ResourceRegistry,
    pub(super) config: GraphicsConfig,
    pub(super) cache: InterpreterCache,
    pub(super) scratch: UniformScratch,
    pub(super) throttle: WarnThrottle,
    /// Set between a begin and an end render pass command.
    pub(super) in_pass: bool,
}

impl<B: GraphicsBackend> GraphicsContext<B> {
    pub fn new(backend: B, config: GraphicsConfig) -> Self {
        log::debug!("graphics context created ({config:?})");
        Self {
            backend,
            registry: ResourceRegistry::with_capacity(config.resources_per_kind),
            cache: InterpreterCache::default(),
            scratch: UniformScratch::default(),
            throttle: WarnThrottle::new(config.warn_interval),
            in_pass: false,
            config,
        }
    }

    /// A command buffer sized per `GraphicsConfig::command_buffer_capacity`.
    pub fn command_buffer(&self) -> CommandBuffer {
        CommandBuffer::with_capacity(self.config.command_buffer_capacity)
    }

    #[inline]
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    #[inline]
    pub fn config(&self) -> &GraphicsConfig {
        &self.config
    }

    /// Bound state as left by the last executed command.
    #[inline]
    pub fn cache(&self) -> &InterpreterCache {
        &self.cache
    }

}

impl<B: GraphicsBackend + fmt::Debug> fmt::Debug for GraphicsContext<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphicsContext")
            .field("backend", &self.backend)
            .field("config", &self.config)
            .field("cache", &self.cache)
            .field("in_pass", &self.in_pass)
            .finish_non_exhaustive()
    }
}

/// Logs a warning through a context's throttle unless `site` has warned recently.
///
/// Expands in the caller, so records carry the caller's module as their target.
macro_rules! warn_throttled {
    ($ctx:expr, $site:expr, $($arg:tt)+) => {{
        let site: &str = $site;
        if $ctx.throttle.should_emit(site) {
            log::warn!("{} [{} occurrence(s)]", format_args!($($arg)+), $ctx.throttle.hits(site));
        }
    }};
}

pub(crate) use warn_throttled;
