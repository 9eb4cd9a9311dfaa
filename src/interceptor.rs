//! Installs the fixture recorder into client configurations

use std::sync::Arc;

use crate::client::{ClientConfig, ConfigKind, InterceptingClient, ProtocolHandler};
use crate::config::Config;
use crate::recorder::FixtureRecorder;
use crate::recording::Registry;
use crate::transport::Transport;
use crate::Result;

/// Opt-in hook that puts one shared recorder in front of client transports
///
/// Every configuration produced or patched by the same interceptor shares
/// its recorder and therefore its registry.
#[derive(Clone)]
pub struct Interceptor {
    recorder: Arc<FixtureRecorder>,
}

impl Interceptor {
    /// Create an interceptor around a recorder
    #[must_use]
    pub fn new(recorder: FixtureRecorder) -> Self {
        Self {
            recorder: Arc::new(recorder),
        }
    }

    /// Create an interceptor with a fresh registry from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid
    pub fn from_config(config: &Config) -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Ok(Self::new(FixtureRecorder::from_config(config, registry)?))
    }

    /// Install the recorder into a configuration
    ///
    /// Idempotent: returns `false` if the recorder is already installed.
    pub fn install(&self, config: &mut ClientConfig) -> bool {
        config.install(Arc::clone(&self.recorder) as Arc<dyn ProtocolHandler>)
    }

    /// New configuration of the given kind with the recorder installed
    #[must_use]
    pub fn configuration(&self, kind: ConfigKind) -> ClientConfig {
        let mut config = ClientConfig::new(kind);
        self.install(&mut config);
        config
    }

    /// Wrap a transport in an intercepting client of the given kind
    pub fn client<T: Transport>(&self, kind: ConfigKind, transport: T) -> InterceptingClient {
        InterceptingClient::new(self.configuration(kind), transport)
    }

    /// Registry the recorder reports through
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        self.recorder.registry()
    }
}
