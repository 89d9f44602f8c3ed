use crate::clients::RentARoomClient;
use crate::coordinator::RentARoom;
use crate::framework::{ask, Addr, FrameworkError, Registry};
use crate::lifecycle::Config;
use crate::messages::RootCommand;
use std::time::Duration;
use tracing::info;

/// The running rental system.
///
/// `RentARoomSystem` is responsible for:
/// - **Startup**: creating the registry and the root coordinator with its initial brokers
/// - **Access**: handing out the [`RentARoomClient`] every request goes through
/// - **Shutdown**: stopping brokers, hotels, sagas and the root in order
///
/// # Example
///
/// ```ignore
/// let system = RentARoomSystem::start(Config::default());
/// let created = system.client.create_hotel("Ritz", 10).await?;
/// println!("{created}");
/// system.shutdown().await?;
/// ```
pub struct RentARoomSystem {
    /// Request/response access to the root coordinator.
    pub client: RentARoomClient,
    root: Addr<RootCommand>,
    registry: Registry,
    timeout: Duration,
}

impl RentARoomSystem {
    pub fn start(config: Config) -> Self {
        info!(
            brokers = config.brokers,
            ask_timeout_ms = config.ask_timeout_ms,
            "Starting rent-a-room system"
        );
        if let Some(port) = config.remote_port {
            info!(port, "Remoting port configured");
        }

        let registry = Registry::new(config.registry_buffer);
        let root = RentARoom::start(registry.clone(), config.brokers);
        let client = RentARoomClient::new(root.clone(), config.ask_timeout());
        Self {
            client,
            root,
            registry,
            timeout: config.ask_timeout(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Stops every actor and waits until the root has stopped.
    pub async fn shutdown(self) -> Result<(), FrameworkError> {
        info!("Shutting down system...");
        ask(&self.root, |done| RootCommand::Shutdown { done }, self.timeout).await?;
        self.root.closed().await;
        info!("System shutdown complete.");
        Ok(())
    }
}
