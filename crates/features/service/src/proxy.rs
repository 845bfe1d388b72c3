//! Proxy Service: a Service multiplexing named Client connections.
//!
//! Every Client is built by a Connector looked up in the [`Catalog`] and is owned by exactly one
//! Proxy Service. The Client collection sits behind one lock; Connector and Client calls run
//! under it, so operations on one Proxy Service never interleave.

use keystone_domain::constants::CONNECT_ON_CREATE;
use keystone_domain::named::{self, Named, NamedMap};
use keystone_domain::{Parameterized, Parameters, ProxyServiceConfig};
use keystone_kernel::{Catalog, Connector, Object, Output, ServiceRef};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{ServiceError, ServiceErrorExt};
use crate::lifecycle::{ServiceInstance, ServiceState};

#[derive(Debug)]
struct ClientEntry {
    name: String,
    connector_id: String,
    connector: Box<dyn Connector>,
}

impl Named for ClientEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn set_owner(&mut self, _owner: &str) {}
}

type Clients = Option<NamedMap<ClientEntry>>;

#[derive(Debug)]
pub struct ProxyService {
    instance: Arc<ServiceInstance>,
    catalog: Catalog,
    clients: Mutex<Clients>,
}

impl ProxyService {
    /// Wraps a live Service instance. The instance keeps its lifecycle state.
    #[must_use]
    pub fn new(instance: Arc<ServiceInstance>, catalog: Catalog) -> Self {
        Self { instance, catalog, clients: Mutex::new(None) }
    }

    /// In-place promotion of a plain Service: same instance, empty Client collection.
    #[must_use]
    pub fn promote(instance: Arc<ServiceInstance>, catalog: Catalog) -> Self {
        info!(service = %instance.name(), "Promoting service to proxy service");
        Self::new(instance, catalog)
    }

    /// Wraps `instance` and creates every configured Client in order.
    ///
    /// # Errors
    /// The first Client that cannot be created aborts the sequence. The Clients created so far
    /// are removed and the instance is closed before the error is returned.
    pub fn with_clients(
        instance: Arc<ServiceInstance>,
        catalog: Catalog,
        config: &ProxyServiceConfig,
    ) -> Result<Self, ServiceError> {
        let proxy = Self::new(instance, catalog);
        for client in config.clients().into_iter().flatten() {
            if let Err(err) = proxy.create_client(client.name(), &client.connector, client.parameters()) {
                proxy.abandon(&err);
                return Err(err);
            }
        }
        Ok(proxy)
    }

    fn abandon(&self, cause: &ServiceError) {
        warn!(service = %self.instance.name(), error = %cause, "Proxy service construction failed, closing");
        if let Err(err) = self.close() {
            warn!(service = %self.instance.name(), error = %err, "Cleanup of partial proxy service failed");
        }
    }

    #[must_use]
    pub const fn instance(&self) -> &Arc<ServiceInstance> {
        &self.instance
    }

    #[must_use]
    pub fn name(&self) -> String {
        self.instance.name()
    }

    #[must_use]
    pub fn state(&self) -> ServiceState {
        self.instance.state()
    }

    fn label(&self) -> String {
        format!("service '{}'", self.instance.name())
    }

    fn client_label(&self, client: &str) -> String {
        format!("service '{}', client '{client}'", self.instance.name())
    }

    fn ensure_open(&self) -> Result<(), ServiceError> {
        if self.instance.state() == ServiceState::Closed {
            return Err(ServiceError::InvalidState {
                message: "service is closed".into(),
                context: Some(self.label().into()),
            });
        }
        Ok(())
    }

    /// Creates a Client through the Connector registered as `connector_id`.
    ///
    /// The Client is registered before an optional `connect-on-create` connect; a failing
    /// connect surfaces its error and leaves the Client registered, disconnected.
    ///
    /// # Errors
    /// * [`ServiceError::ClientExists`] if `name` is taken (nothing changes).
    /// * [`ServiceError::UnknownConnector`] if the catalog has no such connector.
    /// * [`ServiceError::Connector`] for init or connect failures.
    pub fn create_client(
        &self,
        name: &str,
        connector_id: &str,
        parameters: Option<&Parameters>,
    ) -> Result<(), ServiceError> {
        if name.is_empty() {
            return Err(ServiceError::invalid(crate::dispatch::keys::CLIENT_NAME));
        }
        self.ensure_open()?;

        let mut clients = self.clients.lock();
        if clients.as_ref().is_some_and(|c| c.contains(name)) {
            return Err(ServiceError::ClientExists {
                message: name.to_owned().into(),
                context: Some(self.label().into()),
            });
        }

        let factory = self.catalog.connector(connector_id).ok_or_else(|| {
            ServiceError::UnknownConnector {
                message: connector_id.to_owned().into(),
                context: Some(self.client_label(name).into()),
            }
        })?;

        let service_name = self.instance.name();
        let scope_name = self.instance.scope_name().unwrap_or_default();
        let service = ServiceRef { scope: &scope_name, name: &service_name };
        let connector =
            factory.init(service, name, parameters).context(self.client_label(name))?;
        if connector.client_name() != name {
            warn!(
                service = %service_name,
                client = %name,
                reported = %connector.client_name(),
                "Connector reports a different client name"
            );
        }

        named::insert_into(
            &mut *clients,
            ClientEntry { name: name.to_owned(), connector_id: connector_id.to_owned(), connector },
        );
        info!(service = %service_name, client = %name, connector = %connector_id, "Client created");

        if parameters.is_some_and(|p| p.flag(CONNECT_ON_CREATE)) {
            let entry = clients.as_mut().and_then(|c| c.get_mut(name)).ok_or_else(|| {
                ServiceError::Internal {
                    message: "client vanished after insert".into(),
                    context: Some(self.client_label(name).into()),
                }
            })?;
            entry.connector.client_mut().connect().context(self.client_label(name))?;
            debug!(service = %service_name, client = %name, "Client connected on create");
        }
        Ok(())
    }

    /// Disconnects (if connected), destroys and removes a Client.
    ///
    /// An unknown name is logged and ignored. A failing disconnect or destroy keeps the Client
    /// registered.
    ///
    /// # Errors
    /// Returns the Connector failure.
    pub fn remove_client(&self, name: &str) -> Result<(), ServiceError> {
        let mut clients = self.clients.lock();
        self.remove_locked(&mut *clients, name)
    }

    fn remove_locked(&self, clients: &mut Clients, name: &str) -> Result<(), ServiceError> {
        let Some(entry) = clients.as_mut().and_then(|c| c.get_mut(name)) else {
            warn!(service = %self.instance.name(), client = %name, "Remove of unknown client ignored");
            return Ok(());
        };

        let client = entry.connector.client_mut();
        if client.is_connected() {
            client.disconnect().context(self.client_label(name))?;
        }
        client.destroy().context(self.client_label(name))?;

        named::remove_from(clients, name);
        info!(service = %self.instance.name(), client = %name, "Client removed");
        Ok(())
    }

    /// Removes every Client in insertion order, stopping at the first failure.
    ///
    /// # Errors
    /// Returns the first failure; that Client and every later one stay registered.
    pub fn remove_all_clients(&self) -> Result<(), ServiceError> {
        let mut clients = self.clients.lock();
        for name in Self::names_locked(&*clients) {
            self.remove_locked(&mut *clients, &name)?;
        }
        Ok(())
    }

    /// # Errors
    /// [`ServiceError::ClientNotFound`] for an unknown name, or the Connector failure.
    pub fn connect(&self, name: &str) -> Result<(), ServiceError> {
        self.ensure_open()?;
        let mut clients = self.clients.lock();
        let entry = clients
            .as_mut()
            .and_then(|c| c.get_mut(name))
            .ok_or_else(|| ServiceError::client_not_found(name, self.label()))?;
        entry.connector.client_mut().connect().context(self.client_label(name))
    }

    /// Disconnects a connected Client. An unknown name is logged and ignored.
    ///
    /// # Errors
    /// Returns the Connector failure.
    pub fn disconnect(&self, name: &str) -> Result<(), ServiceError> {
        let mut clients = self.clients.lock();
        let Some(entry) = clients.as_mut().and_then(|c| c.get_mut(name)) else {
            warn!(service = %self.instance.name(), client = %name, "Disconnect of unknown client ignored");
            return Ok(());
        };
        let client = entry.connector.client_mut();
        if client.is_connected() {
            client.disconnect().context(self.client_label(name))?;
        }
        Ok(())
    }

    /// Disconnects connected Clients in order, stopping at the first failure.
    ///
    /// # Errors
    /// Returns the first Connector failure.
    pub fn disconnect_all(&self) -> Result<(), ServiceError> {
        let mut clients = self.clients.lock();
        for entry in clients.iter_mut().flat_map(NamedMap::iter_mut) {
            let client = entry.connector.client_mut();
            if client.is_connected() {
                client.disconnect().context(self.client_label(&entry.name))?;
            }
        }
        Ok(())
    }

    /// # Errors
    /// [`ServiceError::ClientNotFound`] for an unknown name.
    pub fn is_connected(&self, name: &str) -> Result<bool, ServiceError> {
        self.with_client(name, |entry| Ok(entry.connector.client().is_connected()))
    }

    #[must_use]
    pub fn has_client(&self, name: &str) -> bool {
        self.clients.lock().as_ref().is_some_and(|c| c.contains(name))
    }

    /// Compares the Client's kind with `kind`.
    ///
    /// # Errors
    /// [`ServiceError::ClientNotFound`] for an unknown name.
    pub fn is_client_type(&self, name: &str, kind: &str) -> Result<bool, ServiceError> {
        self.with_client(name, |entry| Ok(entry.connector.client().kind() == kind))
    }

    /// Connector id the Client was created with.
    #[must_use]
    pub fn connector_id(&self, name: &str) -> Option<String> {
        self.clients.lock().as_ref().and_then(|c| c.get(name)).map(|e| e.connector_id.clone())
    }

    /// Client names in insertion order.
    #[must_use]
    pub fn client_names(&self) -> Vec<String> {
        Self::names_locked(&*self.clients.lock())
    }

    /// The Client's underlying connection handle.
    ///
    /// # Errors
    /// [`ServiceError::ClientNotFound`] for an unknown name;
    /// [`ServiceError::UnsupportedCapability`] when the Client exposes no connection.
    pub fn connection(&self, name: &str) -> Result<Object, ServiceError> {
        self.with_client(name, |entry| {
            entry.connector.client().connection().ok_or_else(|| {
                ServiceError::UnsupportedCapability {
                    message: "client exposes no connection".into(),
                    context: Some(self.client_label(name).into()),
                }
            })
        })
    }

    /// Removes every Client, then runs the Service's own shutdown.
    ///
    /// # Errors
    /// A Client removal failure aborts the close before the shutdown hook runs.
    pub fn close(&self) -> Result<(), ServiceError> {
        self.remove_all_clients()?;
        self.instance.close()
    }

    /// String-addressed entry point; see [`crate::dispatch`].
    ///
    /// # Errors
    /// Validation failures, the typed operation's failure, or the behaviour's failure for
    /// operations this layer does not know.
    pub fn execute(&self, operation: &str, parameters: &Parameters) -> Result<Output, ServiceError> {
        match crate::dispatch::Operation::parse(operation, parameters)? {
            Some(op) => op.apply(self),
            None => self.instance.execute(operation, parameters),
        }
    }

    fn with_client<T>(
        &self,
        name: &str,
        f: impl FnOnce(&ClientEntry) -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let clients = self.clients.lock();
        let entry = clients
            .as_ref()
            .and_then(|c| c.get(name))
            .ok_or_else(|| ServiceError::client_not_found(name, self.label()))?;
        f(entry)
    }

    fn names_locked(clients: &Clients) -> Vec<String> {
        clients.iter().flat_map(NamedMap::iter).map(|e| e.name.clone()).collect()
    }
}
