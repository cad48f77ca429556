//! InstallManager: Serialized create/update of the install identity.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::Utc;
use tracing::{debug, info, warn};

use hawk_core::{Backend, Install, InstallChanges, InstallId, InstallPhase};
use hawk_state::StateStore;

use crate::error::{InstallError, InstallResult};
use crate::gate::FifoGate;

/// Owner of the process's install identity.
///
/// The `Install` is only written while holding the gate, and only after
/// the backend call made under that gate has succeeded.
pub struct InstallManager {
    backend: Arc<dyn Backend>,
    gate: FifoGate,
    install: RwLock<Install>,
    store: Option<StateStore>,
    /// Attributes configured locally that the backend has not confirmed yet.
    unsent: Mutex<Option<InstallChanges>>,
}

/// Keeps `Install::pending` set while a create/update call is in flight,
/// including when the calling future is dropped mid-call.
struct PendingGuard<'a> {
    manager: &'a InstallManager,
}

impl<'a> PendingGuard<'a> {
    fn new(manager: &'a InstallManager) -> Self {
        manager.write().pending = true;
        Self { manager }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.manager.write().pending = false;
    }
}

impl InstallManager {
    /// Create a manager with an empty install for `app_key`.
    pub fn new(app_key: &str, backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            gate: FifoGate::new(),
            install: RwLock::new(Install::new(app_key)),
            store: None,
            unsent: Mutex::new(None),
        }
    }

    /// Report `version` as the client version from the first registration on.
    ///
    /// Call before [`with_store`](Self::with_store): a restored install whose
    /// version differs is updated by the next create/update operation.
    pub fn with_client_version(self, version: impl Into<String>) -> Self {
        self.write().client_version = Some(version.into());
        self
    }

    /// Persist the identified install to `store` and reload a previously
    /// identified one from it.
    ///
    /// A stored app key wins over the configured one. A configured client
    /// version wins over the stored one once the backend accepts it.
    pub fn with_store(mut self, store: StateStore) -> Self {
        let mut upgrade = None;
        match store.get_install() {
            Ok(Some(stored)) if stored.is_identified() => {
                let mut install = self.write();
                if stored.app_key != install.app_key {
                    warn!(
                        stored = %stored.app_key,
                        configured = %install.app_key,
                        "app key differs from the registered install, keeping the registered one"
                    );
                }
                if install.client_version.is_some() && install.client_version != stored.client_version {
                    info!(
                        stored = ?stored.client_version,
                        configured = ?install.client_version,
                        "client version changed since registration"
                    );
                    upgrade = Some(InstallChanges {
                        client_version: install.client_version.clone(),
                        ..Default::default()
                    });
                }
                info!(install_id = %stored.install_id, "restored install");
                *install = stored;
            }
            Ok(_) => debug!("no stored install"),
            Err(e) => warn!(error = %e, "failed to read stored install"),
        }
        self.unsent = Mutex::new(upgrade);
        self.store = Some(store);
        self
    }

    /// Snapshot of the current install.
    pub fn current(&self) -> Install {
        self.read().clone()
    }

    pub fn phase(&self) -> InstallPhase {
        self.read().phase()
    }

    pub fn install_id(&self) -> Option<InstallId> {
        let install = self.read();
        install.is_identified().then(|| install.install_id.clone())
    }

    /// Create/update calls waiting behind the one in flight.
    pub fn queued_operations(&self) -> usize {
        self.gate.queued()
    }

    /// Return the install id, registering the install first if needed.
    ///
    /// Concurrent callers queue on the gate; once the first one identifies
    /// the install, the rest return the stored id without a network call.
    /// Unsent local attributes are pushed on the way; a failure there is
    /// logged and retried by the next call.
    pub async fn ensure_install(&self) -> InstallResult<InstallId> {
        if let Some(id) = self.install_id()
            && !self.has_unsent()
        {
            return Ok(id);
        }

        let _permit = self.gate.acquire().await;
        let install_id = self.register_locked().await?;
        if let Some(changes) = self.take_unsent()
            && let Err(e) = self.update_locked(&install_id, &changes).await
        {
            debug!(%install_id, error = %e, "unsent install attributes kept for the next call");
            self.restore_unsent(changes);
        }
        Ok(install_id)
    }

    /// Apply `changes` to the install on the backend, then locally.
    ///
    /// An unidentified install is registered first, under the same gate hold.
    pub async fn update_install(&self, changes: InstallChanges) -> InstallResult<()> {
        let _permit = self.gate.acquire().await;
        let install_id = self.register_locked().await?;

        let unsent = self.take_unsent();
        let merged = match &unsent {
            Some(unsent) => changes.or(unsent),
            None => changes,
        };
        let result = self.update_locked(&install_id, &merged).await;
        if result.is_err()
            && let Some(unsent) = unsent
        {
            self.restore_unsent(unsent);
        }
        result
    }

    /// Register if still unidentified. Caller must hold the gate.
    async fn register_locked(&self) -> InstallResult<InstallId> {
        if let Some(id) = self.install_id() {
            return Ok(id);
        }

        let request = self.current().request();
        let result = {
            let _pending = PendingGuard::new(self);
            self.backend.register_install(&request).await
        };

        let install_id = match result {
            Ok(id) if id.trim().is_empty() => {
                warn!("server returned an empty install id");
                return Err(InstallError::EmptyInstallId);
            }
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "install registration failed");
                return Err(InstallError::Registration(e));
            }
        };

        let mut install = self.current();
        install.install_id = install_id.clone();
        install.last_update = Some(Utc::now());
        self.commit(install);
        info!(%install_id, "install registered");
        Ok(install_id)
    }

    /// Send `changes` for an identified install. Caller must hold the gate.
    async fn update_locked(&self, install_id: &str, changes: &InstallChanges) -> InstallResult<()> {
        let next = self.current().with_changes(changes);
        if next == self.current() {
            debug!(%install_id, "install unchanged, skipping update");
            return Ok(());
        }

        let result = {
            let _pending = PendingGuard::new(self);
            self.backend.update_install(install_id, &next.request()).await
        };

        if let Err(e) = result {
            warn!(%install_id, error = %e, "install update failed");
            return Err(InstallError::Update(e));
        }

        let mut updated = next;
        updated.last_update = Some(Utc::now());
        self.commit(updated);
        debug!(%install_id, "install updated");
        Ok(())
    }

    fn commit(&self, install: Install) {
        if let Some(store) = &self.store
            && let Err(e) = store.put_install(&install)
        {
            warn!(install_id = %install.install_id, error = %e, "failed to persist install");
        }
        *self.write() = install;
    }

    fn unsent(&self) -> MutexGuard<'_, Option<InstallChanges>> {
        self.unsent.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn has_unsent(&self) -> bool {
        self.unsent().is_some()
    }

    fn take_unsent(&self) -> Option<InstallChanges> {
        self.unsent().take()
    }

    /// Put back changes that failed to send, unless newer ones arrived.
    fn restore_unsent(&self, changes: InstallChanges) {
        self.unsent().get_or_insert(changes);
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Install> {
        self.install.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Install> {
        self.install.write().unwrap_or_else(PoisonError::into_inner)
    }
}
