//! HawkApp: The process-wide coordinator context.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use hawk_core::{
    Backend, CompletionToken, EventAction, Feedback, FetchResult, FriendlyName, HawkConfig,
    InstallChanges, InstallId,
};
use hawk_deeplink::{DeepLinkResolver, FriendlyNameRegistry};
use hawk_install::InstallManager;
use hawk_router::{
    LoggingPresenter, NotificationContext, NotificationRouter, OpenUrlHandler, Presenter,
    RouteOutcome,
};
use hawk_scheduler::{
    Clock, LocationSource, NoLocation, RegularTaskScheduler, SystemClock, TaskIntervals,
};
use hawk_state::StateStore;
use hawk_transport::{
    EventQueue, FeedbackSender, HttpBackend, QueueConfig, QueueStats, TransportError,
};

use crate::error::{HawkError, HawkResult};

/// Collaborators for a [`HawkApp`]. Anything not supplied falls back to a
/// default built from the configuration.
pub struct HawkAppBuilder {
    config: HawkConfig,
    backend: Option<Arc<dyn Backend>>,
    presenter: Option<Arc<dyn Presenter>>,
    location: Arc<dyn LocationSource>,
    clock: Arc<dyn Clock>,
    store: Option<StateStore>,
    open_url_handler: Option<OpenUrlHandler>,
}

impl HawkAppBuilder {
    /// Use `backend` instead of an `HttpBackend` built from `[server]`.
    pub fn backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn presenter(mut self, presenter: Arc<dyn Presenter>) -> Self {
        self.presenter = Some(presenter);
        self
    }

    pub fn location(mut self, location: Arc<dyn LocationSource>) -> Self {
        self.location = location;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use `store` instead of opening `[state] path`.
    pub fn store(mut self, store: StateStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn open_url_handler(mut self, handler: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.open_url_handler = Some(Arc::new(handler));
        self
    }

    /// Wire the components and start the transport worker.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(self) -> HawkResult<HawkApp> {
        let config = self.config;
        let app_key = config.app.app_key.trim().to_string();
        if app_key.is_empty() {
            return Err(HawkError::Config("app.app_key cannot be empty".into()));
        }

        let backend: Arc<dyn Backend> = match self.backend {
            Some(backend) => backend,
            None => Arc::new(HttpBackend::from_config(&config).ok_or_else(|| {
                HawkError::Config("no [server] section and no backend supplied".into())
            })?),
        };

        let store = match self.store {
            Some(store) => Some(store),
            None => config.state_path().map(StateStore::open).transpose()?,
        };

        let mut install = InstallManager::new(&app_key, backend.clone());
        if let Some(version) = &config.app.client_version {
            install = install.with_client_version(version.clone());
        }
        if let Some(store) = &store {
            install = install.with_store(store.clone());
        }
        let install = Arc::new(install);
        let feedback = Arc::new(FeedbackSender::new(install.clone(), backend.clone()));

        let queue = Arc::new(EventQueue::start(
            QueueConfig::from_config(&config),
            install.clone(),
            backend,
        ));

        let mut scheduler = RegularTaskScheduler::new(
            TaskIntervals::from_config(&config),
            queue.clone(),
            self.location,
            self.clock.clone(),
        );
        if let Some(store) = store {
            scheduler = scheduler.with_store(store);
        }

        let registry = Arc::new(FriendlyNameRegistry::new());
        let resolver = Arc::new(DeepLinkResolver::from_config(registry.clone(), &config));
        let presenter = self
            .presenter
            .unwrap_or_else(|| Arc::new(LoggingPresenter));
        let mut router =
            NotificationRouter::new(resolver.clone(), presenter.clone(), queue.clone(), feedback.clone());
        if let Some(handler) = &self.open_url_handler {
            router = router.with_open_url_handler(handler.clone());
        }

        info!(
            %app_key,
            install_id = ?install.install_id(),
            "hawk app started"
        );

        Ok(HawkApp {
            config,
            install,
            queue,
            scheduler: Arc::new(scheduler),
            registry,
            resolver,
            router,
            presenter,
            feedback,
            clock: self.clock,
            open_url_handler: self.open_url_handler,
            current_page: Mutex::new(None),
            tick: Mutex::new(None),
        })
    }
}

struct TickLoop {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// One coordinator per process. Tests build a fresh one each.
pub struct HawkApp {
    config: HawkConfig,
    install: Arc<InstallManager>,
    queue: Arc<EventQueue>,
    scheduler: Arc<RegularTaskScheduler>,
    registry: Arc<FriendlyNameRegistry>,
    resolver: Arc<DeepLinkResolver>,
    router: NotificationRouter,
    presenter: Arc<dyn Presenter>,
    feedback: Arc<FeedbackSender>,
    clock: Arc<dyn Clock>,
    open_url_handler: Option<OpenUrlHandler>,
    current_page: Mutex<Option<String>>,
    tick: Mutex<Option<TickLoop>>,
}

impl HawkApp {
    pub fn builder(config: HawkConfig) -> HawkAppBuilder {
        HawkAppBuilder {
            config,
            backend: None,
            presenter: None,
            location: Arc::new(NoLocation),
            clock: Arc::new(SystemClock),
            store: None,
            open_url_handler: None,
        }
    }

    pub fn config(&self) -> &HawkConfig {
        &self.config
    }

    // ── Install ────────────────────────────────────────────────────

    pub fn install_id(&self) -> Option<InstallId> {
        self.install.install_id()
    }

    /// Register the install now instead of on the first delivery.
    pub async fn ensure_install(&self) -> HawkResult<InstallId> {
        Ok(self.install.ensure_install().await?)
    }

    pub async fn set_push_token(&self, token: impl Into<String>) -> HawkResult<()> {
        Ok(self
            .install
            .update_install(InstallChanges::push_token(token))
            .await?)
    }

    pub async fn set_advertising_id(&self, id: impl Into<String>) -> HawkResult<()> {
        Ok(self
            .install
            .update_install(InstallChanges::advertising_id(id))
            .await?)
    }

    /// Send user feedback now, registering the install first if needed.
    pub async fn send_feedback(
        &self,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> HawkResult<()> {
        self.feedback.send(&Feedback::new(title, content)).await?;
        Ok(())
    }

    // ── Tags ───────────────────────────────────────────────────────

    pub fn tag_string(&self, value: impl Into<String>, key: impl Into<String>) -> bool {
        self.submit(EventAction::TagString {
            key: key.into(),
            value: value.into(),
        })
    }

    pub fn tag_numeric(&self, value: f64, key: impl Into<String>) -> bool {
        self.submit(EventAction::TagNumeric {
            key: key.into(),
            value,
        })
    }

    pub fn tag_datetime(&self, value: DateTime<Utc>, key: impl Into<String>) -> bool {
        self.submit(EventAction::TagDatetime {
            key: key.into(),
            value,
        })
    }

    pub fn remove_tag(&self, key: impl Into<String>) -> bool {
        self.submit(EventAction::RemoveTag { key: key.into() })
    }

    pub fn increment_tag(&self, key: impl Into<String>) -> bool {
        self.submit(EventAction::IncrementTag { key: key.into() })
    }

    // ── Page trace ─────────────────────────────────────────────────

    /// Record entering `page`. An earlier page that was never exited gets
    /// its exit recorded first.
    pub fn notify_page_enter(&self, page: &str) -> bool {
        let page = page.trim();
        if page.is_empty() {
            warn!("page enter with empty page name");
            return false;
        }

        let previous = self.page().replace(page.to_string());
        if let Some(previous) = previous {
            debug!(%previous, next = %page, "closing page that was never exited");
            self.submit(EventAction::PageExit { page: previous });
        }
        self.submit(EventAction::PageEnter {
            page: page.to_string(),
        })
    }

    pub fn notify_page_exit(&self, page: &str) -> bool {
        let page = page.trim();
        {
            let mut current = self.page();
            if current.as_deref() == Some(page) {
                *current = None;
            }
        }
        self.submit(EventAction::PageExit {
            page: page.to_string(),
        })
    }

    // ── Events ─────────────────────────────────────────────────────

    /// Encode and enqueue `action`. True once accepted for delivery.
    pub fn submit(&self, action: EventAction) -> bool {
        let code = action.code();
        let submitted = action
            .encode(self.clock.now())
            .map_err(TransportError::from)
            .and_then(|record| self.queue.submit(record));
        match submitted {
            Ok(_) => true,
            Err(e) => {
                warn!(%code, error = %e, "event not accepted");
                false
            }
        }
    }

    /// Encode, enqueue and wait for the delivery outcome of `action`.
    pub async fn send(&self, action: EventAction) -> HawkResult<()> {
        let record = action.encode(self.clock.now())?;
        self.queue.send(record).await?;
        Ok(())
    }

    pub fn queue_stats(&self) -> QueueStats {
        self.queue.stats()
    }

    // ── Deep links ─────────────────────────────────────────────────

    /// Register friendly names. False if any entry is invalid, in which
    /// case none are registered.
    pub fn register_friendly_names(&self, entries: impl IntoIterator<Item = FriendlyName>) -> bool {
        match self.registry.register(entries) {
            Ok(report) => {
                if report.has_warnings() {
                    warn!(overwritten = ?report.overwritten, "friendly names replaced");
                }
                true
            }
            Err(e) => {
                warn!(error = %e, "friendly name registration rejected");
                false
            }
        }
    }

    pub fn registry(&self) -> &Arc<FriendlyNameRegistry> {
        &self.registry
    }

    /// Handle a URL opened by the platform.
    ///
    /// Launch commands are resolved and presented. Other URLs go to the
    /// open-url handler, if one was supplied.
    pub async fn open_url(&self, url: &str) -> bool {
        if !self.resolver.is_launch_command(url) {
            return match &self.open_url_handler {
                Some(handler) => handler(url),
                None => {
                    debug!(%url, "no handler for non-launch url");
                    false
                }
            };
        }

        let request = match self.resolver.resolve(url) {
            Ok(request) => request,
            Err(e) => {
                warn!(%url, error = %e, "launch url rejected");
                return false;
            }
        };
        match self.presenter.launch_view(&request).await {
            Ok(()) => true,
            Err(e) => {
                warn!(%url, error = %e, "launch failed");
                false
            }
        }
    }

    // ── Notifications ──────────────────────────────────────────────

    pub async fn handle_notification(&self, ctx: NotificationContext) -> RouteOutcome {
        self.router.handle(ctx).await
    }

    // ── Regular tasks ──────────────────────────────────────────────

    /// Background-fetch entry point.
    pub fn regular_task(&self, completion: Option<CompletionToken>) -> FetchResult {
        self.scheduler.run_scheduled_tasks(completion)
    }

    /// Start running regular tasks every `[scheduler] tick`.
    pub fn enter_foreground(&self) {
        let mut tick = self.tick_loop();
        if tick.is_some() {
            return;
        }
        let (shutdown, rx) = watch::channel(false);
        let scheduler = self.scheduler.clone();
        let interval = self.config.tick();
        let handle = tokio::spawn(async move { scheduler.run(interval, rx).await });
        *tick = Some(TickLoop { shutdown, handle });
    }

    /// Stop the foreground tick loop.
    pub async fn enter_background(&self) {
        let running = self.tick_loop().take();
        if let Some(TickLoop { shutdown, handle }) = running {
            let _ = shutdown.send(true);
            if let Err(e) = handle.await {
                warn!(error = %e, "tick loop ended abnormally");
            }
        }
    }

    /// Stop the tick loop and deliver whatever is still queued.
    pub async fn shutdown(&self) {
        self.enter_background().await;
        self.queue.shutdown().await;
        info!("hawk app stopped");
    }

    fn page(&self) -> MutexGuard<'_, Option<String>> {
        self.current_page.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn tick_loop(&self) -> MutexGuard<'_, Option<TickLoop>> {
        self.tick.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
