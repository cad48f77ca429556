//! NotificationRouter: Classify, route, complete.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use hawk_core::{EventAction, FetchResult, LaunchRequest, PushResult};
use hawk_deeplink::DeepLinkResolver;
use hawk_transport::{EventQueue, FeedbackSender};

use crate::codes::{FRIENDLY_NAME_LOGIN, FRIENDLY_NAME_REGISTER, PushAction, PushCode};
use crate::context::{AppState, NotificationContext};
use crate::error::RouteError;
use crate::presenter::{OpenUrlHandler, Presenter, Prompt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteState {
    Received,
    Classified,
    Routed,
    Ignored,
    Completed,
}

/// What happened to a notification.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// Dispatched; `result` is how the user (or the router) responded.
    Routed { code: PushCode, result: PushResult },
    /// Dispatched, but the handler failed.
    Failed { code: PushCode, error: RouteError },
    /// Unknown or malformed code, or an unrecognized action.
    Ignored { error: RouteError },
}

impl RouteOutcome {
    /// The state reached before `Completed`.
    pub fn state(&self) -> RouteState {
        match self {
            RouteOutcome::Routed { .. } | RouteOutcome::Failed { .. } => RouteState::Routed,
            RouteOutcome::Ignored { .. } => RouteState::Ignored,
        }
    }

    /// Status reported to the platform completion.
    pub fn fetch_result(&self) -> FetchResult {
        match self {
            RouteOutcome::Routed {
                code,
                result: PushResult::Accepted,
            } if !code.is_silent() => FetchResult::NewData,
            RouteOutcome::Routed { .. } | RouteOutcome::Ignored { .. } => FetchResult::NoData,
            RouteOutcome::Failed { .. } => FetchResult::Failed,
        }
    }

    pub fn push_result(&self) -> PushResult {
        match self {
            RouteOutcome::Routed { result, .. } => *result,
            RouteOutcome::Failed { .. } | RouteOutcome::Ignored { .. } => PushResult::Ignored,
        }
    }
}

enum Target {
    Silent,
    Launch(LaunchRequest),
    /// Handler first, then the presenter.
    Url(String),
    /// A deep link for the app's own handler; nothing else can open it.
    AppLink(String),
    Feedback(Prompt),
}

pub struct NotificationRouter {
    resolver: Arc<DeepLinkResolver>,
    presenter: Arc<dyn Presenter>,
    queue: Arc<EventQueue>,
    feedback: Arc<FeedbackSender>,
    open_url_handler: Option<OpenUrlHandler>,
}

impl NotificationRouter {
    pub fn new(
        resolver: Arc<DeepLinkResolver>,
        presenter: Arc<dyn Presenter>,
        queue: Arc<EventQueue>,
        feedback: Arc<FeedbackSender>,
    ) -> Self {
        Self {
            resolver,
            presenter,
            queue,
            feedback,
            open_url_handler: None,
        }
    }

    /// Offer URLs that are not launch commands to `handler` first.
    pub fn with_open_url_handler(mut self, handler: OpenUrlHandler) -> Self {
        self.open_url_handler = Some(handler);
        self
    }

    /// Route one notification and consume its completion.
    pub async fn handle(&self, mut ctx: NotificationContext) -> RouteOutcome {
        // Held here so an abandoned route still reports through the drop guard.
        let completion = ctx.completion.take();
        let needs_completion = completion.is_some();
        debug!(state = ?RouteState::Received, needs_completion, action = ?ctx.action_id, "notification received");

        let raw = extract_code(&ctx.payload);
        let classified = raw
            .clone()
            .and_then(|raw| classify(raw, ctx.action_id.as_deref()));

        let outcome = match classified {
            Ok((code, action)) => {
                debug!(state = ?RouteState::Classified, %code, ?action, "notification classified");
                self.route(code, action, &ctx).await
            }
            Err(error) => RouteOutcome::Ignored { error },
        };

        match &outcome {
            RouteOutcome::Routed { code, result } => {
                info!(%code, result = result.label(), "notification routed");
            }
            RouteOutcome::Failed { code, error } => {
                warn!(%code, error = %error, "notification handler failed");
            }
            RouteOutcome::Ignored { error } => {
                warn!(error = %error, "notification ignored");
            }
        }

        if let (Some(msgid), Ok(raw)) = (ctx.message_id(), raw) {
            self.report(msgid, raw, outcome.push_result());
        }

        let result = outcome.fetch_result();
        if let Some(completion) = completion {
            completion.complete(result);
        }
        debug!(state = ?RouteState::Completed, ?result, "notification completed");
        outcome
    }

    async fn route(
        &self,
        code: PushCode,
        action: Option<PushAction>,
        ctx: &NotificationContext,
    ) -> RouteOutcome {
        match action {
            Some(PushAction::Decline) => {
                return RouteOutcome::Routed {
                    code,
                    result: PushResult::Declined,
                };
            }
            Some(PushAction::Postpone) => {
                return RouteOutcome::Routed {
                    code,
                    result: PushResult::Postponed,
                };
            }
            Some(PushAction::Accept) | None => {}
        }

        // Resolve before asking the user, so a bad payload never prompts.
        let target = match self.target(code, ctx) {
            Ok(Target::Silent) => {
                debug!(%code, "silent notification, nothing to present");
                return RouteOutcome::Routed {
                    code,
                    result: PushResult::Accepted,
                };
            }
            Ok(target) => target,
            Err(error) => return RouteOutcome::Failed { code, error },
        };

        if action.is_none() && ctx.app_state == AppState::Active {
            match self.presenter.confirm(&prompt_of(ctx)).await {
                Ok(true) => {}
                Ok(false) => {
                    return RouteOutcome::Routed {
                        code,
                        result: PushResult::Declined,
                    };
                }
                Err(e) => return RouteOutcome::Failed { code, error: e.into() },
            }
        }

        match self.present(target, ctx).await {
            Ok(result) => RouteOutcome::Routed { code, result },
            Err(error) => RouteOutcome::Failed { code, error },
        }
    }

    async fn present(&self, target: Target, ctx: &NotificationContext) -> Result<PushResult, RouteError> {
        match target {
            Target::Silent => {}
            Target::Launch(request) => self.presenter.launch_view(&request).await?,
            Target::Url(url) => {
                if !self.offer_to_handler(&url) {
                    self.presenter.open_url(&url).await?;
                }
            }
            Target::AppLink(url) => {
                if !self.offer_to_handler(&url) {
                    return Err(RouteError::UrlNotHandled(url));
                }
            }
            Target::Feedback(prompt) => {
                let Some(mut feedback) = self.presenter.feedback_prompt(&prompt).await? else {
                    debug!("feedback prompt dismissed");
                    return Ok(PushResult::Declined);
                };
                if feedback.msgid.is_none() {
                    feedback.msgid = ctx.message_id();
                }
                self.feedback.send(&feedback).await.map_err(RouteError::Feedback)?;
            }
        }
        Ok(PushResult::Accepted)
    }

    fn offer_to_handler(&self, url: &str) -> bool {
        match &self.open_url_handler {
            Some(handler) => {
                let handled = handler(url);
                debug!(%url, handled, "url offered to the app");
                handled
            }
            None => false,
        }
    }

    fn target(&self, code: PushCode, ctx: &NotificationContext) -> Result<Target, RouteError> {
        let data = || ctx.text("data").ok_or(RouteError::MissingData(code.code()));
        let target = match code {
            PushCode::AppStatusCheck => Target::Silent,
            PushCode::OpenUrl => {
                let url = data()?;
                if self.resolver.is_launch_command(url) {
                    Target::Launch(self.resolver.resolve(url)?)
                } else {
                    Target::Url(url.to_string())
                }
            }
            PushCode::LaunchView => {
                let view = data()?;
                if !view.contains("://") {
                    Target::Launch(self.resolver.launch_for(view)?)
                } else if self.resolver.is_launch_command(view) || self.open_url_handler.is_none() {
                    Target::Launch(self.resolver.resolve(view)?)
                } else {
                    Target::AppLink(view.to_string())
                }
            }
            PushCode::RegisterView => Target::Launch(self.resolver.launch_for(FRIENDLY_NAME_REGISTER)?),
            PushCode::LoginView => Target::Launch(self.resolver.launch_for(FRIENDLY_NAME_LOGIN)?),
            PushCode::Feedback => Target::Feedback(prompt_of(ctx)),
        };
        Ok(target)
    }

    fn report(&self, msgid: String, code: u32, result: PushResult) {
        let record = EventAction::PushResult {
            msgid,
            code,
            result,
        }
        .encode(Utc::now());
        let submitted = match record {
            Ok(record) => self.queue.submit(record).map(drop).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        if let Err(error) = submitted {
            warn!(code, %error, "push result not recorded");
        }
    }
}

fn extract_code(payload: &Map<String, Value>) -> Result<u32, RouteError> {
    match payload.get("code") {
        None | Some(Value::Null) => Err(RouteError::MissingCode),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| RouteError::MalformedCode(n.to_string())),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| RouteError::MalformedCode(s.clone())),
        Some(other) => Err(RouteError::MalformedCode(other.to_string())),
    }
}

fn classify(raw: u32, action_id: Option<&str>) -> Result<(PushCode, Option<PushAction>), RouteError> {
    let code = PushCode::from_code(raw).ok_or(RouteError::UnknownCode(raw))?;
    let action = match action_id {
        None => None,
        Some(id) => Some(code.action(id).ok_or_else(|| RouteError::UnknownAction {
            code: raw,
            action: id.to_string(),
        })?),
    };
    Ok((code, action))
}

fn prompt_of(ctx: &NotificationContext) -> Prompt {
    Prompt {
        title: ctx.text("title").map(str::to_string),
        message: ctx.text("message").map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hawk_core::testing::{RecordingBackend, recording_completion};
    use hawk_core::{Feedback, FriendlyName, LogCode};
    use hawk_deeplink::FriendlyNameRegistry;
    use hawk_install::InstallManager;
    use hawk_transport::QueueConfig;
    use serde_json::json;
    use std::sync::Mutex;

    use crate::testing::{PresenterCall, RecordingPresenter};

    struct Fixture {
        router: NotificationRouter,
        presenter: Arc<RecordingPresenter>,
        backend: Arc<RecordingBackend>,
        queue: Arc<EventQueue>,
    }

    fn fixture() -> Fixture {
        fixture_with(None)
    }

    fn fixture_with(handler: Option<OpenUrlHandler>) -> Fixture {
        let backend = Arc::new(RecordingBackend::new());
        let install = Arc::new(InstallManager::new("SHSample", backend.clone()));
        let feedback = Arc::new(FeedbackSender::new(install.clone(), backend.clone()));
        let queue = Arc::new(EventQueue::start(
            QueueConfig::default(),
            install,
            backend.clone(),
        ));
        let registry = Arc::new(FriendlyNameRegistry::new());
        registry
            .register([
                FriendlyName::new("login", "LoginView"),
                FriendlyName::new("register", "SignUpView"),
            ])
            .unwrap();
        let presenter = Arc::new(RecordingPresenter::new());
        let mut router = NotificationRouter::new(
            Arc::new(DeepLinkResolver::new(registry)),
            presenter.clone(),
            queue.clone(),
            feedback,
        );
        if let Some(handler) = handler {
            router = router.with_open_url_handler(handler);
        }
        Fixture {
            router,
            presenter,
            backend,
            queue,
        }
    }

    fn ctx(payload: Value) -> (NotificationContext, Arc<std::sync::Mutex<Vec<FetchResult>>>) {
        let (token, calls) = recording_completion();
        (NotificationContext::from_json(payload).with_completion(token), calls)
    }

    #[tokio::test]
    async fn background_launch_view_resolves_friendly_name() {
        let f = fixture();
        let (ctx, completions) = ctx(json!({"code": 8004, "data": "login"}));

        let outcome = f.router.handle(ctx).await;

        assert_eq!(outcome.state(), RouteState::Routed);
        assert_eq!(f.presenter.launches(), vec![LaunchRequest::new("LoginView")]);
        assert_eq!(*completions.lock().unwrap(), vec![FetchResult::NewData]);
    }

    #[tokio::test]
    async fn register_and_login_codes_use_reserved_names() {
        let f = fixture();
        f.router.handle(ctx(json!({"code": 8006})).0).await;
        f.router.handle(ctx(json!({"code": "8007"})).0).await;

        let classes: Vec<_> = f
            .presenter
            .launches()
            .into_iter()
            .map(|r| r.view_class)
            .collect();
        assert_eq!(classes, vec!["SignUpView", "LoginView"]);
    }

    #[tokio::test]
    async fn foreground_asks_before_acting() {
        let f = fixture();
        let (c, completions) = ctx(json!({"code": 8004, "data": "login", "title": "Hi"}));
        f.router.handle(c.with_app_state(AppState::Active)).await;

        assert!(matches!(f.presenter.calls()[0], PresenterCall::Confirm(ref p) if p.title.as_deref() == Some("Hi")));
        assert_eq!(f.presenter.launches().len(), 1);
        assert_eq!(*completions.lock().unwrap(), vec![FetchResult::NewData]);

        f.presenter.answer_confirm(false);
        let (c, completions) = ctx(json!({"code": 8004, "data": "login"}));
        let outcome = f.router.handle(c.with_app_state(AppState::Active)).await;

        assert_eq!(outcome.push_result(), PushResult::Declined);
        assert_eq!(f.presenter.launches().len(), 1);
        assert_eq!(*completions.lock().unwrap(), vec![FetchResult::NoData]);
    }

    #[tokio::test]
    async fn accept_action_skips_confirmation() {
        let f = fixture();
        let (c, _) = ctx(json!({"code": 8004, "data": "login"}));
        f.router
            .handle(c.with_app_state(AppState::Active).with_action("accept"))
            .await;
        assert_eq!(
            f.presenter.calls(),
            vec![PresenterCall::Launch(LaunchRequest::new("LoginView"))]
        );
    }

    #[tokio::test]
    async fn decline_and_postpone_do_not_present() {
        let f = fixture();
        let (c, completions) = ctx(json!({"code": 8011}));
        let outcome = f.router.handle(c.with_action("decline")).await;
        assert_eq!(outcome.push_result(), PushResult::Declined);

        let (c, _) = ctx(json!({"code": 8011}));
        let outcome = f.router.handle(c.with_action("postpone")).await;
        assert_eq!(outcome.push_result(), PushResult::Postponed);

        assert!(f.presenter.calls().is_empty());
        assert_eq!(*completions.lock().unwrap(), vec![FetchResult::NoData]);
    }

    #[tokio::test]
    async fn unknown_code_is_ignored_and_completed_once() {
        let f = fixture();
        let (c, completions) = ctx(json!({"code": 9999}));
        let outcome = f.router.handle(c).await;

        assert_eq!(
            outcome,
            RouteOutcome::Ignored {
                error: RouteError::UnknownCode(9999)
            }
        );
        assert_eq!(*completions.lock().unwrap(), vec![FetchResult::NoData]);
    }

    #[tokio::test]
    async fn malformed_or_missing_code_is_ignored() {
        let f = fixture();
        for payload in [json!({"code": "abc"}), json!({"code": -1}), json!({}), json!("junk")] {
            let (c, completions) = ctx(payload);
            let outcome = f.router.handle(c).await;
            assert_eq!(outcome.state(), RouteState::Ignored);
            assert_eq!(completions.lock().unwrap().len(), 1);
        }
        assert!(f.presenter.calls().is_empty());
    }

    #[tokio::test]
    async fn unrecognized_action_is_a_classification_error() {
        let f = fixture();
        let (c, completions) = ctx(json!({"code": 8004, "data": "login"}));
        let outcome = f.router.handle(c.with_action("share")).await;

        match outcome {
            RouteOutcome::Ignored { error } => assert!(error.is_classification()),
            other => panic!("expected ignored, got {other:?}"),
        }
        assert!(f.presenter.launches().is_empty());
        assert_eq!(*completions.lock().unwrap(), vec![FetchResult::NoData]);
    }

    #[tokio::test]
    async fn presenter_failure_completes_with_failed() {
        let f = fixture();
        f.presenter.fail_presentations(true);
        let (c, completions) = ctx(json!({"code": 8004, "data": "login"}));

        let outcome = f.router.handle(c).await;
        assert!(matches!(outcome, RouteOutcome::Failed { .. }));
        assert_eq!(*completions.lock().unwrap(), vec![FetchResult::Failed]);
    }

    #[tokio::test]
    async fn missing_data_fails_without_prompting() {
        let f = fixture();
        let (c, completions) = ctx(json!({"code": 8004}));
        let outcome = f.router.handle(c.with_app_state(AppState::Active)).await;

        assert_eq!(
            outcome,
            RouteOutcome::Failed {
                code: PushCode::LaunchView,
                error: RouteError::MissingData(8004)
            }
        );
        assert!(f.presenter.calls().is_empty());
        assert_eq!(*completions.lock().unwrap(), vec![FetchResult::Failed]);
    }

    #[tokio::test]
    async fn silent_code_never_touches_ui() {
        let f = fixture();
        let (c, completions) = ctx(json!({"code": 8003}));
        let outcome = f.router.handle(c.with_app_state(AppState::Active)).await;

        assert_eq!(outcome.push_result(), PushResult::Accepted);
        assert!(f.presenter.calls().is_empty());
        assert_eq!(*completions.lock().unwrap(), vec![FetchResult::NoData]);
    }

    #[tokio::test]
    async fn open_url_splits_launch_commands_from_plain_urls() {
        let f = fixture();
        f.router
            .handle(ctx(json!({"code": 8000, "data": "https://example.com/sale"})).0)
            .await;
        f.router
            .handle(ctx(json!({"code": 8000, "data": "app://launchvc?vc=login&promo=X"})).0)
            .await;

        let calls = f.presenter.calls();
        assert_eq!(calls[0], PresenterCall::OpenUrl("https://example.com/sale".into()));
        assert!(matches!(&calls[1], PresenterCall::Launch(r) if r.view_class == "LoginView" && r.extras["promo"] == "X"));
    }

    /// Handler that accepts `app://` links and remembers everything offered.
    fn app_link_handler() -> (OpenUrlHandler, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let handler: OpenUrlHandler = Arc::new(move |url: &str| {
            log.lock().unwrap().push(url.to_string());
            url.starts_with("app://")
        });
        (handler, seen)
    }

    #[tokio::test]
    async fn app_handler_receives_notification_urls() {
        let (handler, seen) = app_link_handler();
        let f = fixture_with(Some(handler));

        let outcome = f
            .router
            .handle(ctx(json!({"code": 8000, "data": "app://product/42"})).0)
            .await;
        assert_eq!(outcome.push_result(), PushResult::Accepted);
        let outcome = f
            .router
            .handle(ctx(json!({"code": 8004, "data": "app://product/43"})).0)
            .await;
        assert_eq!(outcome.push_result(), PushResult::Accepted);
        f.router
            .handle(ctx(json!({"code": 8004, "data": "app://launchvc?vc=login"})).0)
            .await;

        assert_eq!(*seen.lock().unwrap(), vec!["app://product/42", "app://product/43"]);
        assert_eq!(
            f.presenter.calls(),
            vec![PresenterCall::Launch(LaunchRequest::new("LoginView"))]
        );
    }

    #[tokio::test]
    async fn declined_url_falls_back_to_presenter() {
        let (handler, seen) = app_link_handler();
        let f = fixture_with(Some(handler));
        f.router
            .handle(ctx(json!({"code": 8000, "data": "https://example.com/sale"})).0)
            .await;
        assert_eq!(*seen.lock().unwrap(), vec!["https://example.com/sale"]);
        assert_eq!(
            f.presenter.calls(),
            vec![PresenterCall::OpenUrl("https://example.com/sale".into())]
        );

        // A deep link nobody takes has nowhere else to go.
        let (c, completions) = ctx(json!({"code": 8004, "data": "https://example.com/x"}));
        let outcome = f.router.handle(c).await;
        assert_eq!(
            outcome,
            RouteOutcome::Failed {
                code: PushCode::LaunchView,
                error: RouteError::UrlNotHandled("https://example.com/x".into())
            }
        );
        assert_eq!(*completions.lock().unwrap(), vec![FetchResult::Failed]);
    }

    #[tokio::test]
    async fn answered_feedback_is_submitted_with_message_id() {
        let f = fixture();
        f.presenter
            .answer_feedback(Some(Feedback::new("Checkout", "The pay button is hidden")));
        let (c, completions) = ctx(json!({"code": 8011, "msgid": 7, "title": "How was it?"}));

        let outcome = f.router.handle(c).await;

        assert_eq!(outcome.push_result(), PushResult::Accepted);
        let sent = f.backend.feedback();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "install-1");
        assert_eq!(sent[0].1.title, "Checkout");
        assert_eq!(sent[0].1.msgid.as_deref(), Some("7"));
        assert_eq!(*completions.lock().unwrap(), vec![FetchResult::NewData]);
    }

    #[tokio::test]
    async fn dismissed_feedback_prompt_is_declined() {
        let f = fixture();
        let (c, completions) = ctx(json!({"code": 8011}));
        let outcome = f.router.handle(c).await;

        assert_eq!(outcome.push_result(), PushResult::Declined);
        assert!(matches!(f.presenter.calls()[0], PresenterCall::Feedback(_)));
        assert!(f.backend.feedback().is_empty());
        assert_eq!(*completions.lock().unwrap(), vec![FetchResult::NoData]);
    }

    #[tokio::test]
    async fn undelivered_feedback_fails_the_route() {
        let f = fixture();
        f.backend.fail_next_feedback(1);
        f.presenter.answer_feedback(Some(Feedback::new("", "crash on launch")));
        let (c, completions) = ctx(json!({"code": 8011}));

        let outcome = f.router.handle(c).await;

        assert!(matches!(
            outcome,
            RouteOutcome::Failed {
                error: RouteError::Feedback(_),
                ..
            }
        ));
        assert_eq!(*completions.lock().unwrap(), vec![FetchResult::Failed]);
    }

    #[tokio::test]
    async fn push_result_is_recorded_for_message_ids() {
        let f = fixture();
        f.router
            .handle(ctx(json!({"code": 8004, "data": "login", "msgid": 42})).0)
            .await;
        f.router
            .handle(ctx(json!({"code": 9999, "msgid": "m-2"})).0)
            .await;
        f.router.handle(ctx(json!({"code": 8004, "data": "login"})).0).await;
        f.queue.shutdown().await;

        let records = f.backend.logged_records();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.code == LogCode::PushResult && !r.priority));
        assert_eq!(records[0].attributes["msgid"], "42");
        assert_eq!(records[0].attributes["result"], "accepted");
        assert_eq!(records[1].attributes["code"], 9999);
        assert_eq!(records[1].attributes["result"], "ignored");
    }

    #[tokio::test]
    async fn abandoned_route_reports_failure() {
        let f = fixture();
        let (c, completions) = ctx(json!({"code": 8004, "data": "login"}));

        let pending = f.router.handle(c);
        drop(pending);

        assert_eq!(*completions.lock().unwrap(), vec![FetchResult::Failed]);
    }
}
