//! FeedbackSender: Direct submission of user feedback.
//!
//! Feedback bypasses the event queue. It is sent once, after the install
//! is identified, and the caller sees the backend's answer.

use std::sync::Arc;

use tracing::{info, warn};

use hawk_core::{Backend, Feedback};
use hawk_install::InstallManager;

use crate::error::TransportError;

pub struct FeedbackSender {
    install: Arc<InstallManager>,
    backend: Arc<dyn Backend>,
}

impl FeedbackSender {
    pub fn new(install: Arc<InstallManager>, backend: Arc<dyn Backend>) -> Self {
        Self { install, backend }
    }

    /// Validate and submit `feedback`. Not retried on failure.
    pub async fn send(&self, feedback: &Feedback) -> Result<(), TransportError> {
        feedback.validate()?;

        let install_id = self
            .install
            .ensure_install()
            .await
            .map_err(|e| TransportError::NotIdentified(e.to_string()))?;

        if let Err(e) = self.backend.submit_feedback(&install_id, feedback).await {
            warn!(%install_id, error = %e, "feedback submission failed");
            return Err(e.into());
        }
        info!(%install_id, msgid = ?feedback.msgid, "feedback submitted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hawk_core::testing::{BackendCall, RecordingBackend};
    use hawk_core::{BackendError, ValidationError};

    fn sender(backend: &Arc<RecordingBackend>) -> FeedbackSender {
        let install = Arc::new(InstallManager::new("SHSample", backend.clone()));
        FeedbackSender::new(install, backend.clone())
    }

    #[tokio::test]
    async fn registers_before_submitting() {
        let backend = Arc::new(RecordingBackend::new());
        let sender = sender(&backend);

        sender
            .send(&Feedback::new("Bug", "Checkout hangs").with_msgid("m-1"))
            .await
            .unwrap();

        let calls = backend.calls();
        assert!(matches!(calls[0], BackendCall::Register(_)));
        assert_eq!(
            backend.feedback(),
            vec![(
                "install-1".to_string(),
                Feedback::new("Bug", "Checkout hangs").with_msgid("m-1")
            )]
        );
    }

    #[tokio::test]
    async fn blank_feedback_never_reaches_the_network() {
        let backend = Arc::new(RecordingBackend::new());
        let err = sender(&backend)
            .send(&Feedback::new("", "  "))
            .await
            .unwrap_err();

        assert_eq!(err, TransportError::Validation(ValidationError::EmptyFeedback));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn backend_rejection_is_reported_once() {
        let backend = Arc::new(RecordingBackend::new());
        backend.fail_next_feedback(1);

        let err = sender(&backend)
            .send(&Feedback::new("Bug", "x"))
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Delivery(BackendError::Rejected { .. })));
        assert_eq!(backend.feedback().len(), 1);
    }

    #[tokio::test]
    async fn unidentified_install_is_reported() {
        let backend = Arc::new(RecordingBackend::new());
        backend.fail_next_registers(1);

        let err = sender(&backend)
            .send(&Feedback::new("Bug", "x"))
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::NotIdentified(_)));
        assert!(backend.feedback().is_empty());
    }
}
