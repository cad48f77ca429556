//! Push codes and interactive actions.
//!
//! | Code | Meaning                    | Actions                   |
//! |------|----------------------------|---------------------------|
//! | 8000 | open url                   | accept, decline, postpone |
//! | 8003 | app status check (silent)  | none                      |
//! | 8004 | launch view                | accept, decline, postpone |
//! | 8006 | launch registration view   | accept, decline, postpone |
//! | 8007 | launch login view          | accept, decline, postpone |
//! | 8011 | feedback prompt            | accept, decline, postpone |

use std::fmt;

/// Friendly name launched by [`PushCode::RegisterView`].
pub const FRIENDLY_NAME_REGISTER: &str = "register";
/// Friendly name launched by [`PushCode::LoginView`].
pub const FRIENDLY_NAME_LOGIN: &str = "login";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PushCode {
    OpenUrl,
    AppStatusCheck,
    LaunchView,
    RegisterView,
    LoginView,
    Feedback,
}

impl PushCode {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            8000 => Some(PushCode::OpenUrl),
            8003 => Some(PushCode::AppStatusCheck),
            8004 => Some(PushCode::LaunchView),
            8006 => Some(PushCode::RegisterView),
            8007 => Some(PushCode::LoginView),
            8011 => Some(PushCode::Feedback),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            PushCode::OpenUrl => 8000,
            PushCode::AppStatusCheck => 8003,
            PushCode::LaunchView => 8004,
            PushCode::RegisterView => 8006,
            PushCode::LoginView => 8007,
            PushCode::Feedback => 8011,
        }
    }

    /// Silent codes never touch the UI.
    pub fn is_silent(self) -> bool {
        matches!(self, PushCode::AppStatusCheck)
    }

    /// Actions the notification may carry for this code.
    pub fn actions(self) -> &'static [PushAction] {
        const INTERACTIVE: &[PushAction] =
            &[PushAction::Accept, PushAction::Decline, PushAction::Postpone];
        if self.is_silent() { &[] } else { INTERACTIVE }
    }

    /// Parse `identifier` against this code's action table.
    pub fn action(self, identifier: &str) -> Option<PushAction> {
        self.actions()
            .iter()
            .copied()
            .find(|a| a.identifier().eq_ignore_ascii_case(identifier))
    }
}

impl fmt::Display for PushCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A button pressed on an interactive notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushAction {
    Accept,
    Decline,
    Postpone,
}

impl PushAction {
    pub fn identifier(self) -> &'static str {
        match self {
            PushAction::Accept => "accept",
            PushAction::Decline => "decline",
            PushAction::Postpone => "postpone",
        }
    }
}
