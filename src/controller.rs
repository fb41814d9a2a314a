//! UI state for the roster page and the transitions that drive it.
//!
//! Every user interaction and every completed network call is an [`Event`].
//! [`UiState::apply`] folds an event into the state and returns the side
//! effects to perform as [`Command`]s. Nothing here touches the network or
//! the clock, so the whole page workflow can be exercised without a browser.

use std::time::Duration;

use crate::client::ApiReply;
use crate::models::{Roster, UiConfig};

pub const LOAD_FAILED: &str = "Failed to load activities. Please try again later.";
pub const SIGNUP_FAILED: &str = "Failed to sign up. Please try again.";
pub const UNREGISTER_FAILED: &str = "Failed to unregister. Please try again.";
pub const GENERIC_ERROR: &str = "An error occurred";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub modal_close_delay: Duration,
    pub notice_lifetime: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            modal_close_delay: Duration::from_millis(1500),
            notice_lifetime: Duration::from_millis(5000),
        }
    }
}

impl From<&UiConfig> for Timings {
    fn from(cfg: &UiConfig) -> Self {
        Self {
            modal_close_delay: Duration::from_millis(cfg.modal_close_delay_ms),
            notice_lifetime: Duration::from_millis(cfg.notice_lifetime_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

impl NoticeKind {
    pub fn css_class(self) -> &'static str {
        match self {
            NoticeKind::Success => "success",
            NoticeKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoticeId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: NoticeId,
    pub text: String,
    pub kind: NoticeKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub text: String,
    pub kind: NoticeKind,
}

/// What the modal is bound to while it is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationIntent {
    pub activity: String,
    pub email: String,
    pub feedback: Option<Feedback>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Modal {
    #[default]
    Closed,
    Open(RegistrationIntent),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RosterView {
    #[default]
    Loading,
    Loaded(Roster),
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Overlay,
    Panel,
}

/// Result of a signup or unregister call as the UI sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Accepted { message: String },
    Rejected { detail: Option<String> },
    /// The request never completed or the response was unreadable.
    Unreachable { reason: String },
}

impl MutationOutcome {
    pub fn from_result(result: anyhow::Result<ApiReply>) -> Self {
        match result {
            Ok(ApiReply::Accepted { message }) => MutationOutcome::Accepted { message },
            Ok(ApiReply::Rejected { detail, .. }) => MutationOutcome::Rejected { detail },
            Err(e) => MutationOutcome::Unreachable {
                reason: format!("{e:#}"),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    PageLoaded,
    RosterLoaded(Roster),
    RosterFailed { reason: String },
    RegisterClicked { activity: String },
    CloseClicked,
    ModalClicked(ClickTarget),
    KeyPressed { key: String },
    SignupSubmitted { email: String },
    SignupCompleted(MutationOutcome),
    /// The post-signup delay has elapsed.
    SignupSettled { message: String },
    UnregisterClicked { activity: String, email: String },
    UnregisterCompleted(MutationOutcome),
    NoticeExpired(NoticeId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    FetchRoster,
    Signup { activity: String, email: String },
    Unregister { activity: String, email: String },
    /// Deliver `event` once `after` has elapsed.
    Schedule { after: Duration, event: Event },
    LogError(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    pub roster: RosterView,
    pub modal: Modal,
    pub notices: Vec<Notice>,
    pub signup_settling: bool,
    next_notice: u64,
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_modal_open(&self) -> bool {
        matches!(self.modal, Modal::Open(_))
    }

    pub fn intent(&self) -> Option<&RegistrationIntent> {
        match &self.modal {
            Modal::Open(intent) => Some(intent),
            Modal::Closed => None,
        }
    }

    /// Whether the page should reload itself to pick up timer-driven
    /// changes. A notice expiring never reloads over an open modal, so the
    /// email being typed survives; only a settling signup does.
    pub fn wants_auto_refresh(&self) -> bool {
        self.signup_settling || (!self.notices.is_empty() && !self.is_modal_open())
    }

    pub fn apply(&mut self, event: Event, timings: &Timings) -> Vec<Command> {
        match event {
            Event::PageLoaded => vec![Command::FetchRoster],

            Event::RosterLoaded(roster) => {
                self.roster = RosterView::Loaded(roster);
                vec![]
            }

            Event::RosterFailed { reason } => {
                self.roster = RosterView::Failed(LOAD_FAILED.to_string());
                vec![Command::LogError(format!("Error fetching activities: {reason}"))]
            }

            Event::RegisterClicked { activity } => {
                self.modal = Modal::Open(RegistrationIntent {
                    activity,
                    email: String::new(),
                    feedback: None,
                });
                vec![]
            }

            Event::CloseClicked | Event::ModalClicked(ClickTarget::Overlay) => {
                self.close_modal();
                vec![]
            }

            Event::ModalClicked(ClickTarget::Panel) => vec![],

            Event::KeyPressed { key } => {
                if key == "Escape" {
                    self.close_modal();
                }
                vec![]
            }

            Event::SignupSubmitted { email } => match &mut self.modal {
                Modal::Open(intent) => {
                    intent.email = email.clone();
                    vec![Command::Signup {
                        activity: intent.activity.clone(),
                        email,
                    }]
                }
                Modal::Closed => vec![],
            },

            Event::SignupCompleted(outcome) => self.signup_completed(outcome, timings),

            Event::SignupSettled { message } => {
                self.signup_settling = false;
                self.close_modal();
                self.push_notice(message, NoticeKind::Success, timings)
                    .into_iter()
                    .chain(std::iter::once(Command::FetchRoster))
                    .collect()
            }

            Event::UnregisterClicked { activity, email } => {
                vec![Command::Unregister { activity, email }]
            }

            Event::UnregisterCompleted(outcome) => match outcome {
                MutationOutcome::Accepted { message } => self
                    .push_notice(message, NoticeKind::Success, timings)
                    .into_iter()
                    .chain(std::iter::once(Command::FetchRoster))
                    .collect(),
                MutationOutcome::Rejected { detail } => {
                    let text = detail.unwrap_or_else(|| GENERIC_ERROR.to_string());
                    let mut cmds = vec![Command::LogError(format!("Unregister rejected: {text}"))];
                    cmds.extend(self.push_notice(text, NoticeKind::Error, timings));
                    cmds
                }
                MutationOutcome::Unreachable { reason } => {
                    let mut cmds = vec![Command::LogError(format!("Error unregistering: {reason}"))];
                    cmds.extend(self.push_notice(
                        UNREGISTER_FAILED.to_string(),
                        NoticeKind::Error,
                        timings,
                    ));
                    cmds
                }
            },

            Event::NoticeExpired(id) => {
                self.notices.retain(|n| n.id != id);
                vec![]
            }
        }
    }

    fn signup_completed(&mut self, outcome: MutationOutcome, timings: &Timings) -> Vec<Command> {
        match outcome {
            MutationOutcome::Accepted { message } => {
                self.set_feedback(&message, NoticeKind::Success);
                self.signup_settling = true;
                vec![Command::Schedule {
                    after: timings.modal_close_delay,
                    event: Event::SignupSettled { message },
                }]
            }
            MutationOutcome::Rejected { detail } => {
                let text = detail.unwrap_or_else(|| GENERIC_ERROR.to_string());
                self.set_feedback(&text, NoticeKind::Error);
                vec![Command::LogError(format!("Signup rejected: {text}"))]
            }
            MutationOutcome::Unreachable { reason } => {
                self.set_feedback(SIGNUP_FAILED, NoticeKind::Error);
                vec![Command::LogError(format!("Error signing up: {reason}"))]
            }
        }
    }

    // A reply that lands after the modal was dismissed has nowhere to show.
    fn set_feedback(&mut self, text: &str, kind: NoticeKind) {
        if let Modal::Open(intent) = &mut self.modal {
            intent.feedback = Some(Feedback {
                text: text.to_string(),
                kind,
            });
        }
    }

    fn close_modal(&mut self) {
        self.modal = Modal::Closed;
    }

    fn push_notice(&mut self, text: String, kind: NoticeKind, timings: &Timings) -> Vec<Command> {
        let id = NoticeId(self.next_notice);
        self.next_notice += 1;
        self.notices.push(Notice { id, text, kind });
        vec![Command::Schedule {
            after: timings.notice_lifetime,
            event: Event::NoticeExpired(id),
        }]
    }
}
