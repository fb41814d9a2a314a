use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::client::RosterApi;
use crate::controller::{Command, Event, MutationOutcome, Timings, UiState};

/// One page session: the UI state plus everything needed to carry out the
/// commands the controller emits.
pub struct Session<A> {
    state: Mutex<UiState>,
    api: A,
    timings: Timings,
    timers: mpsc::UnboundedSender<Event>,
}

impl<A: RosterApi + 'static> Session<A> {
    /// Create the session and spawn the task that delivers timer events.
    pub fn start(api: A, timings: Timings) -> (Arc<Self>, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let session = Arc::new(Self {
            state: Mutex::new(UiState::new()),
            api,
            timings,
            timers: tx,
        });

        let weak = Arc::downgrade(&session);
        let pump = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let Some(session) = weak.upgrade() else {
                    break;
                };
                session.dispatch(event).await;
            }
            debug!("Timer pump stopped");
        });

        (session, pump)
    }

    pub fn snapshot(&self) -> UiState {
        self.lock().clone()
    }

    /// Apply `event` and run the resulting commands. Network results are fed
    /// back in before returning; scheduled events arrive later via the pump.
    pub async fn dispatch(&self, event: Event) {
        let mut queue = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            debug!("Dispatching {:?}", event);
            let commands = self.lock().apply(event, &self.timings);

            for command in commands {
                if let Some(next) = self.execute(command).await {
                    queue.push_back(next);
                }
            }
        }
    }

    async fn execute(&self, command: Command) -> Option<Event> {
        match command {
            Command::FetchRoster => Some(match self.api.fetch_roster().await {
                Ok(roster) => {
                    info!("Loaded {} activities", roster.len());
                    Event::RosterLoaded(roster)
                }
                Err(e) => Event::RosterFailed {
                    reason: format!("{e:#}"),
                },
            }),
            Command::Signup { activity, email } => {
                info!("Signing up {} for {}", email, activity);
                let result = self.api.signup(&activity, &email).await;
                Some(Event::SignupCompleted(MutationOutcome::from_result(result)))
            }
            Command::Unregister { activity, email } => {
                info!("Unregistering {} from {}", email, activity);
                let result = self.api.unregister(&activity, &email).await;
                Some(Event::UnregisterCompleted(MutationOutcome::from_result(result)))
            }
            Command::Schedule { after, event } => {
                let tx = self.timers.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    // receiver only goes away with the session
                    let _ = tx.send(event);
                });
                None
            }
            Command::LogError(message) => {
                error!("{}", message);
                None
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, UiState> {
        // state is only ever replaced wholesale by `apply`, so a poisoned
        // lock still holds a consistent value
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
