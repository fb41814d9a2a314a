use axum::extract::{Query, State};
use axum::response::{Html, Redirect};
use axum::Form;
use serde::Deserialize;
use tracing::warn;

use super::views::render_page;
use super::AppState;
use crate::controller::{ClickTarget, Event};

/// Where every form post lands. The marker tells [`index`] the roster was
/// already reconciled by the action itself.
pub(crate) const AFTER_ACTION: &str = "/?after=action";

#[derive(Debug, Deserialize)]
pub(crate) struct PageQuery {
    after: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenForm {
    activity: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClickForm {
    target: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct KeyForm {
    key: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SignupForm {
    email: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UnregisterForm {
    activity: String,
    email: String,
}

/// A fresh navigation is a page load and fetches the roster before
/// rendering. Redirects back from an action, and timer refreshes, carry
/// `after` and render the current state as-is.
pub(crate) async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Html<String> {
    if query.after.is_none() {
        state.session.dispatch(Event::PageLoaded).await;
    }
    let snapshot = state.session.snapshot();
    Html(render_page(&snapshot, state.refresh_secs))
}

pub(crate) async fn health() -> &'static str {
    "ok"
}

pub(crate) async fn reload(State(state): State<AppState>) -> Redirect {
    state.session.dispatch(Event::PageLoaded).await;
    Redirect::to(AFTER_ACTION)
}

pub(crate) async fn open_modal(
    State(state): State<AppState>,
    Form(form): Form<OpenForm>,
) -> Redirect {
    state
        .session
        .dispatch(Event::RegisterClicked {
            activity: form.activity,
        })
        .await;
    Redirect::to(AFTER_ACTION)
}

pub(crate) async fn close_modal(State(state): State<AppState>) -> Redirect {
    state.session.dispatch(Event::CloseClicked).await;
    Redirect::to(AFTER_ACTION)
}

pub(crate) async fn modal_click(
    State(state): State<AppState>,
    Form(form): Form<ClickForm>,
) -> Redirect {
    let target = match form.target.as_str() {
        "overlay" => ClickTarget::Overlay,
        "panel" => ClickTarget::Panel,
        other => {
            warn!("Ignoring click on unknown modal target '{}'", other);
            return Redirect::to(AFTER_ACTION);
        }
    };
    state.session.dispatch(Event::ModalClicked(target)).await;
    Redirect::to(AFTER_ACTION)
}

pub(crate) async fn key_pressed(
    State(state): State<AppState>,
    Form(form): Form<KeyForm>,
) -> Redirect {
    state
        .session
        .dispatch(Event::KeyPressed { key: form.key })
        .await;
    Redirect::to(AFTER_ACTION)
}

pub(crate) async fn signup(State(state): State<AppState>, Form(form): Form<SignupForm>) -> Redirect {
    state
        .session
        .dispatch(Event::SignupSubmitted { email: form.email })
        .await;
    Redirect::to(AFTER_ACTION)
}

pub(crate) async fn unregister(
    State(state): State<AppState>,
    Form(form): Form<UnregisterForm>,
) -> Redirect {
    state
        .session
        .dispatch(Event::UnregisterClicked {
            activity: form.activity,
            email: form.email,
        })
        .await;
    Redirect::to(AFTER_ACTION)
}
