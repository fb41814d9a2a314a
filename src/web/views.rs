use leptos::prelude::*;

use crate::controller::{Feedback, Notice, RegistrationIntent, RosterView, UiState};
use crate::models::{Activity, Roster};

const STYLE: &str = include_str!("../style.css");

// Forwards Escape to the session. Only emitted while the modal is open.
const KEY_SCRIPT: &str = "document.addEventListener('keydown', function (e) {
  if (e.key !== 'Escape') { return; }
  fetch('/keys', {
    method: 'POST',
    headers: { 'Content-Type': 'application/x-www-form-urlencoded' },
    body: 'key=' + encodeURIComponent(e.key)
  }).then(function () { window.location.replace('/?after=key'); });
});";

pub(super) fn render_page(state: &UiState, refresh_secs: u64) -> String {
    let roster_html = render_roster(&state.roster);
    // newest first, directly under the roster
    let notices_html: String = state.notices.iter().rev().map(render_notice).collect();
    let modal_html = state.intent().map(render_modal).unwrap_or_default();
    let refresh = (state.wants_auto_refresh() && refresh_secs > 0).then(|| {
        let content = format!("{refresh_secs}; url=/?after=refresh");
        view! { <meta http-equiv="refresh" content=content /> }
    });
    let key_script = state.is_modal_open().then(|| {
        let script = KEY_SCRIPT.to_string();
        view! { <script inner_html=script></script> }
    });

    view! {
        <html lang="en">
            <head>
                <meta charset="utf-8" />
                <meta name="viewport" content="width=device-width, initial-scale=1" />
                <title>"Activities"</title>
                <style>{STYLE}</style>
                {refresh}
            </head>
            <body>
                <header>
                    <h1>"Extracurricular Activities"</h1>
                    <form method="post" action="/reload">
                        <button type="submit" class="reload-btn">"Refresh"</button>
                    </form>
                </header>
                <main>
                    <section id="activities-container">
                        <h3>"Available Activities"</h3>
                        <div id="activities-list" inner_html=roster_html />
                    </section>
                    <div id="notices" inner_html=notices_html />
                </main>
                <div inner_html=modal_html />
                {key_script}
            </body>
        </html>
    }
    .to_html()
}

fn render_roster(roster: &RosterView) -> String {
    match roster {
        RosterView::Loading => view! { <p>"Loading activities..."</p> }.to_html(),
        RosterView::Failed(message) => {
            let message = message.clone();
            view! { <p class="load-error">{message}</p> }.to_html()
        }
        RosterView::Loaded(roster) => render_cards(roster),
    }
}

fn render_cards(roster: &Roster) -> String {
    if roster.is_empty() {
        return view! { <p class="empty">"No activities available."</p> }.to_html();
    }

    roster
        .activities
        .iter()
        .map(|(name, activity)| render_card(name, activity))
        .collect()
}

fn render_card(name: &str, activity: &Activity) -> String {
    let participants_html = render_participants(name, &activity.participants);
    let title = name.to_string();
    let register_activity = name.to_string();
    let description = activity.description.clone();
    let schedule = activity.schedule.clone();
    let availability = format!("{} spots left", activity.spots_left());

    view! {
        <div class="activity-card">
            <h4>{title}</h4>
            <p>{description}</p>
            <p><strong>"Schedule:"</strong> " " {schedule}</p>
            <p class="availability"><strong>"Availability:"</strong> " " {availability}</p>
            <div class="participants-container" inner_html=participants_html />
            <form class="activity-actions" method="post" action="/modal/open">
                <input type="hidden" name="activity" value=register_activity />
                <button type="submit" class="register-student-btn">"Register Student"</button>
            </form>
        </div>
    }
    .to_html()
}

fn render_participants(activity: &str, participants: &[String]) -> String {
    if participants.is_empty() {
        return view! { <p><em>"No participants yet"</em></p> }.to_html();
    }

    let items_html: String = participants
        .iter()
        .map(|email| {
            let shown = email.clone();
            let email = email.clone();
            let activity = activity.to_string();
            view! {
                <li>
                    <span class="participant-email">{shown}</span>
                    <form class="inline" method="post" action="/unregister">
                        <input type="hidden" name="activity" value=activity />
                        <input type="hidden" name="email" value=email />
                        <button type="submit" class="delete-btn" title="Unregister">"❌"</button>
                    </form>
                </li>
            }
            .to_html()
        })
        .collect();

    view! {
        <div class="participants-section">
            <h5>"Participants:"</h5>
            <ul class="participants-list" inner_html=items_html />
        </div>
    }
    .to_html()
}

fn render_notice(notice: &Notice) -> String {
    let css = format!("message {}", notice.kind.css_class());
    let text = notice.text.clone();
    view! { <div class=css>{text}</div> }.to_html()
}

fn render_feedback(feedback: Option<&Feedback>) -> String {
    match feedback {
        Some(f) => {
            let css = f.kind.css_class().to_string();
            let text = f.text.clone();
            view! { <div id="modal-message" class=css>{text}</div> }.to_html()
        }
        None => String::new(),
    }
}

fn render_modal(intent: &RegistrationIntent) -> String {
    let title = format!("Register for {}", intent.activity);
    let email = intent.email.clone();
    let feedback_html = render_feedback(intent.feedback.as_ref());

    view! {
        <div id="registration-modal" class="modal">
            <form class="modal-backdrop" method="post" action="/modal/click">
                <input type="hidden" name="target" value="overlay" />
                <button type="submit" class="backdrop-hit" aria-label="Close"></button>
            </form>
            <div class="modal-content">
                <form method="post" action="/modal/close">
                    <button type="submit" class="close-modal" aria-label="Close">"×"</button>
                </form>
                <h3 id="modal-title">{title}</h3>
                <form id="modal-signup-form" method="post" action="/signup">
                    <div class="form-group">
                        <label>
                            "Student Email:"
                            <input
                                type="email"
                                id="modal-email"
                                name="email"
                                required=true
                                autofocus=true
                                placeholder="your-email@mergington.edu"
                                value=email
                            />
                        </label>
                    </div>
                    <div class="modal-actions">
                        <button type="submit">"Register"</button>
                    </div>
                </form>
                <form method="post" action="/modal/close">
                    <button type="submit" class="cancel-btn">"Cancel"</button>
                </form>
                <div inner_html=feedback_html />
            </div>
        </div>
    }
    .to_html()
}
