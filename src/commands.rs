use anyhow::{bail, Result};
use tracing::{info, warn};

use crate::client::{ApiReply, RosterApi};
use crate::controller::GENERIC_ERROR;
use crate::models::Roster;

/// Fetch the roster once and print it.
pub async fn run_list(api: &impl RosterApi) -> Result<()> {
    let roster = api.fetch_roster().await?;
    print!("{}", format_roster(&roster));
    Ok(())
}

pub fn format_roster(roster: &Roster) -> String {
    if roster.is_empty() {
        return "No activities available.\n".to_string();
    }

    let mut out = String::new();
    for (name, activity) in &roster.activities {
        out.push_str(&format!("{name}\n"));
        out.push_str(&format!("  {}\n", activity.description));
        out.push_str(&format!("  Schedule: {}\n", activity.schedule));
        out.push_str(&format!("  Availability: {} spots left\n", activity.spots_left()));
        if activity.participants.is_empty() {
            out.push_str("  No participants yet\n");
        } else {
            out.push_str("  Participants:\n");
            for email in &activity.participants {
                out.push_str(&format!("    - {email}\n"));
            }
        }
    }
    out
}

pub async fn run_signup(api: &impl RosterApi, activity: &str, email: &str) -> Result<()> {
    info!("Signing up {} for {}", email, activity);
    let reply = api.signup(activity, email).await?;
    report(reply)
}

pub async fn run_unregister(api: &impl RosterApi, activity: &str, email: &str) -> Result<()> {
    info!("Unregistering {} from {}", email, activity);
    let reply = api.unregister(activity, email).await?;
    report(reply)
}

fn report(reply: ApiReply) -> Result<()> {
    match reply {
        ApiReply::Accepted { message } => {
            println!("{message}");
            Ok(())
        }
        ApiReply::Rejected { status, detail } => {
            let detail = detail.as_deref().unwrap_or(GENERIC_ERROR);
            warn!("Request rejected (status {}): {}", status, detail);
            bail!("{detail}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::tests::{chess_roster, FakeApi};

    #[test]
    fn test_format_roster() {
        let out = format_roster(&chess_roster(&["a@b.com"]));
        assert!(out.starts_with("Chess Club\n"));
        assert!(out.contains("Availability: 11 spots left"));
        assert!(out.contains("    - a@b.com"));

        let out = format_roster(&chess_roster(&[]));
        assert!(out.contains("No participants yet"));
        assert_eq!(format_roster(&Roster::default()), "No activities available.\n");
    }

    #[tokio::test]
    async fn test_rejected_signup_is_an_error() {
        let api = FakeApi::default();
        *api.signup_reply.lock().unwrap() = Some(ApiReply::Rejected {
            status: 400,
            detail: None,
        });
        let err = run_signup(&api, "Chess Club", "a@b.com").await.unwrap_err();
        assert_eq!(err.to_string(), GENERIC_ERROR);
    }

    #[tokio::test]
    async fn test_accepted_unregister() {
        let api = FakeApi::default();
        *api.unregister_reply.lock().unwrap() = Some(ApiReply::Accepted {
            message: "Unregistered a@b.com from Chess Club".into(),
        });
        run_unregister(&api, "Chess Club", "a@b.com").await.unwrap();
        assert_eq!(
            *api.calls.lock().unwrap(),
            vec!["unregister Chess Club a@b.com".to_string()]
        );
    }
}
