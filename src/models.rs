use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub ui: UiConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct UiConfig {
    pub modal_close_delay_ms: u64,
    pub notice_lifetime_ms: u64,
    pub refresh_secs: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            modal_close_delay_ms: 1500,
            notice_lifetime_ms: 5000,
            refresh_secs: 2,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:3009".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Activity {
    pub description: String,
    pub schedule: String,
    pub max_participants: u32,
    #[serde(default)]
    pub participants: Vec<String>,
}

impl Activity {
    /// Remaining capacity. Goes negative when the server reports an
    /// over-full activity; that value is shown as-is.
    pub fn spots_left(&self) -> i64 {
        i64::from(self.max_participants) - self.participants.len() as i64
    }
}

/// Snapshot of `GET /activities`, in the order the server listed the keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    pub activities: Vec<(String, Activity)>,
}

impl Roster {
    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }
}

impl<'de> Deserialize<'de> for Roster {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // serde_json's preserve_order keeps the server's key order here
        let map = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        let activities = map
            .into_iter()
            .map(|(name, value)| {
                serde_json::from_value::<Activity>(value)
                    .map(|a| (name, a))
                    .map_err(serde::de::Error::custom)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Roster { activities })
    }
}

/// Body of a mutation response. Success carries `message`, failure `detail`.
#[derive(Debug, Default, Deserialize)]
pub struct ApiBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}
