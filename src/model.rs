// src/model.rs
//
// Wire types returned by the replay service and the normalized record we persist.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One ranked player from `/ladder/<format>.json`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LadderEntry {
    pub userid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elo: Option<f64>,
}

/// Body of a ladder response. Only `toplist` is consumed.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Ladder {
    #[serde(default)]
    pub toplist: Vec<LadderEntry>,
}

impl Ladder {
    /// User ids in ladder order with repeats removed.
    pub fn distinct_users(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.toplist
            .iter()
            .filter(|e| seen.insert(e.userid.as_str()))
            .map(|e| e.userid.clone())
            .collect()
    }
}

/// One row of `/search.json?user=<id>`. Only `id` drives the pipeline; the
/// rest is kept as sent.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct UserReplaySummary {
    pub id: String,
    #[serde(default)]
    pub format: Option<Value>,
    #[serde(default)]
    pub players: Option<Value>,
    #[serde(default)]
    pub uploadtime: Option<Value>,
}

/// Body of `/<replay id>.json`, exactly as the service sends it.
///
/// Every field is optional so a sparse or drifting schema never fails decoding.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct RawReplayPayload {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub players: Vec<String>,
    #[serde(default)]
    pub log: Option<String>,
    #[serde(default)]
    pub views: Option<Value>,
    #[serde(default)]
    pub uploadtime: Option<Value>,
    #[serde(default)]
    pub rating: Option<Value>,
    #[serde(default)]
    pub private: Option<Value>,
    #[serde(default)]
    pub formatid: Option<Value>,
}

/// Player position token used in the event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerSlot {
    P1,
    P2,
}

impl PlayerSlot {
    /// `None` for anything other than `p1` / `p2`.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "p1" => Some(PlayerSlot::P1),
            "p2" => Some(PlayerSlot::P2),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlayerSlot::P1 => "p1",
            PlayerSlot::P2 => "p2",
        }
    }
}

/// Pokemon revealed per player, serialized as `{"p1": [...], "p2": [...]}`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    pub p1: Vec<String>,
    pub p2: Vec<String>,
}

impl Roster {
    pub fn slot(&self, slot: PlayerSlot) -> &[String] {
        match slot {
            PlayerSlot::P1 => &self.p1,
            PlayerSlot::P2 => &self.p2,
        }
    }

    /// Lookup by raw slot token; unknown tokens have no roster.
    pub fn get(&self, token: &str) -> Option<&[String]> {
        PlayerSlot::parse(token).map(|s| self.slot(s))
    }

    pub(crate) fn push(&mut self, slot: PlayerSlot, pokemon: String) {
        match slot {
            PlayerSlot::P1 => self.p1.push(pokemon),
            PlayerSlot::P2 => self.p2.push(pokemon),
        }
    }
}

/// Passthrough fields copied verbatim from the payload.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReplayMetadata {
    pub views: Option<Value>,
    pub uploadtime: Option<Value>,
    pub rating: Option<Value>,
    pub private: Option<Value>,
    pub format_id: Option<Value>,
}

/// The normalized record written once per successfully fetched replay.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Replay {
    pub id: String,
    pub format: String,
    pub players: Vec<String>,
    #[serde(rename = "gen")]
    pub generation: Option<u32>,
    pub tier: Option<String>,
    pub pokemon_by_player: Roster,
    pub winner: Option<String>,
    pub rules: Vec<String>,
    pub metadata: ReplayMetadata,
    pub full_log: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ladder_distinct_users_keeps_first_occurrence() {
        let ladder: Ladder = serde_json::from_value(json!({
            "formatid": "gen8ou",
            "toplist": [
                {"userid": "alice", "username": "Alice", "elo": 1700.5},
                {"userid": "bob"},
                {"userid": "alice"},
            ]
        }))
        .unwrap();
        assert_eq!(ladder.distinct_users(), vec!["alice", "bob"]);
    }

    #[test]
    fn sparse_payload_decodes() {
        let p: RawReplayPayload = serde_json::from_value(json!({"id": "gen8ou-1"})).unwrap();
        assert_eq!(p.id.as_deref(), Some("gen8ou-1"));
        assert!(p.log.is_none());
        assert!(p.players.is_empty());
    }

    #[test]
    fn null_players_decode_as_empty() {
        let p: RawReplayPayload =
            serde_json::from_value(json!({"id": "x", "players": null, "log": "|gen|8"})).unwrap();
        assert!(p.players.is_empty());
        assert_eq!(p.log.as_deref(), Some("|gen|8"));
    }

    #[test]
    fn listing_rows_tolerate_loose_types() {
        let rows: Vec<UserReplaySummary> = serde_json::from_value(json!([
            {"id": "a", "uploadtime": 1.7e9},
            {"id": "b", "players": null},
            {"id": "c", "format": "gen8ou", "players": ["x", "y"], "uploadtime": "yesterday"},
        ]))
        .unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(rows[0].uploadtime, Some(json!(1.7e9)));
        assert_eq!(rows[1].players, None);
    }

    #[test]
    fn replay_uses_published_field_names() {
        let replay = Replay {
            id: "gen8ou-1".into(),
            format: "[Gen 8] OU".into(),
            players: vec!["a".into(), "b".into()],
            generation: Some(8),
            tier: None,
            pokemon_by_player: Roster::default(),
            winner: None,
            rules: vec![],
            metadata: ReplayMetadata { format_id: Some(json!("gen8ou")), ..Default::default() },
            full_log: String::new(),
        };
        let v = serde_json::to_value(&replay).unwrap();
        assert!(v.get("pokemonByPlayer").unwrap().get("p1").is_some());
        assert!(v.get("pokemonByPlayer").unwrap().get("p2").is_some());
        assert!(v.get("fullLog").is_some());
        assert_eq!(v["metadata"]["formatId"], json!("gen8ou"));
        assert!(v["metadata"].get("views").unwrap().is_null());
    }

    #[test]
    fn roster_lookup_by_token() {
        let mut r = Roster::default();
        r.push(PlayerSlot::P2, "Pikachu".into());
        assert_eq!(r.get("p2"), Some(&["Pikachu".to_string()][..]));
        assert!(r.get("p3").is_none());
    }
}
