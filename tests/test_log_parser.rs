// tests/test_log_parser.rs
//
// Behaviour of the event-log parser on realistic and degenerate logs.

use replaydl::{parse, RawReplayPayload};
use serde_json::json;

const BATTLE_LOG: &str = "|j|☆Alice
|j|☆Bob
|player|p1|Alice|265|1500
|player|p2|Bob|1|1480
|teamsize|p1|6
|teamsize|p2|6
|gametype|singles
|gen|8
|tier|[Gen 8] OU
|rated|
|rule|Species Clause: Limit one of each Pokémon
|rule|Sleep Clause Mod: Limit one foe put to sleep
|rule|Dynamax Clause: You cannot dynamax
|clearpoke
|poke|p1|Dragapult, F|
|poke|p1|Landorus-Therian, M|
|poke|p2|Toxapex, F|
|poke|p2|Urshifu-*, M|
|teampreview
|
|start
|switch|p1a: Dragapult|Dragapult, F|100/100
|switch|p2a: Toxapex|Toxapex, F|100/100
|turn|1
|c|☆Alice|gl hf
|win|Alice
";

fn payload() -> RawReplayPayload {
    serde_json::from_value(json!({
        "id": "gen8ou-1234567890",
        "format": "[Gen 8] OU",
        "players": ["Alice", "Bob"],
        "views": 42,
        "uploadtime": 1_700_000_000,
        "rating": 1500,
        "private": 0,
        "formatid": "gen8ou"
    }))
    .unwrap()
}

#[test]
fn parses_full_battle_log() {
    let r = parse(BATTLE_LOG, &payload());

    assert_eq!(r.id, "gen8ou-1234567890");
    assert_eq!(r.format, "[Gen 8] OU");
    assert_eq!(r.players, vec!["Alice", "Bob"]);
    assert_eq!(r.generation, Some(8));
    assert_eq!(r.tier.as_deref(), Some("[Gen 8] OU"));
    assert_eq!(r.winner.as_deref(), Some("Alice"));
    assert_eq!(r.pokemon_by_player.p1, vec!["Dragapult, F", "Landorus-Therian, M"]);
    assert_eq!(r.pokemon_by_player.p2, vec!["Toxapex, F", "Urshifu-*, M"]);
    assert_eq!(
        r.rules,
        vec![
            "Species Clause: Limit one of each Pokémon",
            "Sleep Clause Mod: Limit one foe put to sleep",
            "Dynamax Clause: You cannot dynamax",
        ]
    );
    assert_eq!(r.metadata.views, Some(json!(42)));
    assert_eq!(r.metadata.rating, Some(json!(1500)));
    assert_eq!(r.metadata.private, Some(json!(0)));
    assert_eq!(r.metadata.format_id, Some(json!("gen8ou")));
    assert_eq!(r.full_log, BATTLE_LOG);
}

#[test]
fn parsing_is_deterministic() {
    let a = serde_json::to_vec(&parse(BATTLE_LOG, &payload())).unwrap();
    let b = serde_json::to_vec(&parse(BATTLE_LOG, &payload())).unwrap();
    assert_eq!(a, b);
}

#[test]
fn first_generation_wins() {
    let r = parse("|gen|7\n|gen|8\n", &payload());
    assert_eq!(r.generation, Some(7));
}

#[test]
fn first_tier_and_winner_win() {
    let r = parse("|tier|[Gen 7] OU\n|win|Bob\n|tier|[Gen 8] OU\n|win|Alice", &payload());
    assert_eq!(r.tier.as_deref(), Some("[Gen 7] OU"));
    assert_eq!(r.winner.as_deref(), Some("Bob"));
}

#[test]
fn roster_keeps_log_order_per_slot() {
    let r = parse("|poke|p1|A|\n|poke|p2|X|\n|poke|p1|B|", &payload());
    assert_eq!(r.pokemon_by_player.get("p1").unwrap(), ["A", "B"]);
    assert_eq!(r.pokemon_by_player.get("p2").unwrap(), ["X"]);
}

#[test]
fn roster_keeps_duplicates() {
    let r = parse("|poke|p1|Ditto|\n|poke|p1|Ditto|", &payload());
    assert_eq!(r.pokemon_by_player.p1, vec!["Ditto", "Ditto"]);
}

#[test]
fn unknown_slots_are_dropped() {
    let r = parse("|poke|p3|Mew|\n|poke|p4|Celebi|\n|poke|P1|Jirachi|", &payload());
    assert!(r.pokemon_by_player.p1.is_empty());
    assert!(r.pokemon_by_player.p2.is_empty());

    let v = serde_json::to_value(&r).unwrap();
    let keys: Vec<_> = v["pokemonByPlayer"].as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys, vec!["p1", "p2"]);
}

#[test]
fn rules_keep_order_and_duplicates() {
    let r = parse("|rule|B\n|rule|A\n|rule|B", &payload());
    assert_eq!(r.rules, vec!["B", "A", "B"]);
}

#[test]
fn empty_log_keeps_metadata() {
    let r = parse("", &payload());
    assert_eq!(r.generation, None);
    assert_eq!(r.tier, None);
    assert_eq!(r.winner, None);
    assert!(r.pokemon_by_player.p1.is_empty());
    assert!(r.pokemon_by_player.p2.is_empty());
    assert!(r.rules.is_empty());
    assert_eq!(r.metadata.views, Some(json!(42)));
    assert_eq!(r.metadata.uploadtime, Some(json!(1_700_000_000)));
    assert_eq!(r.full_log, "");
}

#[test]
fn malformed_lines_are_skipped() {
    let log = "garbage\n||\n|gen|\n|gen|abc\n|tier|   \n|poke|p1||\n|win|\n|gen|4";
    let r = parse(log, &payload());
    assert_eq!(r.generation, Some(4));
    assert_eq!(r.tier, None);
    assert_eq!(r.winner, None);
    assert!(r.pokemon_by_player.p1.is_empty());
}

#[test]
fn crlf_logs_parse() {
    let r = parse("|gen|3\r\n|tier|[Gen 3] OU\r\n|poke|p2|Metagross|\r\n", &payload());
    assert_eq!(r.generation, Some(3));
    assert_eq!(r.tier.as_deref(), Some("[Gen 3] OU"));
    assert_eq!(r.pokemon_by_player.p2, vec!["Metagross"]);
}

#[test]
fn missing_payload_fields_stay_unset() {
    let r = parse("|gen|9", &RawReplayPayload::default());
    assert_eq!(r.id, "");
    assert!(r.players.is_empty());
    assert_eq!(r.metadata, Default::default());
}
