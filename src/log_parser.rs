// src/log_parser.rs
//
// Single-pass scanner over a battle event log.
//
// The log is one `|`-delimited event per line, e.g.
//
//   |gen|8
//   |tier|[Gen 8] OU
//   |rule|Species Clause: Limit one of each Pokémon
//   |poke|p1|Dragapult, M|
//   |win|Alice
//
// Lines that do not fit the small grammar below are skipped; parsing never fails.

use crate::model::{PlayerSlot, RawReplayPayload, Replay, ReplayMetadata, Roster};

/// A recognised event line. Anything else is ignored.
#[derive(Debug, PartialEq, Eq)]
enum Event<'a> {
    /// `None` when the digit run does not fit a `u32`; it still counts as the first match.
    Gen(Option<u32>),
    Tier(&'a str),
    Poke { slot: &'a str, pokemon: &'a str },
    Rule(&'a str),
    Win(&'a str),
}

fn non_empty(field: Option<&str>) -> Option<&str> {
    field.map(str::trim).filter(|s| !s.is_empty())
}

/// Non-empty run of leading decimal digits in `field`.
fn leading_digits(field: &str) -> Option<&str> {
    let end = field.find(|c: char| !c.is_ascii_digit()).unwrap_or(field.len());
    (end > 0).then(|| &field[..end])
}

fn scan_line(line: &str) -> Option<Event<'_>> {
    let rest = line.trim_end_matches('\r').strip_prefix('|')?;
    let mut fields = rest.split('|');
    let kind = fields.next()?;
    match kind {
        "gen" => fields.next().and_then(leading_digits).map(|d| Event::Gen(d.parse().ok())),
        "tier" => non_empty(fields.next()).map(Event::Tier),
        "rule" => non_empty(fields.next()).map(Event::Rule),
        "win" => non_empty(fields.next()).map(Event::Win),
        "poke" => {
            let slot = fields.next()?;
            let pokemon = non_empty(fields.next())?;
            Some(Event::Poke { slot, pokemon })
        }
        _ => None,
    }
}

/// Build a [`Replay`] from `log` and the passthrough fields of `payload`.
///
/// Generation, tier and winner come from their first matching event.
/// Roster and rule entries keep log order and duplicates. Pokemon revealed
/// for any slot other than `p1`/`p2` are dropped.
pub fn parse(log: &str, payload: &RawReplayPayload) -> Replay {
    let mut generation: Option<Option<u32>> = None;
    let mut tier = None;
    let mut winner = None;
    let mut roster = Roster::default();
    let mut rules = Vec::new();

    for event in log.lines().filter_map(scan_line) {
        match event {
            Event::Gen(n) => {
                generation.get_or_insert(n);
            }
            Event::Tier(t) => {
                tier.get_or_insert_with(|| t.to_string());
            }
            Event::Win(w) => {
                winner.get_or_insert_with(|| w.to_string());
            }
            Event::Poke { slot, pokemon } => {
                if let Some(slot) = PlayerSlot::parse(slot) {
                    roster.push(slot, pokemon.to_string());
                }
            }
            Event::Rule(r) => rules.push(r.to_string()),
        }
    }

    Replay {
        id: payload.id.clone().unwrap_or_default(),
        format: payload.format.clone().unwrap_or_default(),
        players: payload.players.clone(),
        generation: generation.flatten(),
        tier,
        pokemon_by_player: roster,
        winner,
        rules,
        metadata: ReplayMetadata {
            views: payload.views.clone(),
            uploadtime: payload.uploadtime.clone(),
            rating: payload.rating.clone(),
            private: payload.private.clone(),
            format_id: payload.formatid.clone(),
        },
        full_log: log.to_string(),
    }
}

/// Parse the log embedded in the payload itself.
pub fn parse_payload(payload: &RawReplayPayload) -> Replay {
    parse(payload.log.as_deref().unwrap_or_default(), payload)
}
