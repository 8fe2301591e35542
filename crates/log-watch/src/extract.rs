//! Join/leave event extraction from raw server log lines.

/// Delimiter between the log prefix (`[15:57:19] [Server thread/INFO]`) and
/// the message payload.
const PREFIX_DELIMITER: &str = "]: ";

const JOINED_PHRASE: &str = "joined the game";
const LEFT_PHRASE: &str = "left the game";

/// What happened to a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Joined,
    Left,
}

/// A join/leave event extracted from one log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub name: String,
    pub kind: EventKind,
}

/// Extracts a join/leave event from a raw log line.
///
/// The payload is everything after the last `"]: "`; the player name is its
/// first whitespace-delimited token. Phrase detection is substring-based over
/// the whole payload, independent of tokenisation. Lines without the
/// delimiter, without a name, or matching neither phrase produce no event.
pub fn extract_event(line: &str) -> Option<LogEvent> {
    let (_, payload) = line.rsplit_once(PREFIX_DELIMITER)?;

    let kind = if payload.contains(JOINED_PHRASE) {
        EventKind::Joined
    } else if payload.contains(LEFT_PHRASE) {
        EventKind::Left
    } else {
        return None;
    };

    let name = payload.split_whitespace().next()?;
    Some(LogEvent {
        name: name.to_string(),
        kind,
    })
}
