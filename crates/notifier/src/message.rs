//! Notification message formatting.
//!
//! Existing webhook consumers match on the emoji markers and the Japanese
//! phrasing, so the message bodies must stay byte-for-byte stable.

use chrono::{DateTime, Local};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Message for a player joining the server.
pub fn join_message(name: &str, at: DateTime<Local>) -> String {
    format!(
        "🟢 {name} がサーバに参加しました\n\n発生時刻: {}",
        at.format(TIMESTAMP_FORMAT)
    )
}

/// Message for a player leaving the server.
pub fn leave_message(name: &str, at: DateTime<Local>) -> String {
    format!(
        "🔴 {name} がサーバから退出しました\n\n発生時刻: {}",
        at.format(TIMESTAMP_FORMAT)
    )
}

/// Periodic status message with the current player list.
///
/// An empty list renders the explicit "nobody present" line, never an empty
/// joined list.
pub fn status_message(names: &[String], at: DateTime<Local>) -> String {
    let mut body = format!(
        "✅ サーバは稼働中です\n\nチェック時刻: {}",
        at.format(TIMESTAMP_FORMAT)
    );
    if names.is_empty() {
        body.push_str("\n\n現在サーバには誰もいません");
    } else {
        body.push_str("\n\n現在の参加者: ");
        body.push_str(&names.join(", "));
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 8, 7, 15, 57, 19).unwrap()
    }

    #[test]
    fn join_message_exact_bytes() {
        assert_eq!(
            join_message("marcia2525dayo", fixed_time()),
            "🟢 marcia2525dayo がサーバに参加しました\n\n発生時刻: 2026-08-07 15:57:19"
        );
    }

    #[test]
    fn leave_message_exact_bytes() {
        assert_eq!(
            leave_message("marcia2525dayo", fixed_time()),
            "🔴 marcia2525dayo がサーバから退出しました\n\n発生時刻: 2026-08-07 15:57:19"
        );
    }

    #[test]
    fn status_message_with_players() {
        let names = vec!["alice".to_string(), "bob".to_string()];
        assert_eq!(
            status_message(&names, fixed_time()),
            "✅ サーバは稼働中です\n\nチェック時刻: 2026-08-07 15:57:19\n\n現在の参加者: alice, bob"
        );
    }

    #[test]
    fn status_message_nobody_present() {
        assert_eq!(
            status_message(&[], fixed_time()),
            "✅ サーバは稼働中です\n\nチェック時刻: 2026-08-07 15:57:19\n\n現在サーバには誰もいません"
        );
    }
}
