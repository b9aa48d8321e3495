//! Line protocol spoken by the Ginga engine on stdout/stderr
//!
//! Protocol lines have the shape `cmd::<status>::<entity>::<payload>`.
//! Everything else is plain log text. Parsing is total: every line maps to
//! exactly one [`ProtocolEvent`] and malformed lines degrade to
//! [`ProtocolEvent::Log`].

use gpanel_core::{ProtocolEvent, ProtocolStatus};

/// Prefix that marks a protocol line
pub const CMD_PREFIX: &str = "cmd::";

/// Segment delimiter
pub const DELIMITER: &str = "::";

/// Number of segments in a well-formed protocol line
const SEGMENTS: usize = 4;

/// Entity of the stream-started notification
pub const ENTITY_START: &str = "start";
/// Payload of the stream-started notification
pub const STREAM_STARTED_PAYLOAD: &str = "?mAV?";
/// Entity of scan progress notifications
pub const ENTITY_SCAN_PROGRESS: &str = "tunerscanprogress";
/// Entity of channel-found notifications
pub const ENTITY_CHANNEL_FOUND: &str = "channelfound";
/// Entity of tuner errors
pub const ENTITY_TUNER: &str = "tuner";

/// Parses one line of engine output.
///
/// The line is trimmed before matching. Non-protocol lines and protocol lines
/// with a segment count other than four are returned as `Log` carrying the
/// line exactly as received.
pub fn parse_line(line: &str) -> ProtocolEvent {
    let trimmed = line.trim();
    if !trimmed.starts_with(CMD_PREFIX) {
        return ProtocolEvent::Log(line.to_string());
    }

    let segments: Vec<&str> = trimmed.split(DELIMITER).collect();
    if segments.len() != SEGMENTS {
        return ProtocolEvent::Log(line.to_string());
    }

    let status = if segments[1] == "0" {
        ProtocolStatus::Ok
    } else {
        ProtocolStatus::Err
    };

    ProtocolEvent::Command {
        status,
        entity: segments[2].to_string(),
        payload: segments[3].to_string(),
    }
}

/// True for `cmd::0::start::?mAV?`
pub fn is_stream_started(event: &ProtocolEvent) -> bool {
    event.command_payload(ProtocolStatus::Ok, ENTITY_START) == Some(STREAM_STARTED_PAYLOAD)
}

/// Parses a scan progress payload such as `57` or `57%`.
///
/// Returns `None` for non-numeric payloads and values outside `0..=100`.
pub fn parse_percent(payload: &str) -> Option<u8> {
    let digits = payload.trim().replace('%', "");
    let value: i64 = digits.trim().parse().ok()?;
    u8::try_from(value).ok().filter(|v| *v <= 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(status: ProtocolStatus, entity: &str, payload: &str) -> ProtocolEvent {
        ProtocolEvent::Command {
            status,
            entity: entity.to_string(),
            payload: payload.to_string(),
        }
    }

    #[test]
    fn test_plain_text_is_log_unchanged() {
        for line in [
            "",
            "   ",
            "Ginga v1.0 starting",
            "  indented output\t",
            "command::0::start::x",
            "xcmd::0::start::x",
            "CMD::0::start::x",
        ] {
            assert_eq!(parse_line(line), ProtocolEvent::Log(line.to_string()));
        }
    }

    #[test]
    fn test_stream_started() {
        let event = parse_line("cmd::0::start::?mAV?");
        assert_eq!(event, command(ProtocolStatus::Ok, "start", "?mAV?"));
        assert!(is_stream_started(&event));
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        let event = parse_line("  cmd::0::start::?mAV?\r");
        assert!(is_stream_started(&event));
    }

    #[test]
    fn test_status_ok_only_for_literal_zero() {
        assert_eq!(
            parse_line("cmd::0::tuner::x"),
            command(ProtocolStatus::Ok, "tuner", "x")
        );
        for status in ["1", "2", "00", " 0", "ok", "-0", ""] {
            let line = format!("cmd::{status}::tuner::x");
            match parse_line(&line) {
                ProtocolEvent::Command { status, .. } => assert_eq!(status, ProtocolStatus::Err),
                other => panic!("expected Command for {line:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_empty_payload_is_allowed() {
        assert_eq!(
            parse_line("cmd::1::tuner::"),
            command(ProtocolStatus::Err, "tuner", "")
        );
    }

    #[test]
    fn test_wrong_segment_count_degrades_to_log() {
        for line in [
            "cmd::",
            "cmd::0",
            "cmd::0::start",
            "cmd::0::start::?mAV?::extra",
            "cmd::1::tuner::a::b",
        ] {
            assert_eq!(parse_line(line), ProtocolEvent::Log(line.to_string()));
        }
    }

    #[test]
    fn test_malformed_three_segment_line_is_log() {
        assert_eq!(
            parse_line("garbage::0::x"),
            ProtocolEvent::Log("garbage::0::x".to_string())
        );
    }

    #[test]
    fn test_parse_percent() {
        assert_eq!(parse_percent("57%"), Some(57));
        assert_eq!(parse_percent("10"), Some(10));
        assert_eq!(parse_percent(" 100 % "), Some(100));
        assert_eq!(parse_percent("0"), Some(0));
        assert_eq!(parse_percent("abc"), None);
        assert_eq!(parse_percent(""), None);
        assert_eq!(parse_percent("101"), None);
        assert_eq!(parse_percent("-5"), None);
        assert_eq!(parse_percent("4.5"), None);
    }
}
