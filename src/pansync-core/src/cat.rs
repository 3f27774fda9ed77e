// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Line-oriented CAT wire protocol: `f`/`F`/`LNB_LO`/`RPRT`, `\n`-terminated.

/// A single complete reply line received from a peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `RPRT 0` — the last set command succeeded.
    Ack,
    /// `RPRT <n>` with `n != 0` — the last set command failed.
    Nack(i64),
    /// A bare integer line — a frequency or LO value in Hz.
    Integer(i64),
    /// Anything else: malformed `RPRT`, non-integer, empty, garbage.
    Malformed,
}

/// Parse one already-trimmed, already-`\n`-stripped line.
#[must_use]
pub fn parse_reply(line: &str) -> Reply {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix("RPRT") {
        return match rest.trim().parse::<i64>() {
            Ok(0) => Reply::Ack,
            Ok(n) => Reply::Nack(n),
            Err(_) => Reply::Malformed,
        };
    }
    match line.parse::<i64>() {
        Ok(n) => Reply::Integer(n),
        Err(_) => Reply::Malformed,
    }
}

/// Query current frequency: `f\n`.
#[must_use]
pub fn query_freq() -> Vec<u8> {
    b"f\n".to_vec()
}

/// Query local oscillator offset (SDR, IFreq mode only): `LNB_LO\n`.
#[must_use]
pub fn query_lo() -> Vec<u8> {
    b"LNB_LO\n".to_vec()
}

/// Set frequency: `F <hz>\n`.
#[must_use]
pub fn set_freq(hz: i64) -> Vec<u8> {
    format!("F {hz}\n").into_bytes()
}

/// Set local oscillator offset (SDR, IFreq mode only): `LNB_LO <hz>\n`.
#[must_use]
pub fn set_lo(hz: i64) -> Vec<u8> {
    format!("LNB_LO {hz}\n").into_bytes()
}

/// Split `buf` into complete `\n`-terminated lines plus a leftover tail.
/// The tail is returned as owned bytes so the caller can fold it back into
/// a cleared receive buffer.
pub fn split_lines(buf: &[u8]) -> (Vec<String>, Vec<u8>) {
    let mut lines = Vec::new();
    let mut start = 0;
    for (i, &b) in buf.iter().enumerate() {
        if b == b'\n' {
            let line = String::from_utf8_lossy(&buf[start..i]).into_owned();
            lines.push(line);
            start = i + 1;
        }
    }
    (lines, buf[start..].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ack() {
        assert_eq!(parse_reply("RPRT 0"), Reply::Ack);
    }

    #[test]
    fn parses_nack() {
        assert_eq!(parse_reply("RPRT 5"), Reply::Nack(5));
        assert_eq!(parse_reply("RPRT -1"), Reply::Nack(-1));
    }

    #[test]
    fn parses_integer() {
        assert_eq!(parse_reply("14200000"), Reply::Integer(14_200_000));
        assert_eq!(parse_reply("-59095000"), Reply::Integer(-59_095_000));
    }

    #[test]
    fn malformed_rprt_and_garbage() {
        assert_eq!(parse_reply("RPRT banana"), Reply::Malformed);
        assert_eq!(parse_reply("banana"), Reply::Malformed);
        assert_eq!(parse_reply(""), Reply::Malformed);
    }

    #[test]
    fn encodes_commands_bit_exact() {
        assert_eq!(query_freq(), b"f\n");
        assert_eq!(query_lo(), b"LNB_LO\n");
        assert_eq!(set_freq(14_200_000), b"F 14200000\n");
        assert_eq!(set_lo(-59_095_000), b"LNB_LO -59095000\n");
    }

    #[test]
    fn split_lines_keeps_incomplete_tail() {
        let (lines, tail) = split_lines(b"14200000\nRPRT 0\n140");
        assert_eq!(lines, vec!["14200000", "RPRT 0"]);
        assert_eq!(tail, b"140");
    }

    #[test]
    fn split_lines_coalesced_reads_yield_multiple_lines_at_once() {
        let (lines, tail) = split_lines(b"RPRT 0\n14200000\n");
        assert_eq!(lines, vec!["RPRT 0", "14200000"]);
        assert!(tail.is_empty());
    }
}
