use std::io::Write;

use serde::Serialize;

use crate::config::OverflowPolicy;
use crate::error::{ArchiveError, Result};

/// Result of emitting one log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct LogOutcome {
    /// Bytes of entry content written (prefix excluded)
    pub(crate) written: usize,
    pub(crate) truncated: bool,
    pub(crate) original_len: usize,
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a char.
pub(crate) fn truncate_at_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Write `Processing entry: <entry>` to `out`, enforcing the length policy.
///
/// Under [`OverflowPolicy::Reject`] nothing is written for an oversized entry.
pub(crate) fn process_log(
    entry: &str,
    max_len: usize,
    policy: OverflowPolicy,
    out: &mut dyn Write,
) -> Result<LogOutcome> {
    let original_len = entry.len();
    let body = if original_len <= max_len {
        entry
    } else {
        match policy {
            OverflowPolicy::Reject => {
                tracing::debug!(len = original_len, max = max_len, "log entry rejected");
                return Err(ArchiveError::InputTooLong {
                    what: "log entry",
                    len: original_len,
                    max: max_len,
                });
            }
            OverflowPolicy::Truncate => {
                let cut = truncate_at_char_boundary(entry, max_len);
                tracing::warn!(
                    len = original_len,
                    kept = cut.len(),
                    "log entry truncated"
                );
                cut
            }
        }
    };

    writeln!(out, "Processing entry: {body}")?;
    out.flush()?;

    Ok(LogOutcome {
        written: body.len(),
        truncated: body.len() < original_len,
        original_len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(entry: &str, max: usize, policy: OverflowPolicy) -> (Result<LogOutcome>, String) {
        let mut buf = Vec::new();
        let res = process_log(entry, max, policy, &mut buf);
        (res, String::from_utf8(buf).unwrap())
    }

    #[test]
    fn entry_within_limit_is_emitted_unmodified() {
        let (res, out) = run("System started.", 255, OverflowPolicy::Reject);
        let outcome = res.unwrap();
        assert_eq!(out, "Processing entry: System started.\n");
        assert_eq!(outcome.written, 15);
        assert!(!outcome.truncated);
    }

    #[test]
    fn entry_exactly_at_limit_is_accepted() {
        let entry = "x".repeat(255);
        let (res, out) = run(&entry, 255, OverflowPolicy::Reject);
        assert!(res.is_ok());
        assert_eq!(out, format!("Processing entry: {entry}\n"));
    }

    #[test]
    fn every_length_up_to_limit_round_trips() {
        for len in [0, 1, 16, 128, 254, 255] {
            let entry = "a".repeat(len);
            let (res, out) = run(&entry, 255, OverflowPolicy::Reject);
            assert_eq!(res.unwrap().written, len);
            assert_eq!(out.strip_prefix("Processing entry: ").unwrap(), format!("{entry}\n"));
        }
    }

    #[test]
    fn oversized_entry_rejected_and_nothing_written() {
        let entry = "A".repeat(10_000);
        let (res, out) = run(&entry, 255, OverflowPolicy::Reject);
        match res {
            Err(ArchiveError::InputTooLong { what, len, max }) => {
                assert_eq!(what, "log entry");
                assert_eq!(len, 10_000);
                assert_eq!(max, 255);
            }
            other => panic!("expected InputTooLong, got {other:?}"),
        }
        assert!(out.is_empty());
    }

    #[test]
    fn truncate_policy_reports_truncation() {
        let entry = "B".repeat(300);
        let (res, out) = run(&entry, 255, OverflowPolicy::Truncate);
        let outcome = res.unwrap();
        assert!(outcome.truncated);
        assert_eq!(outcome.written, 255);
        assert_eq!(outcome.original_len, 300);
        assert_eq!(out, format!("Processing entry: {}\n", "B".repeat(255)));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // "é" is two bytes; a 3-byte limit must not split the second one.
        assert_eq!(truncate_at_char_boundary("éé", 3), "é");
        assert_eq!(truncate_at_char_boundary("éé", 4), "éé");
        assert_eq!(truncate_at_char_boundary("日本", 2), "");
    }

    #[test]
    fn writer_failure_is_reported() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }
        let err = process_log("hi", 255, OverflowPolicy::Reject, &mut Broken).unwrap_err();
        assert!(matches!(err, ArchiveError::Output(_)));
    }
}
