// SPDX-License-Identifier: GPL-3.0-only

//! Character recovery for GPFS command output

/// Reverse the percent encoding used in `-Y` output.
///
/// Only `%2F` and `%3A` are recognized, replaced in that order.
pub fn unescape(value: &str) -> String {
    value.replace("%2F", "/").replace("%3A", ":")
}

/// Drop the `%`, `(` and `)` decoration around `mmlspool` and `mmlsmgr` values.
pub fn strip_noise(value: &str) -> String {
    value.chars().filter(|c| !matches!(c, '%' | '(' | ')')).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescapes_slash_and_colon() {
        assert_eq!(unescape("%2Fgpfs%2Ffs1"), "/gpfs/fs1");
        assert_eq!(unescape("created%3A 10%3A30"), "created: 10:30");
    }

    #[test]
    fn leaves_other_sequences_alone() {
        assert_eq!(unescape("50%25 full"), "50%25 full");
        assert_eq!(unescape("plain"), "plain");
    }

    #[test]
    fn unescape_is_idempotent() {
        for input in ["%2F%3A", "%%2F3A", "%3%2FA", "a%3A%3Ab", "no escapes"] {
            let once = unescape(input);
            assert_eq!(unescape(&once), once, "input {input:?}");
        }
    }

    #[test]
    fn strips_pool_decoration() {
        assert_eq!(strip_noise("20405248 ( 97%)"), "20405248  97");
        assert_eq!(strip_noise("10.0.0.1 (c1n1)"), "10.0.0.1 c1n1");
        assert_eq!(strip_noise("clean"), "clean");
    }
}
