//! Command admission policy for `run_command`.

/// Tokens that reject a command outright (compared case-insensitively).
pub const DENIED_TOKENS: &[&str] = &["sudo"];

/// Whether `command` may be executed.
///
/// Rejects any command with a whitespace-delimited token equal to a denied
/// token. Substrings (`pseudo`, `sudoers`) are not tokens and are allowed.
pub fn is_allowed(command: &str) -> bool {
    !command.split_whitespace().any(|token| {
        DENIED_TOKENS
            .iter()
            .any(|denied| token.eq_ignore_ascii_case(denied))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_sudo_in_any_position_and_case() {
        assert!(!is_allowed("sudo rm -rf /"));
        assert!(!is_allowed("echo hi && SUDO apt install x"));
        assert!(!is_allowed("  Sudo\tls"));
    }

    #[test]
    fn allows_sudo_as_substring() {
        assert!(is_allowed("echo pseudo"));
        assert!(is_allowed("cat /etc/sudoers.d/readme"));
    }

    #[test]
    fn allows_plain_commands() {
        assert!(is_allowed("npm init -y"));
        assert!(is_allowed(""));
    }
}
