// SPDX-License-Identifier: MIT
//! Shell-token matching for exec whitelist templates.
//!
//! Commands and templates are tokenised on ASCII whitespace — no shell
//! expansion, no quoting rules. A template token of `*` matches exactly one
//! command token; `**` matches any run of zero or more tokens. The first
//! template that matches wins (see `Policy::exec_allowed`).

/// Split on ASCII whitespace, the same tokenisation rule used for both the
/// incoming command and the configured templates.
pub fn tokenize(s: &str) -> Vec<&str> {
    s.split_ascii_whitespace().collect()
}

/// True iff `tokens` matches `template` under the `*` / `**` rules.
pub fn template_matches(template: &[&str], tokens: &[&str]) -> bool {
    match_tokens(template, tokens)
}

fn match_tokens(template: &[&str], tokens: &[&str]) -> bool {
    match template.first() {
        None => tokens.is_empty(),
        Some(&"**") => {
            // Greedy: try consuming the largest possible suffix first, then
            // back off one token at a time (the "single backtracking" rule
            // reduces to ordinary backtracking here since `**` entries are
            // rare and commands are short).
            for take in (0..=tokens.len()).rev() {
                if match_tokens(&template[1..], &tokens[take..]) {
                    return true;
                }
            }
            false
        }
        Some(&"*") => {
            if tokens.is_empty() {
                false
            } else {
                match_tokens(&template[1..], &tokens[1..])
            }
        }
        Some(&t) => {
            if tokens.first() == Some(&t) {
                match_tokens(&template[1..], &tokens[1..])
            } else {
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_template_matches_only_exact_sequence() {
        let template = tokenize("npm test");
        assert!(template_matches(&template, &tokenize("npm test")));
        assert!(!template_matches(&template, &tokenize("npm test --watch")));
    }

    #[test]
    fn bare_double_star_matches_everything() {
        let template = tokenize("**");
        assert!(template_matches(&template, &tokenize("rm -rf /")));
        assert!(template_matches(&template, &[]));
    }

    #[test]
    fn double_star_suffix_matches_any_trailing_tokens() {
        let template = tokenize("pytest **");
        assert!(template_matches(&template, &tokenize("pytest tests/unit -q")));
        assert!(template_matches(&template, &tokenize("pytest")));
        assert!(!template_matches(&template, &tokenize("pyflakes tests/unit")));
    }

    #[test]
    fn single_star_matches_exactly_one_token() {
        let template = tokenize("docker * up");
        assert!(template_matches(&template, &tokenize("docker compose up")));
        assert!(!template_matches(&template, &tokenize("docker compose exec up")));
    }

    #[test]
    fn empty_template_only_matches_empty_command() {
        let template: Vec<&str> = vec![];
        assert!(template_matches(&template, &[]));
        assert!(!template_matches(&template, &tokenize("anything")));
    }
}
