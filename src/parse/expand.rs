//! Word expansions: home directory and variables on the raw line,
//! pathname expansion on individual tokens.

use std::borrow::Cow;
use std::path::Path;

use glob::{MatchOptions, Pattern};
use log::{debug, warn};

use crate::config::ExpansionConfig;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    // glob drops dot entries outright with this set; see `reveals_hidden`
    require_literal_leading_dot: false,
};

fn home_dir() -> Option<String> {
    std::env::var("HOME").ok()
}

fn lookup_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Expand a leading `~` and `$VAR` / `${VAR}` references in a raw line.
///
/// Unknown variables are left exactly as written.
pub fn expand_words<'a>(line: &'a str, config: &ExpansionConfig) -> Cow<'a, str> {
    match (config.tilde, config.variables) {
        (true, true) => shellexpand::full_with_context_no_errors(line, home_dir, lookup_var),
        (true, false) => shellexpand::tilde_with_context(line, home_dir),
        (false, true) => shellexpand::env_with_context_no_errors(line, lookup_var),
        (false, false) => Cow::Borrowed(line),
    }
}

/// True if `token` contains a wildcard that triggers pathname expansion.
pub fn has_wildcard(token: &str) -> bool {
    token.contains(['?', '*'])
}

/// Expand a wildcard token against the current working directory.
///
/// Tokens without a wildcard pass through unchanged. A pattern matching
/// nothing yields no words at all.
pub fn expand_pathname(token: &str) -> Vec<String> {
    expand_pathname_in(token, Path::new("."))
}

/// Expand a wildcard token relative to `dir`.
///
/// Results are spelled the way the user wrote the pattern: relative
/// patterns yield relative paths, absolute ones absolute paths, and a
/// leading `./` is kept. A wildcard never matches a leading dot; the
/// pattern component has to spell it out.
pub fn expand_pathname_in(token: &str, dir: &Path) -> Vec<String> {
    if !has_wildcard(token) {
        return vec![token.to_string()];
    }

    let absolute = Path::new(token).is_absolute();
    let prefix = if absolute || dir == Path::new(".") {
        String::new()
    } else {
        format!("{}/", Pattern::escape(&dir.to_string_lossy()))
    };

    let paths = match glob::glob_with(&format!("{prefix}{token}"), MATCH_OPTIONS) {
        Ok(paths) => paths,
        Err(e) => {
            // Unclosed brackets and the like: treat brackets literally
            debug!("pattern {token:?} rejected ({e}), retrying with literal brackets");
            let literal = literal_brackets(token);
            match glob::glob_with(&format!("{prefix}{literal}"), MATCH_OPTIONS) {
                Ok(paths) => paths,
                Err(e) => {
                    warn!("pattern {token:?} cannot be expanded: {e}");
                    return Vec::new();
                }
            }
        }
    };

    let base = if prefix.is_empty() { None } else { Some(dir) };
    let dot_slash = token.starts_with("./");
    paths
        .filter_map(Result::ok)
        .map(|path| {
            let spelled = match base.and_then(|b| path.strip_prefix(b).ok()) {
                Some(relative) => relative.to_string_lossy().into_owned(),
                None => path.to_string_lossy().into_owned(),
            };
            if dot_slash && !spelled.starts_with("./") {
                format!("./{spelled}")
            } else {
                spelled
            }
        })
        .filter(|spelled| !reveals_hidden(token, spelled))
        .collect()
}

/// True if `matched` has a dot-file component where `pattern` has a
/// component that does not itself start with a dot.
fn reveals_hidden(pattern: &str, matched: &str) -> bool {
    pattern
        .split('/')
        .zip(matched.split('/'))
        .any(|(want, got)| got.starts_with('.') && !want.starts_with('.'))
}

/// Rewrite `[` and `]` as single-character classes so they match themselves.
fn literal_brackets(token: &str) -> String {
    let mut out = String::with_capacity(token.len() + 4);
    for c in token.chars() {
        match c {
            '[' => out.push_str("[[]"),
            ']' => out.push_str("[]]"),
            _ => out.push(c),
        }
    }
    out
}
