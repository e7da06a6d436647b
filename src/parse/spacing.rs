//! Operator spacing: make `| & < >` runs standalone words before tokenizing.

use std::sync::LazyLock;

use regex::Regex;

/// Runs of one or two process-control operator characters.
static OPERATOR_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([|&<>]{1,2})").expect("operator pattern must compile"));

fn is_operator_char(c: char) -> bool {
    matches!(c, '|' | '&' | '<' | '>')
}

/// Surround every operator run with single spaces (`ls|wc` → `ls | wc`).
///
/// This pass knows nothing about quoting: `echo 'a|b'` becomes
/// `echo 'a | b'`. See [`space_operators_quoted`] for the quote-aware form.
pub fn space_operators(line: &str) -> String {
    OPERATOR_RUN.replace_all(line, " ${1} ").into_owned()
}

/// Like [`space_operators`], but leaves operator characters alone inside
/// single or double quotes and when escaped by a backslash.
pub fn space_operators_quoted(line: &str) -> String {
    let mut out = String::with_capacity(line.len() + 8);
    let chars: Vec<char> = line.chars().collect();
    let len = chars.len();
    let mut i = 0;
    let (mut sq, mut dq, mut esc) = (false, false, false);

    while i < len {
        let c = chars[i];

        if esc {
            out.push(c);
            esc = false;
            i += 1;
            continue;
        }
        if c == '\\' && !sq {
            esc = true;
            out.push(c);
            i += 1;
            continue;
        }
        if c == '\'' && !dq {
            sq = !sq;
        } else if c == '"' && !sq {
            dq = !dq;
        }
        if sq || dq || !is_operator_char(c) {
            out.push(c);
            i += 1;
            continue;
        }

        // Operator run, at most two characters
        let run = if i + 1 < len && is_operator_char(chars[i + 1]) {
            2
        } else {
            1
        };
        out.push(' ');
        out.extend(&chars[i..i + run]);
        out.push(' ');
        i += run;
    }
    out
}

/// Apply whichever spacing mode is configured.
pub fn space(line: &str, quote_aware: bool) -> String {
    if quote_aware {
        space_operators_quoted(line)
    } else {
        space_operators(line)
    }
}
