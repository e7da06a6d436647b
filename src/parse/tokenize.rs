use std::borrow::Cow;

use super::types::Lexed;

/// Tokenize a logical line into words using shlex (POSIX word splitting).
///
/// A line whose last character is an active escape (a backslash outside
/// single quotes with nothing after it) is reported as
/// [`Lexed::NeedsMoreInput`] rather than an error, so the caller can join
/// it with the next physical line.
pub fn tokenize(line: &str) -> Lexed {
    if let Some(words) = shlex::split(&shield_hashes(line)) {
        return Lexed::Complete(words);
    }
    if ends_with_naked_backslash(line) {
        Lexed::NeedsMoreInput
    } else {
        Lexed::LexError("No closing quotation".into())
    }
}

/// Escape every `#` that starts an unquoted word.
///
/// shlex reads such a `#` as the start of a comment and drops the rest of
/// the line; here it is an ordinary character.
fn shield_hashes(line: &str) -> Cow<'_, str> {
    if !line.contains('#') {
        return Cow::Borrowed(line);
    }
    let mut out = String::with_capacity(line.len() + 4);
    let (mut sq, mut dq, mut esc) = (false, false, false);
    let mut word_start = true;
    for c in line.chars() {
        if esc {
            esc = false;
            word_start = false;
            out.push(c);
            continue;
        }
        match c {
            '#' if word_start => out.push('\\'),
            '\\' if !sq => esc = true,
            '\'' if !dq => sq = !sq,
            '"' if !sq => dq = !dq,
            _ => {}
        }
        word_start = !sq && !dq && matches!(c, ' ' | '\t' | '\n');
        out.push(c);
    }
    Cow::Owned(out)
}

/// True if `line` ends in a backslash that would escape the next character.
///
/// Inside single quotes a backslash is literal; inside double quotes and
/// in bare words it escapes.
pub fn ends_with_naked_backslash(line: &str) -> bool {
    let (mut sq, mut dq, mut esc) = (false, false, false);
    for c in line.chars() {
        if esc {
            esc = false;
            continue;
        }
        match c {
            '\\' if !sq => esc = true,
            '\'' if !dq => sq = !sq,
            '"' if !sq => dq = !dq,
            _ => {}
        }
    }
    esc
}

/// Drop the trailing backslash from a line that requested continuation.
pub fn strip_continuation(line: &str) -> &str {
    line.strip_suffix('\\').unwrap_or(line)
}
