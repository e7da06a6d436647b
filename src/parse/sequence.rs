use std::path::Path;

use log::debug;

use super::expand::{expand_pathname_in, has_wildcard};
use super::types::{Command, CommandSequence};

/// The token that separates pipeline stages.
pub const PIPE: &str = "|";

/// Parse tokens into a pipeline, expanding wildcards against the current
/// working directory.
pub fn parse(tokens: &[String]) -> CommandSequence {
    parse_in(tokens, Path::new("."), true)
}

/// Parse tokens into a pipeline.
///
/// Tokens are grouped into stages at each exact `|` token. When `globbing`
/// is on, wildcard tokens are replaced by their matches under `dir` (and
/// vanish when nothing matches). Redirection-looking tokens (`>`, `<`, ...)
/// get no special treatment and end up as plain arguments.
///
/// A stage is emitted with no arguments when a `|` has nothing before it
/// (or nothing after it at end of input), or when all of its words were
/// globs that matched nothing. The exec layer refuses to run such stages.
pub fn parse_in(tokens: &[String], dir: &Path, globbing: bool) -> CommandSequence {
    let mut commands = Vec::new();
    let mut args: Vec<String> = Vec::new();

    for token in tokens {
        if token == PIPE {
            commands.push(Command::new(std::mem::take(&mut args)));
            continue;
        }
        if globbing && has_wildcard(token) {
            let matches = expand_pathname_in(token, dir);
            debug!("expanded {token:?} to {} path(s)", matches.len());
            args.extend(matches);
        } else {
            args.push(token.clone());
        }
    }

    // Any token at all opens a final stage, even if globbing emptied it
    if !tokens.is_empty() {
        commands.push(Command::new(args));
    }

    CommandSequence::new(commands)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn stages(seq: &CommandSequence) -> Vec<Vec<&str>> {
        seq.commands
            .iter()
            .map(|c| c.args().iter().map(String::as_str).collect())
            .collect()
    }

    #[test]
    fn single_command() {
        let seq = parse(&toks(&["echo", "hi"]));
        assert_eq!(stages(&seq), vec![vec!["echo", "hi"]]);
        assert_eq!(seq.commands[0].name(), Some("echo"));
    }

    #[test]
    fn two_stage_pipeline() {
        let seq = parse(&toks(&["ls", "|", "wc", "-l"]));
        assert_eq!(stages(&seq), vec![vec!["ls"], vec!["wc", "-l"]]);
    }

    #[test]
    fn three_stage_pipeline() {
        let seq = parse(&toks(&["a", "|", "b", "|", "c"]));
        assert_eq!(seq.len(), 3);
    }

    #[test]
    fn empty_tokens_give_empty_sequence() {
        assert!(parse(&[]).is_empty());
    }

    #[test]
    fn trailing_pipe_leaves_empty_stage() {
        let seq = parse(&toks(&["ls", "|"]));
        assert_eq!(seq.len(), 2);
        assert!(seq.commands[1].is_empty());
        assert_eq!(seq.commands[1].name(), None);
    }

    #[test]
    fn leading_pipe_leaves_empty_stage() {
        let seq = parse(&toks(&["|", "wc"]));
        assert!(seq.commands[0].is_empty());
        assert_eq!(seq.commands[1].name(), Some("wc"));
    }

    #[test]
    fn double_operator_is_not_a_pipe() {
        let seq = parse(&toks(&["a", "||", "b"]));
        assert_eq!(stages(&seq), vec![vec!["a", "||", "b"]]);
    }

    #[test]
    fn redirections_are_plain_arguments() {
        let seq = parse(&toks(&["echo", "x", ">", "out.txt"]));
        assert_eq!(stages(&seq), vec![vec!["echo", "x", ">", "out.txt"]]);
    }

    #[test]
    fn unmatched_glob_alone_leaves_empty_command() {
        let dir = tempfile::tempdir().unwrap();
        let seq = parse_in(&toks(&["*.nonexistent_ext"]), dir.path(), true);
        assert_eq!(seq.len(), 1);
        assert!(seq.commands[0].is_empty());
    }

    #[test]
    fn glob_expands_in_place() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.rs"), b"").unwrap();
        std::fs::write(dir.path().join("y.rs"), b"").unwrap();
        let seq = parse_in(&toks(&["wc", "*.rs", "-l"]), dir.path(), true);
        assert_eq!(stages(&seq), vec![vec!["wc", "x.rs", "y.rs", "-l"]]);
    }

    #[test]
    fn globbing_disabled_keeps_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let seq = parse_in(&toks(&["echo", "*.none"]), dir.path(), false);
        assert_eq!(stages(&seq), vec![vec!["echo", "*.none"]]);
    }

    #[test]
    fn literal_missing_file_kept() {
        let dir = tempfile::tempdir().unwrap();
        let seq = parse_in(&toks(&["cat", "missing.txt"]), dir.path(), true);
        assert_eq!(stages(&seq), vec![vec!["cat", "missing.txt"]]);
    }

    #[test]
    fn slots_default_to_standard_streams() {
        let seq = parse(&toks(&["true"]));
        assert_eq!((seq.input, seq.output, seq.error), (0, 1, 2));
    }
}
