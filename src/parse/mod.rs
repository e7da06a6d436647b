pub mod expand;
pub mod sequence;
pub mod spacing;
pub mod tokenize;
pub mod types;

pub use expand::{expand_pathname, expand_words, has_wildcard};
pub use sequence::{PIPE, parse, parse_in};
pub use spacing::{space, space_operators, space_operators_quoted};
pub use tokenize::{strip_continuation, tokenize};
pub use types::{Command, CommandSequence, Lexed};

use crate::config::ExpansionConfig;

/// Apply word expansions, then operator spacing, to one physical line.
pub fn prepare_line(raw: &str, expansion: &ExpansionConfig, quote_aware: bool) -> String {
    let expanded = expand_words(raw, expansion);
    space(&expanded, quote_aware)
}
