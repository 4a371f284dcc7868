// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Glob pattern compilation
//!
//! Translates a glob pattern into an anchored regular expression in a single
//! left-to-right scan. The translation is parameterized by the separator
//! character of the filesystem the pattern will be matched against:
//!
//! - `*` matches within one path segment, `**` matches across separators
//! - `?` matches exactly one non-separator character
//! - `[...]` is a character class (`[!...]` negates, ranges allowed), and
//!   never matches the separator
//! - `{a,b,c}` is an alternation (groups do not nest)
//! - `\x` matches `x` literally
//!
//! This is filesystem-agnostic; callers match the compiled regex against the
//! string form of a path.

use regex::Regex;

/// Error type for glob compilation
#[derive(thiserror::Error, Debug)]
pub enum GlobError {
    /// The glob is malformed; `index` is the offending position in `pattern`
    #[error("Invalid glob {pattern:?} at index {index}: {message}")]
    InvalidGlob {
        pattern: String,
        index: usize,
        message: &'static str,
    },

    #[error("Glob produced an invalid regex: {0}")]
    Regex(#[from] regex::Error),
}

impl GlobError {
    fn invalid(pattern: &[char], index: usize, message: &'static str) -> Self {
        GlobError::InvalidGlob {
            pattern: pattern.iter().collect(),
            index,
            message,
        }
    }

    /// Offending character index for syntax errors
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self {
            GlobError::InvalidGlob { index, .. } => Some(*index),
            GlobError::Regex(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, GlobError>;

/// Marker for "no more input" while peeking.
const EOL: char = '\0';

fn is_regex_meta(c: char) -> bool {
    ".^$+*?{}[]|()\\".contains(c)
}

fn is_glob_meta(c: char) -> bool {
    "\\*?[{".contains(c)
}

fn peek(chars: &[char], i: usize) -> char {
    chars.get(i).copied().unwrap_or(EOL)
}

/// Append `c` as a literal outside of a character class.
fn push_literal(regex: &mut String, c: char) {
    if is_regex_meta(c) || is_glob_meta(c) {
        regex.push('\\');
    }
    regex.push(c);
}

/// Append `c` as a literal inside a character class.
///
/// `&`, `~` and `-` are escaped as well because doubled they form class
/// set operations.
fn push_class_literal(regex: &mut String, c: char) {
    if "\\[]^&~-".contains(c) {
        regex.push('\\');
    }
    regex.push(c);
}

/// Translate `glob` into an anchored regex source string.
pub fn glob_to_regex(glob: &str, separator: char) -> Result<String> {
    let chars: Vec<char> = glob.chars().collect();
    let mut sep = String::new();
    push_class_literal(&mut sep, separator);
    let not_sep = format!("[^{sep}]");

    let mut regex = String::from("^");
    let mut in_group = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        i += 1;
        match c {
            '\\' => {
                if i == chars.len() {
                    return Err(GlobError::invalid(&chars, i - 1, "No character to escape"));
                }
                push_literal(&mut regex, chars[i]);
                i += 1;
            }
            '[' => {
                let mut body = String::new();
                let mut negated = false;
                if peek(&chars, i) == '^' {
                    body.push_str("\\^");
                    i += 1;
                } else {
                    if peek(&chars, i) == '!' {
                        negated = true;
                        i += 1;
                    }
                    if peek(&chars, i) == '-' {
                        body.push_str("\\-");
                        i += 1;
                    }
                }

                let mut has_range_start = false;
                let mut last = EOL;
                let mut closed = false;
                while i < chars.len() {
                    let c = chars[i];
                    i += 1;
                    if c == ']' {
                        closed = true;
                        break;
                    }
                    if c == separator {
                        return Err(GlobError::invalid(
                            &chars,
                            i - 1,
                            "Explicit 'name separator' in class",
                        ));
                    }
                    if c == '-' {
                        if !has_range_start {
                            return Err(GlobError::invalid(&chars, i - 1, "Invalid range"));
                        }
                        let end = peek(&chars, i);
                        i += 1;
                        if end == EOL || end == ']' {
                            // Trailing '-' is a literal; ']' still closes the class.
                            push_class_literal(&mut body, '-');
                            closed = end == ']';
                            break;
                        }
                        if end == separator {
                            return Err(GlobError::invalid(
                                &chars,
                                i - 1,
                                "Explicit 'name separator' in class",
                            ));
                        }
                        if end < last {
                            return Err(GlobError::invalid(&chars, i - 3, "Invalid range"));
                        }
                        body.push('-');
                        push_class_literal(&mut body, end);
                        has_range_start = false;
                    } else {
                        push_class_literal(&mut body, c);
                        has_range_start = true;
                        last = c;
                    }
                }
                if !closed {
                    return Err(GlobError::invalid(&chars, i - 1, "Missing ']'"));
                }
                if body.is_empty() && !negated {
                    return Err(GlobError::invalid(&chars, i - 1, "Empty class"));
                }
                if negated {
                    regex.push_str(&format!("[^{sep}{body}]"));
                } else {
                    regex.push_str(&format!("[[^{sep}]&&[{body}]]"));
                }
            }
            '{' => {
                if in_group {
                    return Err(GlobError::invalid(&chars, i - 1, "Cannot nest groups"));
                }
                regex.push_str("(?:(?:");
                in_group = true;
            }
            '}' => {
                if in_group {
                    regex.push_str("))");
                    in_group = false;
                } else {
                    regex.push_str("\\}");
                }
            }
            ',' => {
                if in_group {
                    regex.push_str(")|(?:");
                } else {
                    regex.push(',');
                }
            }
            '*' => {
                if peek(&chars, i) == '*' {
                    regex.push_str(".*");
                    i += 1;
                } else {
                    regex.push_str(&not_sep);
                    regex.push('*');
                }
            }
            '?' => regex.push_str(&not_sep),
            c => push_literal(&mut regex, c),
        }
    }

    if in_group {
        return Err(GlobError::invalid(&chars, i.saturating_sub(1), "Missing '}'"));
    }

    regex.push('$');
    Ok(regex)
}

/// Compile `glob` into a [`Regex`] for a filesystem using `separator`.
pub fn compile(glob: &str, separator: char) -> Result<Regex> {
    let source = glob_to_regex(glob, separator)?;
    Ok(Regex::new(&source)?)
}
