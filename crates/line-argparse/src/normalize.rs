//! Token normalization ahead of resolution.

use std::collections::HashSet;

/// Separator after which every token is taken literally.
pub const END_OF_OPTIONS: &str = "--";

/// Host-runtime switches that are not part of any command's own grammar.
const PERMISSION_FLAGS: &[&str] = &[
    "-A",
    "--allow-all",
    "--allow-env",
    "--allow-net",
    "--allow-read",
    "--allow-run",
    "--allow-write",
    "--reload",
];

/// Flags the host environment reserves for itself.
///
/// Matching tokens are removed before resolution and handed to the handler
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservedFlags {
    flags: HashSet<String>,
}

impl ReservedFlags {
    pub fn none() -> Self {
        Self::default()
    }

    /// The runtime permission switches (`--allow-net`, `-A`, ...).
    pub fn permissions() -> Self {
        Self::new(PERMISSION_FLAGS.iter().copied())
    }

    pub fn new<I, S>(flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            flags: flags.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `token` is a reserved flag, bare or written as `flag=value`.
    pub fn matches(&self, token: &str) -> bool {
        if self.flags.contains(token) {
            return true;
        }
        token
            .split_once('=')
            .is_some_and(|(flag, _)| self.flags.contains(flag))
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

/// Normalizer output: the command's own tokens plus the extracted reserved flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedTokens {
    pub tokens: Vec<String>,
    pub reserved: Vec<String>,
    /// Index in `tokens` of the literal `--` the user typed, if any. A `--`
    /// produced by splitting `--flag=--` is a value and is not recorded here.
    pub separator: Option<usize>,
}

/// Split `flag=value` tokens and pull out reserved flags.
///
/// Positions are preserved. Nothing after `--` is touched.
pub fn normalize<S: AsRef<str>>(raw: &[S], reserved: &ReservedFlags) -> NormalizedTokens {
    let mut out = NormalizedTokens::default();
    let mut after_separator = false;

    for token in raw {
        let token = token.as_ref();

        if after_separator {
            out.tokens.push(token.to_string());
            continue;
        }
        if token == END_OF_OPTIONS {
            after_separator = true;
            out.separator = Some(out.tokens.len());
            out.tokens.push(token.to_string());
            continue;
        }
        if reserved.matches(token) {
            out.reserved.push(token.to_string());
            continue;
        }

        match split_flag_value(token) {
            Some((flag, value)) => {
                out.tokens.push(flag.to_string());
                out.tokens.push(value.to_string());
            }
            None => out.tokens.push(token.to_string()),
        }
    }

    out
}

fn split_flag_value(token: &str) -> Option<(&str, &str)> {
    if !token.starts_with('-') || token == "-" {
        return None;
    }
    token
        .split_once('=')
        .filter(|(flag, _)| flag.len() > 1 && *flag != END_OF_OPTIONS)
}
