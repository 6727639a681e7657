//! Option table construction.
//!
//! An option is declared by a key such as `"-L [value], --log [value]"`: a
//! comma-separated list of aliases, each optionally followed by bracketed
//! placeholders. Every placeholder adds one to the option's arity. All aliases
//! of one key share a single [`OptionSpec`].

use std::collections::HashMap;

use crate::error::DefinitionError;

/// Canonical identity of an option, shared by all of its aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OptionId(usize);

impl OptionId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    declaration: String,
    aliases: Vec<String>,
    arity: usize,
    description: String,
}

impl OptionSpec {
    /// Aliases in declaration order.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Number of value tokens following the flag. Zero means a presence flag.
    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The declaration key as written, placeholders included.
    pub fn declaration(&self) -> &str {
        &self.declaration
    }

    /// The longest alias, used when a single display name is needed.
    pub fn display_name(&self) -> &str {
        self.aliases
            .iter()
            .max_by_key(|a| a.len())
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// Arena of option specs plus an alias lookup table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionTable {
    specs: Vec<OptionSpec>,
    lookup: HashMap<String, OptionId>,
}

impl OptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(declaration key, description)` pairs.
    pub fn build<I, K, D>(declarations: I) -> Result<Self, DefinitionError>
    where
        I: IntoIterator<Item = (K, D)>,
        K: AsRef<str>,
        D: Into<String>,
    {
        let mut table = Self::new();
        for (key, description) in declarations {
            table.declare(key.as_ref(), description)?;
        }
        Ok(table)
    }

    /// Add one declaration to the table.
    pub fn declare(
        &mut self,
        declaration: &str,
        description: impl Into<String>,
    ) -> Result<OptionId, DefinitionError> {
        let (aliases, arity) = parse_declaration(declaration)?;

        for (i, alias) in aliases.iter().enumerate() {
            if self.lookup.contains_key(alias) || aliases[..i].contains(alias) {
                return Err(DefinitionError::DuplicateAlias(alias.clone()));
            }
        }

        let id = OptionId(self.specs.len());
        for alias in &aliases {
            self.lookup.insert(alias.clone(), id);
        }
        self.specs.push(OptionSpec {
            declaration: declaration.trim().to_string(),
            aliases,
            arity,
            description: description.into(),
        });
        Ok(id)
    }

    pub fn lookup(&self, alias: &str) -> Option<OptionId> {
        self.lookup.get(alias).copied()
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.lookup.contains_key(alias)
    }

    pub fn spec(&self, id: OptionId) -> &OptionSpec {
        &self.specs[id.0]
    }

    pub fn get(&self, alias: &str) -> Option<&OptionSpec> {
        self.lookup(alias).map(|id| self.spec(id))
    }

    /// Specs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (OptionId, &OptionSpec)> {
        self.specs.iter().enumerate().map(|(i, s)| (OptionId(i), s))
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

/// Parse one declaration key into its aliases and shared arity.
///
/// An alias without placeholders takes the arity of its siblings, so
/// `"-L, --log [value]"` declares a one-value option.
pub fn parse_declaration(declaration: &str) -> Result<(Vec<String>, usize), DefinitionError> {
    let mut aliases = Vec::new();
    let mut arity: Option<usize> = None;

    for part in declaration.split(',') {
        let (alias, count) = parse_alias(declaration, part.trim())?;
        if count > 0 {
            match arity {
                Some(prev) if prev != count => {
                    return Err(DefinitionError::ArityMismatch(declaration.to_string()));
                }
                _ => arity = Some(count),
            }
        }
        aliases.push(alias);
    }

    Ok((aliases, arity.unwrap_or(0)))
}

fn parse_alias(declaration: &str, part: &str) -> Result<(String, usize), DefinitionError> {
    let name_end = part
        .find(|c: char| c.is_whitespace() || c == '[')
        .unwrap_or(part.len());
    let (name, rest) = part.split_at(name_end);

    if name.is_empty() {
        return Err(DefinitionError::EmptyAlias(declaration.to_string()));
    }
    if !name.starts_with('-') || name == "-" || name.contains('=') {
        return Err(DefinitionError::InvalidAlias(name.to_string()));
    }

    let mut count = 0usize;
    let mut open = false;

    for (offset, c) in rest.char_indices() {
        let column = name_end + offset;
        match c {
            '[' if open => {
                return Err(DefinitionError::UnexpectedOpenBracket {
                    declaration: declaration.to_string(),
                    column,
                });
            }
            '[' => open = true,
            ']' if !open => {
                return Err(DefinitionError::UnmatchedCloseBracket {
                    declaration: declaration.to_string(),
                    column,
                });
            }
            ']' => {
                open = false;
                count += 1;
            }
            c if open || c.is_whitespace() => {}
            _ => {
                let text = rest[offset..]
                    .split(|c: char| c.is_whitespace() || c == '[')
                    .next()
                    .unwrap_or_default();
                return Err(DefinitionError::UnexpectedText {
                    declaration: declaration.to_string(),
                    text: text.to_string(),
                });
            }
        }
    }

    if open {
        return Err(DefinitionError::UnclosedBracket(declaration.to_string()));
    }

    Ok((name.to_string(), count))
}
