//! Signature compilation.
//!
//! A signature is the command name followed by bracketed positional slots:
//! `copy [source] [destination...]`. A trailing `...` (or a leading one, as in
//! `[...files]`) marks the slot as variadic.

use std::collections::HashSet;

use crate::error::DefinitionError;

const VARIADIC_MARKER: &str = "...";

/// A named positional argument position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentSlot {
    name: String,
    variadic: bool,
}

impl ArgumentSlot {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this slot absorbs all remaining positional tokens.
    pub fn is_variadic(&self) -> bool {
        self.variadic
    }
}

/// A compiled signature: the command name plus its ordered slots.
///
/// Two signatures with the same slots in a different order are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Signature {
    command: String,
    slots: Vec<ArgumentSlot>,
}

impl Signature {
    /// Compile a signature string. Zero slots is allowed.
    pub fn compile(source: &str) -> Result<Self, DefinitionError> {
        let mut tokens = source.split_whitespace().peekable();

        let command = match tokens.peek() {
            Some(first) if !first.starts_with('[') => {
                let first = first.to_string();
                tokens.next();
                first
            }
            _ => String::new(),
        };

        let mut slots: Vec<ArgumentSlot> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for token in tokens {
            let Some(inner) = token
                .strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
            else {
                return Err(DefinitionError::MalformedSlot {
                    signature: source.to_string(),
                    token: token.to_string(),
                });
            };

            let (name, variadic) = split_variadic(inner);
            if name.is_empty() || name.contains(['[', ']']) {
                return Err(DefinitionError::EmptySlotName(source.to_string()));
            }

            if let Some(prev) = slots.last() {
                if prev.variadic {
                    return Err(DefinitionError::VariadicNotLast {
                        signature: source.to_string(),
                        slot: prev.name.clone(),
                    });
                }
            }

            if !seen.insert(name.to_string()) {
                return Err(DefinitionError::DuplicateSlot {
                    signature: source.to_string(),
                    slot: name.to_string(),
                });
            }

            slots.push(ArgumentSlot {
                name: name.to_string(),
                variadic,
            });
        }

        Ok(Self { command, slots })
    }

    /// Compile a signature for a command that must take arguments.
    pub fn compile_with_slots(source: &str) -> Result<Self, DefinitionError> {
        let signature = Self::compile(source)?;
        if signature.slots.is_empty() {
            return Err(DefinitionError::EmptySignature(source.to_string()));
        }
        Ok(signature)
    }

    /// The leading command-name token (empty when the signature starts with a slot).
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn slots(&self) -> &[ArgumentSlot] {
        &self.slots
    }

    pub fn slot(&self, name: &str) -> Option<&ArgumentSlot> {
        self.slots.iter().find(|s| s.name == name)
    }

    pub fn is_variadic(&self) -> bool {
        self.slots.last().is_some_and(|s| s.variadic)
    }

    /// Render the slots back in signature form, e.g. `[file] [files...]`.
    pub fn usage(&self) -> String {
        self.slots
            .iter()
            .map(|s| {
                if s.variadic {
                    format!("[{}{VARIADIC_MARKER}]", s.name)
                } else {
                    format!("[{}]", s.name)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn split_variadic(inner: &str) -> (&str, bool) {
    let inner = inner.trim();
    if let Some(name) = inner.strip_suffix(VARIADIC_MARKER) {
        return (name.trim(), true);
    }
    if let Some(name) = inner.strip_prefix(VARIADIC_MARKER) {
        return (name.trim(), true);
    }
    (inner, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(sig: &Signature) -> Vec<&str> {
        sig.slots().iter().map(|s| s.name()).collect()
    }

    #[test]
    fn compile_drops_command_name_and_brackets() {
        let sig = Signature::compile("copy [source] [destination]").unwrap();
        assert_eq!(sig.command(), "copy");
        assert_eq!(names(&sig), vec!["source", "destination"]);
        assert!(!sig.is_variadic());
    }

    #[test]
    fn trailing_ellipsis_marks_variadic() {
        let sig = Signature::compile("cat [file] [files...]").unwrap();
        assert_eq!(names(&sig), vec!["file", "files"]);
        assert!(sig.slots()[1].is_variadic());
        assert!(sig.is_variadic());
        assert_eq!(sig.usage(), "[file] [files...]");
    }

    #[test]
    fn leading_ellipsis_is_accepted() {
        let sig = Signature::compile("cat [file1] [...files]").unwrap();
        assert_eq!(names(&sig), vec!["file1", "files"]);
        assert!(sig.is_variadic());
    }

    #[test]
    fn signature_without_command_name() {
        let sig = Signature::compile("[file] [other]").unwrap();
        assert_eq!(sig.command(), "");
        assert_eq!(names(&sig), vec!["file", "other"]);
    }

    #[test]
    fn variadic_must_be_last() {
        let err = Signature::compile("cat [files...] [file]").unwrap_err();
        assert!(matches!(err, DefinitionError::VariadicNotLast { ref slot, .. } if slot == "files"));
    }

    #[test]
    fn rejects_unbracketed_and_duplicate_slots() {
        assert!(matches!(
            Signature::compile("copy source").unwrap_err(),
            DefinitionError::MalformedSlot { .. }
        ));
        assert!(matches!(
            Signature::compile("copy [a] [a]").unwrap_err(),
            DefinitionError::DuplicateSlot { .. }
        ));
        assert!(matches!(
            Signature::compile("copy []").unwrap_err(),
            DefinitionError::EmptySlotName(_)
        ));
    }

    #[test]
    fn compile_with_slots_requires_arguments() {
        assert!(Signature::compile("main").unwrap().slots().is_empty());
        assert_eq!(
            Signature::compile_with_slots("main").unwrap_err(),
            DefinitionError::EmptySignature("main".to_string())
        );
    }

    #[test]
    fn slot_order_matters() {
        let a = Signature::compile("run [a] [b]").unwrap();
        let b = Signature::compile("run [b] [a]").unwrap();
        assert_ne!(a, b);
    }
}
