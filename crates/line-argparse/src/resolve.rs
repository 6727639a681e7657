//! Resolution of normalized tokens against a signature and an option table.
//!
//! Options are extracted first, in one left-to-right pass; the tokens left
//! over are then bound to the signature's slots in order. Declared arity always
//! wins: an option takes its `k` values even when one of them could have been
//! a positional argument. Only a recognized alias stops an option early.

use std::collections::{BTreeMap, HashMap, HashSet};

use indexmap::IndexMap;

use crate::error::ParseError;
use crate::normalize::{END_OF_OPTIONS, NormalizedTokens};
use crate::options::{OptionId, OptionTable};
use crate::signature::Signature;

/// The value bound to one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentValue {
    Single(String),
    /// Variadic slot; may be empty.
    Many(Vec<String>),
}

impl ArgumentValue {
    /// The single value, or the first of many.
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Single(v) => Some(v.as_str()),
            Self::Many(vs) => vs.first().map(String::as_str),
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Single(v) => vec![v.as_str()],
            Self::Many(vs) => vs.iter().map(String::as_str).collect(),
        }
    }
}

/// The value bound to one option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// A zero-arity flag was given.
    Present,
    Values(Vec<String>),
}

impl OptionValue {
    pub fn values(&self) -> &[String] {
        match self {
            Self::Present => &[],
            Self::Values(vs) => vs,
        }
    }
}

/// Slot name to bound value, in signature order. Absent means not supplied.
pub type ParsedArguments = IndexMap<String, ArgumentValue>;

/// Canonical option identity to bound value. Absent means unset.
pub type ParsedOptions = HashMap<OptionId, OptionValue>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseResult {
    pub arguments: ParsedArguments,
    pub options: ParsedOptions,
    /// Deduplicated by message and sorted by it.
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn argument(&self, name: &str) -> Option<&ArgumentValue> {
        self.arguments.get(name)
    }

    /// Look an option up by any of its aliases.
    pub fn option(&self, table: &OptionTable, alias: &str) -> Option<&OptionValue> {
        table.lookup(alias).and_then(|id| self.options.get(&id))
    }
}

/// Resolve `tokens` against `signature` and `options`.
///
/// Pure: the same inputs always give the same result, and every problem in the
/// input is reported, not just the first. The first literal `--` ends option
/// scanning.
pub fn resolve<S: AsRef<str>>(
    tokens: &[S],
    signature: &Signature,
    options: &OptionTable,
) -> ParseResult {
    let separator = tokens.iter().position(|t| t.as_ref() == END_OF_OPTIONS);
    resolve_tokens(tokens, separator, signature, options)
}

/// Resolve normalizer output. Only the `--` the user typed ends option
/// scanning; one split out of `--flag=--` stays a value.
pub fn resolve_normalized(
    normalized: &NormalizedTokens,
    signature: &Signature,
    options: &OptionTable,
) -> ParseResult {
    resolve_tokens(&normalized.tokens, normalized.separator, signature, options)
}

fn resolve_tokens<S: AsRef<str>>(
    tokens: &[S],
    separator: Option<usize>,
    signature: &Signature,
    options: &OptionTable,
) -> ParseResult {
    let mut errors: Vec<ParseError> = Vec::new();
    let (bound, positionals) = extract_options(tokens, separator, options, &mut errors);
    let arguments = bind_positionals(positionals, signature, &mut errors);

    let result = ParseResult {
        arguments,
        options: bound,
        errors: sort_errors(errors),
    };
    tracing::trace!(
        arguments = result.arguments.len(),
        options = result.options.len(),
        errors = result.errors.len(),
        "resolved invocation"
    );
    result
}

fn extract_options<'t, S: AsRef<str>>(
    tokens: &'t [S],
    separator: Option<usize>,
    table: &OptionTable,
    errors: &mut Vec<ParseError>,
) -> (ParsedOptions, Vec<&'t str>) {
    let mut bound = ParsedOptions::new();
    let mut seen: HashSet<OptionId> = HashSet::new();
    let mut positionals = Vec::new();

    let mut i = 0usize;
    while i < tokens.len() {
        let token = tokens[i].as_ref();

        if separator == Some(i) {
            positionals.extend(tokens[i + 1..].iter().map(|t| t.as_ref()));
            break;
        }

        let Some(id) = table.lookup(token) else {
            if is_flag_shaped(token) {
                errors.push(ParseError::UnknownToken(token.to_string()));
            } else {
                positionals.push(token);
            }
            i += 1;
            continue;
        };

        let spec = table.spec(id);
        let values: Vec<String> = tokens
            .iter()
            .enumerate()
            .skip(i + 1)
            .take(spec.arity())
            .take_while(|(j, t)| separator != Some(*j) && !table.contains(t.as_ref()))
            .map(|(_, t)| t.as_ref().to_string())
            .collect();
        i += 1 + values.len();

        if !seen.insert(id) {
            errors.push(ParseError::DuplicateOption(spec.aliases().to_vec()));
            continue;
        }

        if values.len() < spec.arity() {
            errors.push(ParseError::WrongArity {
                alias: token.to_string(),
                expected: spec.arity(),
                got: values.len(),
            });
            continue;
        }

        let value = if spec.arity() == 0 {
            OptionValue::Present
        } else {
            OptionValue::Values(values)
        };
        bound.insert(id, value);
    }

    (bound, positionals)
}

fn bind_positionals(
    positionals: Vec<&str>,
    signature: &Signature,
    errors: &mut Vec<ParseError>,
) -> ParsedArguments {
    let mut arguments = ParsedArguments::new();
    let mut remaining = positionals.into_iter();

    for slot in signature.slots() {
        if slot.is_variadic() {
            let rest: Vec<String> = remaining.by_ref().map(str::to_string).collect();
            arguments.insert(slot.name().to_string(), ArgumentValue::Many(rest));
            break;
        }
        match remaining.next() {
            Some(value) => {
                arguments.insert(
                    slot.name().to_string(),
                    ArgumentValue::Single(value.to_string()),
                );
            }
            None => errors.push(ParseError::MissingArgument(slot.name().to_string())),
        }
    }

    let extra: Vec<String> = remaining.map(str::to_string).collect();
    if !extra.is_empty() {
        errors.push(ParseError::ExtraArguments(extra));
    }

    arguments
}

fn is_flag_shaped(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-')
}

fn sort_errors(errors: Vec<ParseError>) -> Vec<ParseError> {
    let unique: BTreeMap<String, ParseError> =
        errors.into_iter().map(|e| (e.to_string(), e)).collect();
    unique.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    fn single(value: &str) -> ArgumentValue {
        ArgumentValue::Single(value.to_string())
    }

    fn values(vs: &[&str]) -> OptionValue {
        OptionValue::Values(vs.iter().map(|s| s.to_string()).collect())
    }

    fn n_values_table() -> OptionTable {
        OptionTable::build([
            ("-L [log_value], --log-value [log_value]", "Log value"),
            ("--some-option [arg_1] [arg_2]", "some description"),
            ("--some-option-1 [arg_1] [arg_2] [arg_3]", "some description 1"),
            ("-D, --dry-run", "Dry run"),
        ])
        .unwrap()
    }

    #[test]
    fn binds_slots_in_order() {
        let sig = Signature::compile("run [a] [b] [c]").unwrap();
        let result = resolve(&tokens("he ll a"), &sig, &OptionTable::new());

        assert!(result.is_ok(), "{:?}", result.errors);
        assert_eq!(result.argument("a"), Some(&single("he")));
        assert_eq!(result.argument("b"), Some(&single("ll")));
        assert_eq!(result.argument("c"), Some(&single("a")));
        let order: Vec<&str> = result.arguments.keys().map(String::as_str).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn variadic_slot_absorbs_the_rest() {
        let sig = Signature::compile("cat [file] [files...]").unwrap();
        let result = resolve(&tokens("mod.ts deps.ts hella.ts"), &sig, &OptionTable::new());

        assert!(result.is_ok());
        assert_eq!(result.argument("file"), Some(&single("mod.ts")));
        assert_eq!(
            result.argument("files"),
            Some(&ArgumentValue::Many(vec![
                "deps.ts".to_string(),
                "hella.ts".to_string()
            ]))
        );
    }

    #[test]
    fn variadic_slot_may_be_empty() {
        let sig = Signature::compile("cat [file] [files...]").unwrap();
        let result = resolve(&tokens("mod.ts"), &sig, &OptionTable::new());

        assert!(result.is_ok());
        assert_eq!(result.argument("files"), Some(&ArgumentValue::Many(vec![])));
    }

    #[test]
    fn options_take_their_declared_arity() {
        let table = n_values_table();
        let sig = Signature::compile("main").unwrap();

        let result = resolve(&tokens("--some-option hello world"), &sig, &table);
        assert!(result.is_ok());
        assert_eq!(
            result.option(&table, "--some-option"),
            Some(&values(&["hello", "world"]))
        );

        let result = resolve(
            &tokens("--some-option hello world --some-option-1 x y z"),
            &sig,
            &table,
        );
        assert!(result.is_ok(), "{:?}", result.errors);
        assert_eq!(
            result.option(&table, "--some-option"),
            Some(&values(&["hello", "world"]))
        );
        assert_eq!(
            result.option(&table, "--some-option-1"),
            Some(&values(&["x", "y", "z"]))
        );
        assert!(result.arguments.is_empty());
    }

    #[test]
    fn one_value_short_yields_one_wrong_arity() {
        let table = n_values_table();
        let sig = Signature::compile("main").unwrap();
        let result = resolve(&tokens("--some-option hello"), &sig, &table);

        assert_eq!(
            result.errors,
            vec![ParseError::WrongArity {
                alias: "--some-option".to_string(),
                expected: 2,
                got: 1,
            }]
        );
        assert_eq!(result.option(&table, "--some-option"), None);
    }

    #[test]
    fn recognized_alias_is_not_taken_as_a_value() {
        let table = n_values_table();
        let sig = Signature::compile("main").unwrap();
        let result = resolve(&tokens("-L --dry-run"), &sig, &table);

        assert_eq!(
            result.errors,
            vec![ParseError::WrongArity {
                alias: "-L".to_string(),
                expected: 1,
                got: 0,
            }]
        );
        assert_eq!(result.option(&table, "-D"), Some(&OptionValue::Present));
    }

    #[test]
    fn unknown_flag_shaped_value_is_accepted_under_arity() {
        let table = n_values_table();
        let sig = Signature::compile("main").unwrap();
        let result = resolve(&tokens("-L -x"), &sig, &table);

        assert!(result.is_ok());
        assert_eq!(result.option(&table, "--log-value"), Some(&values(&["-x"])));
    }

    #[test]
    fn duplicate_alias_keeps_first_value() {
        let table = n_values_table();
        let sig = Signature::compile("main [file]").unwrap();
        let result = resolve(&tokens("-L first in.txt --log-value second"), &sig, &table);

        assert_eq!(
            result.errors,
            vec![ParseError::DuplicateOption(vec![
                "-L".to_string(),
                "--log-value".to_string()
            ])]
        );
        assert_eq!(result.option(&table, "-L"), Some(&values(&["first"])));
        assert_eq!(result.argument("file"), Some(&single("in.txt")));

        let result = resolve(&tokens("-D in.txt --dry-run -D"), &sig, &table);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.option(&table, "--dry-run"), Some(&OptionValue::Present));
    }

    #[test]
    fn unknown_flag_is_reported_and_value_stays_positional() {
        let sig = Signature::compile("main [input]").unwrap();
        let result = resolve(&tokens("-Z value"), &sig, &OptionTable::new());

        assert_eq!(result.errors, vec![ParseError::UnknownToken("-Z".to_string())]);
        assert_eq!(result.argument("input"), Some(&single("value")));
    }

    #[test]
    fn missing_and_extra_arguments() {
        let sig = Signature::compile("copy [source] [destination]").unwrap();

        let result = resolve(&tokens("a"), &sig, &OptionTable::new());
        assert_eq!(
            result.errors,
            vec![ParseError::MissingArgument("destination".to_string())]
        );
        assert_eq!(result.argument("source"), Some(&single("a")));
        assert_eq!(result.argument("destination"), None);

        let result = resolve(&tokens("a b c d"), &sig, &OptionTable::new());
        assert_eq!(
            result.errors,
            vec![ParseError::ExtraArguments(vec![
                "c".to_string(),
                "d".to_string()
            ])]
        );
    }

    #[test]
    fn collects_every_error_sorted_and_deduplicated() {
        let table = n_values_table();
        let sig = Signature::compile("copy [source] [destination]").unwrap();
        let result = resolve(&tokens("-Z -Z -D -D --some-option x"), &sig, &table);

        let rendered: Vec<String> = result.errors.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "Argument 'destination' is missing".to_string(),
                "Argument 'source' is missing".to_string(),
                "Option '--some-option' expects 2 value(s) but received 1".to_string(),
                "Option '-D, --dry-run' provided more than once".to_string(),
                "Option '-Z' is not recognized".to_string(),
            ]
        );
    }

    #[test]
    fn separator_makes_the_rest_positional() {
        let table = n_values_table();
        let sig = Signature::compile("main [files...]").unwrap();
        let result = resolve(&tokens("-D -- -L --weird"), &sig, &table);

        assert!(result.is_ok());
        assert_eq!(
            result.argument("files"),
            Some(&ArgumentValue::Many(vec![
                "-L".to_string(),
                "--weird".to_string()
            ]))
        );
    }

    #[test]
    fn folded_separator_is_an_option_value() {
        use crate::normalize::{ReservedFlags, normalize};

        let table = n_values_table();
        let sig = Signature::compile("cat [file] [files...]").unwrap();
        let normalized = normalize(&["--log-value=--", "notes.txt", "-D"], &ReservedFlags::none());
        let result = resolve_normalized(&normalized, &sig, &table);

        assert!(result.is_ok(), "{:?}", result.errors);
        assert_eq!(result.option(&table, "-L"), Some(&values(&["--"])));
        assert_eq!(result.argument("file"), Some(&single("notes.txt")));
        assert_eq!(result.option(&table, "--dry-run"), Some(&OptionValue::Present));

        let normalized = normalize(&["--log-value", "--", "-D"], &ReservedFlags::none());
        let result = resolve_normalized(&normalized, &sig, &table);
        assert_eq!(
            result.errors,
            vec![ParseError::WrongArity {
                alias: "--log-value".to_string(),
                expected: 1,
                got: 0,
            }]
        );
        assert_eq!(result.argument("file"), Some(&single("-D")));
    }

    #[test]
    fn single_dash_is_positional() {
        let sig = Signature::compile("cat [file]").unwrap();
        let result = resolve(&tokens("-"), &sig, &OptionTable::new());
        assert!(result.is_ok());
        assert_eq!(result.argument("file"), Some(&single("-")));
    }

    #[test]
    fn resolution_is_idempotent() {
        let table = n_values_table();
        let sig = Signature::compile("cat [file] [files...]").unwrap();
        let input = tokens("a -L x -Q b -D c --some-option 1");

        let first = resolve(&input, &sig, &table);
        let second = resolve(&input, &sig, &table);
        assert_eq!(first, second);
    }
}
