//! Command trees and the dispatch state machine.
//!
//! For one invocation the machine starts at the root command and looks at the
//! first token: `-h/--help` and `-v/--version` stop immediately, a subcommand
//! name moves one level down and looks again, anything else falls through to
//! the current command's own resolution. Only a resolution without errors
//! reaches the handler.

use std::fmt;

use indexmap::IndexMap;
use thiserror::Error;

use crate::error::{DefinitionError, ParseError};
use crate::normalize::{ReservedFlags, normalize};
use crate::options::OptionTable;
use crate::resolve::{ArgumentValue, OptionValue, ParseResult, resolve_normalized};
use crate::signature::Signature;

pub const HELP_FLAGS: [&str; 2] = ["-h", "--help"];
pub const VERSION_FLAGS: [&str; 2] = ["-v", "--version"];

/// Exit code for usage errors.
pub const USAGE_ERROR_CODE: i32 = 1;
/// Lowest exit code a handler failure may use.
pub const HANDLER_ERROR_CODE: i32 = 2;

/// A failure reported by a handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerError {
    code: i32,
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: HANDLER_ERROR_CODE,
            message: message.into(),
        }
    }

    /// Codes below 2 belong to success and usage errors and are raised to 2.
    pub fn with_code(mut self, code: i32) -> Self {
        self.code = code.max(HANDLER_ERROR_CODE);
        self
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

pub type HandlerResult = Result<(), HandlerError>;

/// Code run for a successfully resolved invocation.
pub trait Handler: Send + Sync {
    fn handle(&self, matches: &Matches<'_>) -> HandlerResult;
}

impl<F> Handler for F
where
    F: Fn(&Matches<'_>) -> HandlerResult + Send + Sync,
{
    fn handle(&self, matches: &Matches<'_>) -> HandlerResult {
        self(matches)
    }
}

/// A compiled command: signature, options, subcommands and handler.
pub struct Command {
    signature: Signature,
    description: String,
    arguments: IndexMap<String, String>,
    options: OptionTable,
    subcommands: Vec<Command>,
    handler: Option<Box<dyn Handler>>,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("signature", &self.signature)
            .field("description", &self.description)
            .field("arguments", &self.arguments)
            .field("options", &self.options)
            .field("subcommands", &self.subcommands)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

impl Command {
    /// The command name from the signature (empty for an unnamed root).
    pub fn name(&self) -> &str {
        self.signature.command()
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Description of a slot, if one was given.
    pub fn argument_description(&self, slot: &str) -> Option<&str> {
        self.arguments.get(slot).map(String::as_str)
    }

    pub fn options(&self) -> &OptionTable {
        &self.options
    }

    pub fn subcommands(&self) -> &[Command] {
        &self.subcommands
    }

    pub fn subcommand(&self, name: &str) -> Option<&Command> {
        self.subcommands.iter().find(|c| c.name() == name)
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }
}

/// Start building a command from its signature string.
pub fn command(signature: impl Into<String>) -> CommandBuilder {
    CommandBuilder {
        signature: signature.into(),
        description: String::new(),
        arguments: Vec::new(),
        options: Vec::new(),
        subcommands: Vec::new(),
        handler: None,
        takes_args: false,
    }
}

pub struct CommandBuilder {
    signature: String,
    description: String,
    arguments: Vec<(String, String)>,
    options: Vec<(String, String)>,
    subcommands: Vec<CommandBuilder>,
    handler: Option<Box<dyn Handler>>,
    takes_args: bool,
}

impl CommandBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Describe a slot declared in the signature.
    pub fn argument(mut self, slot: impl Into<String>, description: impl Into<String>) -> Self {
        self.arguments.push((slot.into(), description.into()));
        self
    }

    /// Declare an option, e.g. `option("-L [value], --log [value]", "Log value")`.
    pub fn option(mut self, declaration: impl Into<String>, description: impl Into<String>) -> Self {
        self.options.push((declaration.into(), description.into()));
        self
    }

    pub fn subcommand(mut self, subcommand: CommandBuilder) -> Self {
        self.subcommands.push(subcommand);
        self
    }

    /// Require the signature to declare at least one slot.
    pub fn takes_args(mut self, takes_args: bool) -> Self {
        self.takes_args = takes_args;
        self
    }

    pub fn handler(mut self, handler: impl Handler + 'static) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Compile the whole command tree, failing on the first invalid definition.
    pub fn build(self) -> Result<Command, DefinitionError> {
        let signature = if self.takes_args {
            Signature::compile_with_slots(&self.signature)?
        } else {
            Signature::compile(&self.signature)?
        };
        let options = OptionTable::build(self.options)?;

        let mut arguments = IndexMap::new();
        for (slot, description) in self.arguments {
            if signature.slot(&slot).is_none() {
                return Err(DefinitionError::UnknownArgumentDescription {
                    command: signature.command().to_string(),
                    argument: slot,
                });
            }
            arguments.insert(slot, description);
        }

        let mut subcommands: Vec<Command> = Vec::with_capacity(self.subcommands.len());
        for builder in self.subcommands {
            let sub = builder.build()?;
            if sub.name().is_empty() {
                return Err(DefinitionError::UnnamedSubcommand {
                    command: signature.command().to_string(),
                    signature: sub.signature.usage(),
                });
            }
            if subcommands.iter().any(|s| s.name() == sub.name()) {
                return Err(DefinitionError::DuplicateSubcommand {
                    command: signature.command().to_string(),
                    subcommand: sub.name().to_string(),
                });
            }
            subcommands.push(sub);
        }

        if self.handler.is_none() && subcommands.is_empty() {
            return Err(DefinitionError::NoHandler(self.signature.trim().to_string()));
        }

        Ok(Command {
            signature,
            description: self.description,
            arguments,
            options,
            subcommands,
            handler: self.handler,
        })
    }
}

/// A whole CLI: identity plus the root command.
#[derive(Debug)]
pub struct Cli {
    name: String,
    version: String,
    description: String,
    reserved: ReservedFlags,
    root: Command,
}

impl Cli {
    pub fn new(name: impl Into<String>, version: impl Into<String>, root: Command) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: String::new(),
            reserved: ReservedFlags::none(),
            root,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_reserved_flags(mut self, reserved: ReservedFlags) -> Self {
        self.reserved = reserved;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn root(&self) -> &Command {
        &self.root
    }

    /// The name the root command is invoked by.
    pub fn command_name(&self) -> &str {
        if self.root.name().is_empty() {
            &self.name
        } else {
            self.root.name()
        }
    }

    /// Follow a path of subcommand names from the root.
    pub fn find<S: AsRef<str>>(&self, path: &[S]) -> Option<&Command> {
        let mut command = &self.root;
        for name in path {
            command = command.subcommand(name.as_ref())?;
        }
        Some(command)
    }

    /// Decide what `raw` selects without running a handler.
    pub fn decide<S: AsRef<str>>(&self, raw: &[S]) -> Dispatch<'_> {
        let mut command = &self.root;
        let mut path = vec![self.command_name().to_string()];
        let mut rest = raw;

        loop {
            match select(command, rest) {
                Selection::Help => {
                    tracing::debug!(command = %path.join(" "), "help requested");
                    return Dispatch::ShowHelp { command, path };
                }
                Selection::Version => {
                    tracing::debug!("version requested");
                    return Dispatch::ShowVersion;
                }
                Selection::Subcommand(index) => {
                    command = &command.subcommands[index];
                    path.push(command.name().to_string());
                    rest = &rest[1..];
                    tracing::debug!(command = %path.join(" "), "subcommand selected");
                }
                Selection::MainCommand => break,
            }
        }

        self.fall_through(command, path, rest)
    }

    /// Decide, then run the selected handler when resolution succeeded.
    pub fn run<S: AsRef<str>>(&self, raw: &[S]) -> Dispatch<'_> {
        match self.decide(raw) {
            Dispatch::Resolved(matches) => {
                let command = matches.command;
                let Some(handler) = command.handler.as_deref() else {
                    return Dispatch::Executed(matches);
                };
                match handler.handle(&matches) {
                    Ok(()) => Dispatch::Executed(matches),
                    Err(err) => {
                        tracing::debug!(code = err.code(), "handler failed: {err}");
                        Dispatch::HandlerFailed(matches, err)
                    }
                }
            }
            other => other,
        }
    }

    fn fall_through<'c, S: AsRef<str>>(
        &'c self,
        command: &'c Command,
        path: Vec<String>,
        rest: &[S],
    ) -> Dispatch<'c> {
        let normalized = normalize(rest, &self.reserved);

        if !command.has_handler() {
            let Some(first) = normalized.tokens.first().map(String::as_str) else {
                return Dispatch::ShowHelp { command, path };
            };
            let error = if first.len() > 1 && first.starts_with('-') {
                ParseError::UnknownToken(first.to_string())
            } else {
                ParseError::UnknownSubcommand(first.to_string())
            };
            let result = ParseResult {
                errors: vec![error],
                ..ParseResult::default()
            };
            return Dispatch::ErrorExit(Matches {
                command,
                path,
                result,
                reserved: normalized.reserved,
            });
        }

        let result = resolve_normalized(&normalized, &command.signature, &command.options);
        tracing::debug!(
            command = %path.join(" "),
            errors = result.errors.len(),
            reserved = normalized.reserved.len(),
            "main command resolved"
        );

        let matches = Matches {
            command,
            path,
            result,
            reserved: normalized.reserved,
        };
        if matches.result.is_ok() {
            Dispatch::Resolved(matches)
        } else {
            Dispatch::ErrorExit(matches)
        }
    }
}

/// What the first token selects for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Help,
    Version,
    Subcommand(usize),
    MainCommand,
}

/// Look at the first token only. A command that declares `-h` or `-v` itself
/// keeps them as ordinary options. `--help=x` counts as `--help`.
pub fn select<S: AsRef<str>>(command: &Command, tokens: &[S]) -> Selection {
    let Some(first) = tokens.first().map(|t| t.as_ref()) else {
        return Selection::MainCommand;
    };
    let flag = match first.split_once('=') {
        Some((flag, _)) if first.starts_with('-') => flag,
        _ => first,
    };
    if HELP_FLAGS.contains(&flag) && !command.options.contains(flag) {
        return Selection::Help;
    }
    if VERSION_FLAGS.contains(&flag) && !command.options.contains(flag) {
        return Selection::Version;
    }
    match command.subcommands.iter().position(|c| c.name() == first) {
        Some(index) => Selection::Subcommand(index),
        None => Selection::MainCommand,
    }
}

/// Terminal states of one dispatch.
#[derive(Debug)]
pub enum Dispatch<'c> {
    ShowHelp {
        command: &'c Command,
        path: Vec<String>,
    },
    ShowVersion,
    /// Resolved without errors; the handler has not run yet.
    Resolved(Matches<'c>),
    Executed(Matches<'c>),
    HandlerFailed(Matches<'c>, HandlerError),
    ErrorExit(Matches<'c>),
}

impl Dispatch<'_> {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ShowHelp { .. } | Self::ShowVersion | Self::Resolved(_) | Self::Executed(_) => 0,
            Self::HandlerFailed(_, err) => err.code(),
            Self::ErrorExit(_) => USAGE_ERROR_CODE,
        }
    }
}

/// A resolved invocation of one command, as seen by its handler.
#[derive(Debug)]
pub struct Matches<'c> {
    command: &'c Command,
    path: Vec<String>,
    result: ParseResult,
    reserved: Vec<String>,
}

impl<'c> Matches<'c> {
    pub fn command(&self) -> &'c Command {
        self.command
    }

    /// Command names from the root down to the selected command.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn result(&self) -> &ParseResult {
        &self.result
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.result.errors
    }

    pub fn argument(&self, name: &str) -> Option<&ArgumentValue> {
        self.result.argument(name)
    }

    /// First value bound to a slot.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.argument(name).and_then(ArgumentValue::first)
    }

    /// Look an option up by any of its aliases.
    pub fn option(&self, alias: &str) -> Option<&OptionValue> {
        self.result.option(&self.command.options, alias)
    }

    pub fn is_present(&self, alias: &str) -> bool {
        self.option(alias).is_some()
    }

    /// Host-reserved flags removed before resolution, in input order.
    pub fn reserved_flags(&self) -> &[String] {
        &self.reserved
    }
}
