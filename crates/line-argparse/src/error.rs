use thiserror::Error;

/// An invalid command definition.
///
/// These are programming mistakes in the declared signature, option table or
/// command tree. They are reported while building, before any input is parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("signature '{signature}': '{token}' is not a bracketed slot")]
    MalformedSlot { signature: String, token: String },

    #[error("signature '{0}' declares a slot with an empty name")]
    EmptySlotName(String),

    #[error("signature '{signature}': variadic slot '{slot}' must be the last slot")]
    VariadicNotLast { signature: String, slot: String },

    #[error("signature '{signature}' declares slot '{slot}' more than once")]
    DuplicateSlot { signature: String, slot: String },

    #[error("signature '{0}' declares no argument slots")]
    EmptySignature(String),

    #[error("option declaration '{0}' contains an empty alias")]
    EmptyAlias(String),

    #[error("option alias '{0}' must start with '-' and must not contain '='")]
    InvalidAlias(String),

    #[error("option declaration '{declaration}': '[' at column {column} opens inside another '['")]
    UnexpectedOpenBracket { declaration: String, column: usize },

    #[error("option declaration '{declaration}': ']' at column {column} has no matching '['")]
    UnmatchedCloseBracket { declaration: String, column: usize },

    #[error("option declaration '{0}' has an unclosed '['")]
    UnclosedBracket(String),

    #[error("option declaration '{declaration}': unexpected '{text}' outside of brackets")]
    UnexpectedText { declaration: String, text: String },

    #[error("option declaration '{0}': aliases declare different numbers of values")]
    ArityMismatch(String),

    #[error("option alias '{0}' is registered more than once")]
    DuplicateAlias(String),

    #[error("command '{command}' describes argument '{argument}' which its signature does not declare")]
    UnknownArgumentDescription { command: String, argument: String },

    #[error("command '{command}': subcommand signature '{signature}' has no command name")]
    UnnamedSubcommand { command: String, signature: String },

    #[error("command '{command}' declares subcommand '{subcommand}' more than once")]
    DuplicateSubcommand { command: String, subcommand: String },

    #[error("command '{0}' has neither a handler nor subcommands")]
    NoHandler(String),
}

/// A usage error found while resolving one invocation.
///
/// Resolution never stops at the first of these; every problem in the input is
/// collected so the user can fix them all at once.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum ParseError {
    #[error("Argument '{0}' is missing")]
    MissingArgument(String),

    #[error("Option '{0}' is not recognized")]
    UnknownToken(String),

    #[error("Option '{}' provided more than once", .0.join(", "))]
    DuplicateOption(Vec<String>),

    #[error("Option '{alias}' expects {expected} value(s) but received {got}")]
    WrongArity {
        alias: String,
        expected: usize,
        got: usize,
    },

    #[error("Extra arguments provided: {}", .0.join(", "))]
    ExtraArguments(Vec<String>),

    #[error("Subcommand '{0}' is not recognized")]
    UnknownSubcommand(String),
}
