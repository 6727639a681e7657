//! Command-line interpretation for `line` commands.
//!
//! A command is declared by a signature string (`copy [source] [destination]`)
//! and an option table keyed by declarations (`"-L [value], --log [value]"`).
//! Raw tokens pass through [`normalize`], are matched against the command tree
//! by [`Cli::decide`], and end up either as help/version output, a list of
//! usage errors, or a [`Matches`] handed to the command's [`Handler`].
//!
//! Definition mistakes surface as [`DefinitionError`] when the tree is built.
//! Input mistakes never abort resolution; they are collected as [`ParseError`]s.

pub mod dispatch;
pub mod error;
pub mod help;
pub mod normalize;
pub mod options;
pub mod resolve;
pub mod signature;

pub use dispatch::{
    Cli, Command, CommandBuilder, Dispatch, Handler, HandlerError, HandlerResult, Matches,
    Selection, command, select,
};
pub use error::{DefinitionError, ParseError};
pub use normalize::{NormalizedTokens, ReservedFlags, normalize};
pub use options::{OptionId, OptionSpec, OptionTable};
pub use resolve::{ArgumentValue, OptionValue, ParseResult, resolve, resolve_normalized};
pub use signature::{ArgumentSlot, Signature};
