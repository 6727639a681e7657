//! Declarative command definitions for `line`.
//!
//! A manifest describes a whole CLI as JSON: its identity plus a tree of
//! [`CommandDef`]s carrying signature strings and option declarations in the
//! same grammar the engine compiles. [`Manifest::to_cli`] turns it into a
//! compiled [`line_argparse::Cli`].

use indexmap::IndexMap;
use line_argparse::{Cli, CommandBuilder, DefinitionError, HandlerResult, Matches, ReservedFlags};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The only manifest layout understood so far.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("invalid manifest JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported schemaVersion {0} (expected {SCHEMA_VERSION})")]
    UnsupportedSchema(u32),

    #[error("manifest name must not be empty")]
    EmptyName,

    #[error("manifest '{name}' has an invalid command definition: {source}")]
    Definition {
        name: String,
        #[source]
        source: DefinitionError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Host flags stripped before resolution and forwarded to handlers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reserved_flags: Vec<String>,
    pub command: CommandDef,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandDef {
    /// `name [slot] [rest...]`
    pub signature: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Slot name to description.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub arguments: IndexMap<String, String>,
    /// Option declaration (`-L [value], --log [value]`) to description.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub options: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subcommands: Vec<CommandDef>,
    /// Defaults to `true` for leaf commands and `false` for command groups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<bool>,
    /// Reject a signature that declares no slots.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub takes_args: bool,
}

impl CommandDef {
    pub fn new(signature: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            ..Self::default()
        }
    }

    pub fn has_handler(&self) -> bool {
        self.handler.unwrap_or(self.subcommands.is_empty())
    }

    /// This command plus every nested subcommand.
    pub fn count(&self) -> usize {
        1 + self.subcommands.iter().map(CommandDef::count).sum::<usize>()
    }

    fn builder(&self) -> CommandBuilder {
        let mut builder = line_argparse::command(self.signature.as_str())
            .description(self.description.as_str())
            .takes_args(self.takes_args);
        for (slot, description) in &self.arguments {
            builder = builder.argument(slot.as_str(), description.as_str());
        }
        for (declaration, description) in &self.options {
            builder = builder.option(declaration.as_str(), description.as_str());
        }
        for sub in &self.subcommands {
            builder = builder.subcommand(sub.builder());
        }
        if self.has_handler() {
            builder = builder.handler(accept);
        }
        builder
    }
}

/// Handler installed for declared commands; a manifest carries no behavior.
fn accept(_: &Matches<'_>) -> HandlerResult {
    Ok(())
}

impl Manifest {
    pub fn from_json(contents: &str) -> Result<Self, LoadError> {
        let manifest: Manifest = serde_json::from_str(contents)?;
        if manifest.schema_version != SCHEMA_VERSION {
            return Err(LoadError::UnsupportedSchema(manifest.schema_version));
        }
        if manifest.name.trim().is_empty() {
            return Err(LoadError::EmptyName);
        }
        Ok(manifest)
    }

    pub fn to_json_pretty(&self) -> Result<String, LoadError> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }

    /// Compile the command tree.
    pub fn to_cli(&self) -> Result<Cli, LoadError> {
        let root = self
            .command
            .builder()
            .build()
            .map_err(|source| LoadError::Definition {
                name: self.name.clone(),
                source,
            })?;
        tracing::debug!(
            name = %self.name,
            commands = self.command.count(),
            "compiled manifest"
        );
        Ok(Cli::new(self.name.as_str(), self.version.as_str(), root)
            .with_description(self.description.as_str())
            .with_reserved_flags(ReservedFlags::new(self.reserved_flags.iter().cloned())))
    }

    /// A small file-manager style definition used by `line init`.
    pub fn sample(name: &str) -> Self {
        let mut copy = CommandDef::new("copy [source] [destination]");
        copy.description = "Copy a file".to_string();
        copy.arguments
            .insert("source".to_string(), "File to copy".to_string());
        copy.arguments
            .insert("destination".to_string(), "Where to put the copy".to_string());
        copy.options.insert(
            "-D, --dry-run".to_string(),
            "Only print what would be copied".to_string(),
        );

        let mut root = CommandDef::new(format!("{name} [file] [files...]"));
        root.description = "Print files".to_string();
        root.arguments
            .insert("file".to_string(), "First file to print".to_string());
        root.arguments
            .insert("files".to_string(), "More files to print".to_string());
        root.options
            .insert("-L [value], --log [value]".to_string(), "Log level".to_string());
        root.subcommands.push(copy);
        root.handler = Some(true);

        Self {
            schema_version: SCHEMA_VERSION,
            name: name.to_string(),
            version: "0.1.0".to_string(),
            description: format!("{name} command line"),
            reserved_flags: Vec::new(),
            command: root,
        }
    }
}
