use indexmap::IndexMap;
use line_argparse::{ArgumentValue, Command, Dispatch, Matches, OptionValue, help};
use serde::Serialize;
use serde_json::{Value, json};

/// Summary of a compiled manifest, as printed by `line check`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub manifest: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub commands: Vec<CommandSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandSummary {
    pub path: String,
    pub usage: String,
    pub options: Vec<String>,
    pub handler: bool,
}

impl CheckReport {
    pub fn failed(manifest: String, error: String) -> Self {
        Self {
            manifest,
            ok: false,
            error: Some(error),
            commands: Vec::new(),
        }
    }

    pub fn compiled(manifest: String, cli: &line_argparse::Cli) -> Self {
        let mut commands = Vec::new();
        collect(cli.root(), vec![cli.command_name().to_string()], &mut commands);
        Self {
            manifest,
            ok: true,
            error: None,
            commands,
        }
    }
}

fn collect(command: &Command, path: Vec<String>, out: &mut Vec<CommandSummary>) {
    out.push(CommandSummary {
        path: path.join(" "),
        usage: command.signature().usage(),
        options: command
            .options()
            .iter()
            .map(|(_, spec)| spec.declaration().to_string())
            .collect(),
        handler: command.has_handler(),
    });
    for sub in command.subcommands() {
        let mut sub_path = path.clone();
        sub_path.push(sub.name().to_string());
        collect(sub, sub_path, out);
    }
}

/// Outcome of a `line parse` dry run.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ParseReport {
    Help {
        command: String,
        text: String,
    },
    Version {
        text: String,
    },
    Resolved {
        command: String,
        arguments: IndexMap<String, Value>,
        options: IndexMap<String, Value>,
        reserved_flags: Vec<String>,
    },
    Error {
        command: String,
        errors: Vec<String>,
        text: String,
    },
}

impl ParseReport {
    pub fn from_dispatch(cli: &line_argparse::Cli, dispatch: &Dispatch<'_>) -> Self {
        match dispatch {
            Dispatch::ShowHelp { command, path } => Self::Help {
                command: path.join(" "),
                text: help::help(cli, command, path),
            },
            Dispatch::ShowVersion => Self::Version {
                text: help::version(cli),
            },
            Dispatch::Resolved(m) | Dispatch::Executed(m) | Dispatch::HandlerFailed(m, _) => {
                resolved(m)
            }
            Dispatch::ErrorExit(m) => Self::Error {
                command: m.path().join(" "),
                errors: m.errors().iter().map(ToString::to_string).collect(),
                text: help::errors(m),
            },
        }
    }

    /// Plain-text rendering for the terminal.
    pub fn render(&self) -> String {
        match self {
            Self::Help { text, .. } | Self::Version { text } | Self::Error { text, .. } => {
                text.clone()
            }
            Self::Resolved {
                command,
                arguments,
                options,
                reserved_flags,
            } => {
                let mut out = format!("Command: {command}\n");
                if !arguments.is_empty() {
                    out.push_str("\nArguments:\n");
                    for (name, value) in arguments {
                        out.push_str(&format!("  {name} = {}\n", display_value(value)));
                    }
                }
                if !options.is_empty() {
                    out.push_str("\nOptions:\n");
                    for (name, value) in options {
                        match value {
                            Value::Bool(_) => out.push_str(&format!("  {name}\n")),
                            _ => out.push_str(&format!("  {name} = {}\n", display_value(value))),
                        }
                    }
                }
                if !reserved_flags.is_empty() {
                    out.push_str("\nReserved flags:\n");
                    for flag in reserved_flags {
                        out.push_str(&format!("  {flag}\n"));
                    }
                }
                out
            }
        }
    }
}

fn resolved(m: &Matches<'_>) -> ParseReport {
    let arguments = m
        .result()
        .arguments
        .iter()
        .map(|(name, value)| {
            let value = match value {
                ArgumentValue::Single(v) => json!(v),
                ArgumentValue::Many(vs) => json!(vs),
            };
            (name.clone(), value)
        })
        .collect();

    let command = m.command();
    let options = command
        .options()
        .iter()
        .filter_map(|(id, spec)| {
            let value = match m.result().options.get(&id)? {
                OptionValue::Present => Value::Bool(true),
                OptionValue::Values(vs) => json!(vs),
            };
            Some((spec.display_name().to_string(), value))
        })
        .collect();

    ParseReport::Resolved {
        command: m.path().join(" "),
        arguments,
        options,
        reserved_flags: m.reserved_flags().to_vec(),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(display_value).collect();
            format!("[{}]", items.join(", "))
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use line_metadata::Manifest;

    fn argv(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn check_report_walks_every_command() {
        let cli = Manifest::sample("demo").to_cli().unwrap();
        let report = CheckReport::compiled("line.json".to_string(), &cli);
        assert!(report.ok);
        let paths: Vec<&str> = report.commands.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["demo", "demo copy"]);
        assert_eq!(report.commands[1].usage, "[source] [destination]");
        assert_eq!(report.commands[1].options, vec!["-D, --dry-run".to_string()]);
    }

    #[test]
    fn resolved_report_uses_canonical_option_names() {
        let cli = Manifest::sample("demo").to_cli().unwrap();
        let dispatch = cli.decide(&argv("a.txt b.txt c.txt -L debug"));
        let report = ParseReport::from_dispatch(&cli, &dispatch);

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["outcome"], "resolved");
        assert_eq!(value["arguments"]["file"], "a.txt");
        assert_eq!(value["arguments"]["files"], json!(["b.txt", "c.txt"]));
        assert_eq!(value["options"]["--log"], json!(["debug"]));
        assert_eq!(value["reservedFlags"], json!([]));

        let text = report.render();
        assert!(text.contains("  files = [b.txt, c.txt]\n"), "{text}");
        assert!(text.contains("  --log = [debug]\n"), "{text}");
    }

    #[test]
    fn error_report_lists_messages() {
        let cli = Manifest::sample("demo").to_cli().unwrap();
        let dispatch = cli.decide(&argv("copy a.txt -Z"));
        let report = ParseReport::from_dispatch(&cli, &dispatch);

        let ParseReport::Error { command, errors, text } = &report else {
            panic!("expected error report");
        };
        assert_eq!(command, "demo copy");
        assert_eq!(
            errors,
            &vec![
                "Argument 'destination' is missing".to_string(),
                "Option '-Z' is not recognized".to_string(),
            ]
        );
        assert!(text.contains("Command 'demo copy' used incorrectly"));
    }
}
