//! Plain-text help, usage, version and error rendering.
//!
//! Nothing here is consulted during resolution; these are conveniences for the
//! layer that prints to the terminal.

use crate::dispatch::{Cli, Command, HELP_FLAGS, Matches, VERSION_FLAGS};

/// Usage lines for `command` invoked as `path`.
pub fn usage(command: &Command, path: &[String]) -> String {
    let invoked = path.join(" ");
    let mut lines: Vec<String> = Vec::new();

    if command.has_handler() {
        let mut line = invoked.clone();
        if !command.options().is_empty() {
            line.push_str(" [options]");
        }
        let slots = command.signature().usage();
        if !slots.is_empty() {
            line.push(' ');
            line.push_str(&slots);
        }
        lines.push(line);
    }
    if !command.subcommands().is_empty() {
        lines.push(format!("{invoked} <subcommand> [args] [options]"));
    }
    lines.push(format!("{invoked} [-h | --help | -v | --version]"));

    let mut out = String::from("Usage:");
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            out.push_str(&format!(" {line}\n"));
        } else {
            out.push_str(&format!("       {line}\n"));
        }
    }
    out
}

fn push_rows(out: &mut String, title: &str, rows: Vec<(String, String)>) {
    if rows.is_empty() {
        return;
    }
    out.push_str(&format!("\n{title}:\n"));
    let width = rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
    for (left, help) in rows {
        if help.is_empty() {
            out.push_str(&format!("  {}\n", left));
        } else {
            out.push_str(&format!("  {:width$}  {}\n", left, help, width = width));
        }
    }
}

/// Render the help menu of `command` invoked as `path`.
pub fn help(cli: &Cli, command: &Command, path: &[String]) -> String {
    let mut out = String::new();

    let is_root = std::ptr::eq(command, cli.root());
    let summary = if is_root && command.description().trim().is_empty() {
        cli.description()
    } else {
        command.description()
    };
    let title = if is_root { cli.name() } else { command.name() };
    if summary.trim().is_empty() {
        out.push_str(&format!("{title}\n"));
    } else {
        out.push_str(&format!("{} - {}\n", title, summary.trim()));
    }

    out.push('\n');
    out.push_str(&usage(command, path));

    if command.has_handler() {
        let rows = command
            .signature()
            .slots()
            .iter()
            .map(|slot| {
                let left = if slot.is_variadic() {
                    format!("{}...", slot.name())
                } else {
                    slot.name().to_string()
                };
                let help = command
                    .argument_description(slot.name())
                    .unwrap_or("(no description)")
                    .trim()
                    .to_string();
                (left, help)
            })
            .collect();
        push_rows(&mut out, "Arguments", rows);
    }

    let rows = command
        .subcommands()
        .iter()
        .map(|sub| (sub.name().to_string(), sub.description().trim().to_string()))
        .collect();
    push_rows(&mut out, "Subcommands", rows);

    let mut rows: Vec<(String, String)> = Vec::new();
    if !HELP_FLAGS.iter().any(|f| command.options().contains(f)) {
        rows.push((HELP_FLAGS.join(", "), "Show this menu".to_string()));
    }
    if !VERSION_FLAGS.iter().any(|f| command.options().contains(f)) {
        rows.push((VERSION_FLAGS.join(", "), "Show version information".to_string()));
    }
    for (_, spec) in command.options().iter() {
        rows.push((
            spec.declaration().to_string(),
            spec.description().trim().to_string(),
        ));
    }
    push_rows(&mut out, "Options", rows);

    out
}

/// Render the version line.
pub fn version(cli: &Cli) -> String {
    if cli.version().trim().is_empty() {
        format!("{}\n", cli.name())
    } else {
        format!("{} {}\n", cli.name(), cli.version().trim())
    }
}

/// Render every error of a failed invocation followed by the command's usage.
pub fn errors(matches: &Matches<'_>) -> String {
    let mut out = format!(
        "Command '{}' used incorrectly. Error(s) found:\n\n",
        matches.path().join(" ")
    );
    for err in matches.errors() {
        out.push_str(&format!("  * {err}\n"));
    }
    out.push('\n');
    out.push_str(&usage(matches.command(), matches.path()));
    out
}
