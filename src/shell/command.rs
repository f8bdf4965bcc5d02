//! Shell command parsing

/// One line of shell input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// Blank line
    Empty,

    /// `q`: disconnect and leave
    Quit,

    /// `c`: clear the screen
    Clear,

    /// `h`: show help
    Help,

    /// `p`: send a keep-alive now
    Ping,

    /// `pm`: show the last automatic keep-alive
    LastPing,

    /// `NAME`: read a variable
    Read { name: String },

    /// `NAME, VALUE`: write a variable
    Write { name: String, value: String },
}

/// Parse one input line.
///
/// Single-letter commands are case insensitive. Anything else is a variable
/// name, optionally followed by a comma and a value; the split happens on the
/// first comma so values may contain commas (e.g. `{X 10, Y 20}`).
pub fn parse_line(line: &str) -> ShellCommand {
    let line = line.trim();
    match line.to_ascii_lowercase().as_str() {
        "" => return ShellCommand::Empty,
        "q" => return ShellCommand::Quit,
        "c" => return ShellCommand::Clear,
        "h" => return ShellCommand::Help,
        "p" => return ShellCommand::Ping,
        "pm" => return ShellCommand::LastPing,
        _ => {}
    }

    match line.split_once(',') {
        Some((name, value)) => ShellCommand::Write {
            name: name.trim().to_string(),
            value: value.trim().to_string(),
        },
        None => ShellCommand::Read {
            name: line.to_string(),
        },
    }
}
