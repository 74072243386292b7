//! Operator command parsing.

use std::str::FromStr;

use thiserror::Error;

use crate::config::parse_flag;
use crate::orientation::{Orientation, ParseOrientationError};

/// One line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Get(String),
    Put(String, Orientation),
    Remove(String),
    /// Reconcile against the listed installed packages.
    Installed(Vec<String>),
    Reset,
    Disabled,
    /// Turn the override switch on or off.
    Check(bool),
    List,
    Flush,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),

    #[error("'{command}' needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("'{0}' takes no more arguments")]
    TrailingArguments(&'static str),

    #[error(transparent)]
    Orientation(#[from] ParseOrientationError),

    #[error("expected on or off, got '{0}'")]
    Switch(String),
}

/// Usage text for `help`.
pub const HELP: &str = "\
Commands:
  get <package>                  show the override for a package
  put <package> <orientation>    set an override (invalid removes it)
  remove <package>               remove an override
  installed <package>...         prune overrides for packages not listed
  reset                          remove every override
  disabled                       whether per-package checks are skipped
  check on|off                   toggle per-package checks
  list                           print every override as JSON
  flush                          wait for pending writes
  help                           show this text
  quit                           flush and exit";

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or(ParseCommandError::Empty)?;

        let command = match name.to_lowercase().as_str() {
            "get" => Self::Get(required(&mut words, "get", "a package name")?),
            "put" | "set" => {
                let package_name = required(&mut words, "put", "a package name")?;
                let orientation = required(&mut words, "put", "an orientation")?.parse::<Orientation>()?;
                Self::Put(package_name, orientation)
            }
            "remove" | "rm" => Self::Remove(required(&mut words, "remove", "a package name")?),
            // Remaining words are consumed here; an empty list prunes everything.
            "installed" => return Ok(Self::Installed(words.map(str::to_string).collect())),
            "reset" => Self::Reset,
            "disabled" => Self::Disabled,
            "check" => {
                let value = required(&mut words, "check", "on or off")?;
                match value.to_lowercase().as_str() {
                    v if parse_flag(v) => Self::Check(true),
                    "0" | "false" | "no" | "off" => Self::Check(false),
                    _ => return Err(ParseCommandError::Switch(value)),
                }
            }
            "list" | "ls" => Self::List,
            "flush" => Self::Flush,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(ParseCommandError::Unknown(other.to_string())),
        };

        if words.next().is_some() {
            return Err(ParseCommandError::TrailingArguments(command.name()));
        }
        Ok(command)
    }
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Get(_) => "get",
            Self::Put(..) => "put",
            Self::Remove(_) => "remove",
            Self::Installed(_) => "installed",
            Self::Reset => "reset",
            Self::Disabled => "disabled",
            Self::Check(_) => "check",
            Self::List => "list",
            Self::Flush => "flush",
            Self::Help => "help",
            Self::Quit => "quit",
        }
    }
}

fn required<'a>(
    words: &mut impl Iterator<Item = &'a str>,
    command: &'static str,
    argument: &'static str,
) -> Result<String, ParseCommandError> {
    words
        .next()
        .map(str::to_string)
        .ok_or(ParseCommandError::MissingArgument { command, argument })
}
