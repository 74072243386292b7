//! Operator shell - drives a [`PackageSettings`] from text commands.
//!
//! Add new commands by:
//! 1. Adding a variant to `Command` and its parse arm in `command.rs`
//! 2. Handling it in `execute()`
//! 3. Documenting it in `HELP`

mod command;

pub use command::{Command, HELP, ParseCommandError};

use tracing::debug;

use crate::cache::PackageSettings;

/// What the shell should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Print this and keep reading.
    Reply(String),
    /// Stop reading input.
    Quit,
}

/// Run one command against the cache.
pub async fn execute(settings: &PackageSettings, command: Command) -> Outcome {
    debug!("Executing {:?}", command);

    let reply = match command {
        Command::Get(package_name) => settings.get(&package_name).to_string(),
        Command::Put(package_name, orientation) => {
            settings.put(&package_name, orientation);
            format!("{} -> {}", package_name, settings.get(&package_name))
        }
        Command::Remove(package_name) => {
            settings.remove(&package_name);
            format!("{} removed", package_name)
        }
        Command::Installed(packages) => {
            let pruned = settings.reconcile(&packages);
            if pruned.is_empty() {
                "nothing pruned".to_string()
            } else {
                format!("pruned {}", pruned.join(", "))
            }
        }
        Command::Reset => {
            settings.reset();
            "all overrides removed".to_string()
        }
        Command::Disabled => settings.disabled().to_string(),
        Command::Check(enabled) => {
            settings.switch().set(enabled);
            format!("per-package checks {}", if enabled { "on" } else { "off" })
        }
        Command::List => match serde_json::to_string_pretty(&settings.snapshot()) {
            Ok(json) => json,
            Err(e) => format!("failed to render overrides: {}", e),
        },
        Command::Flush => {
            settings.flush().await;
            "flushed".to_string()
        }
        Command::Help => HELP.to_string(),
        Command::Quit => return Outcome::Quit,
    };

    Outcome::Reply(reply)
}

/// Parse and run one input line. Blank lines produce no reply.
pub async fn handle_line(settings: &PackageSettings, line: &str) -> Option<Outcome> {
    if line.trim().is_empty() {
        return None;
    }

    Some(match line.parse::<Command>() {
        Ok(command) => execute(settings, command).await,
        Err(e) => Outcome::Reply(format!("error: {}", e)),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::OverrideSwitch;
    use crate::database::MemoryPreferenceStore;
    use crate::orientation::Orientation;

    async fn shell_cache() -> (Arc<MemoryPreferenceStore>, PackageSettings) {
        let store = Arc::new(MemoryPreferenceStore::new());
        let settings = PackageSettings::new(store.clone(), OverrideSwitch::new(false));
        settings.initialize().unwrap();
        settings.wait_until_loaded().await;
        (store, settings)
    }

    fn reply(outcome: Option<Outcome>) -> String {
        match outcome {
            Some(Outcome::Reply(text)) => text,
            other => panic!("expected a reply, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_put_get_flush() {
        let (store, settings) = shell_cache().await;

        assert_eq!(
            reply(handle_line(&settings, "put com.example.maps portrait").await),
            "com.example.maps -> portrait"
        );
        assert_eq!(reply(handle_line(&settings, "get com.example.maps").await), "portrait");
        assert_eq!(reply(handle_line(&settings, "flush").await), "flushed");
        assert_eq!(store.code("com.example.maps"), Some(Orientation::Portrait.code()));
    }

    #[tokio::test]
    async fn test_check_toggles_disabled() {
        let (_store, settings) = shell_cache().await;
        handle_line(&settings, "put a landscape").await;

        assert_eq!(reply(handle_line(&settings, "disabled").await), "true");
        handle_line(&settings, "check on").await;
        assert_eq!(reply(handle_line(&settings, "disabled").await), "false");
    }

    #[tokio::test]
    async fn test_installed_and_list() {
        let (_store, settings) = shell_cache().await;
        handle_line(&settings, "put a landscape").await;
        handle_line(&settings, "put b portrait").await;

        assert_eq!(reply(handle_line(&settings, "installed a").await), "pruned b");
        assert_eq!(reply(handle_line(&settings, "installed a").await), "nothing pruned");

        let listed: serde_json::Value =
            serde_json::from_str(&reply(handle_line(&settings, "list").await)).unwrap();
        assert_eq!(listed, serde_json::json!({ "a": "landscape" }));
    }

    #[tokio::test]
    async fn test_errors_blank_and_quit() {
        let (_store, settings) = shell_cache().await;

        assert!(handle_line(&settings, "   ").await.is_none());
        assert!(reply(handle_line(&settings, "bogus").await).starts_with("error: unknown command"));
        assert_eq!(handle_line(&settings, "quit").await, Some(Outcome::Quit));
    }
}
