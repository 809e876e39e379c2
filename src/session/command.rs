//! Operator commands and their key bindings

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Commands the operator can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", content = "params")]
pub enum SessionCommand {
    /// Capture, generate and merge the current view
    Retexture,
    OrbitLeft,
    OrbitRight,
    OrbitUp,
    OrbitDown,
    ZoomIn,
    ZoomOut,
    /// Write the id buffer of the current view as an image
    ShowIds,
    /// Write the depth images and removal mask, flag the removed points
    ShowDepthFilter,
    SavePatch,
    LoadPatch,
    /// Write a render of the retextured points only
    ShowTexturedOnly,
    /// Restore original colors and clear the textured set
    Reset,
    /// Drop every point that has not been retextured
    PruneUntextured,
    /// Retexture `views` views evenly spaced around the target
    Sweep { views: usize },
}

impl SessionCommand {
    pub fn description(&self) -> &'static str {
        match self {
            SessionCommand::Retexture => "retexture the current view",
            SessionCommand::OrbitLeft => "orbit left",
            SessionCommand::OrbitRight => "orbit right",
            SessionCommand::OrbitUp => "orbit up",
            SessionCommand::OrbitDown => "orbit down",
            SessionCommand::ZoomIn => "zoom in",
            SessionCommand::ZoomOut => "zoom out",
            SessionCommand::ShowIds => "write the id buffer",
            SessionCommand::ShowDepthFilter => "write the depth filter images",
            SessionCommand::SavePatch => "save retextured colors",
            SessionCommand::LoadPatch => "load retextured colors",
            SessionCommand::ShowTexturedOnly => "write a render of textured points",
            SessionCommand::Reset => "reset all colors",
            SessionCommand::PruneUntextured => "remove untextured points",
            SessionCommand::Sweep { .. } => "retexture a ring of views",
        }
    }
}

const BASE_BINDINGS: [(char, SessionCommand); 7] = [
    ('r', SessionCommand::Retexture),
    ('a', SessionCommand::OrbitLeft),
    ('d', SessionCommand::OrbitRight),
    ('w', SessionCommand::OrbitUp),
    ('s', SessionCommand::OrbitDown),
    ('+', SessionCommand::ZoomIn),
    ('-', SessionCommand::ZoomOut),
];

const DEBUG_BINDINGS: [(char, SessionCommand); 7] = [
    ('i', SessionCommand::ShowIds),
    ('f', SessionCommand::ShowDepthFilter),
    ('k', SessionCommand::SavePatch),
    ('l', SessionCommand::LoadPatch),
    ('x', SessionCommand::ShowTexturedOnly),
    ('n', SessionCommand::Reset),
    ('p', SessionCommand::PruneUntextured),
];

/// Key to command table, fixed at session setup
#[derive(Debug, Clone)]
pub struct CommandTable {
    bindings: BTreeMap<char, SessionCommand>,
}

impl CommandTable {
    /// Base bindings, plus the diagnostic ones when `debug` is set
    pub fn new(debug: bool) -> Self {
        let mut bindings: BTreeMap<char, SessionCommand> = BASE_BINDINGS.into_iter().collect();
        if debug {
            bindings.extend(DEBUG_BINDINGS);
        }
        Self { bindings }
    }

    pub fn lookup(&self, key: char) -> Option<SessionCommand> {
        self.bindings.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bindings in key order
    pub fn iter(&self) -> impl Iterator<Item = (char, SessionCommand)> + '_ {
        self.bindings.iter().map(|(&k, &c)| (k, c))
    }

    /// One `key  description` line per binding
    pub fn help(&self) -> String {
        self.iter()
            .map(|(key, command)| format!("  {}  {}", key, command.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_bindings() {
        let table = CommandTable::new(false);
        assert_eq!(table.len(), 7);
        assert_eq!(table.lookup('r'), Some(SessionCommand::Retexture));
        assert_eq!(table.lookup('-'), Some(SessionCommand::ZoomOut));
        assert_eq!(table.lookup('i'), None);
        assert_eq!(table.lookup('p'), None);
    }

    #[test]
    fn test_debug_bindings() {
        let table = CommandTable::new(true);
        assert_eq!(table.len(), 14);
        assert_eq!(table.lookup('f'), Some(SessionCommand::ShowDepthFilter));
        assert_eq!(table.lookup('p'), Some(SessionCommand::PruneUntextured));
        assert!(table.help().contains("remove untextured points"));
    }

    #[test]
    fn test_command_json() {
        let json = serde_json::to_string(&SessionCommand::Sweep { views: 8 }).unwrap();
        assert_eq!(json, r#"{"cmd":"Sweep","params":{"views":8}}"#);
        let parsed: SessionCommand = serde_json::from_str(r#"{"cmd":"Reset"}"#).unwrap();
        assert_eq!(parsed, SessionCommand::Reset);
    }
}
