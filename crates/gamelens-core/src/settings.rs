//! Settings file loading and the typed game schema.
//!
//! The settings document is YAML with two top-level sections: `Server`
//! identifies the game server the capture was filtered against, and `Game`
//! holds one schema subtree per role. Everything is validated while the file
//! is deserialized; the dissector never re-checks field shapes at decode
//! time. Unknown output casts, malformed record IDs, and missing field types
//! all fail here, with the file path in the error.
//!
//! ```yaml
//! Server:
//!   host: 192.168.0.10
//!   port: 6900
//! Game:
//!   node:
//!     actions:
//!       9:
//!         title: Tick
//!       125:
//!         title: Move
//!         structs:
//!           - type: unsigned short
//!             name: X
//!             output:
//!               type: hex
//!               auto_zero_fill: true
//! ```

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::dissect::Role;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot open settings file `{path}`: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("settings file `{path}` is not valid: {message}")]
    Parse { path: String, message: String },
    #[error("no settings found in the file `{path}`")]
    Empty { path: String },
}

/// Top of the settings document.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(rename = "Server")]
    pub server: ServerSettings,
    #[serde(rename = "Game", default)]
    pub game: Option<GameSchema>,
}

/// Identity of the game server; used to filter captured segments and to
/// resolve the role of each payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: IpAddr,
    pub port: u16,
}

/// Per-role schema subtrees.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameSchema {
    #[serde(default)]
    pub host: Option<RoleSchema>,
    #[serde(default)]
    pub node: Option<RoleSchema>,
}

impl GameSchema {
    pub fn role(&self, role: Role) -> Option<&RoleSchema> {
        match role {
            Role::Host => self.host.as_ref(),
            Role::Node => self.node.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.host.is_none() && self.node.is_none()
    }
}

/// One role's record table plus its default display flag.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleSchema {
    #[serde(default)]
    pub display_message: Option<bool>,
    #[serde(default)]
    pub actions: BTreeMap<i16, ActionSpec>,
}

/// One schema-described record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionSpec {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub display_message: Option<bool>,
    #[serde(default)]
    pub structs: Vec<FieldSpec>,
}

/// One typed field within a record.
///
/// `size` doubles as the repeat count for numeric types and the byte length
/// for `chars`; it is also summed into the record's byte budget on top of
/// the type's unit width.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub output: Option<OutputSpec>,
    #[serde(default)]
    pub reference: Option<BTreeMap<i64, String>>,
}

/// Independently toggled output transforms, applied in pipeline order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputSpec {
    #[serde(rename = "type", default)]
    pub cast: Option<Cast>,
    #[serde(default)]
    pub zero_fill: Option<u32>,
    #[serde(default)]
    pub auto_zero_fill: bool,
    #[serde(default)]
    pub fill: Option<u32>,
    #[serde(default)]
    pub fill_left: Option<u32>,
}

/// Textual cast applied before the fill options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cast {
    Hex,
}

impl Settings {
    /// Load and validate a settings file. A null or empty document is
    /// reported as missing settings rather than a parse failure.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let display_path = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: display_path.clone(),
            source,
        })?;
        let parsed: Option<Self> =
            serde_yaml_ng::from_str(&content).map_err(|error| SettingsError::Parse {
                path: display_path.clone(),
                message: error.to_string(),
            })?;
        parsed.ok_or(SettingsError::Empty { path: display_path })
    }
}

#[cfg(test)]
mod tests {
    use super::{Cast, Settings, SettingsError};
    use crate::dissect::Role;
    use std::time::{SystemTime, UNIX_EPOCH};

    const FULL: &str = "
Server:
  host: 192.168.0.10
  port: 6900
Game:
  node:
    display_message: false
    actions:
      125:
        title: Move
        display_message: true
        structs:
          - type: unsigned short
            size: 2
            name: X
            output:
              type: hex
              zero_fill: 6
              auto_zero_fill: true
              fill: 10
              fill_left: 12
          - type: chars
            size: 4
          - type: unsigned char
            reference:
              1: Heal
";

    #[test]
    fn full_document_deserializes() {
        let settings: Settings = serde_yaml_ng::from_str(FULL).unwrap();
        assert_eq!(settings.server.port, 6900);
        assert_eq!(settings.server.host.to_string(), "192.168.0.10");

        let game = settings.game.unwrap();
        assert!(game.role(Role::Host).is_none());
        let node = game.role(Role::Node).unwrap();
        assert_eq!(node.display_message, Some(false));

        let action = &node.actions[&125];
        assert_eq!(action.title.as_deref(), Some("Move"));
        assert_eq!(action.display_message, Some(true));
        assert_eq!(action.structs.len(), 3);

        let field = &action.structs[0];
        assert_eq!(field.type_name, "unsigned short");
        assert_eq!(field.size, Some(2));
        let output = field.output.as_ref().unwrap();
        assert_eq!(output.cast, Some(Cast::Hex));
        assert_eq!(output.zero_fill, Some(6));
        assert!(output.auto_zero_fill);
        assert_eq!(output.fill, Some(10));
        assert_eq!(output.fill_left, Some(12));

        let reference = action.structs[2].reference.as_ref().unwrap();
        assert_eq!(reference[&1], "Heal");
    }

    #[test]
    fn game_section_is_optional() {
        let yaml = "
Server:
  host: 10.0.0.1
  port: 9000
";
        let settings: Settings = serde_yaml_ng::from_str(yaml).unwrap();
        assert!(settings.game.is_none());
    }

    #[test]
    fn unknown_cast_fails_at_load() {
        let yaml = "
Server:
  host: 10.0.0.1
  port: 9000
Game:
  node:
    actions:
      1:
        structs:
          - type: short
            output:
              type: octal
";
        let result: Result<Settings, _> = serde_yaml_ng::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn field_without_type_fails_at_load() {
        let yaml = "
Server:
  host: 10.0.0.1
  port: 9000
Game:
  node:
    actions:
      1:
        structs:
          - name: Orphan
";
        let result: Result<Settings, _> = serde_yaml_ng::from_str(yaml);
        assert!(result.is_err());
    }

    fn temp_file(name: &str, content: Option<&str>) -> std::path::PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!("gamelens_{name}_{unique}.yml"));
        if let Some(content) = content {
            std::fs::write(&path, content).unwrap();
        }
        path
    }

    #[test]
    fn load_reports_missing_file_as_io_error() {
        let path = temp_file("missing", None);
        let err = Settings::load(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }

    #[test]
    fn load_reports_empty_file_as_missing_settings() {
        let path = temp_file("empty", Some(""));
        let err = Settings::load(&path).unwrap_err();
        let _ = std::fs::remove_file(&path);
        assert!(matches!(err, SettingsError::Empty { .. }));
        assert!(err.to_string().contains("no settings found in the file"));
    }

    #[test]
    fn load_reads_a_real_file() {
        let path = temp_file("full", Some(FULL));
        let settings = Settings::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(settings.server.port, 6900);
    }
}
