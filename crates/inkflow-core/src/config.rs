//! Engine configuration.

use crate::gesture::{parse_pattern, GestureError};
use crate::input::MouseButton;
use crate::manager::DrawingManager;
use crate::shapes::{Pen, PenKind, Rgba8, HANDLE_SIZE};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Gesture interval must be positive, got {0}")]
    InvalidInterval(f64),
    #[error("Handle size must be positive, got {0}")]
    InvalidHandleSize(f64),
    #[error("{0:?} is used for both drawing and gestures")]
    ButtonConflict(MouseButton),
    #[error("Invalid gesture {pattern:?}: {source}")]
    InvalidGesture {
        pattern: String,
        #[source]
        source: GestureError,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Action bound to a gesture pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GestureCommand {
    /// Remove every shape.
    ClearCanvas,
    /// Recolor the default tool.
    SetPenColor(Rgba8),
    UseRectanglePen,
    UseEllipsePen,
    UseSelector,
    GroupSelection,
    UngroupSelection,
}

impl GestureCommand {
    /// Run the command against `manager`, building tools from `config`.
    pub fn apply(&self, manager: &mut DrawingManager, config: &EngineConfig) {
        match self {
            GestureCommand::ClearCanvas => manager.clear(),
            GestureCommand::SetPenColor(color) => manager.default_tool_mut().set_color((*color).into()),
            GestureCommand::UseRectanglePen => manager.set_default_tool(config.pen(PenKind::Rectangle)),
            GestureCommand::UseEllipsePen => manager.set_default_tool(config.pen(PenKind::Ellipse)),
            GestureCommand::UseSelector => manager.set_default_tool(config.pen(PenKind::Select)),
            GestureCommand::GroupSelection => {
                manager.group_selection();
            }
            GestureCommand::UngroupSelection => {
                manager.ungroup_selection();
            }
        }
    }
}

/// Gesture patterns and their commands, in declaration order.
///
/// Serialized as a JSON object. Repeated keys are kept so that
/// [`EngineConfig::validate`] can reject them instead of letting the last
/// one win.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GestureBindings(Vec<(String, GestureCommand)>);

impl GestureBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pattern: impl Into<String>, command: GestureCommand) {
        self.0.push((pattern.into(), command));
    }

    /// First command bound to `pattern`.
    pub fn get(&self, pattern: &str) -> Option<&GestureCommand> {
        self.0.iter().find(|(p, _)| p == pattern).map(|(_, command)| command)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &GestureCommand)> {
        self.0.iter().map(|(pattern, command)| (pattern, command))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for GestureBindings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (pattern, command) in &self.0 {
            map.serialize_entry(pattern, command)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for GestureBindings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BindingsVisitor;

        impl<'de> Visitor<'de> for BindingsVisitor {
            type Value = GestureBindings;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of gesture patterns to commands")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut bindings = GestureBindings::new();
                while let Some((pattern, command)) = access.next_entry::<String, GestureCommand>()? {
                    bindings.insert(pattern, command);
                }
                Ok(bindings)
            }
        }

        deserializer.deserialize_map(BindingsVisitor)
    }
}

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Button that draws, selects and drags shapes.
    pub drag_button: MouseButton,
    /// Button that draws gestures.
    pub gesture_button: MouseButton,
    /// Distance in pixels a stroke must cover to count as a direction.
    pub gesture_interval: f64,
    /// Edge length of resize handles.
    pub handle_size: f64,
    /// Tool active at startup.
    pub default_pen: PenKind,
    pub pen_color: Rgba8,
    pub selector_color: Rgba8,
    /// Gesture table, keyed by arrow string.
    pub gestures: GestureBindings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mut gestures = GestureBindings::new();
        gestures.insert("→←→", GestureCommand::ClearCanvas);
        gestures.insert("↑↓", GestureCommand::SetPenColor(Rgba8::RED));
        Self {
            drag_button: MouseButton::Left,
            gesture_button: MouseButton::Right,
            gesture_interval: 30.0,
            handle_size: HANDLE_SIZE,
            default_pen: PenKind::Rectangle,
            pen_color: Rgba8::BLUE,
            selector_color: Rgba8::BLACK,
            gestures,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.gesture_interval.is_nan() || self.gesture_interval <= 0.0 {
            return Err(ConfigError::InvalidInterval(self.gesture_interval));
        }
        if self.handle_size.is_nan() || self.handle_size <= 0.0 {
            return Err(ConfigError::InvalidHandleSize(self.handle_size));
        }
        if self.drag_button == self.gesture_button {
            return Err(ConfigError::ButtonConflict(self.drag_button));
        }
        let mut seen = BTreeSet::new();
        for (pattern, _) in self.gestures.iter() {
            parse_pattern(pattern).map_err(|source| ConfigError::InvalidGesture {
                pattern: pattern.clone(),
                source,
            })?;
            if !seen.insert(pattern.as_str()) {
                return Err(ConfigError::InvalidGesture {
                    pattern: pattern.clone(),
                    source: GestureError::DuplicatePattern(pattern.clone()),
                });
            }
        }
        Ok(())
    }

    /// Build a tool of `kind` with the configured colors and handle size.
    pub fn pen(&self, kind: PenKind) -> Pen {
        let color = match kind {
            PenKind::Select => self.selector_color,
            PenKind::Rectangle | PenKind::Ellipse => self.pen_color,
        };
        Pen::new(kind, color.into()).with_handle_size(self.handle_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = EngineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.drag_button, MouseButton::Left);
        assert_eq!(config.gesture_button, MouseButton::Right);
        assert!((config.gesture_interval - 30.0).abs() < f64::EPSILON);
        assert!((config.handle_size - 7.0).abs() < f64::EPSILON);
        assert_eq!(config.gestures.get("→←→"), Some(&GestureCommand::ClearCanvas));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{"gesture_interval": 45.0}"#).unwrap();
        assert!((config.gesture_interval - 45.0).abs() < f64::EPSILON);
        assert_eq!(config.pen_color, Rgba8::BLUE);
        assert_eq!(config.gestures.len(), 2);
    }

    #[test]
    fn test_json_gesture_table() {
        let json = r#"{
            "gestures": {
                "↓→": "UseEllipsePen",
                "←": { "SetPenColor": { "r": 0, "g": 128, "b": 0, "a": 255 } }
            }
        }"#;
        let config = EngineConfig::from_json(json).unwrap();
        assert_eq!(config.gestures.len(), 2);
        assert_eq!(
            config.gestures.get("←"),
            Some(&GestureCommand::SetPenColor(Rgba8::new(0, 128, 0, 255)))
        );
    }

    #[test]
    fn test_roundtrip() {
        let config = EngineConfig::default();
        let parsed = EngineConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validation_errors() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"gesture_interval": 0.0}"#),
            Err(ConfigError::InvalidInterval(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"handle_size": -1.0}"#),
            Err(ConfigError::InvalidHandleSize(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"gesture_button": "Left"}"#),
            Err(ConfigError::ButtonConflict(MouseButton::Left))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"gestures": {"up": "ClearCanvas"}}"#),
            Err(ConfigError::InvalidGesture { .. })
        ));
        assert!(matches!(EngineConfig::from_json("{"), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_duplicate_gesture_is_rejected() {
        let json = r#"{"gestures": {"→": "ClearCanvas", "→": "UseSelector"}}"#;
        match EngineConfig::from_json(json) {
            Err(ConfigError::InvalidGesture {
                pattern,
                source: GestureError::DuplicatePattern(repeated),
            }) => {
                assert_eq!(pattern, "→");
                assert_eq!(repeated, "→");
            }
            other => panic!("expected duplicate pattern error, got {other:?}"),
        }

        let mut config = EngineConfig::default();
        config.gestures.insert("↑↓", GestureCommand::UseSelector);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidGesture {
                source: GestureError::DuplicatePattern(_),
                ..
            })
        ));
    }

    #[test]
    fn test_gesture_order_survives_roundtrip() {
        let json = r#"{"gestures": {"↓": "UseSelector", "↑": "UseEllipsePen"}}"#;
        let config = EngineConfig::from_json(json).unwrap();
        let patterns: Vec<&String> = config.gestures.iter().map(|(pattern, _)| pattern).collect();
        assert_eq!(patterns, ["↓", "↑"]);
        let parsed = EngineConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed.gestures, config.gestures);
    }

    #[test]
    fn test_pen_uses_configured_colors() {
        let config = EngineConfig::default();
        let pen = config.pen(PenKind::Select);
        assert_eq!(pen.kind(), PenKind::Select);
        assert_eq!(Rgba8::from(pen.color()), Rgba8::BLACK);
        assert_eq!(Rgba8::from(config.pen(PenKind::Ellipse).color()), Rgba8::BLUE);
    }

    #[test]
    fn test_commands_apply() {
        let config = EngineConfig::default();
        let mut manager = DrawingManager::new(config.pen(config.default_pen));

        GestureCommand::SetPenColor(Rgba8::RED).apply(&mut manager, &config);
        assert_eq!(Rgba8::from(manager.default_tool().color()), Rgba8::RED);

        GestureCommand::UseSelector.apply(&mut manager, &config);
        assert_eq!(manager.default_tool().kind(), PenKind::Select);

        manager.add_shape(crate::shapes::Shape::rectangle(
            kurbo::Rect::new(0.0, 0.0, 10.0, 10.0),
            peniko::Color::BLACK,
        ));
        GestureCommand::ClearCanvas.apply(&mut manager, &config);
        assert!(manager.canvas().is_empty());
    }
}
