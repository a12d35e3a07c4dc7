//! List configuration.
//!
//! A [`ListConfig`] can be built in code or loaded from TOML:
//!
//! ```toml
//! entity_name = "Ingredient"
//!
//! [affordance]
//! enabled = true
//! label = "Create new {entity}"
//!
//! [updates]
//! in_place_refresh = true
//!
//! [refetch]
//! mode = "background"
//! queue_capacity = 64
//! thread_name = "rowsync-refetch"
//! ```
//!
//! Every field is optional; missing fields take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Placeholder in [`AffordanceConfig::label`] replaced by the entity name.
pub const ENTITY_PLACEHOLDER: &str = "{entity}";

/// How refetches triggered by filter changes are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefetchMode {
    /// Run the query on the calling thread and reload immediately.
    #[default]
    Inline,
    /// Run the query on a dedicated worker thread; the result is applied by
    /// the next `process_pending` after it completes.
    Background,
}

/// The synthetic "add new item" row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AffordanceConfig {
    /// Whether the row may be shown at all.
    pub enabled: bool,
    /// Row label; `{entity}` is replaced by the entity name.
    pub label: String,
}

impl Default for AffordanceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            label: format!("Create new {ENTITY_PLACEHOLDER}"),
        }
    }
}

/// Incremental update behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Translate store updates into in-place row refreshes when the
    /// presentation supports them.
    pub in_place_refresh: bool,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            in_place_refresh: true,
        }
    }
}

/// Refetch execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefetchConfig {
    /// Inline or background.
    pub mode: RefetchMode,
    /// Capacity of the background worker's queue.
    pub queue_capacity: usize,
    /// Name of the background worker thread.
    pub thread_name: String,
}

impl Default for RefetchConfig {
    fn default() -> Self {
        Self {
            mode: RefetchMode::Inline,
            queue_capacity: 64,
            thread_name: "rowsync-refetch".to_string(),
        }
    }
}

/// Configuration for one bound list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    /// Human-readable name of the listed records, used in labels and logs.
    pub entity_name: String,
    /// Synthetic row settings.
    pub affordance: AffordanceConfig,
    /// Incremental update settings.
    pub updates: UpdateConfig,
    /// Refetch settings.
    pub refetch: RefetchConfig,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            entity_name: "Item".to_string(),
            affordance: AffordanceConfig::default(),
            updates: UpdateConfig::default(),
            refetch: RefetchConfig::default(),
        }
    }
}

impl ListConfig {
    /// Create a default config for `entity_name`.
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self::default().with_entity_name(entity_name)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|err| ConfigError::io(path, err))?;
        Self::from_toml_str(&source)
    }

    /// Serialize to pretty TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let toml = self.to_toml_string()?;
        std::fs::write(path, toml).map_err(|err| ConfigError::io(path, err))
    }

    /// Check values that deserialization cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refetch.queue_capacity == 0 {
            return Err(ConfigError::invalid(
                "refetch.queue_capacity",
                "must be at least 1",
            ));
        }
        if self.refetch.thread_name.trim().is_empty() {
            return Err(ConfigError::invalid("refetch.thread_name", "must not be empty"));
        }
        Ok(())
    }

    /// The affordance label with the entity name filled in.
    pub fn affordance_label(&self) -> String {
        self.affordance.label.replace(ENTITY_PLACEHOLDER, &self.entity_name)
    }

    // -------------------------------------------------------------------------
    // Builder-style setters
    // -------------------------------------------------------------------------

    /// Set the entity name.
    pub fn with_entity_name(mut self, entity_name: impl Into<String>) -> Self {
        self.entity_name = entity_name.into();
        self
    }

    /// Enable or disable the affordance row.
    pub fn affordance(mut self, enabled: bool) -> Self {
        self.affordance.enabled = enabled;
        self
    }

    /// Set the affordance label template.
    pub fn affordance_label_template(mut self, label: impl Into<String>) -> Self {
        self.affordance.label = label.into();
        self
    }

    /// Enable or disable in-place refresh of updated rows.
    pub fn in_place_refresh(mut self, enabled: bool) -> Self {
        self.updates.in_place_refresh = enabled;
        self
    }

    /// Set the refetch mode.
    pub fn refetch_mode(mut self, mode: RefetchMode) -> Self {
        self.refetch.mode = mode;
        self
    }

    /// Set the background worker's queue capacity.
    pub fn refetch_queue_capacity(mut self, capacity: usize) -> Self {
        self.refetch.queue_capacity = capacity;
        self
    }

    /// Set the background worker's thread name.
    pub fn refetch_thread_name(mut self, name: impl Into<String>) -> Self {
        self.refetch.thread_name = name.into();
        self
    }
}
