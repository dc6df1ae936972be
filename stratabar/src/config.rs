// Copyright 2026 the Stratabar Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! TOML configuration loading and panel construction.
//!
//! Configuration is read once at startup and is immutable afterwards. When no
//! file exists, a built-in default (one top bar with clock, battery, and
//! network widgets) keeps the daemon useful out of the box.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use stratabar_core::paint::{ColorParseError, Rgba};
use stratabar_core::panel::{Anchor, Direction, PanelConfig, WidgetConfig};

use crate::render;

/// Configuration loading failure.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    /// The file exists but could not be read.
    #[error("reading {path} failed")]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The file is not valid TOML or does not match the schema.
    #[error("parsing configuration failed")]
    Parse(#[from] toml::de::Error),
    /// A widget color is not `#rrggbb` or `#rrggbbaa`.
    #[error(transparent)]
    Color(#[from] ColorParseError),
}

fn default_buffers() -> usize {
    2
}
fn default_width() -> u32 {
    1920
}
fn default_height() -> u32 {
    48
}
fn all_outputs() -> Vec<String> {
    vec!["*".to_owned()]
}

/// Buffer pool geometry.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PoolSection {
    /// Slot count shared by every panel on every output.
    #[serde(default = "default_buffers")]
    pub(crate) buffers: usize,
    /// Slot width in pixels; also the bar length.
    #[serde(default = "default_width")]
    pub(crate) width: u32,
    /// Slot height in pixels; also the bar thickness.
    #[serde(default = "default_height")]
    pub(crate) height: u32,
}

impl Default for PoolSection {
    fn default() -> Self {
        Self {
            buffers: default_buffers(),
            width: default_width(),
            height: default_height(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum AnchorName {
    #[default]
    Top,
    Bottom,
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum DirectionName {
    #[default]
    Row,
    Column,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum WidgetKind {
    Clock,
    Battery,
    Network,
    Block,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct WidgetEntry {
    pub(crate) kind: WidgetKind,
    /// `#rrggbb` or `#rrggbbaa`; defaults to white.
    pub(crate) color: Option<String>,
    /// Source dependencies; defaults per kind.
    pub(crate) sources: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct PanelEntry {
    #[serde(default)]
    pub(crate) anchor: AnchorName,
    #[serde(default)]
    pub(crate) direction: DirectionName,
    /// Output names this panel appears on; `*` matches every output.
    #[serde(default = "all_outputs")]
    pub(crate) outputs: Vec<String>,
    pub(crate) widgets: Vec<WidgetEntry>,
}

/// Root configuration document.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
    #[serde(default)]
    pub(crate) pool: PoolSection,
    #[serde(default)]
    pub(crate) panel: Vec<PanelEntry>,
}

const DEFAULT_CONFIG: &str = r##"
[[panel]]
anchor = "top"

[[panel.widgets]]
kind = "clock"

[[panel.widgets]]
kind = "battery"
color = "#a0e8a0"

[[panel.widgets]]
kind = "network"
color = "#80b0ff"
"##;

fn default_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(base.join("stratabar").join("config.toml"))
}

/// Loads configuration from `path`, the default location, or the built-in
/// default, in that order.
pub(crate) fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let candidate = path.map(Path::to_path_buf).or_else(default_path);
    match candidate {
        Some(file) if path.is_some() || file.exists() => {
            info!(path = %file.display(), "loading configuration");
            let text = fs::read_to_string(&file).map_err(|source| ConfigError::Read {
                path: file,
                source,
            })?;
            Ok(toml::from_str(&text)?)
        }
        _ => {
            info!("no configuration file, using built-in defaults");
            Ok(toml::from_str(DEFAULT_CONFIG)?)
        }
    }
}

fn default_sources(kind: WidgetKind) -> Vec<String> {
    match kind {
        WidgetKind::Clock => vec!["time".to_owned()],
        WidgetKind::Battery => vec!["power".to_owned()],
        WidgetKind::Network => vec!["network".to_owned()],
        WidgetKind::Block => Vec::new(),
    }
}

fn build_widget(entry: &WidgetEntry) -> Result<WidgetConfig, ConfigError> {
    let color = match &entry.color {
        Some(text) => Rgba::parse(text)?,
        None => Rgba::rgb(255, 255, 255),
    };
    let sources: Vec<String> = entry
        .sources
        .clone()
        .unwrap_or_else(|| default_sources(entry.kind));
    let primary = sources.first().cloned().unwrap_or_default();
    let render = match entry.kind {
        WidgetKind::Clock => render::clock(primary, color),
        WidgetKind::Battery => render::battery(primary, color),
        WidgetKind::Network => render::network(primary, color),
        WidgetKind::Block => render::block(8, 8, color),
    };
    Ok(WidgetConfig {
        render,
        on_click: None,
        sources: sources.into_iter().collect::<BTreeSet<String>>(),
    })
}

/// Builds the immutable panel set the redraw machinery consumes.
pub(crate) fn build_panels(config: &Config) -> Result<Vec<PanelConfig>, ConfigError> {
    config
        .panel
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let widgets = entry
                .widgets
                .iter()
                .map(build_widget)
                .collect::<Result<Vec<_>, _>>()?;
            let outputs = entry.outputs.clone();
            Ok(PanelConfig {
                index,
                anchor: match entry.anchor {
                    AnchorName::Top => Anchor::Top,
                    AnchorName::Bottom => Anchor::Bottom,
                    AnchorName::Left => Anchor::Left,
                    AnchorName::Right => Anchor::Right,
                },
                direction: match entry.direction {
                    DirectionName::Row => Direction::Row,
                    DirectionName::Column => Direction::Column,
                },
                widgets,
                check_display: Box::new(move |name| {
                    outputs.iter().any(|entry| entry == "*" || entry == name)
                }),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_default_parses_and_builds() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).expect("default config parses");
        assert_eq!(config.pool.buffers, 2, "pool defaults applied");

        let panels = build_panels(&config).expect("default config builds");
        assert_eq!(panels.len(), 1, "one default panel");
        assert_eq!(panels[0].widgets.len(), 3, "clock, battery, network");
        assert!(panels[0].matches_output("DP-1"), "wildcard output");
    }

    #[test]
    fn explicit_outputs_limit_the_panel() {
        let config: Config = toml::from_str(
            r#"
            [[panel]]
            outputs = ["eDP-1"]
            [[panel.widgets]]
            kind = "clock"
            "#,
        )
        .expect("parses");
        let panels = build_panels(&config).expect("builds");

        assert!(panels[0].matches_output("eDP-1"), "listed output matches");
        assert!(!panels[0].matches_output("DP-1"), "others do not");
    }

    #[test]
    fn widget_sources_default_per_kind_and_can_be_overridden() {
        let config: Config = toml::from_str(
            r#"
            [[panel]]
            [[panel.widgets]]
            kind = "clock"
            [[panel.widgets]]
            kind = "clock"
            sources = ["date"]
            "#,
        )
        .expect("parses");
        let panels = build_panels(&config).expect("builds");

        assert!(
            panels[0].widgets[0].sources.contains("time"),
            "clock defaults to the time source"
        );
        assert!(
            panels[0].widgets[1].sources.contains("date"),
            "override replaces the default"
        );
    }

    #[test]
    fn bad_color_is_a_load_error() {
        let config: Config = toml::from_str(
            r##"
            [[panel]]
            [[panel.widgets]]
            kind = "clock"
            color = "#nope"
            "##,
        )
        .expect("parses");
        assert!(
            matches!(build_panels(&config), Err(ConfigError::Color(_))),
            "invalid color rejected at build time"
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(
            toml::from_str::<Config>("[pool]\nbufers = 3").is_err(),
            "typoed key must not be silently ignored"
        );
    }
}
