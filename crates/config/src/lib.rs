// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Number of real interrupt lines a scenario may reference.
pub const MAX_LINES: u32 = 64;

pub const SCHEMA_VERSION: &str = "1.0";

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

fn default_max_time() -> u64 {
    1_000_000
}

fn default_max_events() -> u64 {
    100_000
}

/// Reserved pseudo-lines that can be raised but never occupy a bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhonyLine {
    PhonyHard,
    PhonyWeak,
}

/// Target of a raise action: either a real line number or a phony line name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RaiseLine {
    Line(u32),
    Phony(PhonyLine),
}

/// An operation performed on the controller from the firmware (software) context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Raise { line: RaiseLine },
    /// Raise and wake the CPU synchronously instead of one delta cycle later.
    RaiseNow { line: RaiseLine },
    Clear { line: u32 },
    Enable { line: u32 },
    Disable { line: u32 },
    ClearAll,
    ClearAllEnabled,
    SetPriority { line: u32, priority: u8 },
    Lock,
    Unlock,
}

impl Action {
    /// Real line this action touches, if any.
    pub fn line(&self) -> Option<u32> {
        match self {
            Action::Raise {
                line: RaiseLine::Line(n),
            }
            | Action::RaiseNow {
                line: RaiseLine::Line(n),
            } => Some(*n),
            Action::Clear { line }
            | Action::Enable { line }
            | Action::Disable { line }
            | Action::SetPriority { line, .. } => Some(*line),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PriorityEntry {
    pub line: u32,
    pub priority: u8,
}

/// Boot-time controller setup applied before the first event.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ControllerConfig {
    #[serde(default)]
    pub priorities: Vec<PriorityEntry>,
    #[serde(default)]
    pub enabled: Vec<u32>,
    #[serde(default)]
    pub locked: bool,
}

/// A hardware model that raises one line from the hardware context.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub id: String,
    pub line: u32,
    #[serde(default)]
    pub start: u64,
    #[serde(default)]
    pub period: Option<u64>,
    #[serde(default)]
    pub count: Option<u64>,
}

/// A firmware action scheduled at a virtual time.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FirmwareStep {
    pub at: u64,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ScenarioLimits {
    #[serde(default = "default_max_time")]
    pub max_time: u64,
    #[serde(default = "default_max_events")]
    pub max_events: u64,
}

impl Default for ScenarioLimits {
    fn default() -> Self {
        Self {
            max_time: default_max_time(),
            max_events: default_max_events(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Scenario failed to load or validate.
    ConfigError,
    /// No further events are scheduled.
    Idle,
    MaxTime,
    MaxEvents,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DeliveredCountDetails {
    pub line: u32,
    pub count: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DeliveredCountAssertion {
    pub delivered_count: DeliveredCountDetails,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DeliveryOrderAssertion {
    pub delivery_order: Vec<u32>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LatchedDetails {
    pub line: u32,
    pub latched: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LatchedAtEndAssertion {
    pub latched_at_end: LatchedDetails,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StopReasonAssertion {
    pub expected_stop_reason: StopReason,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ScenarioAssertion {
    DeliveredCount(DeliveredCountAssertion),
    DeliveryOrder(DeliveryOrderAssertion),
    LatchedAtEnd(LatchedAtEndAssertion),
    ExpectedStopReason(StopReasonAssertion),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub firmware: Vec<FirmwareStep>,
    /// Actions run while the keyed line is being serviced.
    #[serde(default)]
    pub handlers: BTreeMap<u32, Vec<Action>>,
    #[serde(default)]
    pub limits: ScenarioLimits,
    #[serde(default)]
    pub assertions: Vec<ScenarioAssertion>,
}

fn check_line(line: u32, what: &str) -> Result<()> {
    if line >= MAX_LINES {
        anyhow::bail!(
            "{} references line {} (valid lines: 0..{})",
            what,
            line,
            MAX_LINES
        );
    }
    Ok(())
}

impl Scenario {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario at {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let scenario: Self =
            serde_yaml::from_str(contents).context("Failed to parse Scenario YAML")?;
        scenario.validate()?;
        tracing::debug!(
            "Loaded scenario '{}': {} sources, {} firmware steps, {} handlers",
            scenario.name,
            scenario.sources.len(),
            scenario.firmware.len(),
            scenario.handlers.len()
        );
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_version != SCHEMA_VERSION {
            anyhow::bail!(
                "Unsupported schema_version '{}'. Supported versions: '{}'",
                self.schema_version,
                SCHEMA_VERSION
            );
        }

        if self.name.trim().is_empty() {
            anyhow::bail!("Scenario 'name' cannot be empty");
        }

        for entry in &self.controller.priorities {
            check_line(entry.line, "controller.priorities")?;
        }
        for line in &self.controller.enabled {
            check_line(*line, "controller.enabled")?;
        }

        let mut ids = HashSet::new();
        for source in &self.sources {
            if source.id.trim().is_empty() {
                anyhow::bail!("Source 'id' cannot be empty");
            }
            if !ids.insert(source.id.as_str()) {
                anyhow::bail!("Duplicate source id '{}'", source.id);
            }
            check_line(source.line, &format!("source '{}'", source.id))?;
            if source.period == Some(0) {
                anyhow::bail!("Source '{}' has a zero period", source.id);
            }
        }

        for (i, step) in self.firmware.iter().enumerate() {
            if let Some(line) = step.action.line() {
                check_line(line, &format!("firmware step {}", i))?;
            }
        }

        for (line, actions) in &self.handlers {
            check_line(*line, "handlers")?;
            for action in actions {
                if let Some(l) = action.line() {
                    check_line(l, &format!("handler for line {}", line))?;
                }
            }
        }

        if self.limits.max_time == 0 {
            anyhow::bail!("Limit 'max_time' must be greater than zero");
        }
        if self.limits.max_events == 0 {
            anyhow::bail!("Limit 'max_events' must be greater than zero");
        }

        Ok(())
    }
}

/// Load and validate a scenario from YAML.
pub fn load_scenario<P: AsRef<Path>>(path: P) -> Result<Scenario> {
    Scenario::from_file(path)
}
