//! Reference data consumed by the engine
//!
//! Pairing rules, descriptor tables, single-event codes and the flash transition
//! mapping. All of it is loaded once by the caller and handed to the engine as an
//! immutable value; nothing in here is global state.

use crate::types::{EngineError, EventRecord, Result, StatusCategory, UNKNOWN_DESCRIPTOR};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Complete set of reference tables for one engine instance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceData {
    /// Start/end code pairings, evaluated in order
    #[serde(default)]
    pub pairs: PairingTable,

    /// Event code descriptors and parameter-conditioned overrides
    #[serde(default)]
    pub descriptors: DescriptorTable,

    /// Start-only notification codes with no end pairing
    #[serde(default)]
    pub singles: Vec<SingleEventRule>,

    /// Flash enter/exit transition mapping
    #[serde(default)]
    pub flash: FlashConfig,
}

impl ReferenceData {
    /// Create empty reference data with the default flash mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: add a pairing rule
    pub fn add_rule(mut self, rule: PairingRule) -> Self {
        self.pairs.rules.push(rule);
        self
    }

    /// Builder method: add a single-event code with its status label
    pub fn add_single(mut self, event_code: i32, label: impl Into<String>) -> Self {
        self.singles.push(SingleEventRule {
            event_code,
            label: label.into(),
        });
        self
    }

    /// Builder method: replace the descriptor tables
    pub fn with_descriptors(mut self, descriptors: DescriptorTable) -> Self {
        self.descriptors = descriptors;
        self
    }

    /// Builder method: replace the flash transition mapping
    pub fn with_flash(mut self, flash: FlashConfig) -> Self {
        self.flash = flash;
        self
    }

    /// Check every pairing rule and the flash mapping
    pub fn validate(&self) -> Result<()> {
        for rule in &self.pairs.rules {
            rule.validate()?;
        }
        self.flash.validate()
    }

    /// Label for a single-event code, if the code is registered as one
    pub fn single_label(&self, event_code: i32) -> Option<&str> {
        self.singles
            .iter()
            .find(|s| s.event_code == event_code)
            .map(|s| s.label.as_str())
    }
}

/// Ordered list of pairing rules
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairingTable {
    pub rules: Vec<PairingRule>,
}

impl PairingTable {
    pub fn new(rules: Vec<PairingRule>) -> Self {
        Self { rules }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PairingRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// One logical on/off signal: entered by `start_code`, exited by any `end_codes`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingRule {
    pub start_code: i32,

    /// Termination codes; the first one is the nominal code for synthetic ends
    #[serde(deserialize_with = "deserialize_end_codes")]
    pub end_codes: Vec<i32>,

    /// Display abbreviation appended to the parameter in status labels
    pub abbreviation: String,

    #[serde(default)]
    pub category: StatusCategory,
}

/// End codes as written in reference files: a list or the `"7-9"` form
#[derive(Deserialize)]
#[serde(untagged)]
enum EndCodesSource {
    List(Vec<i32>),
    Single(i32),
    Delimited(String),
}

fn deserialize_end_codes<'de, D>(deserializer: D) -> std::result::Result<Vec<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    match EndCodesSource::deserialize(deserializer)? {
        EndCodesSource::List(codes) => Ok(codes),
        EndCodesSource::Single(code) => Ok(vec![code]),
        EndCodesSource::Delimited(text) => {
            parse_end_codes(&text).map_err(serde::de::Error::custom)
        }
    }
}

/// Parse the `-`-delimited end code form used by the source tables
pub fn parse_end_codes(text: &str) -> std::result::Result<Vec<i32>, String> {
    text.split('-')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i32>()
                .map_err(|e| format!("invalid end code {:?}: {}", part, e))
        })
        .collect()
}

impl PairingRule {
    /// Create a validated rule in the default (ops) category
    pub fn new(start_code: i32, end_codes: Vec<i32>, abbreviation: impl Into<String>) -> Result<Self> {
        let rule = Self {
            start_code,
            end_codes,
            abbreviation: abbreviation.into(),
            category: StatusCategory::Ops,
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Create a rule from the source table row form, e.g. `(1, "7-9", "G")`
    pub fn from_source_row(start_code: i32, end_codes: &str, abbreviation: &str) -> Result<Self> {
        let codes = parse_end_codes(end_codes).map_err(|reason| EngineError::InvalidPairingRule {
            start_code,
            reason,
        })?;
        Self::new(start_code, codes, abbreviation.trim())
    }

    /// Builder method: set the status category
    pub fn with_category(mut self, category: StatusCategory) -> Self {
        self.category = category;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.end_codes.is_empty() {
            return Err(EngineError::InvalidPairingRule {
                start_code: self.start_code,
                reason: "at least one end code is required".to_string(),
            });
        }
        if self.end_codes.contains(&self.start_code) {
            return Err(EngineError::InvalidPairingRule {
                start_code: self.start_code,
                reason: "start code also listed as an end code".to_string(),
            });
        }
        Ok(())
    }

    /// Nominal end code used for synthesized end records
    pub fn nominal_end_code(&self) -> Result<i32> {
        self.end_codes
            .first()
            .copied()
            .ok_or_else(|| EngineError::InvalidPairingRule {
                start_code: self.start_code,
                reason: "at least one end code is required".to_string(),
            })
    }

    pub fn is_start(&self, event_code: i32) -> bool {
        event_code == self.start_code
    }

    pub fn is_end(&self, event_code: i32) -> bool {
        self.end_codes.contains(&event_code)
    }

    /// True if the code takes part in this rule at all
    pub fn matches(&self, event_code: i32) -> bool {
        self.is_start(event_code) || self.is_end(event_code)
    }
}

/// Start-only notification code (e.g. coordination pattern change)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleEventRule {
    pub event_code: i32,
    pub label: String,
}

/// Flash state a transition record moves the controller into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlashState {
    Enter,
    Exit,
}

impl FlashState {
    pub fn complement(self) -> Self {
        match self {
            FlashState::Enter => FlashState::Exit,
            FlashState::Exit => FlashState::Enter,
        }
    }
}

/// Controller-specific flash transition mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashConfig {
    /// Event code reporting flash status changes
    #[serde(default = "default_flash_code")]
    pub event_code: i32,

    /// Parameters meaning "flash exited"
    #[serde(default = "default_exit_parameters")]
    pub exit_parameters: Vec<i32>,

    /// Parameters meaning "flash entered"; `None` means every other parameter
    #[serde(default)]
    pub enter_parameters: Option<Vec<i32>>,

    /// Ops status label attached to records inside a flash sub-period
    #[serde(default = "default_flash_label")]
    pub label: String,
}

fn default_flash_code() -> i32 {
    173
}

fn default_exit_parameters() -> Vec<i32> {
    vec![2]
}

fn default_flash_label() -> String {
    "Flash".to_string()
}

impl Default for FlashConfig {
    fn default() -> Self {
        Self {
            event_code: default_flash_code(),
            exit_parameters: default_exit_parameters(),
            enter_parameters: None,
            label: default_flash_label(),
        }
    }
}

impl FlashConfig {
    /// Create a mapping for `event_code` with explicit exit parameters
    pub fn new(event_code: i32, exit_parameters: Vec<i32>) -> Self {
        Self {
            event_code,
            exit_parameters,
            ..Self::default()
        }
    }

    /// Builder method: restrict which parameters count as entering flash
    pub fn with_enter_parameters(mut self, parameters: Vec<i32>) -> Self {
        self.enter_parameters = Some(parameters);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(enter) = &self.enter_parameters {
            if let Some(p) = enter.iter().find(|p| self.exit_parameters.contains(p)) {
                return Err(EngineError::InvalidPairingRule {
                    start_code: self.event_code,
                    reason: format!("flash parameter {} is both enter and exit", p),
                });
            }
        }
        Ok(())
    }

    /// Classify a record as a flash transition
    pub fn classify(&self, record: &EventRecord) -> Option<FlashState> {
        if record.event_code != self.event_code {
            return None;
        }
        if self.exit_parameters.contains(&record.parameter) {
            return Some(FlashState::Exit);
        }
        match &self.enter_parameters {
            Some(enter) if enter.contains(&record.parameter) => Some(FlashState::Enter),
            Some(_) => None,
            None => Some(FlashState::Enter),
        }
    }
}

/// Event code descriptors with parameter-conditioned overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DescriptorSource", into = "DescriptorSource")]
pub struct DescriptorTable {
    codes: HashMap<i32, String>,
    overrides: HashMap<(i32, i32), String>,
}

/// On-disk form of the descriptor tables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DescriptorSource {
    #[serde(default)]
    pub codes: Vec<CodeDescriptor>,
    #[serde(default)]
    pub overrides: Vec<OverrideDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeDescriptor {
    pub event_code: i32,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideDescriptor {
    pub event_code: i32,
    pub parameter: i32,
    pub text: String,
}

impl From<DescriptorSource> for DescriptorTable {
    fn from(source: DescriptorSource) -> Self {
        let mut table = DescriptorTable::new();
        for entry in source.codes {
            table.insert(entry.event_code, entry.text);
        }
        for entry in source.overrides {
            table.insert_override(entry.event_code, entry.parameter, entry.text);
        }
        table
    }
}

impl From<DescriptorTable> for DescriptorSource {
    fn from(table: DescriptorTable) -> Self {
        let codes: BTreeMap<_, _> = table.codes.into_iter().collect();
        let overrides: BTreeMap<_, _> = table.overrides.into_iter().collect();
        DescriptorSource {
            codes: codes
                .into_iter()
                .map(|(event_code, text)| CodeDescriptor { event_code, text })
                .collect(),
            overrides: overrides
                .into_iter()
                .map(|((event_code, parameter), text)| OverrideDescriptor {
                    event_code,
                    parameter,
                    text,
                })
                .collect(),
        }
    }
}

impl DescriptorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, event_code: i32, text: impl Into<String>) {
        self.codes.insert(event_code, text.into());
    }

    pub fn insert_override(&mut self, event_code: i32, parameter: i32, text: impl Into<String>) {
        self.overrides.insert((event_code, parameter), text.into());
    }

    /// Builder method: add a code descriptor
    pub fn with_code(mut self, event_code: i32, text: impl Into<String>) -> Self {
        self.insert(event_code, text);
        self
    }

    /// Builder method: add a (code, parameter) override
    pub fn with_override(mut self, event_code: i32, parameter: i32, text: impl Into<String>) -> Self {
        self.insert_override(event_code, parameter, text);
        self
    }

    /// Look up a descriptor; overrides win over the plain code entry
    pub fn resolve(&self, event_code: i32, parameter: i32) -> Result<&str> {
        self.overrides
            .get(&(event_code, parameter))
            .or_else(|| self.codes.get(&event_code))
            .map(String::as_str)
            .ok_or(EngineError::UnresolvableLabel {
                event_code,
                parameter,
            })
    }

    /// Descriptor text, or the `UNKNOWN` sentinel if the code is not listed
    pub fn describe(&self, event_code: i32, parameter: i32) -> &str {
        self.resolve(event_code, parameter).unwrap_or(UNKNOWN_DESCRIPTOR)
    }

    pub fn len(&self) -> usize {
        self.codes.len() + self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty() && self.overrides.is_empty()
    }
}
