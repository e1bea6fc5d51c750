//! Property schema: which labels a dialog or control type knows, requires and
//! localizes.
//!
//! The registry contents belong to the host application. The crate consumes it
//! through [`SchemaProvider`] and ships [`Schema`], a JSON-loadable
//! implementation used by the CLI and the tests.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{error::Error, types::Record};

/// What a property means, as opposed to how it is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalType {
    #[default]
    Plain,
    /// Text shown to the user; either inline or a string-table reference.
    LocalizedString,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PropertySpec {
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub logical_type: LogicalType,
}

fn default_nullable() -> bool {
    true
}

impl PropertySpec {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            required: false,
            nullable: true,
            logical_type: LogicalType::Plain,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn non_nullable(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn localized(mut self) -> Self {
        self.logical_type = LogicalType::LocalizedString;
        self
    }

    pub fn is_localized(&self) -> bool {
        self.logical_type == LogicalType::LocalizedString
    }
}

/// Answers property questions per dialog and per control type.
pub trait SchemaProvider {
    fn dialog_specs(&self) -> &[PropertySpec];

    /// `None` when the control type is unknown.
    fn control_specs(&self, ctrl_type: &str) -> Option<&[PropertySpec]>;

    /// Specs for whichever record is given.
    fn specs_for(&self, record: &Record<'_>) -> Option<&[PropertySpec]> {
        match record {
            Record::Dialog(_) => Some(self.dialog_specs()),
            Record::Control(control) => self.control_specs(&control.ctrl_type()),
        }
    }

    fn spec_for(&self, record: &Record<'_>, label: &str) -> Option<&PropertySpec> {
        self.specs_for(record)?
            .iter()
            .find(|spec| spec.label == label)
    }

    fn is_localized(&self, record: &Record<'_>, label: &str) -> bool {
        self.spec_for(record, label)
            .is_some_and(PropertySpec::is_localized)
    }
}

/// Supplies bit values for named flags such as `WS_VISIBLE`.
pub trait FlagResolver {
    fn flag_value(&self, name: &str) -> Option<i64>;
}

/// Resolver that knows no flag values; names are kept, bits are not.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFlagValues;

impl FlagResolver for NoFlagValues {
    fn flag_value(&self, _name: &str) -> Option<i64> {
        None
    }
}

impl FlagResolver for BTreeMap<String, i64> {
    fn flag_value(&self, name: &str) -> Option<i64> {
        self.get(name).copied()
    }
}

/// A schema loaded from configuration.
///
/// ```json
/// {
///   "dialog": [{ "label": "id", "required": true, "nullable": false }],
///   "controls": { "Button": [{ "label": "text", "logical_type": "localized_string" }] },
///   "flags": { "WS_VISIBLE": 268435456 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Schema {
    #[serde(default)]
    pub dialog: Vec<PropertySpec>,
    #[serde(default)]
    pub controls: BTreeMap<String, Vec<PropertySpec>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub flags: BTreeMap<String, i64>,
}

impl Schema {
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self, Error> {
        serde_json::from_reader(reader).map_err(Error::Json)
    }

    pub fn from_json(text: &str) -> Result<Self, Error> {
        serde_json::from_str(text).map_err(Error::Json)
    }

    pub fn with_dialog_spec(mut self, spec: PropertySpec) -> Self {
        self.dialog.push(spec);
        self
    }

    pub fn with_control_spec(mut self, ctrl_type: &str, spec: PropertySpec) -> Self {
        self.controls
            .entry(ctrl_type.to_string())
            .or_default()
            .push(spec);
        self
    }
}

impl SchemaProvider for Schema {
    fn dialog_specs(&self) -> &[PropertySpec] {
        &self.dialog
    }

    fn control_specs(&self, ctrl_type: &str) -> Option<&[PropertySpec]> {
        self.controls.get(ctrl_type).map(Vec::as_slice)
    }
}

impl FlagResolver for Schema {
    fn flag_value(&self, name: &str) -> Option<i64> {
        self.flags.flag_value(name)
    }
}
