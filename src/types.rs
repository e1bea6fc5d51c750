//! Core resource model for CV dialogs.
//! The parser decodes into these; the writer serializes these.

use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    locale::{Language, Locale},
};

/// Well-known property labels.
pub mod labels {
    pub const ID: &str = "id";
    pub const CTRL_TYPE: &str = "ctrlType";
    pub const TEXT: &str = "text";
    pub const LEFT: &str = "left";
    pub const TOP: &str = "top";
    pub const WIDTH: &str = "width";
    pub const HEIGHT: &str = "height";
    pub const RESOURCE_CLASS: &str = "resourceClass";
    pub const STYLE_FLAGS: &str = "styleFlags";
    pub const EXT_STYLE_FLAGS: &str = "extStyleFlags";
    pub const FONT: &str = "font";
    pub const FONT_SIZE: &str = "fontSize";
}

/// The physical representation a property value has in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhysicalType {
    Number,
    String,
    Identifier,
    Flags,
}

impl Display for PhysicalType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PhysicalType::Number => write!(f, "number"),
            PhysicalType::String => write!(f, "string"),
            PhysicalType::Identifier => write!(f, "identifier"),
            PhysicalType::Flags => write!(f, "flags"),
        }
    }
}

/// A set of named bit flags plus their combined integer value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Flags {
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    names: Vec<String>,
    value: i64,
}

impl Flags {
    pub fn new(value: i64) -> Self {
        Self {
            names: Vec::new(),
            value,
        }
    }

    /// Adds a named flag, OR-ing in its bit value when one is known.
    /// Returns `false` when the name was already present.
    pub fn insert(&mut self, name: impl Into<String>, bit: Option<i64>) -> bool {
        if let Some(bit) = bit {
            self.value |= bit;
        }
        let name = name.into();
        if self.names.contains(&name) {
            return false;
        }
        self.names.push(name);
        true
    }

    /// Removes a named flag and clears its bit value when one is known.
    pub fn remove(&mut self, name: &str, bit: Option<i64>) -> bool {
        if let Some(bit) = bit {
            self.value &= !bit;
        }
        let before = self.names.len();
        self.names.retain(|existing| existing != name);
        before != self.names.len()
    }

    pub fn or_value(&mut self, value: i64) {
        self.value |= value;
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|existing| existing == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value == 0 && self.names.is_empty()
    }
}

/// Renders flags the way the source text spells them: `A | B | 0`.
impl Display for Flags {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for name in &self.names {
            write!(f, "{} | ", name)?;
        }
        write!(f, "{}", self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    /// `None` is an undefined number.
    Number(Option<f64>),
    String(String),
    Identifier(String),
    Flags(Flags),
}

impl PropertyValue {
    pub fn physical_type(&self) -> PhysicalType {
        match self {
            PropertyValue::Number(_) => PhysicalType::Number,
            PropertyValue::String(_) => PhysicalType::String,
            PropertyValue::Identifier(_) => PhysicalType::Identifier,
            PropertyValue::Flags(_) => PhysicalType::Flags,
        }
    }

    pub fn has_value(&self) -> bool {
        match self {
            PropertyValue::Number(value) => value.is_some(),
            PropertyValue::String(value) | PropertyValue::Identifier(value) => !value.is_empty(),
            PropertyValue::Flags(flags) => !flags.is_empty(),
        }
    }

    /// The value with no type decoration: numbers in decimal, strings without
    /// quotes, identifiers as-is. Used as the key for ids.
    pub fn plain_text(&self) -> String {
        match self {
            PropertyValue::Number(Some(value)) => value.to_string(),
            PropertyValue::Number(None) => String::new(),
            PropertyValue::String(value) | PropertyValue::Identifier(value) => value.clone(),
            PropertyValue::Flags(flags) => flags.to_string(),
        }
    }

    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            PropertyValue::Identifier(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(value) => *value,
            _ => None,
        }
    }

    pub fn as_flags(&self) -> Option<&Flags> {
        match self {
            PropertyValue::Flags(flags) => Some(flags),
            _ => None,
        }
    }
}

/// Renders a value in source syntax, ready to be placed in an argument list.
impl Display for PropertyValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyValue::Number(Some(value)) => write!(f, "{}", value),
            PropertyValue::Number(None) => write!(f, "0"),
            PropertyValue::String(value) => write!(f, "\"{}\"", value),
            PropertyValue::Identifier(value) => write!(f, "{}", value),
            PropertyValue::Flags(flags) => write!(f, "{}", flags),
        }
    }
}

/// How a property was introduced, which decides whether it may replace an
/// existing value for the same label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddPolicy {
    /// From an argument slot of a `begin_*` call. Overwrites.
    Positional,
    /// From a `define_dialog_property` entry. Only fills gaps.
    Labeled,
    /// From the `{[label=value]...}` mini-format. Overwrites.
    Serialized,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PropertyDefinition {
    pub label: String,
    pub value: PropertyValue,
    /// Policy that last set this property; the writer emits it back there.
    pub source: AddPolicy,
}

impl PropertyDefinition {
    pub fn new(label: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            label: label.into(),
            value,
            source: AddPolicy::Positional,
        }
    }

    pub fn number(label: impl Into<String>, value: f64) -> Self {
        Self::new(label, PropertyValue::Number(Some(value)))
    }

    pub fn string(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(label, PropertyValue::String(value.into()))
    }

    pub fn identifier(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(label, PropertyValue::Identifier(value.into()))
    }

    pub fn flags(label: impl Into<String>, flags: Flags) -> Self {
        Self::new(label, PropertyValue::Flags(flags))
    }

    pub fn physical_type(&self) -> PhysicalType {
        self.value.physical_type()
    }

    pub fn has_value(&self) -> bool {
        self.value.has_value()
    }
}

impl Display for PropertyDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.label, self.value)
    }
}

/// Label-keyed, insertion-ordered property storage shared by dialogs and
/// controls.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct PropertyMap {
    entries: IndexMap<String, PropertyDefinition>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a property under the given policy. Returns whether the map changed.
    pub fn add(&mut self, mut property: PropertyDefinition, policy: AddPolicy) -> bool {
        if policy == AddPolicy::Labeled && self.entries.contains_key(&property.label) {
            return false;
        }
        property.source = policy;
        self.entries.insert(property.label.clone(), property);
        true
    }

    /// Replaces the value of a label, keeping where it was originally defined.
    /// New labels are recorded as serialized properties.
    pub fn set(&mut self, label: &str, value: PropertyValue) {
        match self.entries.get_mut(label) {
            Some(existing) => existing.value = value,
            None => {
                let mut property = PropertyDefinition::new(label, value);
                property.source = AddPolicy::Serialized;
                self.entries.insert(label.to_string(), property);
            }
        }
    }

    pub fn get(&self, label: &str) -> Option<&PropertyDefinition> {
        self.entries.get(label)
    }

    pub fn get_mut(&mut self, label: &str) -> Option<&mut PropertyDefinition> {
        self.entries.get_mut(label)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.entries.contains_key(label)
    }

    pub fn remove(&mut self, label: &str) -> Option<PropertyDefinition> {
        self.entries.shift_remove(label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyDefinition> {
        self.entries.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PropertyDefinition> {
        self.entries.values_mut()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One control inside a dialog. Always carries `ctrlType` and `id`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ControlDefinition {
    properties: PropertyMap,
}

impl ControlDefinition {
    /// Builds a control from already parsed properties.
    pub fn from_properties(
        properties: impl IntoIterator<Item = PropertyDefinition>,
    ) -> Result<Self, Error> {
        let mut map = PropertyMap::new();
        for property in properties {
            let source = property.source;
            map.add(property, source);
        }

        match map.get(labels::CTRL_TYPE) {
            Some(property) if property.has_value() => {}
            _ => {
                return Err(Error::invalid_resource(
                    "control is missing its `ctrlType` property",
                ));
            }
        }
        match map.get(labels::ID) {
            Some(property) if is_valid_id(&property.value) => {}
            _ => {
                return Err(Error::invalid_resource(
                    "control is missing its `id` property",
                ));
            }
        }

        Ok(Self { properties: map })
    }

    /// Builds a control the way `declare_control(type, id)` introduces it.
    pub fn declare(ctrl_type: impl Into<String>, id: PropertyValue) -> Result<Self, Error> {
        Self::from_properties([
            PropertyDefinition::identifier(labels::CTRL_TYPE, ctrl_type),
            PropertyDefinition::new(labels::ID, id),
        ])
    }

    pub fn ctrl_type(&self) -> String {
        self.properties
            .get(labels::CTRL_TYPE)
            .map(|property| property.value.plain_text())
            .unwrap_or_default()
    }

    pub fn id(&self) -> &PropertyValue {
        // Construction guarantees the id is present and `set_id` keeps it valid.
        match self.properties.get(labels::ID) {
            Some(property) => &property.value,
            None => &UNDEFINED_ID,
        }
    }

    /// Key this control is stored under in its dialog.
    pub fn key(&self) -> String {
        self.id().plain_text()
    }

    pub(crate) fn set_id(&mut self, id: PropertyValue) -> Result<(), Error> {
        if !is_valid_id(&id) {
            return Err(Error::invalid_resource(format!(
                "control id must be a number or identifier, got {}",
                id.physical_type()
            )));
        }
        self.properties.set(labels::ID, id);
        Ok(())
    }

    pub fn property(&self, label: &str) -> Option<&PropertyDefinition> {
        self.properties.get(label)
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    pub(crate) fn properties_mut(&mut self) -> &mut PropertyMap {
        &mut self.properties
    }

    /// Adds a property. `ctrlType` and `id` can only change through
    /// positional or serialized definitions that keep them valid.
    pub fn add_property(
        &mut self,
        property: PropertyDefinition,
        policy: AddPolicy,
    ) -> Result<bool, Error> {
        if property.label == labels::ID && !is_valid_id(&property.value) {
            return Err(Error::invalid_resource(format!(
                "control id must be a number or identifier, got {}",
                property.physical_type()
            )));
        }
        if property.label == labels::CTRL_TYPE && !property.has_value() {
            return Err(Error::invalid_resource("control type cannot be empty"));
        }
        Ok(self.properties.add(property, policy))
    }
}

static UNDEFINED_ID: PropertyValue = PropertyValue::Number(None);

fn is_valid_id(value: &PropertyValue) -> bool {
    matches!(value, PropertyValue::Number(Some(_)) | PropertyValue::Identifier(_)) && value.has_value()
}

/// Addresses the dialog itself or one of its controls.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyTarget {
    Dialog,
    Control(String),
}

impl Display for PropertyTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyTarget::Dialog => write!(f, "dialog"),
            PropertyTarget::Control(id) => write!(f, "control `{}`", id),
        }
    }
}

/// Either the dialog or one of its controls, viewed through their shared
/// property map.
#[derive(Debug, Clone, Copy)]
pub enum Record<'a> {
    Dialog(&'a DialogDefinition),
    Control(&'a ControlDefinition),
}

impl<'a> Record<'a> {
    pub fn properties(&self) -> &'a PropertyMap {
        match self {
            Record::Dialog(dialog) => &dialog.properties,
            Record::Control(control) => &control.properties,
        }
    }

    pub fn is_dialog(&self) -> bool {
        matches!(self, Record::Dialog(_))
    }

    pub fn target(&self) -> PropertyTarget {
        match self {
            Record::Dialog(_) => PropertyTarget::Dialog,
            Record::Control(control) => PropertyTarget::Control(control.key()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct DialogDefinition {
    properties: PropertyMap,
    controls: IndexMap<String, ControlDefinition>,
}

impl DialogDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> Result<&PropertyValue, Error> {
        self.properties
            .get(labels::ID)
            .map(|property| &property.value)
            .ok_or_else(|| Error::invalid_resource("dialog has no `id` property"))
    }

    /// The id in plain text form, as used in persistent string ids.
    pub fn name(&self) -> Result<String, Error> {
        self.id().map(PropertyValue::plain_text)
    }

    pub fn property(&self, label: &str) -> Option<&PropertyDefinition> {
        self.properties.get(label)
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    pub fn add_property(&mut self, property: PropertyDefinition, policy: AddPolicy) -> bool {
        self.properties.add(property, policy)
    }

    /// Registers a forward-declared control. Ids must be unique.
    pub fn declare_control(&mut self, control: ControlDefinition) -> Result<(), Error> {
        let key = control.key();
        if self.controls.contains_key(&key) {
            return Err(Error::invalid_resource(format!(
                "control `{}` is declared twice",
                key
            )));
        }
        self.controls.insert(key, control);
        Ok(())
    }

    pub fn control(&self, id: &str) -> Option<&ControlDefinition> {
        self.controls.get(id)
    }

    pub fn control_mut(&mut self, id: &str) -> Option<&mut ControlDefinition> {
        self.controls.get_mut(id)
    }

    /// Controls in declaration order.
    pub fn controls(&self) -> impl Iterator<Item = &ControlDefinition> {
        self.controls.values()
    }

    pub fn control_count(&self) -> usize {
        self.controls.len()
    }

    /// Changes a control's id and re-keys it, keeping its position.
    pub fn rename_control(&mut self, id: &str, new_id: PropertyValue) -> Result<(), Error> {
        let new_key = new_id.plain_text();
        if new_key != id && self.controls.contains_key(&new_key) {
            return Err(Error::invalid_resource(format!(
                "control `{}` already exists",
                new_key
            )));
        }
        let index = self
            .controls
            .get_index_of(id)
            .ok_or_else(|| Error::invalid_resource(format!("no control `{}`", id)))?;
        let (_, mut control) = self
            .controls
            .shift_remove_index(index)
            .ok_or_else(|| Error::invalid_resource(format!("no control `{}`", id)))?;
        control.set_id(new_id)?;
        self.controls.shift_insert(index, new_key, control);
        Ok(())
    }

    /// The dialog followed by every control, each as a fresh traversal.
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        std::iter::once(Record::Dialog(self)).chain(self.controls.values().map(Record::Control))
    }

    pub fn targets(&self) -> Vec<PropertyTarget> {
        self.records().map(|record| record.target()).collect()
    }

    pub fn properties_of(&self, target: &PropertyTarget) -> Option<&PropertyMap> {
        match target {
            PropertyTarget::Dialog => Some(&self.properties),
            PropertyTarget::Control(id) => self.controls.get(id).map(|control| &control.properties),
        }
    }

    pub(crate) fn properties_of_mut(&mut self, target: &PropertyTarget) -> Option<&mut PropertyMap> {
        match target {
            PropertyTarget::Dialog => Some(&mut self.properties),
            PropertyTarget::Control(id) => self
                .controls
                .get_mut(id)
                .map(|control| &mut control.properties),
        }
    }
}

/// A named group of control indices, kept for the layout editor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Layer {
    pub name: String,
    values: Vec<i64>,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    /// Adds a value unless it is already a member.
    pub fn insert(&mut self, value: i64) -> bool {
        if self.values.contains(&value) {
            return false;
        }
        self.values.push(value);
        true
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }
}

/// Everything one locale knows about a dialog.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DialogResource {
    pub locale: Locale,
    pub version: String,
    headers: Vec<String>,
    #[serde(default)]
    pub string_files: BTreeMap<Language, String>,
    pub dialog: DialogDefinition,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub layers: Vec<Layer>,
}

impl DialogResource {
    pub fn new(locale: Locale, version: impl Into<String>) -> Self {
        Self {
            locale,
            version: version.into(),
            headers: Vec::new(),
            string_files: BTreeMap::new(),
            dialog: DialogDefinition::new(),
            layers: Vec::new(),
        }
    }

    /// Adds an included header; names compare case-insensitively.
    pub fn add_header(&mut self, header: impl Into<String>) -> bool {
        let header = header.into();
        if self
            .headers
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(&header))
        {
            return false;
        }
        self.headers.push(header);
        true
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn string_file(&self, language: Language) -> Option<&str> {
        self.string_files.get(&language).map(String::as_str)
    }

    pub fn dialog_id(&self) -> Result<String, Error> {
        self.dialog.name()
    }

    /// A copy of this resource filed under another locale.
    pub fn retagged(&self, locale: Locale) -> Self {
        let mut copy = self.clone();
        copy.locale = locale;
        copy
    }
}
