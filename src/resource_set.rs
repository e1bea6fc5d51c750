//! One dialog across every locale.
//!
//! The master resource (`Locale::Any`) holds the shared definition. A language
//! with no explicit resource is *linked* and reads and writes through to the
//! master; an explicit resource *unlinks* it.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs::File,
    io::{Read, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    builder::check_consistency,
    error::Error,
    locale::Locale,
    normalize,
    schema::{FlagResolver, NoFlagValues, SchemaProvider},
    string_map::StringMap,
    types::{
        ControlDefinition, DialogDefinition, DialogResource, Flags, PropertyDefinition,
        PropertyTarget, PropertyValue, Record, labels,
    },
    verify,
};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DialogResourceSet {
    dialog_id: String,
    resources: BTreeMap<Locale, DialogResource>,
    #[serde(default)]
    import_logs: BTreeMap<Locale, Vec<String>>,
    #[serde(default)]
    strings: StringMap,
}

impl DialogResourceSet {
    pub(crate) fn from_parts(
        dialog_id: String,
        resources: BTreeMap<Locale, DialogResource>,
        import_logs: BTreeMap<Locale, Vec<String>>,
        strings: StringMap,
    ) -> Self {
        Self {
            dialog_id,
            resources,
            import_logs,
            strings,
        }
    }

    pub fn dialog_id(&self) -> &str {
        &self.dialog_id
    }

    /// Every locale that resolves to a resource, master first.
    pub fn locales(&self) -> impl Iterator<Item = Locale> + '_ {
        Locale::ALL
            .into_iter()
            .filter(|locale| self.resource(*locale).is_some())
    }

    /// The resource a locale sees: its own when unlinked, the master otherwise.
    pub fn resource(&self, locale: Locale) -> Option<&DialogResource> {
        self.resources
            .get(&locale)
            .or_else(|| self.resources.get(&Locale::Any))
    }

    pub fn explicit_resource(&self, locale: Locale) -> Option<&DialogResource> {
        self.resources.get(&locale)
    }

    /// Whether a language locale has no resource of its own. The master is
    /// always linked to itself.
    pub fn is_linked_to_master(&self, locale: Locale) -> bool {
        locale.is_master() || !self.resources.contains_key(&locale)
    }

    pub fn import_log(&self, locale: Locale) -> &[String] {
        self.import_logs
            .get(&locale)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn strings(&self) -> &StringMap {
        &self.strings
    }

    pub fn dialog(&self, locale: Locale) -> Option<&DialogDefinition> {
        self.resource(locale).map(|resource| &resource.dialog)
    }

    pub fn controls(&self, locale: Locale) -> impl Iterator<Item = &ControlDefinition> {
        self.dialog(locale)
            .into_iter()
            .flat_map(DialogDefinition::controls)
    }

    pub fn control(&self, locale: Locale, id: &str) -> Option<&ControlDefinition> {
        self.dialog(locale)?.control(id)
    }

    pub fn property(
        &self,
        locale: Locale,
        target: &PropertyTarget,
        label: &str,
    ) -> Option<&PropertyDefinition> {
        self.dialog(locale)?.properties_of(target)?.get(label)
    }

    /// The dialog and its controls as seen from `locale`.
    pub fn records(&self, locale: Locale) -> impl Iterator<Item = Record<'_>> {
        self.dialog(locale)
            .into_iter()
            .flat_map(DialogDefinition::records)
    }

    /// Drops a language's own resource so it follows the master again.
    ///
    /// When every language was unlinked there is no master yet; it is rebuilt
    /// from this locale's resource first.
    pub fn link_to_master(&mut self, locale: Locale) -> Result<(), Error> {
        if locale.is_master() || self.is_linked_to_master(locale) {
            return Ok(());
        }

        if !self.resources.contains_key(&Locale::Any) {
            let master = self
                .resources
                .get(&locale)
                .map(|resource| resource.retagged(Locale::Any))
                .ok_or_else(|| Error::consistency(format!("no {} resource to link", locale)))?;
            debug!("rebuilding the master resource from {}", locale);
            self.resources.insert(Locale::Any, master);
        }
        self.resources.remove(&locale);
        debug!("linked {} to the master resource", locale);
        Ok(())
    }

    /// Gives a linked language its own copy of the master.
    ///
    /// Once no language is linked any more the master is dropped.
    pub fn unlink_from_master(&mut self, locale: Locale) -> Result<(), Error> {
        if locale.is_master() || !self.is_linked_to_master(locale) {
            return Ok(());
        }

        let copy = self
            .resources
            .get(&Locale::Any)
            .map(|master| master.retagged(locale))
            .ok_or_else(|| Error::consistency("missing master for linked resources"))?;
        self.resources.insert(locale, copy);
        debug!("unlinked {} from the master resource", locale);

        if Locale::languages().all(|language| self.resources.contains_key(&language)) {
            debug!("every language is unlinked, dropping the master resource");
            self.resources.remove(&Locale::Any);
        }
        Ok(())
    }

    /// Distinct storages behind `locales`; linked locales map to the master.
    fn storage_locales(&self, locales: &[Locale]) -> Result<BTreeSet<Locale>, Error> {
        locales
            .iter()
            .map(|locale| {
                let storage = if self.resources.contains_key(locale) {
                    *locale
                } else {
                    Locale::Any
                };
                if self.resources.contains_key(&storage) {
                    Ok(storage)
                } else {
                    Err(Error::consistency(format!("no resource for {}", locale)))
                }
            })
            .collect()
    }

    /// Sets a property on `target` for each of `locales`.
    ///
    /// An existing property keeps the place it is written to; a new one is
    /// added with the property's own source. Changing a control's `id` re-keys
    /// the control. The dialog id cannot be changed. When any storage rejects
    /// the change, none of them is modified.
    pub fn update_property(
        &mut self,
        target: &PropertyTarget,
        property: PropertyDefinition,
        locales: &[Locale],
    ) -> Result<(), Error> {
        if *target == PropertyTarget::Dialog && property.label == labels::ID {
            return Err(Error::Unsupported(
                "changing the dialog id of a resource set".to_string(),
            ));
        }

        let storages = self.storage_locales(locales)?;
        let mut resources = self.resources.clone();
        for storage in storages {
            let Some(resource) = resources.get_mut(&storage) else {
                continue;
            };
            let dialog = &mut resource.dialog;

            if let PropertyTarget::Control(id) = target {
                if property.label == labels::ID {
                    dialog.rename_control(id, property.value.clone())?;
                    continue;
                }
                if property.label == labels::CTRL_TYPE && !property.has_value() {
                    return Err(Error::invalid_resource("control type cannot be empty"));
                }
            }

            let map = dialog
                .properties_of_mut(target)
                .ok_or_else(|| Error::invalid_resource(format!("no {} in {}", target, storage)))?;
            if map.contains(&property.label) {
                map.set(&property.label, property.value.clone());
            } else {
                map.add(property.clone(), property.source);
            }
        }
        self.resources = resources;
        Ok(())
    }

    /// Turns one named flag of a flags property on or off for each of
    /// `locales`. A missing property starts out as `0`.
    pub fn update_flag_property(
        &mut self,
        target: &PropertyTarget,
        label: &str,
        flag: &str,
        enabled: bool,
        locales: &[Locale],
    ) -> Result<(), Error> {
        self.update_flag_property_with(target, label, flag, enabled, locales, &NoFlagValues)
    }

    /// Like [`update_flag_property`](Self::update_flag_property), also
    /// setting or clearing the flag's bit value when `flag_resolver` knows it.
    /// Nothing changes unless every storage accepts the flag.
    pub fn update_flag_property_with(
        &mut self,
        target: &PropertyTarget,
        label: &str,
        flag: &str,
        enabled: bool,
        locales: &[Locale],
        flag_resolver: &dyn FlagResolver,
    ) -> Result<(), Error> {
        let bit = flag_resolver.flag_value(flag);
        let storages = self.storage_locales(locales)?;
        let mut resources = self.resources.clone();
        for storage in storages {
            let Some(resource) = resources.get_mut(&storage) else {
                continue;
            };
            let map = resource
                .dialog
                .properties_of_mut(target)
                .ok_or_else(|| Error::invalid_resource(format!("no {} in {}", target, storage)))?;

            if !map.contains(label) {
                map.set(label, PropertyValue::Flags(Flags::default()));
            }
            let Some(PropertyValue::Flags(flags)) = map.get_mut(label).map(|p| &mut p.value) else {
                return Err(Error::invalid_resource(format!(
                    "property `{}` of {} is not a flags property",
                    label, target
                )));
            };
            if enabled {
                flags.insert(flag, bit);
            } else {
                flags.remove(flag, bit);
            }
        }
        self.resources = resources;
        Ok(())
    }

    /// Rewrites the text a localized property refers to, for the language of
    /// `locale`. The property keeps its string id. The master has no language
    /// of its own, so a master request changes nothing.
    pub fn update_localized_string_property(
        &mut self,
        target: &PropertyTarget,
        label: &str,
        text: &str,
        locale: Locale,
    ) -> Result<(), Error> {
        let Some(language) = locale.language() else {
            return Ok(());
        };

        let property = self.property(locale, target, label).ok_or_else(|| {
            Error::invalid_resource(format!("{} has no property `{}`", target, label))
        })?;
        let id = property
            .value
            .as_identifier()
            .ok_or_else(|| {
                Error::invalid_resource(format!(
                    "property `{}` of {} is not a string reference",
                    label, target
                ))
            })?
            .to_string();

        self.strings.insert(language, id, text);
        Ok(())
    }

    /// Moves every localized text into the string map under session ids.
    /// See [`normalize::normalize_localized_strings`].
    pub fn normalize_localized_strings(&mut self, schema: &dyn SchemaProvider) {
        normalize::normalize_localized_strings(&mut self.resources, &mut self.strings, schema);
    }

    /// Gives strings their persistent ids and inlines empty ones.
    /// See [`normalize::denormalize_localized_strings`].
    pub fn denormalize_localized_strings(&mut self, schema: &dyn SchemaProvider) {
        normalize::denormalize_localized_strings(
            &self.dialog_id,
            &mut self.resources,
            &mut self.strings,
            schema,
        );
    }

    /// Checks the resource `locale` sees against `schema`.
    pub fn verify(&self, locale: Locale, schema: &dyn SchemaProvider) -> Result<Vec<String>, Error> {
        let resource = self
            .resource(locale)
            .ok_or_else(|| Error::consistency(format!("no resource for {}", locale)))?;
        Ok(verify::verify(resource, schema))
    }

    /// Serializes the whole set as JSON.
    pub fn cache_to_writer<W: Write>(&self, writer: W) -> Result<(), Error> {
        serde_json::to_writer_pretty(writer, self).map_err(Error::Json)
    }

    /// Loads a set written by [`cache_to_writer`](Self::cache_to_writer),
    /// checking it the way the builder does.
    pub fn load_from_reader<R: Read>(reader: R) -> Result<Self, Error> {
        let mut set: DialogResourceSet = serde_json::from_reader(reader).map_err(Error::Json)?;
        let dialog_id = check_consistency(&set.resources)?;
        if dialog_id != set.dialog_id {
            return Err(Error::consistency(format!(
                "mismatched dialog id: cache says `{}`, resources say `{}`",
                set.dialog_id, dialog_id
            )));
        }
        for locale in Locale::ALL {
            set.import_logs.entry(locale).or_default();
        }
        Ok(set)
    }

    pub fn cache_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let writer = File::create(path).map_err(Error::Io)?;
        self.cache_to_writer(writer)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let reader = File::open(path).map_err(Error::Io)?;
        Self::load_from_reader(reader)
    }
}
