//! Moving localized texts between inline properties and the string map.
//!
//! While a dialog is edited every localized property is a reference into the
//! string map under a session id. Export renames those ids to the persistent
//! scheme and turns references to texts that are empty in every language
//! back into inline empty strings.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tracing::{debug, warn};

use crate::{
    ids::{IdGenerator, InternalIdGenerator, PersistentIdGenerator},
    locale::{Language, Locale},
    schema::SchemaProvider,
    string_map::StringMap,
    types::{DialogResource, PropertyTarget, PropertyValue},
};

/// `(target, label)` of every localized property of a resource.
fn localized_properties(
    resource: &DialogResource,
    schema: &dyn SchemaProvider,
) -> Vec<(PropertyTarget, String)> {
    resource
        .dialog
        .records()
        .flat_map(|record| {
            record
                .properties()
                .labels()
                .filter(|label| schema.is_localized(&record, label))
                .map(|label| (record.target(), label.to_string()))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Languages whose text a resource defines: its own, or for the master every
/// language still linked to it.
fn languages_of(locale: Locale, explicit: &BTreeSet<Locale>) -> Vec<Language> {
    match locale.language() {
        Some(language) => vec![language],
        None => Language::ALL
            .into_iter()
            .filter(|language| !explicit.contains(&Locale::from(*language)))
            .collect(),
    }
}

/// Regenerates every string id with session ids and turns inline localized
/// texts into references.
///
/// An inline text gets one new id per `(locale, target, label)`; the text is
/// stored for the languages the resource speaks for and as an empty
/// placeholder for the rest. References to ids missing from the string map
/// are left as they are.
pub fn normalize_localized_strings(
    resources: &mut BTreeMap<Locale, DialogResource>,
    strings: &mut StringMap,
    schema: &dyn SchemaProvider,
) {
    let mut generator = InternalIdGenerator::new();
    let (mut normalized, lookup) = strings.copy_with_regenerated_ids(&mut generator);
    let explicit: BTreeSet<Locale> = resources.keys().copied().collect();
    let mut minted: HashMap<(Locale, PropertyTarget, String), String> = HashMap::new();

    for (locale, resource) in resources.iter_mut() {
        let languages = languages_of(*locale, &explicit);

        for (target, label) in localized_properties(resource, schema) {
            let Some(property) = resource
                .dialog
                .properties_of_mut(&target)
                .and_then(|map| map.get_mut(&label))
            else {
                continue;
            };

            match &property.value {
                PropertyValue::Identifier(id) => match lookup.get(id) {
                    Some(new_id) => property.value = PropertyValue::Identifier(new_id.clone()),
                    None => warn!(
                        "{} `{}` of {} refers to unknown string `{}`",
                        locale, label, target, id
                    ),
                },
                PropertyValue::String(text) => {
                    let text = text.clone();
                    let id = minted
                        .entry((*locale, target.clone(), label.clone()))
                        .or_insert_with(|| generator.next_id())
                        .clone();
                    for language in Language::ALL {
                        let value = if languages.contains(&language) {
                            text.as_str()
                        } else {
                            ""
                        };
                        normalized.insert(language, id.as_str(), value);
                    }
                    property.value = PropertyValue::Identifier(id);
                }
                _ => {}
            }
        }
    }

    debug!(
        "normalized strings: {} ids, {} inline texts moved",
        normalized.ids().count(),
        minted.len()
    );
    *strings = normalized;
}

/// Renames string ids to `DLGPROP_<dialog>_<n>_Text` and inlines empty texts.
///
/// Every id is numbered from 1 in string-map order. Ids whose text is empty in
/// every language are then dropped from the map and the properties referring
/// to them become inline empty strings, so their numbers are left unused.
pub fn denormalize_localized_strings(
    dialog_name: &str,
    resources: &mut BTreeMap<Locale, DialogResource>,
    strings: &mut StringMap,
    schema: &dyn SchemaProvider,
) {
    let mut generator = PersistentIdGenerator::new(dialog_name);
    let (mut denormalized, lookup) = strings.copy_with_regenerated_ids(&mut generator);

    let empty: HashSet<String> = denormalized
        .ids()
        .filter(|id| denormalized.is_empty_everywhere(id))
        .map(str::to_string)
        .collect();
    for id in &empty {
        denormalized.remove(id);
    }

    for (locale, resource) in resources.iter_mut() {
        for (target, label) in localized_properties(resource, schema) {
            let Some(property) = resource
                .dialog
                .properties_of_mut(&target)
                .and_then(|map| map.get_mut(&label))
            else {
                continue;
            };
            let PropertyValue::Identifier(id) = &property.value else {
                continue;
            };

            match lookup.get(id) {
                Some(new_id) if empty.contains(new_id) => {
                    property.value = PropertyValue::String(String::new());
                }
                Some(new_id) => property.value = PropertyValue::Identifier(new_id.clone()),
                None => {
                    warn!(
                        "{} `{}` of {} refers to unknown string `{}`",
                        locale, label, target, id
                    );
                }
            }
        }
    }

    debug!(
        "denormalized strings: {} kept, {} inlined as empty",
        lookup.len() - empty.len(),
        empty.len()
    );
    *strings = denormalized;
}
