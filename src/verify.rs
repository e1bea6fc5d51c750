//! Schema checks over a single resource.

use crate::{
    schema::SchemaProvider,
    types::{DialogResource, labels},
};

/// Checks the dialog and each control against `schema`.
///
/// Returns one line per finding, each starting with `[Error]` or `[Warning]`,
/// in record order. Never fails.
pub fn verify(resource: &DialogResource, schema: &dyn SchemaProvider) -> Vec<String> {
    let mut log = Vec::new();

    for record in resource.dialog.records() {
        let target = record.target();
        let Some(specs) = schema.specs_for(&record) else {
            let ctrl_type = record
                .properties()
                .get(labels::CTRL_TYPE)
                .map(|property| property.value.plain_text())
                .unwrap_or_default();
            log.push(format!(
                "[Warning] {}: unknown control type `{}`",
                target, ctrl_type
            ));
            continue;
        };

        for property in record.properties().iter() {
            match specs.iter().find(|spec| spec.label == property.label) {
                None => log.push(format!(
                    "[Warning] {}: unknown property `{}`",
                    target, property.label
                )),
                Some(spec) if !spec.nullable && !property.has_value() => log.push(format!(
                    "[Error] {}: property `{}` has no value",
                    target, property.label
                )),
                Some(_) => {}
            }
        }

        for spec in specs.iter().filter(|spec| spec.required) {
            if !record.properties().contains(&spec.label) {
                log.push(format!(
                    "[Error] {}: missing required property `{}`",
                    target, spec.label
                ));
            }
        }
    }

    log
}

/// Whether a verifier log contains an `[Error]` line.
pub fn has_errors(log: &[String]) -> bool {
    log.iter().any(|line| line.starts_with("[Error]"))
}
