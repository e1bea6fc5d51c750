use cvdialog::{DialogResource, Language, PropertyDefinition};

/// Print a summary of a parsed dialog resource.
pub fn print_view(resource: &DialogResource) {
    println!("=== Dialog {} ===", resource.dialog_id().unwrap_or_default());
    println!("Locale: {}", resource.locale);
    println!("Version: {}", resource.version);
    println!("Headers: {}", resource.headers().join(", "));
    for language in Language::ALL {
        if let Some(file) = resource.string_file(language) {
            println!("Strings ({}): {}", language, file);
        }
    }

    println!("\nProperties:");
    print_properties(resource.dialog.properties().iter());

    println!("\nControls: {}", resource.dialog.control_count());
    for (i, control) in resource.dialog.controls().enumerate() {
        println!("\n  Control {}: {} ({})", i + 1, control.key(), control.ctrl_type());
        print_properties(control.properties().iter());
    }

    if !resource.layers.is_empty() {
        println!("\nLayers:");
        for layer in &resource.layers {
            let values: Vec<String> = layer.values().iter().map(i64::to_string).collect();
            println!("  {}: {}", layer.name, values.join(" "));
        }
    }
}

fn print_properties<'a>(properties: impl Iterator<Item = &'a PropertyDefinition>) {
    for property in properties {
        println!("    {} = {}  [{:?}]", property.label, property.value, property.source);
    }
}
