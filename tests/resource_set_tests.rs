use std::fs;

use cvdialog::{
    DialogResourceSet, DialogResourceSetBuilder, Error, Language, Locale, PropertySpec,
    PropertyTarget, PropertyValue, Schema, parse, source, tokenize, types::labels, write_dialog,
    write_strings,
};
use indoc::indoc;
use tempfile::TempDir;

const MASTER: &str = indoc! {r#"
    #include "cvdialog.h"
    // Version [1.4]
    #ifdef RES_US
    #include "main_us.str"
    #elif defined RES_GERMAN
    #include "main_de.str"
    #elif defined RES_JAPAN
    #include "main_jp.str"
    #else
    #error "Unsupported language"
    #endif

    begin_dialog_definition_ex_(IDD_MAIN, "", 0, 0, 200, 120, IDS_TITLE, "CVDialog", 0, "", 0)
    begin_dialog_properties()
    end_dialog_properties()
    declare_control(Button, IDC_OK)
    declare_control(Label, IDC_HINT)
    begin_control_definitions()
        begin_control_ex(Button, "CVButton", IDC_OK, "{}Caption=""OK""", 5, 30, 40, 12, 0, 0)
        end_control_ex()
        begin_control_ex(Label, "CVLabel", IDC_HINT, "{}Caption=""""", 5, 5, 40, 12, 0, 0)
        end_control_ex()
    end_control_definitions()
    end_dialog_definition_ex_()
"#};

const GUARDED_INCLUDE: &str = indoc! {r#"
    #ifdef RES_US
    #include "main.dlg"
    #elif defined RES_GERMAN
    #include "main.dlg"
    #elif defined RES_JAPAN
    #include "main.dlg"
    #endif
"#};

fn schema() -> Schema {
    Schema::default()
        .with_dialog_spec(PropertySpec::new(labels::TEXT).localized())
        .with_control_spec("Button", PropertySpec::new(labels::TEXT).localized())
        .with_control_spec("Label", PropertySpec::new(labels::TEXT).localized())
}

#[test]
fn test_minimal_dialog_end_to_end() {
    let source = indoc! {r#"
        #include "cvdialog.h"
        // Version [1.0]
        #ifdef RES_US
        #include "a_us.str"
        #elif defined RES_GERMAN
        #include "a_de.str"
        #elif defined RES_JAPAN
        #include "a_jp.str"
        #else
        #error "Unsupported language"
        #endif
        begin_dialog_definition_ex_(dlgId,"",0,0,10,20,strId,"className",0,"",0)
        begin_dialog_properties()
        end_dialog_properties()
        begin_control_definitions()
        end_control_definitions()
        end_dialog_definition_ex_()
    "#};
    let resource = parse(&tokenize(source).unwrap(), Locale::Any)
        .unwrap()
        .unwrap();
    let value = |label: &str| resource.dialog.property(label).unwrap().value.clone();

    assert_eq!(value(labels::ID), PropertyValue::Identifier("dlgId".into()));
    assert_eq!(value(labels::LEFT), PropertyValue::Number(Some(0.0)));
    assert_eq!(value(labels::TOP), PropertyValue::Number(Some(0.0)));
    assert_eq!(value(labels::WIDTH), PropertyValue::Number(Some(10.0)));
    assert_eq!(value(labels::HEIGHT), PropertyValue::Number(Some(20.0)));
    assert_eq!(value(labels::TEXT), PropertyValue::Identifier("strId".into()));
    assert_eq!(value(labels::RESOURCE_CLASS), PropertyValue::String("className".into()));
    assert_eq!(value(labels::FONT), PropertyValue::String(String::new()));
    assert_eq!(value(labels::FONT_SIZE), PropertyValue::Number(Some(0.0)));
    assert!(value(labels::STYLE_FLAGS).as_flags().unwrap().is_empty());
    assert_eq!(resource.dialog.control_count(), 0);
    assert!(resource.layers.is_empty());
}

fn write_project(dir: &TempDir) {
    fs::write(dir.path().join("main.dlg"), MASTER).unwrap();
    fs::write(dir.path().join("main_us.dlg"), GUARDED_INCLUDE).unwrap();
    // The German dialog is wider to fit its texts.
    fs::write(
        dir.path().join("main_de.dlg"),
        MASTER.replace("200, 120", "260, 120"),
    )
    .unwrap();

    fs::write(dir.path().join("main_us.str"), "#define IDS_TITLE \"Settings\"\n").unwrap();
    fs::write(
        dir.path().join("main_de.str"),
        source::encode("#define IDS_TITLE \"Einstellungen für Sie\"\n", "windows-1252").unwrap(),
    )
    .unwrap();
    fs::write(
        dir.path().join("main_jp.str"),
        source::encode("#define IDS_TITLE \"設定\"\n", "shift_jis").unwrap(),
    )
    .unwrap();
}

fn load_project(dir: &TempDir) -> DialogResourceSet {
    let path = |name: &str| dir.path().join(name);
    DialogResourceSetBuilder::new()
        .add_dialog_file(path("main.dlg"), Locale::Any)
        .unwrap()
        .add_dialog_file(path("main_us.dlg"), Locale::English)
        .unwrap()
        .add_dialog_file(path("main_de.dlg"), Locale::German)
        .unwrap()
        .add_strings_file(path("main_us.str"), Language::English, None)
        .unwrap()
        .add_strings_file(path("main_de.str"), Language::German, None)
        .unwrap()
        .add_strings_file(path("main_jp.str"), Language::Japanese, None)
        .unwrap()
        .build()
        .unwrap()
}

#[test]
fn test_load_project_from_files() {
    let dir = TempDir::new().unwrap();
    write_project(&dir);
    let set = load_project(&dir);

    assert_eq!(set.dialog_id(), "IDD_MAIN");
    assert!(set.is_linked_to_master(Locale::English));
    assert!(set.is_linked_to_master(Locale::Japanese));
    assert!(!set.is_linked_to_master(Locale::German));
    assert_eq!(set.import_log(Locale::German).len(), 1);
    assert!(set.import_log(Locale::English).is_empty());

    let width = |locale| {
        set.property(locale, &PropertyTarget::Dialog, labels::WIDTH)
            .unwrap()
            .value
            .as_number()
    };
    assert_eq!(width(Locale::English), Some(200.0));
    assert_eq!(width(Locale::German), Some(260.0));

    assert_eq!(
        set.strings().get(Language::German, "IDS_TITLE"),
        Some("Einstellungen für Sie")
    );
    assert_eq!(set.strings().get(Language::Japanese, "IDS_TITLE"), Some("設定"));
}

#[test]
fn test_normalize_then_denormalize() {
    let dir = TempDir::new().unwrap();
    write_project(&dir);
    let mut set = load_project(&dir);
    let schema = schema();

    set.normalize_localized_strings(&schema);
    let ok = PropertyTarget::Control("IDC_OK".into());
    let hint = PropertyTarget::Control("IDC_HINT".into());
    for locale in [Locale::Any, Locale::German] {
        let text = set.property(locale, &ok, labels::TEXT).unwrap();
        let id = text.value.as_identifier().unwrap();
        assert!(id.ends_with("__internal"));
    }

    // Edit the English caption through the string map.
    set.update_localized_string_property(&ok, labels::TEXT, "Okay", Locale::English)
        .unwrap();

    set.denormalize_localized_strings(&schema);

    let title = set.property(Locale::German, &PropertyTarget::Dialog, labels::TEXT).unwrap();
    assert_eq!(title.value, PropertyValue::Identifier("DLGPROP_IDD_MAIN_1_Text".into()));
    assert_eq!(
        set.strings().get(Language::German, "DLGPROP_IDD_MAIN_1_Text"),
        Some("Einstellungen für Sie")
    );

    let caption = set.property(Locale::English, &ok, labels::TEXT).unwrap();
    let caption_id = caption.value.as_identifier().unwrap();
    assert_eq!(set.strings().get(Language::English, caption_id), Some("Okay"));
    assert_eq!(set.strings().get(Language::Japanese, caption_id), Some("OK"));

    // Empty everywhere: back to an inline empty string, and gone from the map.
    for locale in [Locale::Any, Locale::German] {
        let text = set.property(locale, &hint, labels::TEXT).unwrap();
        assert_eq!(text.value, PropertyValue::String(String::new()));
    }
    assert!(set.strings().ids().all(|id| id.starts_with("DLGPROP_IDD_MAIN_")));
    assert!(set.strings().ids().all(|id| !set.strings().is_empty_everywhere(id)));
}

#[test]
fn test_export_reparses() {
    let dir = TempDir::new().unwrap();
    write_project(&dir);
    let mut set = load_project(&dir);
    set.normalize_localized_strings(&schema());
    set.denormalize_localized_strings(&schema());

    for locale in [Locale::Any, Locale::German] {
        let resource = set.explicit_resource(locale).unwrap();
        let text = write_dialog(resource).unwrap();
        let reparsed = parse(&tokenize(&text).unwrap(), locale).unwrap().unwrap();
        assert_eq!(&reparsed, resource);
    }

    let german = write_strings(set.strings(), Language::German);
    let bytes = source::encode(&german, set.strings().encoding(Language::German)).unwrap();
    let decoded = source::decode(&bytes, "windows-1252").unwrap();
    let strings = cvdialog::parse_strings(&tokenize(&decoded).unwrap(), Language::German).unwrap();
    assert_eq!(strings.len(Language::German), set.strings().len(Language::German));
}

#[test]
fn test_mismatched_dialog_ids_are_rejected() {
    let dir = TempDir::new().unwrap();
    write_project(&dir);
    fs::write(
        dir.path().join("main_de.dlg"),
        MASTER.replace("IDD_MAIN", "IDD_OTHER"),
    )
    .unwrap();

    let result = DialogResourceSetBuilder::new()
        .add_dialog_file(dir.path().join("main.dlg"), Locale::Any)
        .unwrap()
        .add_dialog_file(dir.path().join("main_de.dlg"), Locale::German)
        .unwrap()
        .build();
    assert!(matches!(result, Err(Error::Consistency(_))));
}

#[test]
fn test_cache_file_round_trip() {
    let dir = TempDir::new().unwrap();
    write_project(&dir);
    let mut set = load_project(&dir);
    set.unlink_from_master(Locale::Japanese).unwrap();

    let cache = dir.path().join("cache.json");
    set.cache_to_file(&cache).unwrap();
    let loaded = DialogResourceSet::load_from_file(&cache).unwrap();
    assert_eq!(loaded, set);
    assert!(!loaded.is_linked_to_master(Locale::Japanese));
}
