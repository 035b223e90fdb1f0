use std::fs;
use std::path::{Path, PathBuf};

use slkgen_core::{
    run, ConvertError, ConverterSettings, FieldCatalog, FieldValue, SlkFileManager, SlkKind,
};

const CATALOG: &str = r#"[
    {"id": "weapon", "field": "weapType1", "type": "string", "slk": "UnitWeapons", "index": "-1"},
    {"id": "ua1c", "field": "cool1", "type": "unreal", "slk": "UnitWeapons", "index": "-1"},
    {"id": "uabi", "field": "abilList", "type": "string", "slk": "UnitAbilities", "index": "-1"},
    {"id": "ulev", "field": "level", "type": "int", "slk": "UnitBalance", "index": "-1"},
    {"id": "uhpm", "field": "HP", "type": "int", "slk": "UnitBalance", "index": "-1"},
    {"id": "umpm", "field": "manaN", "type": "int", "slk": "UnitBalance", "index": "-1"},
    {"id": "udef", "field": "def", "type": "int", "slk": "UnitBalance", "index": "-1"},
    {"id": "udup", "field": "defUp", "type": "int", "slk": "UnitBalance", "index": "-1"},
    {"id": "uagp", "field": "AGIplus", "type": "unreal", "slk": "UnitBalance", "index": "-1"},
    {"id": "urac", "field": "race", "type": "string", "slk": "UnitData", "index": "-1"},
    {"id": "umdl", "field": "file", "type": "string", "slk": "UnitUI", "index": "-1"},
    {"id": "unam", "field": "Name", "type": "string", "slk": "Profile", "index": "-1"},
    {"id": "ubpx", "field": "Buttonpos", "type": "int", "slk": "Profile", "index": "0"},
    {"id": "ubpy", "field": "Buttonpos", "type": "int", "slk": "Profile", "index": "1"},
    {"id": "uhot", "field": "Tip", "type": "string", "slk": "Profile", "index": 0},
    {"id": "uhos", "field": "Tip", "type": "string", "slk": "Profile", "index": 1}
]"#;

fn template_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("assets")
        .join("Units")
}

fn catalog() -> FieldCatalog {
    FieldCatalog::from_json_str(CATALOG, "inline").unwrap()
}

fn read(dir: &Path, kind: SlkKind) -> String {
    fs::read_to_string(dir.join(kind.file_name())).unwrap()
}

fn body_rows(text: &str) -> Vec<&str> {
    text.split("\r\n")
        .filter(|line| line.starts_with("C;X1;Y") && !line.starts_with("C;X1;Y1;"))
        .collect()
}

#[test]
fn unit_without_fields_adds_no_weapons_row() {
    let out = tempfile::tempdir().unwrap();
    let mut manager = SlkFileManager::new(catalog(), &template_dir()).unwrap();
    manager.set_count(2);
    manager.write_unit("H001", [("weapon", FieldValue::from("Claws"))]);
    manager.write_unit("H002", Vec::<(String, FieldValue)>::new());
    assert!(manager.write_files(out.path()).is_success());

    let weapons = read(out.path(), SlkKind::Weapons);
    let lines: Vec<&str> = weapons.split("\r\n").collect();
    assert_eq!(lines[1], "B;X66;Y3;D0");
    assert_eq!(body_rows(&weapons), vec!["C;X1;Y2;K\"H001\""]);
    assert!(weapons.contains("C;X1;Y2;K\"H001\"\r\nC;X16;K\"Claws\"\r\nE\r\n"));
    assert!(!weapons.contains("H002"));

    // The abilities list column is required even for units with no abilities.
    let abilities = read(out.path(), SlkKind::Abilities);
    assert_eq!(
        body_rows(&abilities),
        vec!["C;X1;Y2;K\"H001\"", "C;X1;Y3;K\"H002\""]
    );
    assert!(abilities.contains("C;X1;Y3;K\"H002\"\r\nC;X4;K\"_\"\r\n"));

    assert_eq!(read(out.path(), SlkKind::Profile), "");
}

#[test]
fn balance_rows_get_their_legacy_columns() {
    let out = tempfile::tempdir().unwrap();
    let mut manager = SlkFileManager::new(catalog(), &template_dir()).unwrap();
    manager.set_count(1);
    manager.write_unit(
        "H001",
        [
            ("ulev", FieldValue::Integer(3)),
            ("uhpm", FieldValue::Integer(650)),
            ("umpm", FieldValue::Integer(200)),
            ("udef", FieldValue::Integer(4)),
            ("udup", FieldValue::Integer(2)),
            ("uagp", FieldValue::Real(1.5)),
        ],
    );
    assert!(manager.write_files(out.path()).is_success());

    let balance = read(out.path(), SlkKind::Balance);
    let row = balance.split("C;X1;Y2;K\"H001\"\r\n").nth(1).unwrap();
    assert_eq!(
        row,
        [
            "C;X5;K3",
            "C;X6;KFALSE",
            "C;X23;K650",
            "C;X24;K650",
            "C;X27;K200",
            "C;X28;K200",
            "C;X31;K4",
            "C;X32;K2",
            "C;X33;K4",
            "C;X47;K1.5",
            "C;X48;K\"-\"",
            "E",
            "",
        ]
        .join("\r\n")
    );
}

#[test]
fn profile_merges_indexed_fields() {
    let out = tempfile::tempdir().unwrap();
    let mut manager = SlkFileManager::new(catalog(), &template_dir()).unwrap();
    manager.set_count(1);
    manager.write_unit(
        "H001",
        [
            ("ubpy", FieldValue::Integer(2)),
            ("unam", FieldValue::from("Blademaster")),
            ("uhot", FieldValue::from("Train")),
            ("ubpx", FieldValue::Integer(1)),
            ("uhos", FieldValue::from("Blademaster")),
        ],
    );
    assert!(manager.write_files(out.path()).is_success());
    assert!(manager.anomalies().is_empty());

    assert_eq!(
        read(out.path(), SlkKind::Profile),
        "[H001]\r\nButtonpos=1,2\r\nName=Blademaster\r\nTip=\"Train,Blademaster\"\r\n\r\n"
    );
}

#[test]
fn missing_template_aborts_setup() {
    let dir = tempfile::tempdir().unwrap();
    for kind in [SlkKind::Weapons, SlkKind::Abilities, SlkKind::Data, SlkKind::Ui] {
        fs::copy(
            template_dir().join(kind.file_name()),
            dir.path().join(kind.file_name()),
        )
        .unwrap();
    }
    let err = SlkFileManager::new(catalog(), dir.path()).unwrap_err();
    assert!(err.to_string().contains("UnitBalance.slk"));
}

fn write_inputs(dir: &Path, units: &str) -> ConverterSettings {
    let input_path = dir.join("units.json");
    let catalog_path = dir.join("catalog.json");
    fs::write(&input_path, units).unwrap();
    fs::write(&catalog_path, CATALOG).unwrap();
    ConverterSettings {
        input_path,
        catalog_path,
        template_path: Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("assets"),
        output_path: dir.join("out"),
    }
}

#[test]
fn run_is_deterministic() {
    let units = r#"[
        {"id": "H001", "fields": {"isCustom": true, "baseUnit": "Hpal", "unam": "Knight",
            "weapon": "", "ua1c": 1.35, "urac": "human", "umdl": "units\\human\\Knight\\Knight",
            "uhpm": 835, "bogus": 1}},
        {"id": "H002", "fields": {"unam": "Rifleman", "ubpx": 0, "ubpy": 1}}
    ]"#;

    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let summary = run(write_inputs(first.path(), units)).unwrap();
    run(write_inputs(second.path(), units)).unwrap();

    assert_eq!(summary.units, 2);
    assert_eq!(summary.files_written.len(), 6);
    assert_eq!(summary.anomalies.len(), 1);

    for kind in SlkKind::ALL {
        let a = fs::read(first.path().join("out").join(kind.file_name())).unwrap();
        let b = fs::read(second.path().join("out").join(kind.file_name())).unwrap();
        assert_eq!(a, b, "{kind} differs between runs");
    }

    let weapons = read(&first.path().join("out"), SlkKind::Weapons);
    assert!(weapons.contains("C;X16;K\"_\"\r\nC;X23;K1.35"));
    for kind in SlkKind::ALL.into_iter().filter(|k| k.is_templated()) {
        let text = read(&first.path().join("out"), kind);
        assert_eq!(text.split("\r\n").nth(1).unwrap().split(';').nth(2), Some("Y3"));
    }
}

#[test]
fn run_rejects_empty_input() {
    let dir = tempfile::tempdir().unwrap();
    let settings = write_inputs(dir.path(), "[]");
    assert!(matches!(run(settings), Err(ConvertError::NoUnits)));
}

#[test]
fn run_rejects_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = write_inputs(dir.path(), "[]");
    settings.input_path = dir.path().join("nope.json");
    assert!(matches!(run(settings), Err(ConvertError::Config(_))));
}
