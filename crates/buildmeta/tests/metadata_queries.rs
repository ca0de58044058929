//! Queries over a metadata document modelled on the generator's output for a
//! small multi-target project.

use buildmeta::{
    CompileCommands, Language, MetadataError, MetadataStore, PropertyKind, SessionConfig,
    TargetKind, Validation,
};
use std::path::Path;

const METADATA: &str = include_str!("fixtures/cmake-metadata.json");
const SCHEMA: &str = include_str!("fixtures/cmake-metadata-schema.json");

const MAIN_CPP: &str = "/home/dev/Metadata/main.cpp";
const BAR_FILE: &str = "/home/dev/Metadata/bar_file.cpp";
const COMPILED_AS_CXX: &str = "/home/dev/Metadata/compiled_as_cxx.c";
const C_FILE: &str = "/home/dev/Metadata/c_file.c";
const SHARED_UTIL: &str = "/home/dev/Metadata/shared_util.c";

fn store() -> MetadataStore {
    MetadataStore::load(METADATA, SCHEMA).expect("fixture should load")
}

#[test]
fn test_fixture_document_info() {
    let store = store();
    let doc = store.document();

    assert_eq!(doc.info().platform.as_deref(), Some("Linux"));
    let names: Vec<&str> = doc.targets().map(|t| t.name()).collect();
    assert_eq!(names, vec!["main", "static_dep", "shared_dep", "docs"]);

    let shared = doc.target("shared_dep").unwrap();
    assert_eq!(shared.kind(), Some(TargetKind::SharedLibrary));
    assert!(shared.artifacts().soname_file.is_some());
    assert_eq!(shared.excluded_sources().len(), 1);
    assert!(shared.is_generated(Path::new("/home/dev/Metadata/build/shared_dep_gen.cpp")));

    let docs = doc.target("docs").unwrap();
    assert_eq!(docs.kind(), Some(TargetKind::Utility));
    assert_eq!(docs.classified_files().count(), 0);
}

#[test]
fn test_base_definitions_for_cxx_file() {
    let store = store();
    assert_eq!(
        store.resolver().compile_definitions("main", BAR_FILE).unwrap(),
        vec!["MAIN_DEF"]
    );
}

#[test]
fn test_classification_beats_suffix() {
    let store = store();
    let r = store.resolver();

    assert_eq!(r.language_for_file("main", COMPILED_AS_CXX).unwrap(), Some(Language::Cxx));
    assert_eq!(r.compiler_for_file("main", COMPILED_AS_CXX).unwrap(), "/usr/bin/clang++");
    assert_eq!(r.compiler_for_file("main", C_FILE).unwrap(), "/usr/bin/clang");
    assert_eq!(r.compiler_id_for_file("main", C_FILE).unwrap(), "Clang");
    assert_eq!(r.compiler_version_for_file("main", C_FILE).unwrap(), "3.6.0");
}

#[test]
fn test_classification_is_scoped_per_target() {
    let store = store();
    let r = store.resolver();

    assert_eq!(r.language_for_file("static_dep", SHARED_UTIL).unwrap(), Some(Language::C));
    assert_eq!(r.language_for_file("shared_dep", SHARED_UTIL).unwrap(), Some(Language::Cxx));
    assert_eq!(r.language_for_file("main", SHARED_UTIL).unwrap(), None);

    assert_eq!(
        r.compile_definitions("static_dep", SHARED_UTIL).unwrap(),
        vec!["STATIC_PUBLIC", "STATIC_PRIVATE", "MAIN_DEF", "UTIL_DEF"]
    );
    assert_eq!(
        r.compile_definitions("shared_dep", SHARED_UTIL).unwrap(),
        vec!["SHARED_PUBLIC", "shared_dep_EXPORTS", "MAIN_DEF", "UTIL_DEF"]
    );
}

#[test]
fn test_unclassified_file_fails() {
    let store = store();
    let r = store.resolver();
    let header = "/home/dev/Metadata/bar_file.h";

    assert_eq!(r.language_for_file("main", header).unwrap(), None);
    for result in [
        r.compiler_for_file("main", header).map(str::to_string),
        r.compiler_id_for_file("main", header).map(str::to_string),
    ] {
        assert!(matches!(result, Err(MetadataError::UnknownLanguage { .. })));
    }
    for kind in PropertyKind::ALL {
        assert!(matches!(
            r.compile_property("main", header, kind),
            Err(MetadataError::UnknownLanguage { .. })
        ));
    }
}

#[test]
fn test_missing_target_fails_every_query() {
    let store = store();
    let r = store.resolver();

    let is_not_found = |e: &MetadataError| matches!(e, MetadataError::TargetNotFound(n) if n == "ghost");

    assert!(is_not_found(&r.language_for_file("ghost", MAIN_CPP).unwrap_err()));
    assert!(is_not_found(&r.compiler_for_file("ghost", MAIN_CPP).unwrap_err()));
    assert!(is_not_found(&r.compiler_id_for_file("ghost", MAIN_CPP).unwrap_err()));
    assert!(is_not_found(&r.compiler_version_for_file("ghost", MAIN_CPP).unwrap_err()));
    for kind in PropertyKind::ALL {
        assert!(is_not_found(&r.compile_property("ghost", MAIN_CPP, kind).unwrap_err()));
    }
}

#[test]
fn test_classified_without_properties_is_empty() {
    let store = store();
    let r = store.resolver();

    assert!(r
        .compile_options("static_dep", "/home/dev/Metadata/static_dep.c")
        .unwrap()
        .is_empty());
}

#[test]
fn test_merge_is_specialized_or_base_then_override() {
    let store = store();
    let doc = store.document();
    let r = store.resolver();

    for target in doc.targets() {
        for (file, language) in target.classified_files() {
            for kind in PropertyKind::ALL {
                let mut expected = target.properties(kind).for_language(language).to_vec();
                if let Some(extra) = doc.source_override(file).and_then(|o| o.property(kind)) {
                    expected.extend_from_slice(extra);
                }
                assert_eq!(
                    r.compile_property(target.name(), file, kind).unwrap(),
                    expected,
                    "{} {} {}",
                    target.name(),
                    file.display(),
                    kind
                );
            }
        }
    }
}

#[test]
fn test_compile_flags_override_options() {
    let store = store();
    let r = store.resolver();

    // C files fall back to the base string form; the file's own flags follow.
    assert_eq!(r.compile_options("main", C_FILE).unwrap(), vec!["-Wall", "-O0"]);
    assert_eq!(
        r.compile_options("main", MAIN_CPP).unwrap(),
        vec!["-Wall", "-std=c++11"]
    );
}

#[test]
fn test_compile_arguments_for_main_file() {
    let store = store();
    let args = store.resolver().compile_arguments("main", MAIN_CPP).unwrap();

    insta::assert_snapshot!(args.join("\n"), @r"
    -DMAIN_DEF
    -DCOMPILE_LANGUAGE_CXX
    -DTHIS_IS_THE_MAIN_FILE
    -I/home/dev/Metadata/build
    -I/home/dev/Metadata
    -I/home/dev/Metadata/main_dir
    -I/home/dev/Metadata/static_public_dir
    -I/home/dev/Metadata/shared_public_dir
    -Wall
    -std=c++11
    ");
}

#[test]
fn test_repeated_queries_and_stores_agree() {
    let first = store();
    let second = store();

    for target in first.document().targets() {
        for (file, _) in target.classified_files() {
            let a = first.resolver().compile_arguments(target.name(), file).unwrap();
            let b = first.resolver().compile_arguments(target.name(), file).unwrap();
            let c = second.resolver().compile_arguments(target.name(), file).unwrap();
            assert_eq!(a, b);
            assert_eq!(a, c);
        }
    }
}

#[test]
fn test_concurrent_readers() {
    let store = store();
    let expected = store.resolver().compile_definitions("main", MAIN_CPP).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                scope.spawn(move || {
                    (0..100)
                        .map(|_| store.resolver().compile_definitions("main", MAIN_CPP).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for handle in handles {
            for result in handle.join().unwrap() {
                assert_eq!(result, expected);
            }
        }
    });
}

#[test]
fn test_schema_rejects_bad_payload() {
    let bad = r#"{ "targets": { "main": { "type": "EXECUTABLE", "object_sources_cxx": "main.cpp" } } }"#;

    match MetadataStore::load(bad, SCHEMA) {
        Err(MetadataError::SchemaMismatch { pointer, .. }) => {
            assert_eq!(pointer, "/targets/main/object_sources_cxx")
        }
        other => panic!("expected schema mismatch, got {:?}", other.map(|_| ())),
    }

    // Without validation the same payload fails to decode instead.
    assert!(matches!(
        MetadataStore::load_with(bad, SCHEMA, Validation::Off),
        Err(MetadataError::MalformedInput { .. })
    ));
}

#[test]
fn test_open_from_session_config() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("cmake-metadata-Debug.json"), METADATA).unwrap();
    std::fs::write(dir.path().join("cmake-metadata-schema.json"), SCHEMA).unwrap();

    let config_path = dir.path().join("buildmeta.toml");
    std::fs::write(
        &config_path,
        format!(
            "[metadata]\nbuild_dir = {:?}\nconfiguration = \"Debug\"\n\n[logging]\nfilter = \"buildmeta=warn\"\n",
            dir.path().display().to_string()
        ),
    )
    .unwrap();

    let config = SessionConfig::from_file(&config_path).unwrap();
    config.init_logging();
    let store = MetadataStore::open(&config).unwrap();
    assert_eq!(store.document().target_count(), 4);

    // Release metadata was never written.
    let release = SessionConfig::for_build_dir(dir.path()).with_configuration("Release");
    assert!(matches!(
        MetadataStore::open(&release),
        Err(MetadataError::Io { .. })
    ));
}

#[test]
fn test_compile_database_matches_resolver() {
    let store = store();
    let db = CompileCommands::from_document(store.document(), "/home/dev/Metadata/build").unwrap();
    let r = store.resolver();

    // main: 4, static_dep: 2, shared_dep: 3, docs: 0
    assert_eq!(db.commands().len(), 9);

    let text = db.to_json().unwrap();
    let reparsed = CompileCommands::from_str(&text).unwrap();

    let main_cmd = reparsed.find_command(Path::new(MAIN_CPP)).unwrap();
    assert_eq!(main_cmd.get_defines(), r.compile_definitions("main", MAIN_CPP).unwrap());
    assert_eq!(main_cmd.get_includes(), r.include_directories("main", MAIN_CPP).unwrap());
    assert_eq!(main_cmd.get_args().first().map(String::as_str), Some("/usr/bin/clang++"));

    let c_cmd = reparsed.find_command(Path::new(C_FILE)).unwrap();
    assert_eq!(c_cmd.get_args().first().map(String::as_str), Some("/usr/bin/clang"));
}
