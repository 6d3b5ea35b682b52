//! macOS dependency resolution and relocation with scripted `otool` and
//! `install_name_tool`.

mod common;

use appleseed_maya_package::bundler::{
    Bundler, DependencyProbe, Error, LoadOptions, TargetOs, ToolOutput, load_settings,
    platform::MacOsPackager,
    platform::macos::{
        relocate::Relocator,
        search::{MachOProbe, SearchEnvironment},
    },
    resolve_closure, settings::DEFAULT_HOST_PYTHON_FRAMEWORK,
};
use common::{Fixture, MockTools, macho_bytes, write};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

fn otool_entry(reference: &str) -> String {
    format!("\t{reference} (compatibility version 1.0.0, current version 1.0.0)\n")
}

/// Scripted `otool`: `-L` answers by file name from `libraries`, `-l`
/// reports no `LC_RPATH`.
fn otool(libraries: HashMap<&'static str, Vec<String>>) -> MockTools {
    MockTools::new(move |tool, args| {
        if tool != "otool" || args.first().map(String::as_str) != Some("-L") {
            return ToolOutput::success("");
        }
        let target = Path::new(args.last().unwrap());
        let name = target.file_name().unwrap().to_string_lossy().into_owned();
        let mut out = format!("{}:\n", target.display());
        for reference in libraries.get(name.as_str()).into_iter().flatten() {
            out.push_str(&otool_entry(reference));
        }
        ToolOutput::success(out)
    })
}

#[test]
fn rpath_reference_is_rewritten_relative_to_lib_dir() {
    let dir = tempfile::tempdir().unwrap();
    let search = dir.path().join("deps");
    let app = dir.path().join("package").join("bin").join("app");
    let lib_dir = dir.path().join("package").join("lib");
    write(&search.join("libX.dylib"), b"");
    write(&app, b"");

    let tools = otool(HashMap::from([(
        "app",
        vec!["@rpath/libX.dylib".to_string()],
    )]));
    let environment = SearchEnvironment {
        library_path: vec![search.clone()],
        fallback_library_path: vec![],
    };
    let probe = MachOProbe::new(&tools, environment);

    assert_eq!(
        probe.direct_dependencies(&app).unwrap(),
        vec![search.join("libX.dylib")]
    );

    let relocator = Relocator::new(&tools, &probe, &lib_dir, DEFAULT_HOST_PYTHON_FRAMEWORK);
    assert_eq!(relocator.relink(&app).unwrap(), 1);
    assert_eq!(
        tools.calls_to("install_name_tool"),
        vec![vec![
            "-change".to_string(),
            "@rpath/libX.dylib".to_string(),
            "@loader_path/../lib/libX.dylib".to_string(),
            app.display().to_string(),
        ]]
    );
}

#[test]
fn unmatched_placeholder_names_the_original_reference() {
    let dir = tempfile::tempdir().unwrap();
    let search = dir.path().join("deps");
    let app = dir.path().join("bin").join("app");
    fs::create_dir_all(&search).unwrap();
    write(&app, b"");

    let tools = otool(HashMap::from([(
        "app",
        vec!["@rpath/libMissing.dylib".to_string()],
    )]));
    let probe = MachOProbe::new(
        &tools,
        SearchEnvironment {
            library_path: vec![search],
            fallback_library_path: vec![],
        },
    );

    match probe.direct_dependencies(&app).unwrap_err() {
        Error::UnresolvedDependency { reference, binary } => {
            assert_eq!(reference, "@rpath/libMissing.dylib");
            assert_eq!(binary, app);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn relocated_bundle_resolves_and_needs_no_more_changes() {
    let dir = tempfile::tempdir().unwrap();
    let package = dir.path().join("package");
    let app = package.join("bin").join("app");
    let lib_dir = package.join("lib");
    for path in [&app, &lib_dir.join("libX.dylib"), &lib_dir.join("libY.dylib")] {
        write(path, b"");
    }

    let tools = otool(HashMap::from([
        ("app", vec!["@loader_path/../lib/libX.dylib".to_string()]),
        (
            "libX.dylib",
            vec![
                "libX.dylib".to_string(),
                "@loader_path/libY.dylib".to_string(),
                "/usr/lib/libSystem.B.dylib".to_string(),
            ],
        ),
        ("libY.dylib", vec!["libY.dylib".to_string()]),
    ]));
    let probe = MachOProbe::new(&tools, SearchEnvironment::default());

    let closure = resolve_closure(&probe, &[app.clone()]).unwrap();
    let mut libraries: Vec<PathBuf> = closure.iter().map(Path::to_path_buf).collect();
    libraries.sort();
    assert_eq!(
        libraries,
        vec![lib_dir.join("libX.dylib"), lib_dir.join("libY.dylib")]
    );

    let relocator = Relocator::new(&tools, &probe, &lib_dir, DEFAULT_HOST_PYTHON_FRAMEWORK);
    for binary in [&app, &lib_dir.join("libX.dylib"), &lib_dir.join("libY.dylib")] {
        assert_eq!(relocator.relink(binary).unwrap(), 0);
    }
    assert!(tools.calls_to("install_name_tool").is_empty());
}

#[tokio::test]
async fn package_relinks_every_bundled_binary() {
    let fixture = Fixture::new(&macho_bytes(), ".dylib", ".bundle");
    fixture.add_dependency("libX.dylib", &macho_bytes());
    fixture.add_dependency("libY.dylib", &macho_bytes());
    let python = fixture.add_dependency(
        "Python.framework/Versions/2.7/Python",
        &macho_bytes(),
    );
    let python_ref = python.display().to_string();

    let config = fixture.write_config("mac", None);
    let settings = load_settings(&LoadOptions {
        config_path: config,
        root_dir: fixture.root.clone(),
        archive_dir: fixture.archives.clone(),
        offline: true,
    })
    .unwrap();

    let tools = otool(HashMap::from([
        (
            "appleseed.cli",
            vec![
                "@rpath/libappleseed.dylib".to_string(),
                "@rpath/libX.dylib".to_string(),
                "@executable_path/../Frameworks/QtCore.framework/QtCore".to_string(),
                "/usr/lib/libSystem.B.dylib".to_string(),
            ],
        ),
        (
            "_appleseedpython.so",
            vec![
                "@rpath/libX.dylib".to_string(),
                python_ref.clone(),
            ],
        ),
        (
            "libX.dylib",
            vec![
                "@rpath/libX.dylib".to_string(),
                "@loader_path/libY.dylib".to_string(),
            ],
        ),
        ("libY.dylib", vec!["@rpath/libY.dylib".to_string()]),
    ]));

    let packager = MacOsPackager::with_environment(SearchEnvironment {
        library_path: vec![fixture.appleseed_lib.clone(), fixture.deps.clone()],
        fallback_library_path: vec![],
    });
    let artifact = Bundler::new(&settings, TargetOs::MacOs, &tools)
        .with_macos_packager(packager)
        .bundle()
        .await
        .unwrap();

    let out = &fixture.output;
    let lib = out.join("lib");
    assert!(lib.join("libX.dylib").is_file());
    assert!(lib.join("libY.dylib").is_file());
    assert!(!lib.join("Python").exists());
    assert!(artifact.dependencies.contains(&python));

    let install_name_tool = tools.calls_to("install_name_tool");
    let has = |args: &[&str]| {
        install_name_tool
            .iter()
            .any(|call| call.iter().map(String::as_str).eq(args.iter().copied()))
    };

    let cli = out.join("bin").join("appleseed.cli").display().to_string();
    let python_module = out
        .join("scripts")
        .join("appleseed")
        .join("_appleseedpython.so")
        .display()
        .to_string();
    let plugin = out
        .join("plug-ins")
        .join("2018")
        .join("appleseedMaya.bundle")
        .display()
        .to_string();
    let lib_x = lib.join("libX.dylib").display().to_string();

    assert!(has(&["-id", "libX.dylib", &lib_x]));
    assert!(has(&["-id", "appleseedMaya.bundle", &plugin]));
    assert!(has(&["-id", "_appleseedpython.so", &python_module]));
    assert!(has(&[
        "-change",
        "@rpath/libX.dylib",
        "@loader_path/../lib/libX.dylib",
        &cli
    ]));
    assert!(has(&[
        "-change",
        "@rpath/libappleseed.dylib",
        "@loader_path/../lib/libappleseed.dylib",
        &cli
    ]));
    assert!(has(&[
        "-change",
        "@rpath/libX.dylib",
        "@loader_path/../../lib/libX.dylib",
        &python_module
    ]));
    assert!(has(&[
        "-change",
        &python_ref,
        DEFAULT_HOST_PYTHON_FRAMEWORK,
        &python_module
    ]));
    assert!(!install_name_tool
        .iter()
        .any(|call| call[0] == "-change" && call[1] == "@loader_path/libY.dylib"));

    // One rewrite per (binary, reference).
    let changes = install_name_tool
        .iter()
        .filter(|call| call[0] == "-change" && call[3] == cli)
        .count();
    assert_eq!(changes, 2);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(lib.join("libY.dylib")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
