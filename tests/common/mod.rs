//! Shared helpers for integration tests: a scripted tool runner and an
//! on-disk plugin checkout with fake build artifacts.

#![allow(dead_code)]

use appleseed_maya_package::bundler::{Result, ToolOutput, ToolRunner};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

type Handler = Box<dyn Fn(&str, &[String]) -> ToolOutput>;

/// Tool runner answering from a closure and recording every call.
pub struct MockTools {
    handler: Handler,
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl MockTools {
    pub fn new(handler: impl Fn(&str, &[String]) -> ToolOutput + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Arguments of every call made to `tool`, in order.
    pub fn calls_to(&self, tool: &str) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == tool)
            .map(|(_, args)| args.clone())
            .collect()
    }
}

impl ToolRunner for MockTools {
    fn ensure_available(&self, _tool: &str) -> Result<()> {
        Ok(())
    }

    fn run(&self, tool: &str, args: &[&OsStr]) -> Result<ToolOutput> {
        let args: Vec<String> = args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        self.calls
            .lock()
            .unwrap()
            .push((tool.to_string(), args.clone()));
        Ok((self.handler)(tool, &args))
    }
}

/// Minimal ELF header, enough to be recognized as an object file.
pub fn elf_bytes() -> Vec<u8> {
    let mut bytes = vec![0x7f, b'E', b'L', b'F', 2, 1, 1];
    bytes.resize(64, 0);
    bytes
}

/// Minimal 64-bit little-endian Mach-O header.
pub fn macho_bytes() -> Vec<u8> {
    let mut bytes = vec![0xcf, 0xfa, 0xed, 0xfe, 0x07, 0x00, 0x00, 0x01];
    bytes.resize(64, 0);
    bytes
}

pub fn write(path: &Path, contents: impl AsRef<[u8]>) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Plugin checkout, renderer build and host SDK laid out in a temp dir.
pub struct Fixture {
    pub dir: tempfile::TempDir,
    pub root: PathBuf,
    pub build: PathBuf,
    pub plugin_bin: PathBuf,
    pub appleseed_bin: PathBuf,
    pub appleseed_lib: PathBuf,
    pub shaders: PathBuf,
    pub schemas: PathBuf,
    pub settings: PathBuf,
    pub python: PathBuf,
    pub maketx: PathBuf,
    pub deps: PathBuf,
    pub output: PathBuf,
    pub archives: PathBuf,
}

impl Fixture {
    /// Creates the tree; `binary` is the object header used for renderer
    /// binaries, `lib_ext` and `plugin_ext` the platform file extensions.
    pub fn new(binary: &[u8], lib_ext: &str, plugin_ext: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().to_path_buf();

        let root = base.join("appleseed-maya");
        write(&root.join("LICENSE.txt"), "MIT");
        write(&root.join("icons").join("appleseed.png"), "png");
        write(&root.join("presets").join("default.mel"), "preset");
        write(
            &root.join("scripts").join("appleseedMaya").join("menu.py"),
            "import maya",
        );
        write(
            &root.join("scripts").join("appleseedMaya").join("menu.pyc"),
            "bytecode",
        );
        write(
            &root.join("src").join("appleseedmaya").join("version.h"),
            "#define APPLESEED_MAYA_VERSION_MAJOR 0\n\
             #define APPLESEED_MAYA_VERSION_MINOR 6\n\
             #define APPLESEED_MAYA_VERSION_PATCH 1\n\
             #define APPLESEED_MAYA_VERSION_MATURITY \"beta\"\n",
        );

        let maya_include = base.join("maya2018").join("include");
        write(
            &maya_include.join("maya").join("MTypes.h"),
            "#define MAYA_API_VERSION 20180400\n",
        );
        let build = base.join("build");
        write(
            &build.join("CMakeCache.txt"),
            format!("MAYA_INCLUDE_DIR:PATH={}\n", maya_include.display()),
        );

        let plugin_bin = build.join("src").join("appleseedmaya");
        write(&plugin_bin.join(format!("appleseedMaya{plugin_ext}")), binary);

        let appleseed = base.join("appleseed");
        let appleseed_bin = appleseed.join("bin");
        write(&appleseed_bin.join("appleseed.cli"), binary);
        write(&appleseed_bin.join("appleseed.cli.exe"), binary);
        write(&appleseed_bin.join("appleseed.dll"), binary);
        write(&appleseed_bin.join("appleseed.shared.dll"), binary);

        let appleseed_lib = appleseed.join("lib");
        write(&appleseed_lib.join(format!("libappleseed{lib_ext}")), binary);
        write(&appleseed_lib.join(format!("libappleseed.shared{lib_ext}")), binary);

        let shaders = appleseed.join("shaders");
        write(&shaders.join("maya").join("as_maya_lambert.oso"), "oso");
        write(&shaders.join("maya").join("README.txt"), "not a shader");
        write(
            &shaders.join("appleseed").join("surface").join("as_glass.oso"),
            "oso",
        );

        let schemas = appleseed.join("schemas");
        write(&schemas.join("project.xsd"), "<xs/>");
        write(&schemas.join(".gitignore"), "*.tmp");

        let settings = appleseed.join("settings");
        write(&settings.join("appleseed.cli.xml"), "<settings/>");

        let python = appleseed.join("python");
        write(&python.join("appleseed").join("__init__.py"), "");
        write(&python.join("appleseed").join("__init__.pyc"), "bytecode");
        write(&python.join("appleseed").join("_appleseedpython.so"), binary);

        let maketx = base.join("oiio").join("bin").join("maketx");
        write(&maketx, "#!/bin/sh\n");

        let deps = base.join("deps");
        fs::create_dir_all(&deps).unwrap();

        Self {
            output: base.join("package"),
            archives: base.join("archives"),
            dir,
            root,
            build,
            plugin_bin,
            appleseed_bin,
            appleseed_lib,
            shaders,
            schemas,
            settings,
            python,
            maketx,
            deps,
        }
    }

    /// Writes a configuration file, leaving out `omit` if given.
    pub fn write_config(&self, platform: &str, omit: Option<&str>) -> PathBuf {
        let entries = [
            ("platform", platform.to_string()),
            ("build_path", self.build.display().to_string()),
            ("bin_path", self.plugin_bin.display().to_string()),
            ("appleseed_bin_path", self.appleseed_bin.display().to_string()),
            ("appleseed_lib_path", self.appleseed_lib.display().to_string()),
            ("appleseed_shaders_path", self.shaders.display().to_string()),
            ("appleseed_schemas_path", self.schemas.display().to_string()),
            ("appleseed_settings_path", self.settings.display().to_string()),
            ("appleseed_python_path", self.python.display().to_string()),
            ("maketx_path", self.maketx.display().to_string()),
            ("package_output_path", self.output.display().to_string()),
            ("delete_retry_delay_ms", "10".to_string()),
        ];

        let mut xml = String::from("<?xml version=\"1.0\"?>\n<settings>\n");
        for (key, value) in entries {
            if Some(key) != omit {
                xml.push_str(&format!("    <{key}>{value}</{key}>\n"));
            }
        }
        xml.push_str("</settings>\n");

        let path = self.dir.path().join("appleseed-maya.package.configuration.xml");
        fs::write(&path, xml).unwrap();
        path
    }

    /// Adds a dependency library outside the renderer tree.
    pub fn add_dependency(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.deps.join(name);
        write(&path, contents);
        path
    }
}
