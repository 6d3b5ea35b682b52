//! Windows packaging: DLLs next to the executables, no external tools.

mod common;

use appleseed_maya_package::bundler::{
    Bundler, LoadOptions, TargetOs, ToolOutput, load_settings,
};
use common::{Fixture, MockTools, elf_bytes};

#[tokio::test]
async fn package_places_dlls_in_bin() {
    let fixture = Fixture::new(&elf_bytes(), ".dll", ".mll");
    let config = fixture.write_config("win64", None);
    let settings = load_settings(&LoadOptions {
        config_path: config,
        root_dir: fixture.root.clone(),
        archive_dir: fixture.archives.clone(),
        offline: true,
    })
    .unwrap();
    let tools = MockTools::new(|_, _| ToolOutput::success(""));

    let artifact = Bundler::new(&settings, TargetOs::Windows, &tools)
        .bundle()
        .await
        .unwrap();

    let bin = fixture.output.join("bin");
    assert!(bin.join("appleseed.cli.exe").is_file());
    assert!(bin.join("appleseed.dll").is_file());
    assert!(bin.join("appleseed.shared.dll").is_file());
    assert!(!bin.join("appleseed.cli").exists());
    assert!(!fixture.output.join("lib").exists());
    assert!(
        fixture
            .output
            .join("plug-ins")
            .join("2018")
            .join("appleseedMaya.mll")
            .is_file()
    );

    assert!(artifact.dependencies.is_empty());
    assert!(tools.calls_to("ldd").is_empty());
    assert!(tools.calls_to("otool").is_empty());
    assert_eq!(
        artifact.path,
        fixture
            .archives
            .join("appleseed-maya2018-0.6.1-beta-win64.zip")
    );
}
