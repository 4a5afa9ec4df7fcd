//! End-to-end integration tests across the workspace
//!
//! These exercise the complete flow: config discovery -> project selection
//! -> build path bookkeeping -> project file patching on disk.

use pretty_assertions::assert_eq;
use sdkshim_cbp::{Document, PatchContext, PatchOutcome, SdkNote, patch};
use sdkshim_config::{ConfigStore, Project, ProjectResolver};
use sdkshim_fs::{NormalizedPath, io};
use std::fs;
use tempfile::TempDir;

const GENERATED: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<CodeBlocks_project_file>\n\
\t<Project>\n\
\t\t<Option title=\"app\" />\n\
\t\t<Option virtualFolders=\"CMake Files\\;CMake Files\\..\\..\\..\\usr\\include\\lib\\;\" />\n\
\t\t<Build>\n\
\t\t\t<Target title=\"app\">\n\
\t\t\t\t<Compiler>\n\
\t\t\t\t\t<Add directory=\"/usr/include\" />\n\
\t\t\t\t</Compiler>\n\
\t\t\t</Target>\n\
\t\t</Build>\n\
\t\t<Unit filename=\"/usr/src/main.cpp\" />\n\
\t</Project>\n\
</CodeBlocks_project_file>\n";

/// A home directory holding the config plus a source and a build tree.
struct Workspace {
    temp: TempDir,
}

impl Workspace {
    fn new(sdk: &str) -> Self {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src/app")).unwrap();
        fs::create_dir_all(temp.path().join("build/app")).unwrap();

        let json = format!(
            r#"{{
  "gccClangFixes": ["-Wno-fix"],
  "projects": [
    {{
      "path": "{}",
      "sdkPath": "{}",
      "extraAddDirectory": ["${{sdkPath}}usr/include/extra"]
    }}
  ]
}}"#,
            temp.path().join("src/app").display(),
            sdk
        );
        fs::write(temp.path().join("sdkshim.json"), json).unwrap();
        Self { temp }
    }

    fn path(&self, rel: &str) -> NormalizedPath {
        NormalizedPath::new(self.temp.path().join(rel))
    }
}

/// Locate, select and record, the way the wrapper does before running.
fn resolve(ws: &Workspace) -> (NormalizedPath, Project) {
    let store = ConfigStore::new();
    let home = ws.path("");
    let project_dir = ws.path("src/app").simplify();
    let build_dir = ws.path("build/app").simplify();

    let roots = ConfigStore::search_roots(Some(&home), Some(&project_dir), Some(&build_dir));
    let mut loaded = store.load_first(&store.locate(&roots)).unwrap();
    let project = ProjectResolver::new(&loaded.config)
        .select(project_dir.as_str())
        .unwrap();
    let updated = ProjectResolver::new(&loaded.config).update(project_dir.as_str(), build_dir.as_str());
    store.commit(&mut loaded, updated);
    (loaded.path, project)
}

fn context_for(file: &NormalizedPath, build_dir: &str, project: &Project) -> PatchContext {
    let mut ctx = PatchContext::new(file.as_str(), build_dir, &project.sdk_path);
    ctx.extra_add_directory = project.shared.extra_add_directory.clone();
    ctx.gcc_clang_fixes = project.shared.gcc_clang_fixes.clone();
    ctx
}

/// Patch the file on disk, returning whether it changed.
fn patch_on_disk(file: &NormalizedPath, build_dir: &str, project: &Project) -> bool {
    let text = io::read_text(file).unwrap();
    let mut doc = Document::parse(&text).unwrap();
    let mut ctx = context_for(file, build_dir, project);
    match patch(&mut ctx, &mut doc).unwrap() {
        PatchOutcome::Changed(modified) => {
            io::backup_once(file).unwrap();
            io::write_text(file, &modified).unwrap();
            true
        }
        PatchOutcome::Unchanged => false,
    }
}

#[test]
fn test_resolve_records_build_path() {
    let ws = Workspace::new("/sdk/v42");
    let (config_path, project) = resolve(&ws);

    assert_eq!(config_path, ws.path("sdkshim.json").simplify());
    assert_eq!(project.sdk_path, "/sdk/v42");
    assert_eq!(project.shared.extra_add_directory, vec!["/sdk/v42/usr/include/extra"]);
    assert!(project.shared.gcc_clang_fixes.contains("-Wno-fix"));

    let saved = ConfigStore::new().load(&config_path).unwrap();
    let build = ws.path("build/app").simplify();
    assert!(saved.projects[0].build_paths.contains(build.as_str()));

    // A second run finds nothing new to record.
    let before = fs::read_to_string(config_path.to_native()).unwrap();
    resolve(&ws);
    assert_eq!(fs::read_to_string(config_path.to_native()).unwrap(), before);
}

#[test]
fn test_selection_from_recorded_build_tree() {
    let ws = Workspace::new("/sdk/v42");
    resolve(&ws);

    let store = ConfigStore::new();
    let config = store.load(&ws.path("sdkshim.json")).unwrap();
    let inside_build = ws.path("build/app/CMakeFiles").simplify();
    let selected = ProjectResolver::new(&config).select(inside_build.as_str()).unwrap();
    assert_eq!(selected.sdk_path, "/sdk/v42");
}

#[test]
fn test_patch_generated_project_on_disk() {
    let ws = Workspace::new("/sdk/v42");
    let (_, project) = resolve(&ws);
    let build = ws.path("build/app").simplify();
    let file = build.join("app.cbp");
    fs::write(file.to_native(), GENERATED).unwrap();

    assert!(patch_on_disk(&file, build.as_str(), &project));
    let patched = io::read_text(&file).unwrap();
    assert!(patched.contains("directory=\"/sdk/v42/usr/include\""));
    assert!(patched.contains("filename=\"/sdk/v42/usr/src/main.cpp\""));
    assert!(patched.contains("directory=\"/sdk/v42/usr/include/extra\""));
    assert!(patched.contains("option=\"-Wno-fix\""));
    assert_eq!(io::read_text(&io::backup_path(&file)).unwrap(), GENERATED);

    // Idempotent: the second pass is detected through the embedded note.
    assert!(!patch_on_disk(&file, build.as_str(), &project));
    assert_eq!(io::read_text(&file).unwrap(), patched);
}

#[test]
fn test_sdk_move_repatches_and_keeps_first_backup() {
    let ws = Workspace::new("/sdk/v42");
    let (config_path, project) = resolve(&ws);
    let build = ws.path("build/app").simplify();
    let file = build.join("app.cbp");
    fs::write(file.to_native(), GENERATED).unwrap();
    assert!(patch_on_disk(&file, build.as_str(), &project));

    let mut config = ConfigStore::new().load(&config_path).unwrap();
    config.projects[0].sdk_path = "/sdk/v43".into();
    ConfigStore::new().save(&config_path, &config).unwrap();

    let (_, moved) = resolve(&ws);
    assert!(patch_on_disk(&file, build.as_str(), &moved));

    let patched = io::read_text(&file).unwrap();
    assert!(patched.contains("directory=\"/sdk/v43/usr/include\""));
    assert!(!patched.contains("/sdk/v42"));
    assert_eq!(patched.matches("option=\"-Wno-fix\"").count(), 1);
    assert_eq!(io::read_text(&io::backup_path(&file)).unwrap(), GENERATED);
}

/// Fixed paths so the virtual folder resolves to the filesystem root.
#[test]
fn test_end_to_end_in_memory() {
    let mut ctx = PatchContext::new("/home/u/build/app.cbp", "/home/u/build", "/sdk/v42");
    let mut doc = Document::parse(GENERATED).unwrap();

    let PatchOutcome::Changed(text) = patch(&mut ctx, &mut doc).unwrap() else {
        panic!("expected a change");
    };

    assert_eq!(ctx.virtual_folder_prefix, "..\\..\\..\\..\\sdk\\v42");
    assert!(text.contains("directory=\"/sdk/v42/usr/include\""));
    assert!(text.contains("filename=\"/sdk/v42/usr/src/main.cpp\""));
    assert!(text.contains(
        "virtualFolders=\"CMake Files\\;CMake Files\\..\\..\\..\\..\\sdk\\v42\\usr\\include\\lib\\;\""
    ));

    let mut reparsed = Document::parse(&text).unwrap();
    let mut again = PatchContext::new("/home/u/build/app.cbp", "/home/u/build", "/sdk/v42");
    assert_eq!(patch(&mut again, &mut reparsed).unwrap(), PatchOutcome::Unchanged);
    assert_eq!(
        again.previous,
        Some(SdkNote {
            sdk_dir: "/sdk/v42".into(),
            virtual_folder_prefix: "..\\..\\..\\..\\sdk\\v42".into(),
        })
    );
}
