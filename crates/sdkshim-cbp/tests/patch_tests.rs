//! Tests for patching a generated Code::Blocks project

use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use sdkshim_cbp::patch::{remap_virtual_folders, rewrite_system_path};
use sdkshim_cbp::{Document, Error, NodeId, PatchContext, PatchOutcome, SdkNote, patch};

const INPUT: &str = include_str!("fixtures/testproject_input.cbp");

#[fixture]
fn context() -> PatchContext {
    let mut ctx = PatchContext::new(
        "/home/testuser/build-proj/proj.cbp",
        "/home/testuser/build-proj",
        "/home/testuser/sdks/v42",
    );
    ctx.gcc_clang_fixes.insert("-gcc1".into());
    ctx.gcc_clang_fixes.insert("-gcc2".into());
    ctx.extra_add_directory = vec!["/extra1".into(), "/extra2".into()];
    ctx
}

fn patched(ctx: &mut PatchContext, input: &str) -> String {
    let mut doc = Document::parse(input).unwrap();
    match patch(ctx, &mut doc).unwrap() {
        PatchOutcome::Changed(text) => text,
        PatchOutcome::Unchanged => panic!("expected the document to change"),
    }
}

fn elements_named(doc: &Document, name: &str) -> Vec<NodeId> {
    let mut found = Vec::new();
    let mut stack = vec![doc.document_node()];
    while let Some(node) = stack.pop() {
        if doc.name(node) == Some(name) {
            found.push(node);
        }
        stack.extend(doc.child_elements(node));
    }
    found
}

fn attribute_values(doc: &Document, element: &str, key: &str) -> Vec<String> {
    let mut values: Vec<String> = elements_named(doc, element)
        .into_iter()
        .filter_map(|n| doc.attribute(n, key).map(str::to_string))
        .collect();
    values.sort();
    values
}

fn embedded_note(doc: &Document) -> Option<SdkNote> {
    elements_named(doc, "notes")
        .into_iter()
        .find_map(|n| doc.text(n).and_then(SdkNote::decode))
}

#[test]
fn test_compiler_add_directory() {
    assert_eq!(
        rewrite_system_path("/usr/test/include", "/home/testuser/sdks/v42", None).as_deref(),
        Some("/home/testuser/sdks/v42/usr/test/include")
    );
}

#[rstest]
fn test_virtual_folders_no_change(context: PatchContext) {
    let mut ctx = context;
    ctx.build_dir = "/home/testuser/build-proj".into();
    let value = r"CMake Files\;CMake Files\..\;CMake Files\..\..\;CMake Files\..\..\..\";
    assert_eq!(remap_virtual_folders(&ctx, value), value);
}

#[rstest]
fn test_virtual_folders_change(context: PatchContext) {
    let mut ctx = context;
    ctx.virtual_folder_prefix = r"..\..\sdk\v43".into();
    assert_eq!(
        remap_virtual_folders(&ctx, r"CMake Files\..\..\..\..\usr\include\someotherlib"),
        r"CMake Files\..\..\sdk\v43\usr\include\someotherlib\"
    );
}

#[rstest]
fn test_first_patch_rewrites_system_paths(context: PatchContext) {
    let mut ctx = context;
    let output = patched(&mut ctx, INPUT);
    let doc = Document::parse(&output).unwrap();

    let dirs = attribute_values(&doc, "Add", "directory");
    assert_eq!(
        dirs,
        vec![
            "/extra1",
            "/extra2",
            "/home/testuser/sdks/v42/usr/include/glib-2.0",
            "/home/testuser/sdks/v42/usr/lib/x86_64-linux-gnu/glib-2.0/include",
            "/home/testuser/src/testproject/include",
        ]
    );

    let units = attribute_values(&doc, "Unit", "filename");
    assert!(units.contains(&"/home/testuser/sdks/v42/usr/share/cmake/Modules/CMakeCXXInformation.cmake".to_string()));
    assert!(units.contains(&"/home/testuser/src/testproject/main.cpp".to_string()));
}

#[rstest]
fn test_first_patch_remaps_virtual_folders(context: PatchContext) {
    let mut ctx = context;
    let output = patched(&mut ctx, INPUT);
    let doc = Document::parse(&output).unwrap();

    assert_eq!(
        attribute_values(&doc, "Option", "virtualFolders"),
        vec![r"CMake Files\;CMake Files\..\..\sdks\v42\usr\share\cmake\Modules\;"]
    );
    assert_eq!(
        attribute_values(&doc, "Option", "virtualFolder"),
        vec![
            r"CMake Files\..\..\sdks\v42\usr\share\cmake\Modules\",
            r"CMake Files\..\src\testproject\",
        ]
    );
}

#[rstest]
fn test_first_patch_embeds_note_first(context: PatchContext) {
    let mut ctx = context;
    let output = patched(&mut ctx, INPUT);
    let doc = Document::parse(&output).unwrap();

    let project = elements_named(&doc, "Project")[0];
    let first = doc.first_child_element(project).unwrap();
    assert_eq!(doc.attribute(first, "show_notes"), Some("0"));
    assert_eq!(
        embedded_note(&doc),
        Some(SdkNote {
            sdk_dir: "/home/testuser/sdks/v42".into(),
            virtual_folder_prefix: r"..\..\sdks\v42".into(),
        })
    );
    assert!(output.contains("<notes><![CDATA[/home/testuser/sdks/v42\n..\\..\\sdks\\v42]]></notes>"));
}

#[rstest]
fn test_fixes_prepended_in_order(context: PatchContext) {
    let mut ctx = context;
    let output = patched(&mut ctx, INPUT);
    let doc = Document::parse(&output).unwrap();

    let compiler = elements_named(&doc, "Compiler")[0];
    let adds: Vec<NodeId> = doc.child_elements(compiler).collect();
    assert_eq!(doc.attribute(adds[0], "option"), Some("-gcc1"));
    assert_eq!(doc.attribute(adds[1], "option"), Some("-gcc2"));
    assert_eq!(doc.attribute(adds[adds.len() - 1], "directory"), Some("/extra2"));
}

#[rstest]
fn test_make_commands_untouched(context: PatchContext) {
    let mut ctx = context;
    let before = Document::parse(INPUT).unwrap();
    let output = patched(&mut ctx, INPUT);
    let after = Document::parse(&output).unwrap();

    for command in ["Build", "CompileFile", "Clean", "DistClean"] {
        assert_eq!(
            attribute_values(&after, command, "command"),
            attribute_values(&before, command, "command")
        );
    }
}

#[rstest]
fn test_second_patch_is_unchanged(context: PatchContext) {
    let mut first = context.clone();
    let output = patched(&mut first, INPUT);

    let mut second = context;
    let mut doc = Document::parse(&output).unwrap();
    assert_eq!(patch(&mut second, &mut doc).unwrap(), PatchOutcome::Unchanged);
    assert_eq!(doc.to_xml_string(), output);
    assert_eq!(second.previous, embedded_note(&doc));
}

#[rstest]
fn test_sdk_change_moves_paths(context: PatchContext) {
    let mut first = context.clone();
    let output = patched(&mut first, INPUT);

    let mut moved = context;
    moved.sdk_dir = "/home/testuser/sdks/v43".into();
    let output = patched(&mut moved, &output);
    let doc = Document::parse(&output).unwrap();

    assert_eq!(
        moved.previous.as_ref().map(|n| n.sdk_dir.as_str()),
        Some("/home/testuser/sdks/v42")
    );
    assert!(!output.contains("sdks/v42"));
    assert!(!output.contains(r"sdks\v42"));
    assert!(attribute_values(&doc, "Add", "directory")
        .contains(&"/home/testuser/sdks/v43/usr/include/glib-2.0".to_string()));
    assert_eq!(
        attribute_values(&doc, "Option", "virtualFolders"),
        vec![r"CMake Files\;CMake Files\..\..\sdks\v43\usr\share\cmake\Modules\;"]
    );
    assert_eq!(embedded_note(&doc).unwrap().sdk_dir, "/home/testuser/sdks/v43");
}

#[rstest]
fn test_extras_only_added_on_first_patch(context: PatchContext) {
    let mut first = context.clone();
    let output = patched(&mut first, INPUT);

    let mut moved = context;
    moved.sdk_dir = "/home/testuser/sdks/v43".into();
    let output = patched(&mut moved, &output);

    assert_eq!(output.matches("option=\"-gcc1\"").count(), 1);
    assert_eq!(output.matches("directory=\"/extra1\"").count(), 1);
    assert_eq!(elements_named(&Document::parse(&output).unwrap(), "notes").len(), 1);
}

#[test]
fn test_end_to_end_sdk_outside_home() {
    let mut ctx = PatchContext::new("/home/testuser/build-proj/proj.cbp", "/home/testuser/build-proj", "/sdk/v42");
    let output = patched(&mut ctx, INPUT);
    let doc = Document::parse(&output).unwrap();

    assert_eq!(ctx.virtual_folder_prefix, r"..\..\..\..\sdk\v42");
    assert!(attribute_values(&doc, "Add", "directory").contains(&"/sdk/v42/usr/include/glib-2.0".to_string()));
    assert!(attribute_values(&doc, "Option", "virtualFolder")
        .contains(&r"CMake Files\..\..\..\..\sdk\v42\usr\share\cmake\Modules\".to_string()));
    // No fixes configured, so the compiler section keeps its three entries.
    let compiler = elements_named(&doc, "Compiler")[0];
    assert_eq!(doc.child_elements(compiler).count(), 3);
}

#[test]
fn test_relative_sdk_is_an_error() {
    let mut ctx = PatchContext::new("/home/testuser/build-proj/proj.cbp", "/home/testuser/build-proj", "relative/sdk");
    let mut doc = Document::parse(INPUT).unwrap();
    let before = doc.to_xml_string();

    assert!(matches!(patch(&mut ctx, &mut doc), Err(Error::RelativePath { .. })));
    assert_eq!(doc.to_xml_string(), before);
}

#[test]
fn test_document_without_system_paths_gets_note_only() {
    let input = "<CodeBlocks_project_file>\n\t<Project>\n\t\t<Option title=\"x\" />\n\t</Project>\n</CodeBlocks_project_file>\n";
    let mut ctx = PatchContext::new("/b/p.cbp", "/b", "/sdk");
    let output = patched(&mut ctx, input);

    assert_eq!(
        output,
        "<CodeBlocks_project_file>\n\
\t<Project>\n\
\t\t<Option show_notes=\"0\">\n\
\t\t\t<notes><![CDATA[/sdk\n..\\..\\sdk]]></notes>\n\
\t\t</Option>\n\
\t\t<Option title=\"x\" />\n\
\t</Project>\n\
</CodeBlocks_project_file>\n"
    );
}

#[test]
fn test_project_without_options_is_patched_once() {
    let input = "<CodeBlocks_project_file>\n\
\t<Project>\n\
\t\t<Build>\n\
\t\t\t<Target title=\"x\">\n\
\t\t\t\t<Compiler>\n\
\t\t\t\t\t<Add directory=\"/usr/include\" />\n\
\t\t\t\t</Compiler>\n\
\t\t\t</Target>\n\
\t\t</Build>\n\
\t</Project>\n\
</CodeBlocks_project_file>\n";
    let mut ctx = PatchContext::new("/b/p.cbp", "/b", "/sdk");
    ctx.extra_add_directory = vec!["/extra".into()];
    ctx.gcc_clang_fixes.insert("-fix".into());

    let mut first = ctx.clone();
    let output = patched(&mut first, input);
    let mut doc = Document::parse(&output).unwrap();
    assert_eq!(embedded_note(&doc).map(|n| n.sdk_dir), Some("/sdk".to_string()));

    let mut second = ctx;
    assert_eq!(patch(&mut second, &mut doc).unwrap(), PatchOutcome::Unchanged);
    assert_eq!(doc.to_xml_string(), output);
    assert_eq!(output.matches("option=\"-fix\"").count(), 1);
    assert_eq!(output.matches("directory=\"/extra\"").count(), 1);
}
