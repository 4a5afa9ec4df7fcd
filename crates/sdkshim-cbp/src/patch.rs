//! SDK rewriting for Code::Blocks project files
//!
//! The walk is breadth-first over (node, parent) pairs and only touches:
//!
//! - `Compiler/Add@directory` and every `Unit@filename`: `/usr/...` is
//!   re-rooted under the SDK directory
//! - `Unit/Option@virtualFolder` and `Project/Option@virtualFolders`:
//!   virtual folders that resolve into `/usr/...` are re-rooted under the
//!   relative path to the SDK
//! - `Project/Option[show_notes]/notes`: the embedded note recording the
//!   SDK directory and virtual-folder prefix of the last patch
//!
//! Everything else passes through unchanged. Whether the file changed is
//! decided by comparing the serialized document before and after the walk.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use sdkshim_fs::{NormalizedPath, simplify};

use crate::xml::{Document, NodeId};
use crate::{Error, Result};

/// Literal prefix of every virtual-folder token.
pub const VIRTUAL_FOLDER_PREFIX: &str = "CMake Files\\";

/// Marker of a system path that belongs inside the SDK tree.
const SYSTEM_ROOT: &str = "/usr/";

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// Children of `MakeCommands` reserved for command rewriting.
const MAKE_COMMANDS: [&str; 4] = ["Build", "CompileFile", "Clean", "DistClean"];

/// SDK binding stored inside a patched document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SdkNote {
    pub sdk_dir: String,
    pub virtual_folder_prefix: String,
}

impl SdkNote {
    /// Decode note text: SDK directory and prefix on separate lines. A
    /// literal CDATA wrapper is stripped first.
    pub fn decode(text: &str) -> Option<Self> {
        let data = text
            .strip_prefix(CDATA_OPEN)
            .and_then(|rest| rest.strip_suffix(CDATA_CLOSE))
            .unwrap_or(text);

        let mut fields = data.split('\n').map(|f| f.trim_end_matches('\r'));
        let sdk_dir = fields.next()?.to_string();
        let virtual_folder_prefix = fields.next()?.to_string();
        Some(Self {
            sdk_dir,
            virtual_folder_prefix,
        })
    }

    pub fn encode(&self) -> String {
        format!("{}\n{}", self.sdk_dir, self.virtual_folder_prefix)
    }
}

/// Per-document patch parameters.
#[derive(Debug, Clone, Default)]
pub struct PatchContext {
    pub file_path: String,
    pub build_dir: String,
    pub sdk_dir: String,
    pub extra_add_directory: Vec<String>,
    pub gcc_clang_fixes: BTreeSet<String>,

    /// `..\` followed by the backslash-separated path from the file's
    /// directory to the SDK. Filled in by [`patch`].
    pub virtual_folder_prefix: String,

    /// Binding decoded from the document's note, if one was present.
    pub previous: Option<SdkNote>,
}

impl PatchContext {
    pub fn new(
        file_path: impl Into<String>,
        build_dir: impl Into<String>,
        sdk_dir: impl Into<String>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            build_dir: build_dir.into(),
            sdk_dir: sdk_dir.into(),
            ..Default::default()
        }
    }

    /// Compute [`PatchContext::virtual_folder_prefix`] from the file path
    /// and the SDK directory.
    pub fn compute_virtual_folder_prefix(&mut self) -> Result<&str> {
        let file = NormalizedPath::new(&self.file_path).simplify();
        let dir = file.parent().unwrap_or_else(|| NormalizedPath::new("."));
        let relative = NormalizedPath::new(&self.sdk_dir)
            .relative_to(&dir)
            .map_err(|_| Error::RelativePath {
                from: dir.to_string(),
                to: self.sdk_dir.clone(),
            })?;

        self.virtual_folder_prefix = format!("..\\{}", relative.as_str().replace('/', "\\"));
        Ok(&self.virtual_folder_prefix)
    }

    fn current_note(&self) -> SdkNote {
        SdkNote {
            sdk_dir: self.sdk_dir.clone(),
            virtual_folder_prefix: self.virtual_folder_prefix.clone(),
        }
    }

    fn previous_sdk_dir(&self) -> Option<&str> {
        self.previous.as_ref().map(|n| n.sdk_dir.as_str())
    }

    /// The prior prefix, only when it differs from the current one.
    fn stale_prefix(&self) -> Option<&str> {
        self.previous
            .as_ref()
            .map(|n| n.virtual_folder_prefix.as_str())
            .filter(|p| !p.is_empty() && *p != self.virtual_folder_prefix)
    }
}

/// Result of a successful [`patch`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    /// The document changed; carries the new serialization.
    Changed(String),
    Unchanged,
}

impl PatchOutcome {
    pub fn status(&self) -> PatchStatus {
        match self {
            PatchOutcome::Changed(_) => PatchStatus::Changed,
            PatchOutcome::Unchanged => PatchStatus::Unchanged,
        }
    }
}

/// Per-file outcome reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchStatus {
    Changed,
    Unchanged,
    Error,
}

impl PatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatchStatus::Changed => "Changed",
            PatchStatus::Unchanged => "Unchanged",
            PatchStatus::Error => "Error",
        }
    }
}

impl fmt::Display for PatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&Result<PatchOutcome>> for PatchStatus {
    fn from(result: &Result<PatchOutcome>) -> Self {
        match result {
            Ok(outcome) => outcome.status(),
            Err(_) => PatchStatus::Error,
        }
    }
}

/// Re-root the `/usr/...` part of `value` under `sdk_dir`.
///
/// A value already under the current or previous SDK directory is
/// re-rooted from there, so repeated patches and SDK moves stay stable.
/// Returns `None` when the value has no system part or would not change.
pub fn rewrite_system_path(value: &str, sdk_dir: &str, previous_sdk_dir: Option<&str>) -> Option<String> {
    let mut rest = value;
    for root in [Some(sdk_dir), previous_sdk_dir].into_iter().flatten() {
        if root.is_empty() {
            continue;
        }
        if let Some(stripped) = value.strip_prefix(root)
            && stripped.starts_with('/')
        {
            rest = stripped;
            break;
        }
    }

    let idx = rest.find(SYSTEM_ROOT)?;
    let rewritten = simplify(&format!("{}{}", sdk_dir, &rest[idx..]));
    (rewritten != value).then_some(rewritten)
}

/// Rewrite a `;`-separated list of `CMake Files\...` tokens.
///
/// Each token is resolved against the build directory; when it lands in
/// `/usr/...` it is re-rooted under the virtual-folder prefix, otherwise
/// the simplified token is kept. Tokens without the literal prefix pass
/// through untouched. Every rewritten token ends with a separator.
pub fn remap_virtual_folders(context: &PatchContext, value: &str) -> String {
    value
        .split(';')
        .map(|token| remap_virtual_folder(context, token))
        .collect::<Vec<_>>()
        .join(";")
}

fn remap_virtual_folder(context: &PatchContext, token: &str) -> String {
    let Some(rest) = token.strip_prefix(VIRTUAL_FOLDER_PREFIX) else {
        return token.to_string();
    };

    let mut virtual_path = match context
        .stale_prefix()
        .and_then(|stale| strip_dir_prefix(rest, stale))
    {
        // Rooted under a previous SDK; move it to the current one.
        Some(tail) => format!("{}{}", context.virtual_folder_prefix, tail),
        None => {
            let resolved = simplify(&format!(
                "{}/{}",
                context.build_dir,
                rest.replace('\\', "/")
            ));
            if resolved.starts_with(SYSTEM_ROOT) {
                format!(
                    "{}\\{}",
                    context.virtual_folder_prefix.trim_end_matches('\\'),
                    resolved.trim_start_matches('/').replace('/', "\\")
                )
            } else {
                simplify(rest).replace('/', "\\")
            }
        }
    };

    if !virtual_path.is_empty() && !virtual_path.ends_with(['\\', '/']) {
        virtual_path.push('\\');
    }
    format!("{VIRTUAL_FOLDER_PREFIX}{virtual_path}")
}

/// `rest` without the leading directory `dir`, keeping the separator.
fn strip_dir_prefix<'a>(rest: &'a str, dir: &str) -> Option<&'a str> {
    let tail = rest.strip_prefix(dir.trim_end_matches('\\'))?;
    (tail.is_empty() || tail.starts_with('\\')).then_some(tail)
}

fn rewrite_attribute(doc: &mut Document, node: NodeId, key: &str, context: &PatchContext) {
    let Some(value) = doc.attribute(node, key) else {
        return;
    };
    if let Some(rewritten) = rewrite_system_path(value, &context.sdk_dir, context.previous_sdk_dir()) {
        tracing::trace!(attribute = key, from = value, to = %rewritten, "rewrite system path");
        doc.set_attribute(node, key, &rewritten);
    }
}

fn remap_attribute(doc: &mut Document, node: NodeId, key: &str, context: &PatchContext) {
    let Some(value) = doc.attribute(node, key) else {
        return;
    };
    if value.is_empty() {
        return;
    }
    let remapped = remap_virtual_folders(context, value);
    if remapped != value {
        tracing::trace!(attribute = key, from = value, to = %remapped, "remap virtual folders");
        doc.set_attribute(node, key, &remapped);
    }
}

/// The `notes` element of a `Project/Option[show_notes]` node.
fn note_element(doc: &Document, option: NodeId) -> Option<NodeId> {
    doc.attribute(option, "show_notes").filter(|v| !v.is_empty())?;
    doc.first_child_element(option)
}

/// Find the first embedded note anywhere in the document.
fn find_note(doc: &Document) -> Option<NodeId> {
    let mut queue: VecDeque<NodeId> = doc.child_elements(doc.document_node()).collect();
    while let Some(node) = queue.pop_front() {
        if doc.name(node) == Some("Option")
            && doc.parent(node).and_then(|p| doc.name(p)) == Some("Project")
            && let Some(notes) = note_element(doc, node)
        {
            return Some(notes);
        }
        queue.extend(doc.child_elements(node));
    }
    None
}

fn insert_note(doc: &mut Document, project: NodeId, note: &SdkNote) {
    let option = doc.create_element("Option");
    doc.set_attribute(option, "show_notes", "0");
    let notes = doc.create_element("notes");
    let text = doc.create_cdata(&note.encode());
    doc.append_child(notes, text);
    doc.append_child(option, notes);
    doc.insert_child(project, 0, option);
}

fn augment_compiler(doc: &mut Document, compiler: NodeId, context: &PatchContext) {
    for dir in &context.extra_add_directory {
        let dir = rewrite_system_path(dir, &context.sdk_dir, None).unwrap_or_else(|| dir.clone());
        let add = doc.create_element("Add");
        doc.set_attribute(add, "directory", &dir);
        doc.append_child(compiler, add);
    }

    for (index, fix) in context.gcc_clang_fixes.iter().enumerate() {
        let add = doc.create_element("Add");
        doc.set_attribute(add, "option", fix);
        doc.insert_child(compiler, index, add);
    }
}

/// Patch one project document in place.
///
/// Returns [`PatchOutcome::Changed`] with the new serialization when the
/// document text differs from the input, [`PatchOutcome::Unchanged`] when
/// the embedded note already records the current SDK binding or nothing
/// needed rewriting. Fails when no relative path from the file to the SDK
/// exists.
pub fn patch(context: &mut PatchContext, doc: &mut Document) -> Result<PatchOutcome> {
    context.compute_virtual_folder_prefix()?;
    let original = doc.to_xml_string();
    let current = context.current_note();

    let existing_note = find_note(doc);
    let first_time = existing_note.is_none();
    if let Some(notes) = existing_note {
        context.previous = doc.text(notes).and_then(SdkNote::decode);
        if context.previous.as_ref() == Some(&current) {
            tracing::debug!(file = %context.file_path, "note matches current SDK");
            return Ok(PatchOutcome::Unchanged);
        }
    }

    let mut note_seen = !first_time;
    let mut first_project = None;
    let mut queue: VecDeque<(NodeId, Option<NodeId>)> = doc
        .child_elements(doc.document_node())
        .map(|child| (child, None))
        .collect();

    while let Some((node, parent)) = queue.pop_front() {
        let name = doc.name(node).unwrap_or_default().to_string();
        let parent_name = parent
            .and_then(|p| doc.name(p))
            .unwrap_or_default()
            .to_string();

        if name == "Project" && first_project.is_none() {
            first_project = Some(node);
        }

        if name == "Unit" {
            rewrite_attribute(doc, node, "filename", context);
        }

        match (parent_name.as_str(), name.as_str()) {
            ("Compiler", "Add") => rewrite_attribute(doc, node, "directory", context),
            ("MakeCommands", command) if MAKE_COMMANDS.contains(&command) => {}
            ("Unit", "Option") => remap_attribute(doc, node, "virtualFolder", context),
            ("Project", "Option") => match note_element(doc, node) {
                Some(notes) => {
                    doc.set_text(notes, &current.encode());
                    note_seen = true;
                }
                None => {
                    remap_attribute(doc, node, "virtualFolders", context);
                    if !note_seen && let Some(project) = parent {
                        insert_note(doc, project, &current);
                        note_seen = true;
                    }
                }
            },
            _ => {}
        }

        if first_time && name == "Compiler" {
            augment_compiler(doc, node, context);
        }

        let children: Vec<NodeId> = doc.child_elements(node).collect();
        queue.extend(children.into_iter().map(|child| (child, Some(node))));
    }

    // Projects without any Option still carry the note.
    if !note_seen && let Some(project) = first_project {
        insert_note(doc, project, &current);
    }

    let modified = doc.to_xml_string();
    if modified == original {
        Ok(PatchOutcome::Unchanged)
    } else {
        tracing::debug!(file = %context.file_path, first_time, "project file changed");
        Ok(PatchOutcome::Changed(modified))
    }
}
