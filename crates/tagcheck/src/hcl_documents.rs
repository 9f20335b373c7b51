//! collection of terraform source documents ([Body] or JSON and path to source file)
//!
//! [HclDocuments] tracks
//! - the source path and its text (used to turn byte offsets into line numbers)
//! - the root blocks of every `.tf` document
//! - the root object of every `.tf.json` document
//! and defines a numeric index for each. Once added those indices are stable (removal is not possible)
use hcl_edit::structure::{Block, Body, Structure};
use std::path::{Path, PathBuf};

#[derive(Default, Debug)]
pub struct HclDocuments {
    sources: Vec<SourceFile>,
    root_blocks: Vec<(usize, Block)>,
    json_documents: Vec<(usize, serde_json::Value)>,
}

#[derive(Debug, derive_new::new)]
pub struct SourceFile {
    pub path: Option<PathBuf>,
    text: String,
}

impl SourceFile {
    /// 1-based line number of a byte offset
    pub fn line_of(&self, offset: usize) -> usize {
        let end = offset.min(self.text.len());
        self.text.as_bytes()[..end]
            .iter()
            .filter(|byte| **byte == b'\n')
            .count()
            + 1
    }
}

impl HclDocuments {
    /// Inserts and indexes an hcl document
    pub fn insert(&mut self, document: Body, text: impl Into<String>, path: impl Into<Option<PathBuf>>) {
        let source_index = self.sources.len();
        self.sources.push(SourceFile::new(path.into(), text.into()));

        for structure in document.into_iter() {
            // root attributes carry no declarations
            if let Structure::Block(block) = structure {
                self.root_blocks.push((source_index, block));
            }
        }
    }

    /// Inserts and indexes a document in JSON syntax
    pub fn insert_json(
        &mut self,
        document: serde_json::Value,
        text: impl Into<String>,
        path: impl Into<Option<PathBuf>>,
    ) {
        let source_index = self.sources.len();
        self.sources.push(SourceFile::new(path.into(), text.into()));
        self.json_documents.push((source_index, document));
    }

    /// Parses `text` as hcl and inserts it
    pub fn insert_str(&mut self, text: &str, path: impl Into<Option<PathBuf>>) -> Result<(), LoadError> {
        let body = hcl_edit::parser::parse_body(text)?;
        self.insert(body, text, path);
        Ok(())
    }

    pub fn blocks(&self) -> impl Iterator<Item = SourceBlock> {
        self.root_blocks
            .iter()
            .enumerate()
            .map(|(index, (source_index, block))| (index, &self.sources[*source_index], block))
    }

    pub fn json_documents(&self) -> impl Iterator<Item = (&SourceFile, &serde_json::Value)> {
        self.json_documents
            .iter()
            .map(|(source_index, document)| (&self.sources[*source_index], document))
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}

impl HclDocuments {
    pub fn load_file(&mut self, file_path: &Path) -> Result<(), LoadError> {
        let file_path = file_path.canonicalize()?;
        tracing::info!(path=%file_path.display(), "loading file");

        let file_contents = std::fs::read_to_string(&file_path)?;
        if is_json_source(&file_path) {
            let document = serde_json::from_str(&file_contents)?;
            self.insert_json(document, file_contents, Some(file_path));
            return Ok(());
        }

        let body = hcl_edit::parser::parse_body(&file_contents)?;
        self.insert(body, file_contents, Some(file_path));
        Ok(())
    }

    /// Recursively loads every `.tf` and `.tf.json` file below `dir_path`
    ///
    /// Directories named in `skip_dirs` are not entered. A file that fails to load is skipped and
    /// reported in the returned list, loading continues with the rest of the tree.
    pub fn load_directory(
        &mut self,
        dir_path: &Path,
        skip_dirs: &[String],
    ) -> Result<Vec<FileDiagnostic>, LoadError> {
        if !dir_path.is_dir() {
            return Err(LoadError::NotADirectory(dir_path.to_path_buf()));
        }

        tracing::info!(directory=%dir_path.display(), "loading directory");
        let mut diagnostics = vec![];
        self.walk(dir_path, skip_dirs, &mut diagnostics)?;
        Ok(diagnostics)
    }

    fn walk(
        &mut self,
        dir_path: &Path,
        skip_dirs: &[String],
        diagnostics: &mut Vec<FileDiagnostic>,
    ) -> Result<(), LoadError> {
        let mut entries = std::fs::read_dir(dir_path)?.collect::<Result<Vec<_>, _>>()?;
        // stable load order
        entries.sort_by_key(|entry| entry.file_name());

        for dir_entry in entries {
            let file_type = dir_entry.file_type()?;
            let file_name = dir_entry.file_name().to_string_lossy().to_string();
            let path = dir_entry.path();

            if file_type.is_dir() {
                if skip_dirs.iter().any(|skip| skip == &file_name) {
                    tracing::debug!(path=%path.display(), "skipping directory");
                    continue;
                }
                self.walk(&path, skip_dirs, diagnostics)?;
                continue;
            }

            if !file_type.is_file() || !is_source_file_name(&file_name) {
                continue;
            }

            if let Err(error) = self.load_file(&path) {
                tracing::warn!(path=%path.display(), %error, "skipping file");
                diagnostics.push(FileDiagnostic::new(path, error));
            }
        }

        Ok(())
    }
}

pub fn is_source_file_name(file_name: &str) -> bool {
    file_name.ends_with(".tf") || file_name.ends_with(".tf.json")
}

fn is_json_source(path: &Path) -> bool {
    path.to_string_lossy().ends_with(".json")
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("Unable to parse hcl file: {0}")]
    HclParseFailed(#[from] hcl_edit::parser::Error),
    #[error("Unable to parse json file: {0}")]
    JsonParseFailed(#[from] serde_json::Error),
}

/// A file that was skipped while loading a tree
#[derive(Debug, derive_new::new)]
pub struct FileDiagnostic {
    pub path: PathBuf,
    pub error: LoadError,
}

impl std::fmt::Display for FileDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.error)
    }
}

/// Utility macro to create [HclDocuments]
///
/// Create from a single document
/// ```
/// # use tagcheck::hcl_documents;
/// hcl_documents!(r#"variable "region" {}"#);
/// ```
///
/// Create from multiple documents (path required)
/// ```
/// # use tagcheck::hcl_documents;
/// hcl_documents! {
///   "variables.tf" => r#"variable "region" {}"#,
///   "locals.tf" => "locals {\n  name = var.region\n}"
/// };
/// ```
///
/// # Panic
/// Panics on invalid input
///
/// ```should_panic
/// # use tagcheck::hcl_documents;
/// hcl_documents!("not = valid = hcl");
/// ```
#[macro_export]
macro_rules! hcl_documents {
    // single document without source
    { $expr:expr } => {{
        let mut docs = $crate::hcl_documents::HclDocuments::default();
        docs.insert_str($expr, None).expect("body must parse");
        docs
    }};
    // multi document with sources
    { $($source:expr => $expr:expr),+ } => {{
        let mut docs = $crate::hcl_documents::HclDocuments::default();
        $(
            docs.insert_str($expr, Some(std::path::PathBuf::from($source))).expect("body must parse");
        )+

        docs
    }};
}

pub type SourceBlock<'a> = (usize, &'a SourceFile, &'a Block);

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn iterators() {
        let hcl_documents = hcl_documents! {r#"
        attr_1 = 1
        variable "one" {}
        locals {}
        attr_2 = 2
        "#};

        assert_eq!(hcl_documents.blocks().count(), 2);
        assert_eq!(hcl_documents.source_count(), 1);
    }

    #[test]
    fn line_numbers() {
        let source = SourceFile::new(None, "a\nb\nc".to_string());
        assert_eq!(source.line_of(0), 1);
        assert_eq!(source.line_of(2), 2);
        assert_eq!(source.line_of(100), 3);
    }

    #[test]
    fn directory_walk_skips_broken_files_and_cache_dirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.tf"), "variable \"a\" {}").unwrap();
        std::fs::write(dir.path().join("broken.tf"), "variable \"b\" {").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        std::fs::create_dir(dir.path().join(".terraform")).unwrap();
        std::fs::write(dir.path().join(".terraform/cached.tf"), "variable \"c\" {}").unwrap();
        std::fs::create_dir(dir.path().join("module")).unwrap();
        std::fs::write(dir.path().join("module/vars.tf.json"), r#"{"variable": {}}"#).unwrap();

        let mut documents = HclDocuments::default();
        let diagnostics = documents
            .load_directory(dir.path(), &[".terraform".to_string()])
            .unwrap();

        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].path.ends_with("broken.tf"));
        assert_eq!(documents.blocks().count(), 1);
        assert_eq!(documents.json_documents().count(), 1);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let mut documents = HclDocuments::default();
        let result = documents.load_directory(Path::new("/definitely/not/here"), &[]);
        assert!(matches!(result, Err(LoadError::NotADirectory(_))));
    }
}
