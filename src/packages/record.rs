// src/packages/record.rs

//! The in-memory shape of a package, shared by ingest and export

use crate::codec::{Mapping, Value};
use crate::hash::sha256_hex;
use crate::packages::classify::{classify, is_template, ContentType, FileType};

/// Dependency kind recorded for every `requires` entry
pub const DEP_TYPE_TOOL: &str = "tool";

/// Package-level metadata plus its owned files and dependencies
#[derive(Debug, Clone, PartialEq)]
pub struct PackageRecord {
    pub id: String,
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
    pub license: String,
    pub tags: Vec<String>,
    pub install_scope: String,
    pub variables: Option<Value>,
    pub options: Option<Value>,
    pub files: Vec<FileRecord>,
    pub deps: Vec<DepRecord>,
}

impl PackageRecord {
    /// Create a record with default metadata and no children
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            version: "0.0.0".to_string(),
            description: String::new(),
            author: String::new(),
            license: "MIT".to_string(),
            tags: Vec::new(),
            install_scope: "any".to_string(),
            variables: None,
            options: None,
            files: Vec::new(),
            deps: Vec::new(),
        }
    }

    /// Tags in their stored form
    pub fn tags_joined(&self) -> String {
        self.tags.join(",")
    }

    pub fn file(&self, dest_path: &str) -> Option<&FileRecord> {
        self.files.iter().find(|f| f.dest_path == dest_path)
    }
}

/// Split a stored or declared tag string into trimmed, non-empty tags
pub fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// One file of a package with its derived metadata
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    pub package_id: String,
    /// Package-relative, `/`-separated
    pub dest_path: String,
    /// Exact file text, never normalized
    pub content: String,
    pub sha256: String,
    pub file_type: FileType,
    pub content_type: ContentType,
    pub is_template: bool,
    pub frontmatter: Option<Frontmatter>,
}

impl FileRecord {
    /// Build a record from a path and its content, deriving every other field
    pub fn from_content(
        package_id: &str,
        dest_path: &str,
        content: String,
        frontmatter: Option<Frontmatter>,
    ) -> Self {
        let (file_type, content_type) = classify(dest_path);
        Self {
            package_id: package_id.to_string(),
            dest_path: dest_path.to_string(),
            sha256: sha256_hex(content.as_bytes()),
            is_template: is_template(&content),
            content,
            file_type,
            content_type,
            frontmatter,
        }
    }
}

/// Metadata parsed from a markdown file's leading `---` block
#[derive(Debug, Clone, PartialEq)]
pub struct Frontmatter {
    pub name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub model: Option<String>,
    pub raw: Mapping,
}

impl Frontmatter {
    pub fn from_mapping(raw: Mapping) -> Self {
        Self {
            name: raw.get_text("name"),
            description: raw.get_text("description"),
            version: raw.get_text("version"),
            model: raw.get_text("model"),
            raw,
        }
    }
}

/// A runtime requirement of a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepRecord {
    pub package_id: String,
    pub dep_type: String,
    pub dep_name: String,
    pub dep_spec: String,
}

impl DepRecord {
    /// Build a tool dependency from a requirement string such as `git >= 2.20`
    pub fn from_requirement(package_id: &str, requirement: &str) -> Self {
        let (dep_name, dep_spec) = parse_requirement(requirement);
        Self {
            package_id: package_id.to_string(),
            dep_type: DEP_TYPE_TOOL.to_string(),
            dep_name,
            dep_spec,
        }
    }

    /// The requirement string as written in a manifest
    pub fn requirement(&self) -> String {
        if self.dep_spec.is_empty() {
            self.dep_name.clone()
        } else {
            format!("{} {}", self.dep_name, self.dep_spec)
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '+' | '-')
}

/// Split a requirement into name and version spec
///
/// The name is the leading run of word characters, `.`, `+` and `-`; the
/// spec is the trimmed remainder. Without a leading name character the whole
/// string is the name.
pub fn parse_requirement(requirement: &str) -> (String, String) {
    let end = requirement
        .char_indices()
        .find(|(_, c)| !is_name_char(*c))
        .map(|(i, _)| i)
        .unwrap_or(requirement.len());

    if end == 0 {
        return (requirement.to_string(), String::new());
    }

    (
        requirement[..end].to_string(),
        requirement[end..].trim().to_string(),
    )
}
