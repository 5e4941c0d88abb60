// src/packages/classify.rs

//! Path-based file classification
//!
//! Every package file gets a role (`FileType`) from its top-level directory
//! and a content kind (`ContentType`) from its extension. Both lookups are
//! pure, total and case-insensitive: anything unrecognized lands in
//! `config` / `text`. Skipped names match exactly.

use std::str::FromStr;

/// Names that are never treated as package content, in any path component
pub const SKIP_NAMES: &[&str] = &[
    "__pycache__",
    ".git",
    "node_modules",
    "tests",
    "test",
    ".sc-prefix-verified",
    "README.md",
    "CHANGELOG.md",
    "LICENSE",
    "TROUBLESHOOTING.md",
    "USE-CASES.md",
    "DESIGN.md",
    "manifest.yaml",
];

/// Directory prefix to file role
const FILE_TYPE_PREFIXES: &[(&str, FileType)] = &[
    ("agents/", FileType::Agent),
    ("commands/", FileType::Command),
    ("skills/", FileType::Skill),
    ("scripts/", FileType::Script),
    ("hooks/", FileType::Hook),
];

/// Extension to content kind
const CONTENT_TYPE_EXTENSIONS: &[(&str, ContentType)] = &[
    (".md", ContentType::Markdown),
    (".py", ContentType::Python),
    (".json", ContentType::Json),
    (".yaml", ContentType::Yaml),
    (".yml", ContentType::Yaml),
    (".sh", ContentType::Shell),
    (".bash", ContentType::Shell),
];

/// Artifact sections of a manifest, in the order they are written
pub const MANIFEST_SECTION_ORDER: &[&str] = &["commands", "skills", "agents", "scripts", "config"];

/// Role of a file inside a package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Agent,
    Command,
    Skill,
    Script,
    Hook,
    /// Default for anything outside the known directories
    Config,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Command => "command",
            Self::Skill => "skill",
            Self::Script => "script",
            Self::Hook => "hook",
            Self::Config => "config",
        }
    }

    /// Manifest `artifacts` section listing files of this role
    ///
    /// Hooks are listed with scripts.
    pub fn manifest_section(&self) -> &'static str {
        match self {
            Self::Agent => "agents",
            Self::Command => "commands",
            Self::Skill => "skills",
            Self::Script | Self::Hook => "scripts",
            Self::Config => "config",
        }
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "agent" => Ok(Self::Agent),
            "command" => Ok(Self::Command),
            "skill" => Ok(Self::Skill),
            "script" => Ok(Self::Script),
            "hook" => Ok(Self::Hook),
            "config" => Ok(Self::Config),
            _ => Err(format!("unknown file type: {}", s)),
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of content a file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Markdown,
    Python,
    Json,
    Yaml,
    Shell,
    Text,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Python => "python",
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Shell => "shell",
            Self::Text => "text",
        }
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "markdown" => Ok(Self::Markdown),
            "python" => Ok(Self::Python),
            "json" => Ok(Self::Json),
            "yaml" => Ok(Self::Yaml),
            "shell" => Ok(Self::Shell),
            "text" => Ok(Self::Text),
            _ => Err(format!("unknown content type: {}", s)),
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classify a package-relative path into its role and content kind
pub fn classify(path: &str) -> (FileType, ContentType) {
    let lower = path.to_ascii_lowercase();

    let file_type = FILE_TYPE_PREFIXES
        .iter()
        .find(|(prefix, _)| lower.starts_with(*prefix))
        .map(|(_, t)| *t)
        .unwrap_or(FileType::Config);

    let content_type = CONTENT_TYPE_EXTENSIONS
        .iter()
        .find(|(ext, _)| lower.ends_with(*ext))
        .map(|(_, t)| *t)
        .unwrap_or(ContentType::Text);

    (file_type, content_type)
}

/// Whether any component of a relative path is a skipped name
pub fn is_skipped(path: &str) -> bool {
    path.split(['/', '\\']).any(is_skipped_name)
}

/// Whether a single file or directory name is skipped
pub fn is_skipped_name(name: &str) -> bool {
    SKIP_NAMES.contains(&name)
}

/// Content with both `{{` and `}}` is a substitution template
pub fn is_template(content: &str) -> bool {
    content.contains("{{") && content.contains("}}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_prefix() {
        assert_eq!(classify("commands/run.md"), (FileType::Command, ContentType::Markdown));
        assert_eq!(classify("agents/runner.md"), (FileType::Agent, ContentType::Markdown));
        assert_eq!(classify("skills/x/SKILL.md"), (FileType::Skill, ContentType::Markdown));
        assert_eq!(classify("scripts/run.py"), (FileType::Script, ContentType::Python));
        assert_eq!(classify("hooks/pre.sh"), (FileType::Hook, ContentType::Shell));
        assert_eq!(
            classify(".claude-plugin/plugin.json"),
            (FileType::Config, ContentType::Json)
        );
    }

    #[test]
    fn test_classify_defaults_and_case() {
        assert_eq!(classify("notes"), (FileType::Config, ContentType::Text));
        assert_eq!(classify("Commands/RUN.MD"), (FileType::Command, ContentType::Markdown));
        assert_eq!(classify("config/settings.YML"), (FileType::Config, ContentType::Yaml));
        assert_eq!(classify("scripts/tool.bash"), (FileType::Script, ContentType::Shell));
        // Prefix must be a directory, not a name fragment
        assert_eq!(classify("commandsx.md"), (FileType::Config, ContentType::Markdown));
    }

    #[test]
    fn test_classify_is_pure() {
        for path in ["agents/a.md", "scripts/b.py", "x.txt"] {
            assert_eq!(classify(path), classify(path));
        }
    }

    #[test]
    fn test_is_skipped() {
        assert!(is_skipped("README.md"));
        assert!(is_skipped("scripts/__pycache__/x.pyc"));
        assert!(is_skipped("tests/test_run.py"));
        assert!(is_skipped("manifest.yaml"));
        assert!(!is_skipped("readme.md"));
        assert!(!is_skipped("scripts/Tests/run.py"));
        assert!(!is_skipped("commands/run.md"));
        assert!(!is_skipped("scripts/testing.py"));
    }

    #[test]
    fn test_is_template() {
        assert!(is_template("Hello {{NAME}}"));
        assert!(!is_template("Hello {{NAME"));
        assert!(!is_template("plain"));
        assert!(is_template("}} before {{"));
    }

    #[test]
    fn test_type_strings_round_trip() {
        for t in [
            FileType::Agent,
            FileType::Command,
            FileType::Skill,
            FileType::Script,
            FileType::Hook,
            FileType::Config,
        ] {
            assert_eq!(t.as_str().parse::<FileType>(), Ok(t));
        }
        assert_eq!("python".parse::<ContentType>(), Ok(ContentType::Python));
        assert!("bogus".parse::<ContentType>().is_err());
    }

    #[test]
    fn test_hooks_listed_with_scripts() {
        assert_eq!(FileType::Hook.manifest_section(), "scripts");
        assert_eq!(FileType::Config.manifest_section(), "config");
    }
}
