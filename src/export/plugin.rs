// src/export/plugin.rs

//! Synthesized `.claude-plugin/plugin.json`

use crate::error::Result;
use crate::packages::{FileType, PackageRecord};
use serde::Serialize;

/// Author recorded when a package has none
pub const DEFAULT_PLUGIN_AUTHOR: &str = "synaptic-canvas";

#[derive(Debug, Serialize)]
struct PluginAuthor<'a> {
    name: &'a str,
}

/// Field order here is the order written to disk
#[derive(Debug, Serialize)]
struct PluginDescriptor<'a> {
    name: &'a str,
    description: &'a str,
    version: &'a str,
    author: PluginAuthor<'a>,
    license: &'a str,
    keywords: &'a [String],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    commands: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    agents: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    skills: Vec<String>,
}

fn references(pkg: &PackageRecord, file_type: FileType) -> Vec<String> {
    let mut paths: Vec<String> = pkg
        .files
        .iter()
        .filter(|f| f.file_type == file_type)
        .map(|f| format!("./{}", f.dest_path))
        .collect();
    paths.sort();
    paths
}

/// Render the plugin descriptor for a package that does not store one
pub fn build_plugin_descriptor(pkg: &PackageRecord) -> Result<String> {
    let author = if pkg.author.is_empty() {
        DEFAULT_PLUGIN_AUTHOR
    } else {
        &pkg.author
    };

    let descriptor = PluginDescriptor {
        name: &pkg.name,
        description: &pkg.description,
        version: &pkg.version,
        author: PluginAuthor { name: author },
        license: &pkg.license,
        keywords: &pkg.tags,
        commands: references(pkg, FileType::Command),
        agents: references(pkg, FileType::Agent),
        skills: references(pkg, FileType::Skill),
    };

    let mut json = serde_json::to_string_pretty(&descriptor)?;
    json.push('\n');
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packages::FileRecord;

    #[test]
    fn test_descriptor_layout() {
        let mut pkg = PackageRecord::new("sc-delay");
        pkg.version = "0.4.0".to_string();
        pkg.description = "Délai".to_string();
        pkg.tags = vec!["delay".to_string()];
        for path in ["commands/b.md", "commands/a.md", "scripts/run.py"] {
            pkg.files
                .push(FileRecord::from_content("sc-delay", path, String::new(), None));
        }

        let json = build_plugin_descriptor(&pkg).unwrap();
        assert_eq!(
            json,
            r#"{
  "name": "sc-delay",
  "description": "Délai",
  "version": "0.4.0",
  "author": {
    "name": "synaptic-canvas"
  },
  "license": "MIT",
  "keywords": [
    "delay"
  ],
  "commands": [
    "./commands/a.md",
    "./commands/b.md"
  ]
}
"#
        );
    }

    #[test]
    fn test_author_and_empty_keywords() {
        let mut pkg = PackageRecord::new("p");
        pkg.author = "randlee".to_string();

        let json = build_plugin_descriptor(&pkg).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["author"]["name"], "randlee");
        assert_eq!(parsed["keywords"], serde_json::json!([]));
        assert!(parsed.get("agents").is_none());
    }
}
