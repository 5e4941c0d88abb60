// src/export/manifest.rs

//! Rebuild `manifest.yaml` from a stored package

use crate::codec::{
    render_entry, render_flow_list, render_folded, render_scalar, resolve_plain, Value,
};
use crate::packages::classify::MANIFEST_SECTION_ORDER;
use crate::packages::{PackageRecord, PLUGIN_DESCRIPTOR};
use std::collections::BTreeMap;

/// Text fields that read as numbers (`version: 1.0`) are written bare; the
/// scanner turns scalars back into the same text.
fn render_text(s: &str) -> String {
    match resolve_plain(s) {
        Value::Number(n) if n == s => n,
        _ => render_scalar(s),
    }
}

/// Whether the folded style reads `text` back unchanged
fn folds_cleanly(text: &str) -> bool {
    text.split_whitespace().collect::<Vec<_>>().join(" ") == text
}

/// Artifact paths grouped by manifest section, each group sorted
fn artifact_groups(pkg: &PackageRecord) -> Vec<(&'static str, Vec<&str>)> {
    let mut grouped: BTreeMap<&'static str, Vec<&str>> = BTreeMap::new();
    for file in &pkg.files {
        // The descriptor is picked up by the scanner without being listed
        if file.dest_path == PLUGIN_DESCRIPTOR {
            continue;
        }
        grouped
            .entry(file.file_type.manifest_section())
            .or_default()
            .push(&file.dest_path);
    }

    MANIFEST_SECTION_ORDER
        .iter()
        .filter_map(|section| {
            grouped.remove(section).map(|mut paths| {
                paths.sort_unstable();
                (*section, paths)
            })
        })
        .collect()
}

/// Render the manifest document for a package
pub fn build_manifest(pkg: &PackageRecord) -> String {
    let mut out = String::new();

    out.push_str(&format!("name: {}\n", render_text(&pkg.name)));
    out.push_str(&format!("version: {}\n", render_text(&pkg.version)));
    if folds_cleanly(&pkg.description) {
        if !pkg.description.is_empty() {
            render_folded(&mut out, 0, "description", &pkg.description);
        }
    } else {
        // Line breaks and whitespace runs need a literal block or quotes
        render_entry(&mut out, 0, "description", &Value::String(pkg.description.clone()));
    }
    out.push_str(&format!("author: {}\n", render_text(&pkg.author)));
    out.push_str(&format!("license: {}\n", render_text(&pkg.license)));
    if !pkg.tags.is_empty() {
        let tags: Vec<Value> = pkg.tags.iter().map(|t| Value::String(t.clone())).collect();
        out.push_str(&format!("tags: {}\n", render_flow_list(&tags)));
    }

    let groups = artifact_groups(pkg);
    if !groups.is_empty() {
        out.push_str("\n# Files to install (relative to package root)\nartifacts:\n");
        for (section, paths) in groups {
            out.push_str(&format!("  {}:\n", section));
            for path in paths {
                out.push_str(&format!("    - {}\n", render_scalar(path)));
            }
        }
    }

    if let Some(variables) = pkg.variables.as_ref().filter(|v| !v.is_empty()) {
        out.push_str("\n# Token substitution (Tier 1 package)\n");
        render_entry(&mut out, 0, "variables", variables);
    }

    if pkg.install_scope != "any" && !pkg.install_scope.is_empty() {
        out.push_str("\n# Installation policy/metadata\ninstall:\n");
        out.push_str(&format!("  scope: {}\n", render_text(&pkg.install_scope)));
    }

    if let Some(options) = pkg.options.as_ref().filter(|v| !v.is_empty()) {
        out.push_str("\n# Install-time options\n");
        render_entry(&mut out, 0, "options", options);
    }

    if !pkg.deps.is_empty() {
        out.push_str("\n# Runtime requirements\nrequires:\n");
        for dep in &pkg.deps {
            out.push_str(&format!("  - {}\n", render_scalar(&dep.requirement())));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{parse_document, Mapping};
    use crate::packages::{DepRecord, FileRecord};

    fn file(pkg: &str, path: &str) -> FileRecord {
        FileRecord::from_content(pkg, path, "x\n".to_string(), None)
    }

    fn sample() -> PackageRecord {
        let mut pkg = PackageRecord::new("sc-delay");
        pkg.version = "1.0".to_string();
        pkg.description = "Schedule delayed or interval-based actions with minimal \
            overhead. Useful for polling GitHub Actions and waiting on CI."
            .to_string();
        pkg.author = "randlee".to_string();
        pkg.tags = vec!["delay".to_string(), "polling".to_string()];
        pkg.files = vec![
            file("sc-delay", "scripts/delay-run.py"),
            file("sc-delay", "commands/delay.md"),
            file("sc-delay", "agents/delay-waiter.md"),
            file("sc-delay", "agents/delay-once.md"),
            file("sc-delay", "hooks/pre.sh"),
            file("sc-delay", PLUGIN_DESCRIPTOR),
            file("sc-delay", "config/settings.json"),
        ];
        pkg.deps = vec![DepRecord::from_requirement("sc-delay", "python3 >= 3.8")];
        pkg
    }

    #[test]
    fn test_layout() {
        let text = build_manifest(&sample());
        let expected_head = "name: sc-delay\nversion: 1.0\ndescription: >\n";
        assert!(text.starts_with(expected_head), "{}", text);
        assert!(text.contains(
            "\n# Files to install (relative to package root)\nartifacts:\n  commands:\n    - commands/delay.md\n  agents:\n    - agents/delay-once.md\n    - agents/delay-waiter.md\n  scripts:\n    - hooks/pre.sh\n    - scripts/delay-run.py\n  config:\n    - config/settings.json\n"
        ));
        assert!(!text.contains("plugin.json"));
        assert!(!text.contains("install:"));
        assert!(text.ends_with("\n# Runtime requirements\nrequires:\n  - 'python3 >= 3.8'\n"));
    }

    #[test]
    fn test_description_wraps() {
        let text = build_manifest(&sample());
        for line in text.lines() {
            assert!(line.len() <= crate::codec::WRAP_WIDTH, "too long: {}", line);
        }
    }

    #[test]
    fn test_manifest_parses_back() {
        let mut pkg = sample();
        let mut var = Mapping::new();
        var.insert("default", Value::String("main".to_string()));
        var.insert("auto", Value::Bool(true));
        let mut vars = Mapping::new();
        vars.insert("BRANCH", Value::Map(var));
        pkg.variables = Some(Value::Map(vars.clone()));
        pkg.install_scope = "user".to_string();

        let parsed = parse_document(&build_manifest(&pkg)).unwrap();
        assert_eq!(parsed.get_text("name").as_deref(), Some("sc-delay"));
        assert_eq!(parsed.get_text("version").as_deref(), Some("1.0"));
        assert_eq!(parsed.get_text("description"), Some(pkg.description.clone()));
        assert_eq!(parsed.get("variables"), Some(&Value::Map(vars)));
        assert_eq!(
            parsed
                .get("install")
                .and_then(Value::as_map)
                .and_then(|m| m.get_text("scope"))
                .as_deref(),
            Some("user")
        );
        let requires = parsed.get("requires").and_then(Value::as_list).unwrap();
        assert_eq!(requires[0].as_str(), Some("python3 >= 3.8"));
    }

    #[test]
    fn test_unfoldable_descriptions_parse_back() {
        for description in [
            "Line one.\nLine two.\n",
            "Two  spaces inside.",
            " leading space",
            "tabs\tand\nbreaks",
            "   ",
        ] {
            let mut pkg = sample();
            pkg.description = description.to_string();
            let text = build_manifest(&pkg);
            let parsed = parse_document(&text).unwrap();
            assert_eq!(
                parsed.get_text("description").as_deref(),
                Some(description),
                "{}",
                text
            );
        }
    }

    #[test]
    fn test_literal_description_layout() {
        let mut pkg = sample();
        pkg.description = "Line one.\nLine two.\n".to_string();
        assert!(build_manifest(&pkg).contains("description: |\n  Line one.\n  Line two.\nauthor:"));
    }

    #[test]
    fn test_minimal_package() {
        let pkg = PackageRecord::new("sc-empty");
        assert_eq!(
            build_manifest(&pkg),
            "name: sc-empty\nversion: 0.0.0\nauthor: ''\nlicense: MIT\n"
        );
    }
}
