// src/codec/frontmatter.rs

//! Leading `---` delimited metadata blocks in markdown files

use super::parser::parse;
use super::value::Mapping;
use crate::error::Result;

const DELIMITER: &str = "---";

/// Return the text between an opening `---` on the first line and the next
/// line consisting of `---`
///
/// Returns `None` when the document does not open with a delimiter or the
/// block is never closed.
pub fn extract_block(content: &str) -> Option<&str> {
    let mut lines = content.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim_end() != DELIMITER || !first.ends_with('\n') {
        return None;
    }

    let start = first.len();
    let mut offset = start;
    for line in lines {
        if line.trim_end() == DELIMITER {
            return Some(&content[start..offset]);
        }
        offset += line.len();
    }
    None
}

/// Parse the frontmatter block of a markdown document
///
/// `Ok(None)` means there is no block or the block is empty.
pub fn parse_frontmatter(content: &str) -> Result<Option<Mapping>> {
    let Some(block) = extract_block(content) else {
        return Ok(None);
    };
    let map = parse(block)?;
    Ok(if map.is_empty() { None } else { Some(map) })
}
