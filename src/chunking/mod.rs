//! Hierarchical Markdown chunking.
//!
//! Documents are split at heading boundaries into [`Section`]s. Each emitted
//! section carries the text most recently finalized for every ancestor
//! heading level (its "breadcrumb"), so a deeply nested section still embeds
//! and retrieves with the context of the headings above it, without
//! duplicating full ancestor bodies into every descendant.
//!
//! The walk is an explicit finite-state scan over lines with a fixed six-slot
//! breadcrumb table as its only auxiliary state:
//!
//! * a heading **deeper** than the current level finalizes the accumulated
//!   text into the breadcrumb slot for the current level (it becomes ancestor
//!   context, not a section of its own);
//! * a heading at the **same or a shallower** level emits a section: the
//!   non-empty breadcrumb slots for the levels above the section's own,
//!   followed by the accumulated text; slots at the new heading's level and
//!   deeper are then cleared, so a closed subtree never leaks into a later
//!   sibling;
//! * end of input emits whatever remains by the same rule.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::types::{Chunk, RagError, Section};

/// Markdown supports heading levels 1 through 6.
const LEVELS: usize = 6;

/// Section label used when content precedes any heading.
pub const INTRODUCTION: &str = "Introduction";

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.*)$").expect("valid heading pattern"));

/// Parses a heading line into `(level, trimmed title)`.
///
/// A line only counts as a heading when 1-6 `#` markers are followed by
/// whitespace and a non-empty title.
fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let caps = HEADING.captures(line)?;
    let level = caps.get(1)?.as_str().len();
    let title = caps.get(2)?.as_str().trim();
    if title.is_empty() {
        return None;
    }
    Some((level, title))
}

fn join_trimmed(lines: &[&str]) -> String {
    lines.join("\n").trim().to_string()
}

fn emit(
    sections: &mut Vec<Section>,
    breadcrumbs: &[String; LEVELS],
    level: usize,
    heading: Option<String>,
    content: &[&str],
) {
    let body = join_trimmed(content);
    // A heading line encountered before any heading or body is state setup,
    // not an empty preamble section.
    if heading.is_none() && body.is_empty() {
        return;
    }
    // Ancestors only: the slot at the section's own level belongs to a
    // closed sibling, never to this section.
    let mut parts: Vec<&str> = breadcrumbs[..level - 1]
        .iter()
        .map(String::as_str)
        .filter(|slot| !slot.is_empty())
        .collect();
    if !body.is_empty() {
        parts.push(&body);
    }
    let content = parts.join("\n").trim().to_string();
    sections.push(Section { heading, content });
}

/// Splits a Markdown document into heading-scoped sections with breadcrumb
/// context.
///
/// A document with no heading lines yields exactly one section with
/// `heading: None` and the trimmed input as content; empty or whitespace-only
/// input yields no sections.
pub fn chunk_markdown(markdown: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut breadcrumbs: [String; LEVELS] = Default::default();
    let mut current_level: usize = 1;
    let mut current_heading: Option<String> = None;
    let mut current_content: Vec<&str> = Vec::new();

    for line in markdown.lines() {
        let Some((level, title)) = parse_heading(line) else {
            current_content.push(line);
            continue;
        };

        if level > current_level {
            // Descending: what we have so far becomes ancestor context for
            // the new subtree rather than a section of its own.
            breadcrumbs[current_level - 1] = join_trimmed(&current_content);
        } else {
            emit(
                &mut sections,
                &breadcrumbs,
                current_level,
                current_heading.take(),
                &current_content,
            );
            // The subtree at this level and deeper is closed; stale slots
            // must not survive into the next section, even across a level
            // jump that never overwrites them.
            for slot in &mut breadcrumbs[level - 1..] {
                slot.clear();
            }
        }
        current_content = vec![line];
        current_level = level;
        current_heading = Some(title.to_string());
    }

    if !current_content.is_empty() || current_heading.is_some() {
        emit(
            &mut sections,
            &breadcrumbs,
            current_level,
            current_heading,
            &current_content,
        );
    }

    sections
}

/// Reads and chunks a single Markdown file.
pub fn chunk_file(path: &Path) -> Result<Vec<Section>, RagError> {
    let markdown = fs::read_to_string(path)?;
    Ok(chunk_markdown(&markdown))
}

/// Recursively chunks every `*.md` file under `dir`.
///
/// Files are visited in sorted path order so repeated runs produce chunks in
/// the same order. A file that cannot be read is logged and skipped; it never
/// fails the batch.
pub fn chunk_directory(dir: &Path) -> Vec<Chunk> {
    let mut files = Vec::new();
    collect_markdown_files(dir, &mut files);
    files.sort();
    debug!(
        dir = %dir.display(),
        count = files.len(),
        "discovered markdown sources"
    );

    let mut chunks = Vec::new();
    for path in files {
        let sections = match chunk_file(&path) {
            Ok(sections) => sections,
            Err(err) => {
                warn!(file = %path.display(), %err, "skipping unreadable markdown file");
                continue;
            }
        };
        let source_file = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        for section in sections {
            let heading_path = section
                .heading
                .clone()
                .unwrap_or_else(|| INTRODUCTION.to_string());
            chunks.push(Chunk {
                source_file: source_file.clone(),
                heading: section.heading,
                heading_path,
                content: section.content,
            });
        }
    }
    chunks
}

fn collect_markdown_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(dir = %dir.display(), %err, "skipping unreadable directory");
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_markdown_files(&path, out);
        } else if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
        {
            out.push(path);
        }
    }
}
