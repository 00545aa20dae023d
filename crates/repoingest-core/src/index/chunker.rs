//! File chunking for embedding
//!
//! Code files go through a heuristic block scan (declaration keywords plus
//! brace balance). Anything the scan cannot bound sensibly, and every
//! non-code file, is cut into overlapping line windows instead.

use super::language::{file_extension, is_code_file, Language};
use crate::config::ChunkingConfig;
use crate::models::{ChunkMetadata, CodeChunk};
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;
use tracing::debug;

/// A block open for more lines than this is closed where it stands
pub const MAX_BLOCK_LINES: usize = 200;

/// Characters assumed per line when turning the overlap into a line count
pub const CHARS_PER_LINE: usize = 50;

/// Semantic chunks longer than `OVERSIZE_FACTOR * chunk_size` force line mode
pub const OVERSIZE_FACTOR: usize = 2;

lazy_static! {
    static ref DECLARATION_RE: Regex =
        Regex::new(r"^(function|class|def|func|fn|pub fn|async fn|interface|type|struct|impl)\s+\w+")
            .unwrap();
    static ref EXPORTED_FUNCTION_RE: Regex =
        Regex::new(r"^(export\s+)?(async\s+)?function\s+\w+").unwrap();
    static ref MODIFIED_TYPE_RE: Regex =
        Regex::new(r"^(public|private|protected|static)\s+(class|interface|enum)").unwrap();
}

/// Line span found by the block scan (0-based, inclusive)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub start_line: usize,
    pub end_line: usize,
    pub context: String,
}

fn is_block_opener(trimmed: &str) -> bool {
    DECLARATION_RE.is_match(trimmed)
        || EXPORTED_FUNCTION_RE.is_match(trimmed)
        || MODIFIED_TYPE_RE.is_match(trimmed)
}

/// Signature text before the first `{` or `(`
fn block_context(trimmed: &str) -> String {
    trimmed
        .split(['{', '('])
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Scan lines for declaration blocks.
///
/// Never returns an empty list: a file without recognizable blocks becomes
/// one block spanning every line, labelled `file`.
pub fn identify_blocks(lines: &[&str]) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut open: Option<(usize, String)> = None;
    let mut depth: i64 = 0;

    for (i, raw) in lines.iter().enumerate() {
        let line = raw.trim();

        if open.is_none() && is_block_opener(line) {
            open = Some((i, block_context(line)));
            depth = 0;
        }

        depth += line.matches('{').count() as i64;
        depth -= line.matches('}').count() as i64;

        if depth == 0 && line.contains('}') {
            if let Some((start, context)) = open.take() {
                blocks.push(Block {
                    start_line: start,
                    end_line: i,
                    context,
                });
            }
        }

        if let Some((start, _)) = &open {
            if i - start > MAX_BLOCK_LINES {
                if let Some((start, context)) = open.take() {
                    blocks.push(Block {
                        start_line: start,
                        end_line: i,
                        context,
                    });
                }
            }
        }
    }

    if let Some((start, context)) = open {
        blocks.push(Block {
            start_line: start,
            end_line: lines.len().saturating_sub(1),
            context,
        });
    }

    if blocks.is_empty() {
        blocks.push(Block {
            start_line: 0,
            end_line: lines.len().saturating_sub(1),
            context: "file".to_string(),
        });
    }

    blocks
}

/// Stable chunk id: same repository, file and index always map to the same id
pub fn chunk_id(repo_id: &str, relative_path: &str, chunk_index: usize) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(repo_id.as_bytes());
    hasher.update(&[0]);
    hasher.update(relative_path.as_bytes());
    hasher.update(&[0]);
    hasher.update(&(chunk_index as u64).to_le_bytes());
    hasher.finalize().to_hex()[..32].to_string()
}

/// Per-file values every chunk of that file carries
struct FileChunks<'a> {
    repo_id: &'a str,
    file_path: &'a str,
    metadata: ChunkMetadata,
}

impl FileChunks<'_> {
    fn chunk(
        &self,
        index: usize,
        start_line: usize,
        end_line: usize,
        content: String,
        context: String,
    ) -> CodeChunk {
        CodeChunk {
            id: chunk_id(self.repo_id, &self.metadata.relative_path, index),
            repo_id: self.repo_id.to_string(),
            file_path: self.file_path.to_string(),
            content,
            start_line,
            end_line,
            chunk_index: index,
            metadata: ChunkMetadata {
                context: Some(context),
                ..self.metadata.clone()
            },
        }
    }
}

/// Chunking engine
#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Lines shared by consecutive line-mode chunks
    pub fn overlap_lines(&self) -> usize {
        self.config.chunk_overlap / CHARS_PER_LINE
    }

    /// Split one file into ordered chunks with indices `0..n`
    pub fn chunk_file(
        &self,
        repo_id: &str,
        file_path: &str,
        content: &str,
        relative_path: &str,
    ) -> Vec<CodeChunk> {
        if content.is_empty() {
            return Vec::new();
        }

        let path = Path::new(file_path);
        let extension = file_extension(path);
        let is_code = is_code_file(path);
        let file = FileChunks {
            repo_id,
            file_path,
            metadata: ChunkMetadata {
                language: Language::from_extension(&extension),
                file_type: match extension.trim_start_matches('.') {
                    "" => "unknown".to_string(),
                    ext => ext.to_string(),
                },
                extension,
                relative_path: relative_path.to_string(),
                size: content.len(),
                is_code,
                context: None,
            },
        };

        let lines: Vec<&str> = content.split('\n').collect();

        if is_code {
            if let Some(chunks) = self.semantic_chunk(&file, &lines) {
                return chunks;
            }
            debug!(file = relative_path, "Semantic chunking rejected, using line windows");
        }

        self.simple_chunk(&file, &lines)
    }

    /// Returns `None` when the result must be replaced by line windows
    fn semantic_chunk(&self, file: &FileChunks<'_>, lines: &[&str]) -> Option<Vec<CodeChunk>> {
        let mut chunks: Vec<CodeChunk> = Vec::new();

        for block in identify_blocks(lines) {
            if chunks.len() >= self.config.max_chunks_per_file {
                break;
            }

            let content = lines[block.start_line..=block.end_line].join("\n");
            if content.trim().is_empty() {
                continue;
            }

            chunks.push(file.chunk(
                chunks.len(),
                block.start_line,
                block.end_line,
                content,
                block.context,
            ));
        }

        let limit = self.config.chunk_size.saturating_mul(OVERSIZE_FACTOR);
        let oversized = chunks.iter().any(|c| c.content.chars().count() > limit);

        if chunks.is_empty() || oversized {
            None
        } else {
            Some(chunks)
        }
    }

    /// Accumulate lines up to `chunk_size` characters, then step back by the overlap
    fn simple_chunk(&self, file: &FileChunks<'_>, lines: &[&str]) -> Vec<CodeChunk> {
        let mut chunks = Vec::new();
        let overlap = self.overlap_lines();
        let mut current = 0;

        while current < lines.len() && chunks.len() < self.config.max_chunks_per_file {
            let start = current;
            let mut chars = 0;

            while current < lines.len() && chars < self.config.chunk_size {
                chars += lines[current].chars().count() + 1;
                current += 1;
            }

            let content = lines[start..current].join("\n");
            if !content.trim().is_empty() {
                let context = format!("lines {}-{}", start + 1, current);
                chunks.push(file.chunk(chunks.len(), start, current - 1, content, context));
            }

            if current < lines.len() {
                current = (start + 1).max(current.saturating_sub(overlap));
            }
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chunker(chunk_size: usize, chunk_overlap: usize, max_chunks_per_file: usize) -> Chunker {
        Chunker::new(ChunkingConfig {
            chunk_size,
            chunk_overlap,
            max_chunks_per_file,
        })
    }

    #[test]
    fn test_empty_file_yields_no_chunks() {
        let chunks = Chunker::default().chunk_file("o/r", "/tmp/empty.txt", "", "empty.txt");
        assert!(chunks.is_empty());

        let chunks = Chunker::default().chunk_file("o/r", "/tmp/empty.rs", "", "empty.rs");
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_whitespace_only_file_yields_no_chunks() {
        let chunks = Chunker::default().chunk_file("o/r", "/tmp/blank.ts", "\n  \n\n", "blank.ts");
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_two_typescript_functions() {
        let content = "function hello() {\n  console.log('Hello');\n}\n\nfunction world() {\n  console.log('World');\n}";
        let chunks = Chunker::default().chunk_file("test/repo", "/clone/a.ts", content, "a.ts");

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].metadata.context.as_deref(), Some("function hello"));
        assert_eq!(chunks[1].metadata.context.as_deref(), Some("function world"));
        assert_eq!((chunks[0].start_line, chunks[0].end_line), (0, 2));
        assert_eq!((chunks[1].start_line, chunks[1].end_line), (4, 6));
        for chunk in &chunks {
            assert!(chunk.metadata.is_code);
            assert_eq!(chunk.metadata.language, Language::TypeScript);
            assert_eq!(chunk.metadata.extension, ".ts");
            assert_eq!(chunk.metadata.file_type, "ts");
            assert_eq!(chunk.metadata.size, content.len());
        }
    }

    #[test]
    fn test_small_text_file_is_one_chunk() {
        let content = "Line 1\nLine 2\nLine 3\nLine 4\nLine 5";
        let chunks = Chunker::default().chunk_file("test/repo", "/path/to/file.txt", content, "file.txt");

        assert_eq!(chunks.len(), 1);
        let chunk = &chunks[0];
        assert_eq!(chunk.start_line, 0);
        assert_eq!(chunk.end_line, 4);
        assert_eq!(chunk.content, content);
        assert_eq!(chunk.metadata.context.as_deref(), Some("lines 1-5"));
        assert!(!chunk.metadata.is_code);
        assert_eq!(chunk.metadata.language, Language::Other);
        assert_eq!(chunk.repo_id, "test/repo");
        assert_eq!(chunk.file_path, "/path/to/file.txt");
        assert_eq!(chunk.metadata.relative_path, "file.txt");
    }

    #[test]
    fn test_file_without_blocks_is_single_file_chunk() {
        let content = "const a = 1;\nconst b = 2;\n";
        let chunks = Chunker::default().chunk_file("o/r", "/c/consts.js", content, "consts.js");

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].metadata.context.as_deref(), Some("file"));
        assert_eq!(chunks[0].content, content);
    }

    #[test]
    fn test_rust_and_python_openers() {
        let lines = vec![
            "pub fn area(w: u32) -> u32 {",
            "    w * w",
            "}",
            "struct Point { x: i32 }",
            "def greet(name):",
        ];
        let blocks = identify_blocks(&lines);

        assert_eq!(blocks[0].context, "pub fn area");
        assert_eq!((blocks[0].start_line, blocks[0].end_line), (0, 2));
        assert_eq!(blocks[1].context, "struct Point");
        assert_eq!((blocks[1].start_line, blocks[1].end_line), (3, 3));
        // Python has no closing brace, so the block runs to end of file
        assert_eq!(blocks[2].context, "def greet");
        assert_eq!((blocks[2].start_line, blocks[2].end_line), (4, 4));
    }

    #[test]
    fn test_modifier_openers() {
        let lines = vec!["public class Foo {", "  int x;", "}"];
        let blocks = identify_blocks(&lines);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].context, "public class Foo");
    }

    #[test]
    fn test_block_line_ceiling() {
        let mut lines = vec!["function big() {"];
        lines.extend(std::iter::repeat("  x++;").take(400));
        lines.push("}");
        let blocks = identify_blocks(&lines);

        assert_eq!(blocks[0].start_line, 0);
        assert_eq!(blocks[0].end_line, MAX_BLOCK_LINES + 1);
    }

    #[test]
    fn test_nested_braces_close_at_outer_level() {
        let lines = vec![
            "class Outer {",
            "  method() {",
            "    if (x) { y(); }",
            "  }",
            "}",
        ];
        let blocks = identify_blocks(&lines);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].end_line, 4);
    }

    #[test]
    fn test_oversized_block_falls_back_to_lines() {
        let body: Vec<String> = (0..60).map(|i| format!("  let value_{i} = compute({i});")).collect();
        let content = format!("fn huge() {{\n{}\n}}", body.join("\n"));
        let chunks = chunker(300, 100, 100).chunk_file("o/r", "/c/huge.rs", &content, "huge.rs");

        assert!(chunks.len() > 1);
        assert!(chunks
            .iter()
            .all(|c| c.metadata.context.as_deref().unwrap_or_default().starts_with("lines ")));
        assert!(chunks.iter().all(|c| c.metadata.is_code));
    }

    #[test]
    fn test_simple_mode_overlap() {
        let lines: Vec<String> = (0..40).map(|i| format!("line number {:02} of the notes", i)).collect();
        let content = lines.join("\n");
        let engine = chunker(300, 100, 100);
        let chunks = engine.chunk_file("o/r", "/c/notes.txt", &content, "notes.txt");

        assert_eq!(engine.overlap_lines(), 2);
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            assert_eq!(pair[1].start_line, pair[0].end_line + 1 - 2);
        }
        assert_eq!(chunks.last().unwrap().end_line, 39);
    }

    #[test]
    fn test_chunk_cap() {
        let content = (0..1000).map(|i| format!("row {i}")).collect::<Vec<_>>().join("\n");
        let chunks = chunker(20, 0, 5).chunk_file("o/r", "/c/rows.txt", &content, "rows.txt");
        assert_eq!(chunks.len(), 5);

        let code: String = (0..20).map(|i| format!("function f{i}() {{ return {i}; }}\n")).collect();
        let chunks = chunker(1000, 200, 3).chunk_file("o/r", "/c/many.js", &code, "many.js");
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].metadata.context.as_deref(), Some("function f2"));
    }

    #[test]
    fn test_chunk_ids_are_stable_and_distinct() {
        let content = "function a() {}\nfunction b() {}";
        let first = Chunker::default().chunk_file("o/r", "/c/x.js", content, "x.js");
        let second = Chunker::default().chunk_file("o/r", "/other/clone/x.js", content, "x.js");

        assert_eq!(first[0].id, second[0].id);
        assert_ne!(first[0].id, first[1].id);
        assert_eq!(first[0].id.len(), 32);
        assert_ne!(chunk_id("o/r", "x.js", 0), chunk_id("o/other", "x.js", 0));
    }

    fn arb_line() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-z ]{0,60}",
            Just("function f() {".to_string()),
            Just("}".to_string()),
            Just("class C {".to_string()),
            Just(String::new()),
        ]
    }

    proptest! {
        #[test]
        fn prop_indices_contiguous_and_capped(
            lines in prop::collection::vec(arb_line(), 1..200),
            size in 20usize..400,
            cap in 1usize..30,
            ext in prop_oneof![Just("ts"), Just("txt")],
        ) {
            let content = lines.join("\n");
            let engine = chunker(size, 100, cap);
            let path = format!("/c/file.{ext}");
            let chunks = engine.chunk_file("o/r", &path, &content, "file");

            prop_assert!(chunks.len() <= cap);
            for (i, chunk) in chunks.iter().enumerate() {
                prop_assert_eq!(chunk.chunk_index, i);
                prop_assert!(chunk.start_line <= chunk.end_line);
                prop_assert!(chunk.end_line < lines.len());
            }
            for pair in chunks.windows(2) {
                prop_assert!(pair[0].start_line <= pair[1].start_line);
            }
        }

        #[test]
        fn prop_simple_mode_size_bound(
            lines in prop::collection::vec("[a-z]{0,80}", 1..150),
            size in 10usize..500,
        ) {
            let content = lines.join("\n");
            let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
            let chunks = chunker(size, 200, 1000).chunk_file("o/r", "/c/f.txt", &content, "f.txt");

            for chunk in &chunks {
                prop_assert!(chunk.content.chars().count() <= size + longest);
            }
        }
    }
}
