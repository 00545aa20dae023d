//! Path classification: language tags, binary files and ignored directories

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Language tag attached to every chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    TypeScript,
    JavaScript,
    Python,
    Java,
    Go,
    Rust,
    Cpp,
    C,
    CSharp,
    Ruby,
    Php,
    Swift,
    Kotlin,
    Scala,
    Markdown,
    Json,
    Yaml,
    Xml,
    Html,
    Css,
    Sql,
    Other,
}

/// Extensions (lowercase, with leading dot) treated as binary regardless of content
const BINARY_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".bmp", ".ico", ".svg", ".pdf", ".zip", ".tar", ".gz",
    ".rar", ".7z", ".exe", ".dll", ".so", ".dylib", ".mp3", ".mp4", ".avi", ".mov", ".wav",
    ".ttf", ".woff", ".woff2", ".eot", ".class", ".jar", ".war", ".pyc", ".pyo",
];

/// Path segments whose whole subtree is skipped
const IGNORED_SEGMENTS: &[&str] = &[
    "node_modules",
    ".git",
    ".svn",
    ".hg",
    "dist",
    "build",
    "out",
    "target",
    "bin",
    "obj",
    ".next",
    ".nuxt",
    "coverage",
    ".cache",
    ".vscode",
    ".idea",
    "__pycache__",
    "vendor",
    "deps",
    "_build",
];

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TypeScript => "typescript",
            Self::JavaScript => "javascript",
            Self::Python => "python",
            Self::Java => "java",
            Self::Go => "go",
            Self::Rust => "rust",
            Self::Cpp => "cpp",
            Self::C => "c",
            Self::CSharp => "csharp",
            Self::Ruby => "ruby",
            Self::Php => "php",
            Self::Swift => "swift",
            Self::Kotlin => "kotlin",
            Self::Scala => "scala",
            Self::Markdown => "markdown",
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Xml => "xml",
            Self::Html => "html",
            Self::Css => "css",
            Self::Sql => "sql",
            Self::Other => "other",
        }
    }

    /// Map an extension (with or without leading dot, any case) to a known language
    pub fn lookup(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_lowercase();
        let lang = match ext.as_str() {
            "ts" | "tsx" => Self::TypeScript,
            "js" | "jsx" | "mjs" | "cjs" => Self::JavaScript,
            "py" => Self::Python,
            "java" => Self::Java,
            "go" => Self::Go,
            "rs" => Self::Rust,
            "cpp" | "cc" | "cxx" => Self::Cpp,
            "c" | "h" => Self::C,
            "cs" => Self::CSharp,
            "rb" => Self::Ruby,
            "php" => Self::Php,
            "swift" => Self::Swift,
            "kt" | "kts" => Self::Kotlin,
            "scala" => Self::Scala,
            "md" => Self::Markdown,
            "json" => Self::Json,
            "yaml" | "yml" => Self::Yaml,
            "xml" => Self::Xml,
            "html" | "htm" => Self::Html,
            "css" | "scss" | "sass" => Self::Css,
            "sql" => Self::Sql,
            _ => return None,
        };
        Some(lang)
    }

    /// Total mapping: unknown extensions are `Other`
    pub fn from_extension(ext: &str) -> Self {
        Self::lookup(ext).unwrap_or(Self::Other)
    }

    /// Detect language from file path extension
    pub fn from_path(path: &Path) -> Self {
        Self::from_extension(&file_extension(path))
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extension with leading dot (`".ts"`), or an empty string when there is none
pub fn file_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default()
}

/// Binary by extension denylist
pub fn is_binary_file(path: &Path) -> bool {
    let ext = file_extension(path).to_lowercase();
    BINARY_EXTENSIONS.contains(&ext.as_str())
}

/// True if any segment of a `/`- or `\`-separated path is in the ignore set
pub fn should_ignore_path(path: &str) -> bool {
    path.split(['/', '\\'])
        .any(|segment| IGNORED_SEGMENTS.contains(&segment))
}

/// Extension is in the language table and not binary
pub fn is_code_file(path: &Path) -> bool {
    Language::lookup(&file_extension(path)).is_some() && !is_binary_file(path)
}

/// Normalize separators to `/` and strip leading slashes
pub fn sanitize_path(path: &str) -> String {
    path.replace('\\', "/").trim_start_matches('/').to_string()
}
