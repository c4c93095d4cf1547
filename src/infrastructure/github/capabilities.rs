//! The GitHub analysis capability set.
//!
//! Eight capabilities over one [`GithubApiClient`], each producing a
//! markdown report. Failures return `Err` and are degraded to textual
//! observations by the analyzer's act step, so a broken call never kills
//! a unit.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::domain::ports::capability::{Capability, CapabilityError};

use super::api::{ContentEntry, GithubApiClient, GithubError};

const SOURCE_EXTENSIONS: &[&str] = &[
    ".py", ".js", ".ts", ".java", ".cpp", ".c", ".go", ".rs", ".rb",
];

const CONFIG_FILES: &[&str] = &[
    "requirements.txt",
    "package.json",
    "pyproject.toml",
    "setup.py",
    "Cargo.toml",
    "Dockerfile",
    ".gitignore",
    "Makefile",
];

/// Build the full capability set for one repository context.
pub fn github_capabilities(client: Arc<GithubApiClient>) -> Vec<Arc<dyn Capability>> {
    vec![
        Arc::new(AnalyzeRepositoryStructure {
            client: Arc::clone(&client),
        }),
        Arc::new(ReadFileWithContext {
            client: Arc::clone(&client),
        }),
        Arc::new(SearchCodePatterns {
            client: Arc::clone(&client),
        }),
        Arc::new(DetectTechnologyStack {
            client: Arc::clone(&client),
        }),
        Arc::new(AnalyzeProjectConfiguration {
            client: Arc::clone(&client),
        }),
        Arc::new(ExploreDirectory {
            client: Arc::clone(&client),
        }),
        Arc::new(AnalyzeDependencyGraph {
            client: Arc::clone(&client),
        }),
        Arc::new(TraceCodeFlow { client }),
    ]
}

impl From<GithubError> for CapabilityError {
    fn from(err: GithubError) -> Self {
        CapabilityError::Invocation(err.to_string())
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(args: serde_json::Value) -> Result<T, CapabilityError> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args).map_err(|err| CapabilityError::InvalidArguments(err.to_string()))
}

/// Split a directory listing into named buckets.
struct CategorizedEntries {
    directories: Vec<String>,
    source_files: Vec<String>,
    config_files: Vec<String>,
    documentation: Vec<String>,
    other_files: Vec<String>,
}

fn categorize(entries: &[ContentEntry]) -> CategorizedEntries {
    let mut buckets = CategorizedEntries {
        directories: Vec::new(),
        source_files: Vec::new(),
        config_files: Vec::new(),
        documentation: Vec::new(),
        other_files: Vec::new(),
    };

    for entry in entries {
        let name = entry.name.clone();
        if entry.entry_type == "dir" {
            buckets.directories.push(name);
        } else if SOURCE_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
            buckets.source_files.push(name);
        } else if CONFIG_FILES.contains(&name.as_str()) {
            buckets.config_files.push(name);
        } else if [".md", ".txt", ".rst"].iter().any(|ext| name.ends_with(ext)) {
            buckets.documentation.push(name);
        } else {
            buckets.other_files.push(name);
        }
    }

    buckets
}

fn push_section(report: &mut String, label: &str, names: &[String]) {
    if !names.is_empty() {
        report.push_str(&format!("**{label}** ({}): {}\n", names.len(), names.join(", ")));
    }
}

// ---------------------------------------------------------------------------
// 1. Repository structure
// ---------------------------------------------------------------------------

/// Comprehensive overview of the repository: metadata, root layout, and
/// technology indicators.
struct AnalyzeRepositoryStructure {
    client: Arc<GithubApiClient>,
}

#[async_trait]
impl Capability for AnalyzeRepositoryStructure {
    fn name(&self) -> &str {
        "analyze_repository_structure"
    }

    fn description(&self) -> &str {
        "Analyze the complete repository structure to understand the codebase architecture, \
         languages, frameworks, and project organization."
    }

    async fn invoke(&self, _args: serde_json::Value) -> Result<String, CapabilityError> {
        let info = self.client.repo_info().await?;
        let entries = self.client.list_contents("").await?;
        let buckets = categorize(&entries);

        let mut report = format!("# Repository Analysis: {}\n\n", self.client.repo_slug());
        report.push_str(&format!(
            "**Description**: {}\n",
            info.description.as_deref().unwrap_or("No description")
        ));
        report.push_str(&format!(
            "**Language**: {}\n",
            info.language.as_deref().unwrap_or("Not specified")
        ));
        report.push_str(&format!("**Size**: {} KB\n\n", info.size));

        report.push_str("## Project Structure:\n");
        push_section(&mut report, "Directories", &buckets.directories);
        push_section(&mut report, "Source Files", &buckets.source_files);
        push_section(&mut report, "Configuration Files", &buckets.config_files);
        push_section(&mut report, "Documentation", &buckets.documentation);

        let mut technologies = Vec::new();
        if buckets.source_files.iter().any(|f| f.ends_with(".rs"))
            || buckets.config_files.iter().any(|f| f == "Cargo.toml")
        {
            technologies.push("Rust");
        }
        if buckets.source_files.iter().any(|f| f.ends_with(".py"))
            || buckets
                .config_files
                .iter()
                .any(|f| f == "requirements.txt" || f == "pyproject.toml")
        {
            technologies.push("Python");
        }
        if buckets.config_files.iter().any(|f| f == "package.json") {
            technologies.push("Node.js/JavaScript");
        }
        if buckets.config_files.iter().any(|f| f == "Dockerfile") {
            technologies.push("Docker");
        }
        if !technologies.is_empty() {
            report.push_str(&format!(
                "\n**Detected Technologies**: {}\n",
                technologies.join(", ")
            ));
        }

        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// 2. File reader
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ReadFileArgs {
    file_path: String,
}

/// Read one file with a light structural annotation before the content.
struct ReadFileWithContext {
    client: Arc<GithubApiClient>,
}

#[async_trait]
impl Capability for ReadFileWithContext {
    fn name(&self) -> &str {
        "read_file_with_context"
    }

    fn description(&self) -> &str {
        "Read a specific file and provide context about its purpose and relationships."
    }

    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path to the file in the repository (e.g. 'src/main.rs', 'README.md')"
                }
            },
            "required": ["file_path"]
        })
    }

    async fn invoke(&self, args: serde_json::Value) -> Result<String, CapabilityError> {
        let args: ReadFileArgs = parse_args(args)?;
        let file = self.client.file(&args.file_path).await?;
        if file.entry_type != "file" {
            return Err(CapabilityError::Invocation(format!(
                "{} is not a file",
                args.file_path
            )));
        }
        let content = file.decode()?;

        let extension = args.file_path.rsplit('.').next().unwrap_or_default();
        let mut report = format!("# File Analysis: {}\n\n", args.file_path);

        if matches!(extension, "rs" | "py" | "js" | "ts" | "go") {
            let lines: Vec<&str> = content.lines().map(str::trim).collect();
            let imports: Vec<&str> = lines
                .iter()
                .filter(|line| {
                    line.starts_with("use ")
                        || line.starts_with("import ")
                        || line.starts_with("from ")
                })
                .copied()
                .collect();
            let types: Vec<&str> = lines
                .iter()
                .filter(|line| {
                    line.starts_with("class ")
                        || line.starts_with("struct ")
                        || line.starts_with("pub struct ")
                        || line.starts_with("enum ")
                        || line.starts_with("pub enum ")
                })
                .copied()
                .collect();
            let functions = lines
                .iter()
                .filter(|line| {
                    line.starts_with("def ")
                        || line.starts_with("fn ")
                        || line.starts_with("pub fn ")
                        || line.starts_with("async fn ")
                        || line.starts_with("pub async fn ")
                })
                .count();

            report.push_str("**Type**: source file\n");
            if !imports.is_empty() {
                let preview: Vec<&str> = imports.iter().take(5).copied().collect();
                report.push_str(&format!(
                    "**Imports** ({}): {}\n",
                    imports.len(),
                    preview.join(", ")
                ));
            }
            if !types.is_empty() {
                report.push_str(&format!("**Type definitions**: {}\n", types.len()));
            }
            if functions > 0 {
                report.push_str(&format!("**Functions**: {functions}\n"));
            }
        }

        report.push_str(&format!("\n**File Size**: {} characters\n", content.len()));
        report.push_str(&format!("\n## File Content:\n```{extension}\n{content}\n```"));
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// 3. Code search
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default)]
    file_extension: String,
}

/// Search for code patterns across the repository.
struct SearchCodePatterns {
    client: Arc<GithubApiClient>,
}

#[async_trait]
impl Capability for SearchCodePatterns {
    fn name(&self) -> &str {
        "search_code_patterns"
    }

    fn description(&self) -> &str {
        "Search for specific code patterns, functions, classes, or concepts across the codebase."
    }

    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search term (e.g. 'struct User', 'fn authenticate')"
                },
                "file_extension": {
                    "type": "string",
                    "description": "Optional file extension filter (e.g. 'rs', 'py')"
                }
            },
            "required": ["query"]
        })
    }

    async fn invoke(&self, args: serde_json::Value) -> Result<String, CapabilityError> {
        let args: SearchArgs = parse_args(args)?;
        let query = if args.file_extension.is_empty() {
            args.query.clone()
        } else {
            format!("{} extension:{}", args.query, args.file_extension)
        };

        let results = self.client.search_code(&query).await?;
        if results.total_count == 0 {
            return Ok(format!("No code found matching '{}'", args.query));
        }

        let mut report = format!("# Code Search Results for '{}'\n\n", args.query);
        report.push_str(&format!("**Total matches**: {}\n\n", results.total_count));
        for (index, item) in results.items.iter().take(5).enumerate() {
            report.push_str(&format!("## Result {}: {}\n", index + 1, item.name));
            report.push_str(&format!("**Path**: {}\n", item.path));
            for text_match in item.text_matches.iter().take(2) {
                report.push_str(&format!("**Match**: ...{}...\n", text_match.fragment));
            }
            report.push('\n');
        }
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// 4. Technology stack
// ---------------------------------------------------------------------------

/// Detect languages and well-known configuration files.
struct DetectTechnologyStack {
    client: Arc<GithubApiClient>,
}

#[async_trait]
impl Capability for DetectTechnologyStack {
    fn name(&self) -> &str {
        "detect_technology_stack"
    }

    fn description(&self) -> &str {
        "Detect and analyze the technology stack, frameworks, dependencies, and architecture \
         patterns used in the repository."
    }

    async fn invoke(&self, _args: serde_json::Value) -> Result<String, CapabilityError> {
        let languages = self.client.languages().await.unwrap_or_default();

        let mut report = format!(
            "# Technology Stack Analysis: {}\n\n",
            self.client.repo_slug()
        );

        if !languages.is_empty() {
            let total: u64 = languages.values().sum();
            let mut sorted: Vec<(&String, &u64)> = languages.iter().collect();
            sorted.sort_by(|a, b| b.1.cmp(a.1));

            report.push_str("## Programming Languages:\n");
            for (language, bytes) in sorted {
                #[allow(clippy::cast_precision_loss)]
                let percentage = (*bytes as f64 / total as f64) * 100.0;
                report.push_str(&format!("- **{language}**: {percentage:.1}% ({bytes} bytes)\n"));
            }
        }

        let probes = [
            ("requirements.txt", "Python dependencies"),
            ("pyproject.toml", "Python project configuration"),
            ("package.json", "Node.js dependencies"),
            ("Cargo.toml", "Rust crate manifest"),
            ("Dockerfile", "Docker containerization"),
            ("docker-compose.yml", "Docker Compose"),
            ("Makefile", "Build automation"),
        ];

        report.push_str("\n## Detected Configuration Files:\n");
        for (path, description) in probes {
            if self.client.file_exists(path).await {
                report.push_str(&format!("- **{path}**: {description}\n"));
            }
        }

        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// 5. Project configuration
// ---------------------------------------------------------------------------

/// Read and summarize well-known configuration files.
struct AnalyzeProjectConfiguration {
    client: Arc<GithubApiClient>,
}

#[async_trait]
impl Capability for AnalyzeProjectConfiguration {
    fn name(&self) -> &str {
        "analyze_project_configuration"
    }

    fn description(&self) -> &str {
        "Analyze project configuration files (Cargo.toml, package.json, pyproject.toml, etc.) \
         to understand dependencies, build setup, and project structure."
    }

    async fn invoke(&self, _args: serde_json::Value) -> Result<String, CapabilityError> {
        let mut report = format!(
            "# Configuration Files Analysis: {}\n\n",
            self.client.repo_slug()
        );

        let config_files = [
            "Cargo.toml",
            "requirements.txt",
            "pyproject.toml",
            "setup.py",
            "package.json",
            "Dockerfile",
        ];

        for config_file in config_files {
            let Ok(file) = self.client.file(config_file).await else {
                continue;
            };
            let Ok(content) = file.decode() else { continue };

            report.push_str(&format!("## {config_file}\n"));
            if config_file == "requirements.txt" {
                let deps: Vec<&str> = content
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty() && !line.starts_with('#'))
                    .collect();
                let preview: Vec<&str> = deps.iter().take(10).copied().collect();
                report.push_str(&format!(
                    "**Python Dependencies** ({}): {}\n\n",
                    deps.len(),
                    preview.join(", ")
                ));
            } else {
                let preview: String = content.chars().take(500).collect();
                let ellipsis = if content.len() > 500 { "..." } else { "" };
                report.push_str(&format!("```\n{preview}{ellipsis}\n```\n\n"));
            }
        }

        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// 6. Directory explorer
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ExploreArgs {
    #[serde(default)]
    directory_path: String,
}

/// Explore one directory's contents and organization.
struct ExploreDirectory {
    client: Arc<GithubApiClient>,
}

#[async_trait]
impl Capability for ExploreDirectory {
    fn name(&self) -> &str {
        "explore_directory"
    }

    fn description(&self) -> &str {
        "Explore a specific directory to understand its contents and organization."
    }

    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "directory_path": {
                    "type": "string",
                    "description": "Path to directory (e.g. 'src/', 'tests/') or empty for root"
                }
            }
        })
    }

    async fn invoke(&self, args: serde_json::Value) -> Result<String, CapabilityError> {
        let args: ExploreArgs = parse_args(args)?;
        let entries = self.client.list_contents(&args.directory_path).await?;
        let buckets = categorize(&entries);

        let label = if args.directory_path.is_empty() {
            "Root Directory".to_string()
        } else {
            args.directory_path.clone()
        };
        let mut report = format!("# Directory Structure: {label}\n\n");
        push_section(&mut report, "Subdirectories", &buckets.directories);
        push_section(&mut report, "Source Files", &buckets.source_files);
        push_section(&mut report, "Configuration Files", &buckets.config_files);
        push_section(&mut report, "Documentation", &buckets.documentation);

        let preview: Vec<String> = buckets.other_files.iter().take(10).cloned().collect();
        if !preview.is_empty() {
            report.push_str(&format!(
                "**Other Files** ({}): {}\n",
                buckets.other_files.len(),
                preview.join(", ")
            ));
        }
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// 7. Dependency graph
// ---------------------------------------------------------------------------

/// Map import patterns to the files that use them.
struct AnalyzeDependencyGraph {
    client: Arc<GithubApiClient>,
}

#[async_trait]
impl Capability for AnalyzeDependencyGraph {
    fn name(&self) -> &str {
        "analyze_dependency_graph"
    }

    fn description(&self) -> &str {
        "Analyze dependencies, imports, and module relationships in the codebase to understand \
         how components connect."
    }

    async fn invoke(&self, _args: serde_json::Value) -> Result<String, CapabilityError> {
        let import_patterns = [
            "use crate",
            "import ",
            "from .",
            "require(",
            "mod ",
        ];

        let mut report = format!(
            "# Dependency Graph Analysis: {}\n\n",
            self.client.repo_slug()
        );
        let mut dependency_map: BTreeMap<String, Vec<&str>> = BTreeMap::new();

        for pattern in import_patterns {
            let Ok(results) = self.client.search_code(pattern).await else {
                continue;
            };
            if results.total_count == 0 {
                continue;
            }
            report.push_str(&format!("## `{pattern}` usages\n"));
            for item in results.items.iter().take(3) {
                dependency_map
                    .entry(item.path.clone())
                    .or_default()
                    .push(pattern);
                report.push_str(&format!("- **{}**: uses `{pattern}`\n", item.path));
            }
            report.push('\n');
        }

        report.push_str("## Architectural Dependencies\n");
        for (path, patterns) in &dependency_map {
            if patterns.len() > 1 {
                report.push_str(&format!(
                    "- **{path}**: central component using {}\n",
                    patterns.join(", ")
                ));
            }
        }

        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// 8. Code flow tracer
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct TraceArgs {
    entry_point: String,
}

/// Trace code flow from an entry point like `src/billing.rs:process_payment`.
struct TraceCodeFlow {
    client: Arc<GithubApiClient>,
}

#[async_trait]
impl Capability for TraceCodeFlow {
    fn name(&self) -> &str {
        "trace_code_flow"
    }

    fn description(&self) -> &str {
        "Trace code execution flow from a starting point (e.g. an API endpoint, function, or \
         method)."
    }

    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "entry_point": {
                    "type": "string",
                    "description": "Starting point to trace (e.g. 'src/billing.rs:process_payment')"
                }
            },
            "required": ["entry_point"]
        })
    }

    async fn invoke(&self, args: serde_json::Value) -> Result<String, CapabilityError> {
        let args: TraceArgs = parse_args(args)?;
        let (file_path, target) = match args.entry_point.split_once(':') {
            Some((path, target)) => (path, Some(target)),
            None => (args.entry_point.as_str(), None),
        };

        let file = self.client.file(file_path).await?;
        let content = file.decode()?;

        let mut report = format!("# Code Flow Analysis: {}\n\n", args.entry_point);
        report.push_str(&format!("## Starting Point: {file_path}\n"));

        let target_lines = target.map(|name| extract_definition(&content, name));
        if let (Some(name), Some(lines)) = (target, &target_lines) {
            report.push_str(&format!("### Function: {name}\n"));
            let preview: Vec<&str> = lines.iter().take(10).map(String::as_str).collect();
            report.push_str(&format!("```\n{}\n```\n\n", preview.join("\n")));
        }

        let imports: Vec<&str> = content
            .lines()
            .map(str::trim)
            .filter(|line| {
                line.starts_with("use ") || line.starts_with("import ") || line.starts_with("from ")
            })
            .take(5)
            .collect();
        report.push_str(&format!("### Imports in {file_path}\n"));
        for import in imports {
            report.push_str(&format!("- {import}\n"));
        }

        if let Some(lines) = &target_lines {
            let calls = extract_call_names(lines);
            if !calls.is_empty() {
                report.push_str(&format!(
                    "\n### Function Calls in {}\n",
                    target.unwrap_or_default()
                ));
                for call in calls.iter().take(5) {
                    report.push_str(&format!("- {call}()\n"));
                }
            }
        }

        Ok(report)
    }
}

/// Extract the lines of a named function or type definition, ending at the
/// next top-level definition.
fn extract_definition(content: &str, name: &str) -> Vec<String> {
    let markers = [
        format!("fn {name}"),
        format!("def {name}"),
        format!("class {name}"),
        format!("struct {name}"),
    ];

    let mut in_target = false;
    let mut lines = Vec::new();
    for line in content.lines() {
        if markers.iter().any(|marker| line.contains(marker.as_str())) {
            in_target = true;
        } else if in_target
            && !line.starts_with(' ')
            && !line.starts_with('}')
            && !line.trim().is_empty()
            && !lines.is_empty()
        {
            break;
        }
        if in_target {
            lines.push(line.to_string());
        }
    }
    lines
}

/// Collect identifiers that appear directly before an opening parenthesis.
fn extract_call_names(lines: &[String]) -> Vec<String> {
    let mut seen = std::collections::BTreeSet::new();
    for line in lines {
        let mut identifier = String::new();
        for ch in line.chars() {
            if ch.is_alphanumeric() || ch == '_' {
                identifier.push(ch);
            } else {
                if ch == '(' && !identifier.is_empty() {
                    seen.insert(identifier.clone());
                }
                identifier.clear();
            }
        }
    }
    seen.into_iter().collect()
}
