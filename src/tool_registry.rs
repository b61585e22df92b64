//! Tool Registry
//!
//! A static, process-wide catalog of [`ToolDescriptor`]s published to the LLM on every
//! upstream call made during the tool-discovery phase. Modeled as a tagged sum type rather
//! than an open `dyn Trait` registry: the universe of tools is fixed at compile time, and the
//! one path-parameterized tool has pre-flight handling ([`crate::path_sanitizer`]) that a
//! niladic tool doesn't need. This mirrors the teacher codebase's preference for describing a
//! fixed catalog (`ToolMetadata`/`ToolDefinition` in `tool_protocol.rs`) as plain data rather
//! than virtual dispatch.
//!
//! Tool descriptions are part of the prompting surface: wording changes here are
//! prompt-engineering changes, not refactors, and are treated with the same care the teacher
//! codebase gives its steering prompts.

use serde_json::{json, Value};

/// The one tool accepting a caller-supplied relative `path` argument.
pub const LIST_FILES_IN_PATH: &str = "list_files_in_path";

/// A tool advertised to the LLM: name, human-readable description, and a JSON Schema
/// fragment describing its parameters.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

impl ToolDescriptor {
    /// Render this descriptor as an OpenAI-compatible `tools` array entry.
    pub fn to_wire(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

fn niladic(name: &'static str, description: &'static str) -> ToolDescriptor {
    ToolDescriptor {
        name,
        description,
        parameters: json!({
            "type": "object",
            "properties": {},
        }),
    }
}

fn path_parameterized(name: &'static str, description: &'static str) -> ToolDescriptor {
    ToolDescriptor {
        name,
        description,
        parameters: json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Relative path from the current working directory. Defaults to \".\" if omitted."
                }
            },
        }),
    }
}

lazy_static::lazy_static! {
    static ref CATALOG: Vec<ToolDescriptor> = vec![
        niladic(
            "get_current_directory",
            "Returns the absolute path of the current working directory on the host. Use this \
             whenever you need to know where you are before reasoning about relative paths.",
        ),
        niladic(
            "get_project_tree",
            "Returns a depth-limited, tree-style overview of the current project's directory \
             structure, with common build-artifact directories (target, node_modules, .git, ...) \
             excluded. Use this to orient yourself in an unfamiliar project.",
        ),
        niladic(
            "list_current_directory",
            "Lists the files and subdirectories of the current working directory.",
        ),
        path_parameterized(
            LIST_FILES_IN_PATH,
            "Lists the files and subdirectories of a given path, relative to the current working \
             directory. Pass \"path\" to list a specific subdirectory; omit it to list the current \
             working directory.",
        ),
        niladic(
            "get_current_time",
            "Returns the current wall-clock date and time on the host.",
        ),
        niladic(
            "get_disk_usage",
            "Returns disk usage statistics for the filesystem hosting the current working \
             directory.",
        ),
        niladic(
            "get_os_identity",
            "Returns the identity of the host operating system and kernel.",
        ),
        niladic(
            "get_runtime_version",
            "Returns the version of the Rust toolchain installed on the host.",
        ),
        niladic(
            "get_vcs_status",
            "Returns the short-form version control status (e.g. `git status --short`) of the \
             current working directory, if it is under version control.",
        ),
    ];
}

/// Read-only, process-wide catalog of tools published to the LLM.
pub struct ToolRegistry;

impl ToolRegistry {
    /// The full ordered list of [`ToolDescriptor`]s, as sent to the LLM in every upstream call
    /// made during the tool-discovery phase.
    pub fn list_descriptors() -> &'static [ToolDescriptor] {
        &CATALOG
    }

    /// Whether `name` corresponds to an executable tool in the catalog.
    pub fn is_known(name: &str) -> bool {
        CATALOG.iter().any(|t| t.name == name)
    }

    /// Render the full catalog as an OpenAI-compatible `tools` array.
    pub fn to_wire() -> Vec<Value> {
        CATALOG.iter().map(ToolDescriptor::to_wire).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_stable_and_non_empty() {
        let descriptors = ToolRegistry::list_descriptors();
        assert!(!descriptors.is_empty());
    }

    #[test]
    fn exactly_one_tool_is_path_parameterized() {
        let path_tools: Vec<_> = ToolRegistry::list_descriptors()
            .iter()
            .filter(|t| {
                t.parameters["properties"]
                    .as_object()
                    .map(|p| p.contains_key("path"))
                    .unwrap_or(false)
            })
            .collect();
        assert_eq!(path_tools.len(), 1);
        assert_eq!(path_tools[0].name, LIST_FILES_IN_PATH);
    }

    #[test]
    fn is_known_matches_the_catalog() {
        assert!(ToolRegistry::is_known("get_current_time"));
        assert!(ToolRegistry::is_known(LIST_FILES_IN_PATH));
        assert!(!ToolRegistry::is_known("delete_everything"));
    }

    #[test]
    fn wire_entries_carry_name_description_and_parameters() {
        for entry in ToolRegistry::to_wire() {
            assert_eq!(entry["type"], "function");
            assert!(entry["function"]["name"].is_string());
            assert!(entry["function"]["description"].is_string());
            assert!(entry["function"]["parameters"].is_object());
        }
    }
}
