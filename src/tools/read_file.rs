//! File reading tool

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{Tool, ToolResult};

pub struct ReadFileTool;

#[derive(Debug, Deserialize)]
struct ReadFileParams {
    path: String,
    start_line: Option<usize>,
    end_line: Option<usize>,
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &'static str {
        "read_file"
    }

    fn description(&self) -> &'static str {
        "Read the contents of a text file. Optionally specify a 1-indexed, \
         inclusive line range. Lines are prefixed with their numbers."
    }

    fn parameters(&self) -> serde_json::Value {
        json!({"path": "src/main.rs", "start_line": 1, "end_line": 40})
    }

    async fn execute(&self, params: serde_json::Value) -> Result<ToolResult> {
        let params: ReadFileParams =
            serde_json::from_value(params).context("expected {\"path\": string}")?;
        let path = Path::new(&params.path);

        if !path.is_file() {
            return Ok(ToolResult::error(format!("File not found: {}", params.path)));
        }

        let content = match tokio::fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) => return Ok(ToolResult::error(format!("Failed to read file: {}", e))),
        };

        let lines: Vec<&str> = content.lines().collect();
        let total_lines = lines.len();
        let start = params.start_line.unwrap_or(1).max(1);
        let end = params.end_line.unwrap_or(total_lines).min(total_lines);

        if total_lines > 0 && start > total_lines {
            return Ok(ToolResult::error(format!(
                "Start line {} exceeds file length ({} lines)",
                start, total_lines
            )));
        }

        let width = end.to_string().len().max(4);
        let mut output = String::new();
        for (i, line) in lines.iter().enumerate().take(end).skip(start - 1) {
            output.push_str(&format!("{:>width$}| {}\n", i + 1, line, width = width));
        }

        if start > 1 || end < total_lines {
            output.push_str(&format!("\n[Showing lines {}-{} of {}]", start, end, total_lines));
        }

        Ok(ToolResult::success(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_read_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.txt");
        fs::write(&file_path, "line 1\nline 2\nline 3\n").unwrap();

        let result = ReadFileTool
            .execute(json!({"path": file_path.to_str().unwrap()}))
            .await
            .unwrap();

        assert!(!result.is_error);
        assert!(result.content.contains("   1| line 1"));
        assert!(result.content.contains("   3| line 3"));
        assert!(!result.content.contains("Showing lines"));
    }

    #[tokio::test]
    async fn test_read_file_with_range() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.txt");
        fs::write(&file_path, "line 1\nline 2\nline 3\nline 4\nline 5\n").unwrap();

        let result = ReadFileTool
            .execute(json!({
                "path": file_path.to_str().unwrap(),
                "start_line": 2,
                "end_line": 4
            }))
            .await
            .unwrap();

        assert!(!result.is_error);
        assert!(!result.content.contains("line 1"));
        assert!(result.content.contains("line 2"));
        assert!(result.content.contains("line 4"));
        assert!(!result.content.contains("line 5"));
        assert!(result.content.contains("[Showing lines 2-4 of 5]"));
    }

    #[tokio::test]
    async fn test_read_nonexistent_file() {
        let result = ReadFileTool
            .execute(json!({"path": "/nonexistent/file.txt"}))
            .await
            .unwrap();

        assert!(result.is_error);
        assert!(result.content.contains("not found"));
    }
}
