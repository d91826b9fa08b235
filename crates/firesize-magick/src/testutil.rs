//! Shared fixtures for unit tests: fake ImageMagick scripts, a recording
//! event sink and a minimal descriptor.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use firesize_core::config::{CleanupPolicy, PipelineConfig};
use firesize_core::Error;

use crate::descriptor::TransformDescriptor;
use crate::events::PipelineEvents;
use crate::tools::{ToolRegistry, CONVERT, IDENTIFY};

/// Pipeline settings that keep workspaces under `root` and remove them.
pub fn test_config(root: &Path) -> PipelineConfig {
    PipelineConfig {
        temp_root: Some(root.to_path_buf()),
        cleanup: CleanupPolicy::Always,
        ..PipelineConfig::default()
    }
}

/// Registry containing only the given tools.
pub fn registry(identify: Option<&Path>, convert: Option<&Path>) -> ToolRegistry {
    let mut tools = ToolRegistry::default();
    if let Some(p) = identify {
        tools = tools.with_tool(IDENTIFY, p.to_path_buf());
    }
    if let Some(p) = convert {
        tools = tools.with_tool(CONVERT, p.to_path_buf());
    }
    tools
}

/// Write an executable `sh` script named `name` into `dir`.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// A `convert` stand-in that logs its arguments (one line per call) and
/// copies its first argument to its last.
#[cfg(unix)]
pub fn fake_convert(dir: &Path) -> (PathBuf, PathBuf) {
    let calls = dir.join("convert.calls");
    std::fs::write(&calls, b"").unwrap();
    let body = format!(
        "printf '%s\\n' \"$*\" >> '{}'\n\
         first=\"$1\"\nfor last; do :; done\ncp \"$first\" \"$last\"",
        calls.display()
    );
    (write_script(dir, "convert", &body), calls)
}

/// Lines logged by [`fake_convert`].
pub fn read_calls(calls: &Path) -> Vec<String> {
    std::fs::read_to_string(calls)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Fetch {
        url: String,
        local: PathBuf,
    },
    Transform {
        tool: String,
        args: Vec<String>,
    },
    TransformFailed {
        tool: String,
        args: Vec<String>,
        error: String,
        output: Option<String>,
    },
    Frames {
        path: PathBuf,
        frames: u32,
    },
}

/// [`PipelineEvents`] that keeps every record in memory.
#[derive(Debug, Default)]
pub struct RecordingEvents {
    records: Mutex<Vec<Record>>,
}

impl RecordingEvents {
    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    fn push(&self, record: Record) {
        self.records.lock().unwrap().push(record);
    }
}

impl PipelineEvents for RecordingEvents {
    fn fetch_started(&self, url: &str, local: &Path) {
        self.push(Record::Fetch {
            url: url.to_string(),
            local: local.to_path_buf(),
        });
    }

    fn transform_started(&self, tool: &str, args: &[String]) {
        self.push(Record::Transform {
            tool: tool.to_string(),
            args: args.to_vec(),
        });
    }

    fn transform_failed(&self, tool: &str, args: &[String], error: &Error, output: Option<&str>) {
        self.push(Record::TransformFailed {
            tool: tool.to_string(),
            args: args.to_vec(),
            error: error.to_string(),
            output: output.map(str::to_string),
        });
    }

    fn frames_detected(&self, path: &Path, frames: u32) {
        self.push(Record::Frames {
            path: path.to_path_buf(),
            frames,
        });
    }
}

/// Descriptor producing `<in> -resize <geometry> <out>[.format]`.
#[derive(Debug, Clone)]
pub struct StubDescriptor {
    url: String,
    format: Option<String>,
    geometry: String,
}

impl StubDescriptor {
    pub fn new(url: &str, format: Option<&str>, geometry: &str) -> Self {
        Self {
            url: url.to_string(),
            format: format.map(str::to_string),
            geometry: geometry.to_string(),
        }
    }
}

impl TransformDescriptor for StubDescriptor {
    fn url(&self) -> &str {
        &self.url
    }

    fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    fn set_format(&mut self, format: &str) {
        self.format = Some(format.to_string());
    }

    fn command_args(&self, input: &Path, output: &Path) -> (Vec<String>, PathBuf) {
        let output = match self.format {
            Some(ref f) => PathBuf::from(format!("{}.{f}", output.display())),
            None => output.to_path_buf(),
        };
        let args = vec![
            input.display().to_string(),
            "-resize".to_string(),
            self.geometry.clone(),
            output.display().to_string(),
        ];
        (args, output)
    }
}
