//! Implementation of the 'tools' subcommand.
//!
//! Reports whether ffprobe and ffmpeg can be run and what the `auto`
//! backend resolves to on this machine.

use crate::cli::ToolsArgs;
use crate::error::CliResult;
use crate::output::{print_heading, print_info};

use soundcheck_core::{CoreError, check_dependency};

use serde::Serialize;

/// Availability of the external tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolsReport {
    pub ffprobe: bool,
    pub ffmpeg: bool,
    /// Backends the `auto` setting tries, in order
    pub auto_backends: Vec<&'static str>,
}

impl ToolsReport {
    /// Builds a report from the availability of each tool.
    pub fn new(ffprobe: bool, ffmpeg: bool) -> Self {
        let mut auto_backends = vec!["container"];
        if ffprobe {
            auto_backends.push("ffprobe");
        }
        Self {
            ffprobe,
            ffmpeg,
            auto_backends,
        }
    }

    /// Probes the system for the tools.
    pub fn detect() -> Self {
        Self::new(is_available("ffprobe"), is_available("ffmpeg"))
    }
}

fn is_available(tool: &str) -> bool {
    match check_dependency(tool) {
        Ok(_) => true,
        Err(CoreError::DependencyNotFound(_)) => false,
        Err(e) => {
            log::warn!("Could not check for {}: {}", tool, e);
            false
        }
    }
}

fn availability(available: bool) -> &'static str {
    if available { "available" } else { "not found" }
}

/// Runs the tools command.
pub fn run_tools(args: &ToolsArgs) -> CliResult<()> {
    let report = ToolsReport::detect();

    if args.json {
        let line = serde_json::to_string(&report)
            .map_err(|e| CoreError::OperationFailed(format!("Serializing tools report: {e}")))?;
        println!("{line}");
        return Ok(());
    }

    print_heading("External Tools");
    print_info("ffprobe", availability(report.ffprobe));
    print_info("ffmpeg", availability(report.ffmpeg));
    print_info("auto backend", report.auto_backends.join(" -> "));
    if !report.ffmpeg {
        print_info("ffmpeg backend", "unavailable (install ffmpeg to use --backend ffmpeg)");
    }
    Ok(())
}
