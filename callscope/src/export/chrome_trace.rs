// Microsecond timestamps are f64 by format definition
#![allow(clippy::cast_precision_loss)]

use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::io::Write;

use crate::domain::{Duration, ExportError};
use crate::hook::CallHook;
use crate::profiling::{Calls, Clock, Profiler};

/// Chrome Trace Event format
/// Spec: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU/preview
#[derive(Debug, Clone, Serialize)]
struct ChromeTraceEvent {
    /// Event name (function name)
    name: String,
    /// Category for filtering/coloring
    cat: String,
    /// Phase: "X" = complete, "M" = metadata
    ph: String,
    /// Timestamp in microseconds since `start()`
    ts: f64,
    /// Duration in microseconds (complete events only)
    #[serde(skip_serializing_if = "Option::is_none")]
    dur: Option<f64>,
    /// Process ID
    pid: u32,
    /// Thread ID
    tid: u32,
    /// Optional arguments (metadata)
    #[serde(skip_serializing_if = "Option::is_none")]
    args: Option<HashMap<String, JsonValue>>,
}

/// Chrome Trace Format container
#[derive(Debug, Serialize)]
struct ChromeTrace {
    #[serde(rename = "traceEvents")]
    trace_events: Vec<ChromeTraceEvent>,
    #[serde(rename = "displayTimeUnit")]
    display_time_unit: String,
}

/// Chrome trace exporter for timeline visualization
///
/// Every completed call becomes one complete ("X") event on a single track,
/// so nesting is shown by the viewer from the intervals alone.
pub struct ChromeTraceExporter {
    pid: u32,
    tid: u32,
    thread_name: String,
}

impl ChromeTraceExporter {
    /// Exporter labelling events with the current process ID
    #[must_use]
    pub fn new() -> Self {
        Self::with_ids(std::process::id(), 1)
    }

    /// Exporter labelling events with explicit process and thread IDs
    #[must_use]
    pub fn with_ids(pid: u32, tid: u32) -> Self {
        let thread_name =
            std::thread::current().name().map_or_else(|| "profiled".to_string(), str::to_string);
        Self { pid, tid, thread_name }
    }

    /// Export the calls of a stopped profiler
    ///
    /// # Errors
    /// [`ExportError::NotReady`] if the profiler has not stopped, or a
    /// serialization / I/O error from the writer.
    pub fn export<H, C, W>(&self, profiler: &Profiler<H, C>, writer: W) -> Result<(), ExportError>
    where
        H: CallHook,
        C: Clock + 'static,
        W: Write,
    {
        let calls = profiler.calls().ok_or(ExportError::NotReady)?;
        self.export_calls(calls, writer)
    }

    /// Export an already frozen call list
    ///
    /// # Errors
    /// Serialization or I/O errors from the writer.
    pub fn export_calls<W: Write>(&self, calls: &Calls, writer: W) -> Result<(), ExportError> {
        let trace = ChromeTrace {
            trace_events: self.events(calls),
            display_time_unit: "ms".to_string(),
        };

        serde_json::to_writer_pretty(writer, &trace)?;
        Ok(())
    }

    fn events(&self, calls: &Calls) -> Vec<ChromeTraceEvent> {
        let mut events: Vec<(usize, ChromeTraceEvent)> = calls
            .iter()
            .map(|call| {
                let description = call.description();
                let depth = call.depth();

                let mut args = HashMap::new();
                args.insert("description".to_string(), serde_json::json!(description.as_str()));
                args.insert("depth".to_string(), serde_json::json!(depth));
                if let Some(location) = description.source_location() {
                    args.insert("location".to_string(), serde_json::json!(location));
                }

                let event = ChromeTraceEvent {
                    name: if description.symbol_name().is_empty() {
                        description.as_str().to_string()
                    } else {
                        description.symbol_name().to_string()
                    },
                    cat: "call".to_string(),
                    ph: "X".to_string(), // Complete
                    ts: micros(call.started_at()),
                    dur: Some(micros(call.duration())),
                    pid: self.pid,
                    tid: self.tid,
                    args: Some(args),
                };
                (depth, event)
            })
            .collect();

        // Callers before callees that share a start time
        events.sort_by(|(da, a), (db, b)| a.ts.total_cmp(&b.ts).then(da.cmp(db)));

        let mut args = HashMap::new();
        args.insert("name".to_string(), serde_json::json!(self.thread_name));

        let mut all_events = Vec::with_capacity(events.len() + 1);
        all_events.push(ChromeTraceEvent {
            name: "thread_name".to_string(),
            cat: String::new(),
            ph: "M".to_string(), // Metadata
            ts: 0.0,
            dur: None,
            pid: self.pid,
            tid: self.tid,
            args: Some(args),
        });
        all_events.extend(events.into_iter().map(|(_, event)| event));
        all_events
    }
}

impl Default for ChromeTraceExporter {
    fn default() -> Self {
        Self::new()
    }
}

fn micros(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1000.0
}
