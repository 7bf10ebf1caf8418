//! Measure report export: one JSON object per line.
//!
//! ```text
//! Engine + GraphHandle → export_measure_report() → JSON lines
//!   {"measure":"ENTROPY_SHANNON_WEAVER","id":0,"family":"entropy",
//!    "alpha":1.0,"beta":1.0,"value":0.693…,"transformed":2.0}
//! ```
//!
//! Non-finite values are written as `null`. A measure that fails (no
//! distance source, stale vector space, ...) still gets a line, with null
//! values and an `error` field, so one report covers every requested id.

use std::io::Write;

use serde::Serialize;

use crate::engine::Engine;
use crate::measure::{MeasureFamily, MeasureId};
use crate::model::GraphHandle;
use crate::Result;

#[derive(Debug, Serialize)]
struct ReportLine<'a> {
    measure: &'a str,
    id: i32,
    family: MeasureFamily,
    alpha: f64,
    beta: f64,
    value: Option<f64>,
    transformed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Evaluate `measures` on `graph` and write one line per measure.
/// Returns the number of lines written.
///
/// An invalid graph handle aborts the export before anything is written.
pub fn export_measure_report(
    engine: &Engine,
    graph: GraphHandle,
    measures: &[MeasureId],
    alpha: f64,
    beta: f64,
    writer: &mut dyn Write,
) -> Result<usize> {
    engine.graph(graph)?;

    for &id in measures {
        let line = match engine.measure(graph, id, alpha, beta) {
            Ok(r) => ReportLine {
                measure: id.name(),
                id: id.id(),
                family: id.family(),
                alpha,
                beta,
                value: finite(r.value),
                transformed: finite(r.transformed),
                error: None,
            },
            Err(err) => ReportLine {
                measure: id.name(),
                id: id.id(),
                family: id.family(),
                alpha,
                beta,
                value: None,
                transformed: None,
                error: Some(err.to_string()),
            },
        };
        serde_json::to_writer(&mut *writer, &line).map_err(std::io::Error::from)?;
        writeln!(writer)?;
    }

    Ok(measures.len())
}

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}
