//! Chrome Trace Event Format (JSON) export for Perfetto.
//!
//! Writes a finished run as a JSON file loadable in
//! [ui.perfetto.dev](https://ui.perfetto.dev). The single CPU is one
//! Perfetto process with a "running" thread; every contiguous run of a task
//! becomes a complete ("X") slice. Preemptions and slice expiries are
//! instant events. One tick is rendered as one millisecond.

use std::io::Write;

use serde_json::json;

use crate::engine::SimulationResult;
use crate::trace::TraceKind;
use crate::types::Tick;

const TICK_US: u64 = 1000;

fn ts(tick: Tick) -> u64 {
    u64::from(tick) * TICK_US
}

/// Write the run as Chrome Trace Event Format JSON.
///
/// Stream-writes events one at a time rather than building a `Vec<Value>`.
pub(crate) fn write_json(result: &SimulationResult, writer: &mut impl Write) -> std::io::Result<()> {
    writer.write_all(b"{\"traceEvents\":[")?;

    let mut need_comma = false;

    write_comma(writer, &mut need_comma)?;
    serde_json::to_writer(
        &mut *writer,
        &json!({
            "ph": "M",
            "pid": 0,
            "tid": 0,
            "name": "process_name",
            "args": { "name": "CPU 0" }
        }),
    )?;
    write_comma(writer, &mut need_comma)?;
    serde_json::to_writer(
        &mut *writer,
        &json!({
            "ph": "M",
            "pid": 0,
            "tid": 0,
            "name": "thread_name",
            "args": { "name": "running" }
        }),
    )?;

    for (i, entry) in result.trace.entries().iter().enumerate() {
        let class = result.tasks[i].def.class;
        let bits = entry.occupancy();
        let mut offset = 0;
        while let Some(begin) = bits[offset..].first_one().map(|b| b + offset) {
            let end = bits[begin..]
                .first_zero()
                .map_or(bits.len(), |z| z + begin);
            let start_tick = result.start + begin as Tick;
            write_comma(writer, &mut need_comma)?;
            serde_json::to_writer(
                &mut *writer,
                &json!({
                    "ph": "X",
                    "pid": 0,
                    "tid": 0,
                    "ts": ts(start_tick),
                    "dur": (end - begin) as u64 * TICK_US,
                    "name": entry.id.as_str(),
                    "cat": "sched",
                    "args": { "class": class.code().to_string() }
                }),
            )?;
            offset = end;
        }
    }

    for event in result.trace.events() {
        // Preemption happens before the tick executes; expiry and
        // completion after it.
        let (name, task, at) = match &event.kind {
            TraceKind::TaskPreempted { task, .. } => ("preempted", *task, event.tick),
            TraceKind::SliceExpired { task } => ("slice_expired", *task, event.tick + 1),
            TraceKind::TaskCompleted { task } => ("completed", *task, event.tick + 1),
            _ => continue,
        };
        write_comma(writer, &mut need_comma)?;
        serde_json::to_writer(
            &mut *writer,
            &json!({
                "ph": "i",
                "pid": 0,
                "tid": 0,
                "ts": ts(at),
                "s": "t",
                "name": name,
                "cat": "sched",
                "args": { "task": result.tasks[task.0].def.id.as_str() }
            }),
        )?;
    }

    writer.write_all(b"]}")?;
    Ok(())
}

fn write_comma(writer: &mut impl Write, need_comma: &mut bool) -> std::io::Result<()> {
    if *need_comma {
        writer.write_all(b",")?;
    }
    *need_comma = true;
    Ok(())
}
