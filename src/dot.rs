//! DOT export for a configuration's committed schedule — threads as
//! clusters, events as boxes, same-thread depth edges grey, cross-thread
//! dependency edges blue.

use crate::configuration::Configuration;
use crate::ids::ThreadId;
use crate::unfolding::Unfolding;
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Writes `config`'s committed schedule as a DOT graph.
pub fn write_dotgraph(
    config: &Configuration,
    unfolding: &Unfolding,
    writer: &mut impl Write,
) -> io::Result<()> {
    writeln!(writer, "digraph configuration {{")?;
    writeln!(writer, "  rankdir=TB;")?;

    let mut by_thread: BTreeMap<ThreadId, Vec<u32>> = BTreeMap::new();
    for &id in config.schedule() {
        let rec = unfolding.get(id);
        by_thread.entry(rec.tid.clone()).or_default().push(id.index() as u32);
    }

    for (tid, events) in &by_thread {
        writeln!(writer, "  subgraph \"cluster_{tid}\" {{")?;
        writeln!(writer, "    label=\"{tid}\";")?;
        for &idx in events {
            let rec = unfolding.get(crate::event::EventId(idx));
            writeln!(
                writer,
                "    e{idx} [shape=box, label=\"{}\\n{}\"];",
                rec.kind.discriminant(),
                idx
            )?;
        }
        for pair in events.windows(2) {
            writeln!(writer, "    e{} -> e{} [color=grey];", pair[0], pair[1])?;
        }
        writeln!(writer, "  }}")?;
    }

    for &id in config.schedule() {
        let rec = unfolding.get(id);
        let same_thread = rec.predecessors.first().copied();
        for &pred in &rec.predecessors {
            if Some(pred) == same_thread {
                continue;
            }
            writeln!(
                writer,
                "  e{} -> e{} [color=blue, constraint=false];",
                pred.index(),
                id.index()
            )?;
        }
    }

    writeln!(writer, "}}")?;
    Ok(())
}

impl Configuration {
    /// Renders this configuration's committed schedule as a DOT graph.
    pub fn to_dotgraph(&self, unfolding: &Unfolding, writer: &mut impl Write) -> io::Result<()> {
        write_dotgraph(self, unfolding, writer)
    }
}
