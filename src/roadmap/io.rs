//! Line-based text format for persisted roadmaps.
//!
//! Layout: a `graph <V> <E>` header, `V` vertex lines and `E` edge lines,
//! then `property <name> <vertex|edge> <index> <value...>` blocks. States are
//! serialized as space-separated doubles in shortest round-trip form, so a
//! written roadmap reads back with bit-equal coordinates.

use std::io::{BufRead, Write};

use itertools::Itertools;

use crate::common::error::{PlannerError, PlannerResult};
use crate::family::TAG_UNKNOWN;
use crate::roadmap::graph::{EdgeId, Roadmap, Vertex, VertexId};
use crate::space::State;

pub fn write_roadmap<W: Write>(g: &Roadmap, out: &mut W) -> PlannerResult<()> {
    writeln!(out, "graph {} {}", g.num_vertices(), g.num_edges())?;
    for i in 0..g.num_vertices() {
        writeln!(out, "vertex {}", i)?;
    }
    for i in 0..g.num_edges() {
        let (u, v) = g.endpoints(EdgeId(i));
        writeln!(out, "edge {} {} {}", i, u.0, v.0)?;
    }
    for i in 0..g.num_vertices() {
        let vertex = g.vertex(VertexId(i));
        let state = vertex.state.values().iter().map(|x| x.to_string()).join(" ");
        writeln!(out, "property state vertex {} {}", i, state)?;
        writeln!(out, "property subgraph vertex {} {}", i, vertex.subgraph)?;
        writeln!(
            out,
            "property is_shadow vertex {} {}",
            i,
            u8::from(vertex.is_shadow)
        )?;
    }
    for i in 0..g.num_edges() {
        let edge = g.edge(EdgeId(i));
        writeln!(out, "property distance edge {} {}", i, edge.distance)?;
        writeln!(out, "property subgraph edge {} {}", i, edge.subgraph)?;
    }
    Ok(())
}

fn malformed(line: &str) -> PlannerError {
    PlannerError::BadArgs(format!("malformed roadmap line `{}`", line))
}

/// Reads a roadmap written by [`write_roadmap`]. Tags and lazy weights are
/// runtime knowledge and come back in their initial states.
pub fn read_roadmap<R: BufRead>(input: &mut R) -> PlannerResult<Roadmap> {
    let mut lines = Vec::new();
    for line in input.lines() {
        let line = line?;
        if !line.trim().is_empty() {
            lines.push(line);
        }
    }
    let mut iter = lines.iter();
    let header = iter.next().ok_or_else(|| malformed("<empty>"))?;
    let fields: Vec<&str> = header.split_whitespace().collect();
    let (num_vertices, num_edges) = match fields.as_slice() {
        ["graph", v, e] => (
            v.parse::<usize>().map_err(|_| malformed(header))?,
            e.parse::<usize>().map_err(|_| malformed(header))?,
        ),
        _ => return Err(malformed(header)),
    };

    let mut g = Roadmap::new();
    for i in 0..num_vertices {
        let line = iter.next().ok_or_else(|| malformed("<missing vertex>"))?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.as_slice() {
            ["vertex", idx] if idx.parse() == Ok(i) => {}
            _ => return Err(malformed(line)),
        }
        g.add_vertex(Vertex {
            state: State::new(Vec::new()),
            subgraph: 0,
            is_shadow: false,
            tag: TAG_UNKNOWN,
        });
    }
    for i in 0..num_edges {
        let line = iter.next().ok_or_else(|| malformed("<missing edge>"))?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        let (u, v) = match fields.as_slice() {
            ["edge", idx, u, v] if idx.parse() == Ok(i) => (
                u.parse::<usize>().map_err(|_| malformed(line))?,
                v.parse::<usize>().map_err(|_| malformed(line))?,
            ),
            _ => return Err(malformed(line)),
        };
        if u >= num_vertices || v >= num_vertices {
            return Err(malformed(line));
        }
        g.add_edge(VertexId(u), VertexId(v), 0.0, 0);
    }

    for line in iter {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 5 || fields[0] != "property" {
            return Err(malformed(line));
        }
        let name = fields[1];
        let scope = fields[2];
        let index: usize = fields[3].parse().map_err(|_| malformed(line))?;
        let values = &fields[4..];
        match (name, scope) {
            ("state", "vertex") => {
                let coords = values
                    .iter()
                    .map(|v| v.parse::<f64>().map_err(|_| malformed(line)))
                    .collect::<PlannerResult<Vec<f64>>>()?;
                if index >= num_vertices {
                    return Err(malformed(line));
                }
                g.vertex_mut(VertexId(index)).state = State::new(coords);
            }
            ("subgraph", "vertex") => {
                if index >= num_vertices {
                    return Err(malformed(line));
                }
                g.vertex_mut(VertexId(index)).subgraph =
                    values[0].parse().map_err(|_| malformed(line))?;
            }
            ("is_shadow", "vertex") => {
                if index >= num_vertices {
                    return Err(malformed(line));
                }
                g.vertex_mut(VertexId(index)).is_shadow = match values[0] {
                    "0" => false,
                    "1" => true,
                    _ => return Err(malformed(line)),
                };
            }
            ("distance", "edge") => {
                if index >= num_edges {
                    return Err(malformed(line));
                }
                g.edge_mut(EdgeId(index)).distance =
                    values[0].parse().map_err(|_| malformed(line))?;
            }
            ("subgraph", "edge") => {
                if index >= num_edges {
                    return Err(malformed(line));
                }
                g.edge_mut(EdgeId(index)).subgraph =
                    values[0].parse().map_err(|_| malformed(line))?;
            }
            _ => return Err(malformed(line)),
        }
    }
    Ok(g)
}
