//! Graphviz output. DOT emission is a pure string transform; PNG
//! rendering shells out to the `dot` binary and never touches the core
//! path.

use crate::pcg::{Pcg, END_ID, START_ID};
use std::io;
use std::path::Path;
use std::process::Command;

/// Render the graph as Graphviz DOT. Accepting states are drawn as
/// filled double circles carrying their accept sets.
pub fn to_dot(cg: &Pcg) -> String {
    let mut out = String::from("digraph pcg {\n");
    for id in cg.vertex_ids_sorted() {
        let s = cg.state(id);
        let attrs = if id == START_ID {
            "label=\"Start\"".to_string()
        } else if id == END_ID {
            "label=\"End\"".to_string()
        } else if s.accept.is_empty() {
            format!("label=\"{}, {}\"", s.state, s.loc())
        } else {
            format!(
                "label=\"{}, {}\\nAccept={}\" shape=doublecircle style=filled fillcolor=lightyellow",
                s.state,
                s.loc(),
                s.accept
            )
        };
        out.push_str(&format!("  {} [{}];\n", id, attrs));
    }
    let mut edges: Vec<(u32, u32)> = cg.edges().collect();
    edges.sort_unstable();
    for (u, v) in edges {
        out.push_str(&format!("  {} -> {};\n", u, v));
    }
    out.push_str("}\n");
    out
}

/// Write `<file>.dot` and invoke `dot -Tpng` to produce `<file>.png`.
pub fn generate_png(cg: &Pcg, file: &Path) -> io::Result<()> {
    let dot_path = file.with_extension("dot");
    let png_path = file.with_extension("png");
    std::fs::write(&dot_path, to_dot(cg))?;
    let status = Command::new("dot")
        .arg("-Tpng")
        .arg(&dot_path)
        .arg("-o")
        .arg(&png_path)
        .status()?;
    if !status.success() {
        return Err(io::Error::other(format!(
            "dot exited with status {}",
            status
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcg::build_from_automata;
    use crate::testutil::{ends_with, line_abc};
    use std::sync::Arc;

    #[test]
    fn test_dot_labels() {
        let topo = Arc::new(line_abc());
        let d1 = ends_with("A", &["A", "B", "C"]);
        let cg = build_from_automata(topo, &[d1]).unwrap();
        let dot = to_dot(&cg);
        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("label=\"Start\""));
        assert!(dot.contains("label=\"End\""));
        assert!(dot.contains("Accept={1}"));
        assert!(dot.contains("doublecircle"));
        // One line per edge.
        assert_eq!(dot.matches(" -> ").count(), cg.edge_count());
    }
}
