//! Data preprocessing ahead of clustering

use crate::graph::Graph;

/// Keep only vertices with at least `min_degree` neighbours other than
/// themselves.
///
/// Removing a vertex lowers the degree of its neighbours, so the filter is
/// repeated until nothing else drops out. Global ids are preserved.
pub fn filter_by_degree(graph: &Graph, min_degree: usize) -> Graph {
    let mut current = graph.clone();
    loop {
        let passing = (0..current.order() as u32)
            .filter(|&u| proper_degree(&current, u) >= min_degree)
            .count();
        if passing == current.order() {
            break;
        }

        log::debug!(
            "Degree filter removed {} of {} vertices",
            current.order() - passing,
            current.order()
        );
        let previous = current;
        current = previous.filter_subgraph(|g| {
            previous
                .local_id(g)
                .map_or(false, |u| proper_degree(&previous, u) >= min_degree)
        });
    }

    log::info!(
        "Kept {} of {} vertices with degree >= {}",
        current.order(),
        graph.order(),
        min_degree
    );
    current
}

fn proper_degree(graph: &Graph, u: u32) -> usize {
    graph.neighbors(u).iter().filter(|&&v| v != u).count()
}
