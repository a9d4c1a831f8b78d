use crate::model::{Bounds, SankeyConfig, SankeyDiagramLayout, SankeyLinkLayout, SankeyNodeLayout};
use crate::{Error, Result};
use std::cmp::Ordering;
use trawl_core::FlowGraph;

fn f64_cmp(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Lays out a trophic-layered flow graph as a Sankey diagram.
///
/// Columns come from the pre-assigned `layer` of each node (never from
/// graph traversal: food webs are cyclic). Vertical positions start as
/// a stacked column in input order and are then relaxed by weighted
/// barycenters to reduce crossings. The flow-to-pixel scale is shared
/// by all columns, derived from the busiest one.
pub fn layout(graph: &FlowGraph, config: &SankeyConfig) -> Result<SankeyDiagramLayout> {
    let n = graph.nodes.len();
    for l in &graph.links {
        if l.source >= n || l.target >= n {
            return Err(Error::InvalidGraph {
                message: format!("link {} -> {} references a missing node", l.source, l.target),
            });
        }
        // Written to also reject NaN, which fails every comparison.
        if !(l.value >= 0.0) {
            return Err(Error::InvalidGraph {
                message: format!(
                    "link {} -> {} has negative or non-finite display value {}; normalize upstream",
                    l.source, l.target, l.value
                ),
            });
        }
    }

    let inner_w = (config.width - config.margin.left - config.margin.right - config.node_width)
        .max(0.0);
    let inner_h = (config.height - config.margin.top - config.margin.bottom).max(0.0);
    let y0_extent = config.margin.top;
    let y1_extent = config.margin.top + inner_h;

    let (in_links, out_links) = adjacency(n, graph);

    let mut nodes: Vec<SankeyNodeLayout> = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let out_sum: f64 = out_links[i].iter().map(|&li| graph.links[li].value).sum();
            let in_sum: f64 = in_links[i].iter().map(|&li| graph.links[li].value).sum();
            SankeyNodeLayout {
                index: i,
                name: node.name.clone(),
                layer: node.layer,
                is_fleet: node.is_fleet,
                trophic_level: node.realized_trophic_level,
                value: out_sum.max(in_sum),
                x: 0.0,
                y: 0.0,
                dy: 0.0,
            }
        })
        .collect();

    let max_layer = nodes.iter().map(|n| n.layer).max().unwrap_or(0);
    if max_layer == 0 && !nodes.is_empty() {
        tracing::warn!("all nodes in a single column; layout degenerates to one stack");
    }

    let mut columns: Vec<Vec<usize>> = vec![Vec::new(); max_layer + 1];
    for node in &nodes {
        columns[node.layer].push(node.index);
    }

    let kx = if max_layer == 0 {
        0.0
    } else {
        inner_w / max_layer as f64
    };
    for node in &mut nodes {
        node.x = config.margin.left + node.layer as f64 * kx;
    }

    // One flow-to-pixel scale for the whole diagram, set by the column
    // whose throughput fills its available height first.
    let mut ky = f64::INFINITY;
    for col in &columns {
        if col.is_empty() {
            continue;
        }
        let sum: f64 = col.iter().map(|&ni| nodes[ni].value).sum();
        if sum <= 0.0 {
            tracing::warn!(column = nodes[col[0]].layer, "column has zero throughput");
            continue;
        }
        let avail = inner_h - (col.len() as f64 - 1.0) * config.node_padding;
        if avail <= 0.0 {
            tracing::warn!(
                column = nodes[col[0]].layer,
                "padding exceeds canvas height for this column"
            );
            continue;
        }
        ky = ky.min(avail / sum);
    }
    if !ky.is_finite() {
        tracing::warn!("no column with positive throughput; all nodes get zero height");
        ky = 0.0;
    }

    let mut links: Vec<SankeyLinkLayout> = graph
        .links
        .iter()
        .enumerate()
        .map(|(i, l)| SankeyLinkLayout {
            index: i,
            source: l.source,
            target: l.target,
            value: l.value,
            flux: l.flux,
            dy: l.value * ky,
            sy0: 0.0,
            ty0: 0.0,
            reversed: graph.nodes[l.target].layer <= graph.nodes[l.source].layer,
        })
        .collect();

    // Initial placement: stack each column top to bottom in input order.
    for col in &columns {
        let mut y = y0_extent;
        for &ni in col {
            nodes[ni].dy = nodes[ni].value * ky;
            nodes[ni].y = y;
            y += nodes[ni].dy + config.node_padding;
        }
    }

    let mut columns_work = columns.clone();
    let mut alpha = 1.0f64;
    for _ in 0..config.iterations {
        alpha *= 0.99;
        relax_right_to_left(&mut nodes, &links, &out_links, &columns_work, alpha);
        resolve_collisions(&mut nodes, &mut columns_work, config.node_padding, y0_extent, y1_extent);
        relax_left_to_right(&mut nodes, &links, &in_links, &columns_work, alpha);
        resolve_collisions(&mut nodes, &mut columns_work, config.node_padding, y0_extent, y1_extent);
    }

    compute_link_bands(&nodes, &mut links, &in_links, &out_links);

    let bounds = Bounds::from_points(
        nodes
            .iter()
            .flat_map(|n| [(n.x, n.y), (n.x + config.node_width, n.y + n.dy)])
            .chain([(0.0, 0.0), (config.width, config.height)]),
    );

    Ok(SankeyDiagramLayout {
        width: config.width,
        height: config.height,
        margin: config.margin,
        node_width: config.node_width,
        node_padding: config.node_padding,
        nodes,
        links,
        bounds,
    })
}

/// Incremental relayout after a manual reposition: only the per-node
/// band partitioning is refreshed from the current `y` positions. The
/// relaxation is deliberately not rerun, so dragged nodes stay put.
pub fn relayout(layout: &mut SankeyDiagramLayout) {
    let n = layout.nodes.len();
    let mut in_links: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut out_links: Vec<Vec<usize>> = vec![Vec::new(); n];
    for l in &layout.links {
        out_links[l.source].push(l.index);
        in_links[l.target].push(l.index);
    }
    compute_link_bands(&layout.nodes, &mut layout.links, &in_links, &out_links);
}

fn adjacency(n: usize, graph: &FlowGraph) -> (Vec<Vec<usize>>, Vec<Vec<usize>>) {
    let mut in_links: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut out_links: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (i, l) in graph.links.iter().enumerate() {
        out_links[l.source].push(i);
        in_links[l.target].push(i);
    }
    (in_links, out_links)
}

/// Slots partition each node face proportionally to link value, in
/// link creation order. Never re-sorted, so bands stay with the same
/// link across relayouts and curves do not visually swap.
fn compute_link_bands(
    nodes: &[SankeyNodeLayout],
    links: &mut [SankeyLinkLayout],
    in_links: &[Vec<usize>],
    out_links: &[Vec<usize>],
) {
    for node in nodes {
        let mut acc = 0.0;
        for &li in &out_links[node.index] {
            links[li].sy0 = acc;
            acc += links[li].dy;
        }
        let mut acc = 0.0;
        for &li in &in_links[node.index] {
            links[li].ty0 = acc;
            acc += links[li].dy;
        }
    }
}

fn center(node: &SankeyNodeLayout) -> f64 {
    node.y + node.dy / 2.0
}

fn relax_left_to_right(
    nodes: &mut [SankeyNodeLayout],
    links: &[SankeyLinkLayout],
    in_links: &[Vec<usize>],
    columns: &[Vec<usize>],
    alpha: f64,
) {
    for col in columns.iter() {
        for &ni in col {
            let mut y = 0.0;
            let mut w = 0.0;
            for &li in &in_links[ni] {
                let l = &links[li];
                y += center(&nodes[l.source]) * l.value;
                w += l.value;
            }
            if w > 0.0 {
                let dy = (y / w - center(&nodes[ni])) * alpha;
                nodes[ni].y += dy;
            }
        }
    }
}

fn relax_right_to_left(
    nodes: &mut [SankeyNodeLayout],
    links: &[SankeyLinkLayout],
    out_links: &[Vec<usize>],
    columns: &[Vec<usize>],
    alpha: f64,
) {
    for col in columns.iter().rev() {
        for &ni in col {
            let mut y = 0.0;
            let mut w = 0.0;
            for &li in &out_links[ni] {
                let l = &links[li];
                y += center(&nodes[l.target]) * l.value;
                w += l.value;
            }
            if w > 0.0 {
                let dy = (y / w - center(&nodes[ni])) * alpha;
                nodes[ni].y += dy;
            }
        }
    }
}

/// Pushes overlapping siblings apart, top to bottom, then walks back
/// up if the column ran past the bottom bound. Total column span is
/// preserved whenever it fits the canvas.
fn resolve_collisions(
    nodes: &mut [SankeyNodeLayout],
    columns: &mut [Vec<usize>],
    padding: f64,
    y0_extent: f64,
    y1_extent: f64,
) {
    for col in columns.iter_mut() {
        col.sort_by(|&a, &b| f64_cmp(nodes[a].y, nodes[b].y).then_with(|| a.cmp(&b)));

        let mut y = y0_extent;
        for &ni in col.iter() {
            let dy = y - nodes[ni].y;
            if dy > 0.0 {
                nodes[ni].y += dy;
            }
            y = nodes[ni].y + nodes[ni].dy + padding;
        }

        let Some(&last) = col.last() else { continue };
        let overflow = y - padding - y1_extent;
        if overflow > 0.0 {
            nodes[last].y -= overflow;
            let mut y = nodes[last].y;
            for &ni in col.iter().rev().skip(1) {
                let dy = nodes[ni].y + nodes[ni].dy + padding - y;
                if dy > 0.0 {
                    nodes[ni].y -= dy;
                }
                y = nodes[ni].y;
            }
        }
    }
}
