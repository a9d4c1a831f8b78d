use crate::model::{Bounds, SankeyDiagramLayout};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Route geometry for one link.
///
/// A classic Sankey path assumes monotone left-to-right flow. Food
/// webs feed back (predation loops, cannibalism), so a link whose
/// target sits at or left of its source is drawn as a three-segment
/// composite instead: a departure curve leaving the source's right
/// face, a bridge carrying the backward travel below the canvas, and
/// an arrival curve entering the target's left face. The segments are
/// named fields, with an index accessor for hosts that issue one draw
/// call per segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LinkRoute {
    Forward {
        path: String,
    },
    Reversed {
        departure: String,
        bridge: String,
        arrival: String,
    },
}

impl LinkRoute {
    /// The legacy three-index draw contract: forward links render at
    /// index 0 only; reversed links render all three.
    pub fn segment(&self, index: usize) -> Option<&str> {
        match (self, index) {
            (LinkRoute::Forward { path }, 0) => Some(path),
            (LinkRoute::Reversed { departure, .. }, 0) => Some(departure),
            (LinkRoute::Reversed { bridge, .. }, 1) => Some(bridge),
            (LinkRoute::Reversed { arrival, .. }, 2) => Some(arrival),
            _ => None,
        }
    }

    pub fn is_reversed(&self) -> bool {
        matches!(self, LinkRoute::Reversed { .. })
    }
}

/// Computes path geometry for every link of a laid-out diagram.
///
/// Pure function of the layout: identical inputs produce byte-identical
/// path strings. Reversed links are stacked on distinct bridge rows
/// below the canvas, assigned in link order.
pub fn route_links(layout: &SankeyDiagramLayout, curvature: f64) -> Vec<LinkRoute> {
    let mut bridge_base = layout.height + layout.node_padding;
    layout
        .links
        .iter()
        .map(|link| {
            let source = &layout.nodes[link.source];
            let target = &layout.nodes[link.target];
            let sx = source.x + layout.node_width;
            let sy = source.y + link.sy0 + link.dy / 2.0;
            let tx = target.x;
            let ty = target.y + link.ty0 + link.dy / 2.0;

            if tx > source.x {
                let x2 = sx + (tx - sx) * curvature;
                let x3 = sx + (tx - sx) * (1.0 - curvature);
                let mut path = String::new();
                let _ = write!(
                    &mut path,
                    "M{},{}C{},{},{},{},{},{}",
                    fmt(sx),
                    fmt(sy),
                    fmt(x2),
                    fmt(sy),
                    fmt(x3),
                    fmt(ty),
                    fmt(tx),
                    fmt(ty)
                );
                LinkRoute::Forward { path }
            } else {
                let by = bridge_base + link.dy / 2.0;
                bridge_base += link.dy + layout.node_padding;

                let ext = layout.node_width + layout.node_padding;
                let x_out = sx + ext;
                let x_in = tx - ext;

                let departure = format!(
                    "M{},{}C{},{},{},{},{},{}",
                    fmt(sx),
                    fmt(sy),
                    fmt(x_out),
                    fmt(sy),
                    fmt(x_out),
                    fmt(sy + (by - sy) * curvature),
                    fmt(x_out),
                    fmt(by)
                );
                let bridge = format!("M{},{}L{},{}", fmt(x_out), fmt(by), fmt(x_in), fmt(by));
                let arrival = format!(
                    "M{},{}C{},{},{},{},{},{}",
                    fmt(x_in),
                    fmt(by),
                    fmt(x_in),
                    fmt(by - (by - ty) * curvature),
                    fmt(x_in),
                    fmt(ty),
                    fmt(tx),
                    fmt(ty)
                );
                LinkRoute::Reversed {
                    departure,
                    bridge,
                    arrival,
                }
            }
        })
        .collect()
}

/// Bounding box of the geometry [`route_links`] produces, stroke
/// half-widths included. The canvas always counts; reversed links
/// widen the box with their turnaround columns and deepen it with
/// their bridge rows.
pub fn route_bounds(layout: &SankeyDiagramLayout) -> Bounds {
    let ext = layout.node_width + layout.node_padding;
    let mut bounds = Bounds {
        min_x: 0.0,
        min_y: 0.0,
        max_x: layout.width,
        max_y: layout.height,
    };
    let mut bridge_base = layout.height + layout.node_padding;
    for link in &layout.links {
        let source = &layout.nodes[link.source];
        let target = &layout.nodes[link.target];
        if target.x > source.x {
            continue;
        }
        let half = link.dy / 2.0;
        let by = bridge_base + half;
        bridge_base += link.dy + layout.node_padding;
        bounds.min_x = bounds.min_x.min(target.x - ext - half);
        bounds.max_x = bounds.max_x.max(source.x + layout.node_width + ext + half);
        bounds.max_y = bounds.max_y.max(by + half);
    }
    bounds
}

/// Deterministic float stringification for path data: round-trippable
/// decimal form without `-0` or tiny float noise from our own math.
pub(crate) fn fmt(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let mut v = if v.abs() < 1e-9 { 0.0 } else { v };
    let nearest = v.round();
    if (v - nearest).abs() < 1e-6 {
        v = nearest;
    }
    let s = v.to_string();
    if s == "-0" { "0".to_string() } else { s }
}
