use crate::model::SankeyDiagramLayout;
use crate::route::{LinkRoute, fmt, route_bounds};
use std::fmt::Write as _;

const SCHEME_TABLEAU10: [&str; 10] = [
    "#4e79a7", "#f28e2c", "#e15759", "#76b7b2", "#59a14f", "#edc949", "#af7aa1", "#ff9da7",
    "#9c755f", "#bab0ab",
];

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Renders a laid-out, routed diagram as a headless SVG string.
///
/// Nodes are colored from the tableau10 scheme in node order; links
/// take their source node's color, and reversed links are dashed so
/// feedback reads differently from forward flow.
pub fn render_svg(layout: &SankeyDiagramLayout, routes: &[LinkRoute]) -> String {
    // Reversed links bridge below the canvas and turn around outside
    // its left and right edges; grow the viewport to fit them.
    let bounds = route_bounds(layout);
    let vb_w = bounds.max_x - bounds.min_x;
    let vb_h = bounds.max_y - bounds.min_y;

    let color = |node: usize| SCHEME_TABLEAU10[node % SCHEME_TABLEAU10.len()];

    let mut out = String::new();
    let _ = write!(
        &mut out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="100%" style="max-width: {w}px;" viewBox="{x} {y} {w} {h}" role="graphics-document document" aria-roledescription="food-web sankey">"#,
        x = fmt(bounds.min_x),
        y = fmt(bounds.min_y),
        w = fmt(vb_w),
        h = fmt(vb_h),
    );

    out.push_str(r#"<g class="links" fill="none" stroke-opacity="0.5">"#);
    for (link, route) in layout.links.iter().zip(routes) {
        let stroke = color(link.source);
        let stroke_width = link.dy.max(1.0);
        let dash = if route.is_reversed() {
            r#" stroke-dasharray="6,3""#
        } else {
            ""
        };
        let _ = write!(
            &mut out,
            r#"<g class="link" style="mix-blend-mode: multiply;">"#
        );
        for index in 0..3 {
            if let Some(d) = route.segment(index) {
                let _ = write!(
                    &mut out,
                    r#"<path d="{d}" stroke="{stroke}" stroke-width="{sw}"{dash}/>"#,
                    d = escape_xml(d),
                    stroke = stroke,
                    sw = fmt(stroke_width),
                    dash = dash,
                );
            }
        }
        out.push_str("</g>");
    }
    out.push_str("</g>");

    out.push_str(r#"<g class="nodes">"#);
    for n in &layout.nodes {
        let _ = write!(
            &mut out,
            r#"<g class="node" transform="translate({x},{y})"><rect height="{h}" width="{w}" fill="{fill}"><title>{title}</title></rect></g>"#,
            x = fmt(n.x),
            y = fmt(n.y),
            h = fmt(n.dy),
            w = fmt(layout.node_width),
            fill = color(n.index),
            title = escape_xml(&n.name),
        );
    }
    out.push_str("</g>");

    out.push_str(r#"<g class="node-labels" font-size="14">"#);
    for n in &layout.nodes {
        let y = n.y + n.dy / 2.0;
        let (x, anchor) = if n.x < layout.width / 2.0 {
            (n.x + layout.node_width + 6.0, "start")
        } else {
            (n.x - 6.0, "end")
        };
        let _ = write!(
            &mut out,
            r#"<text x="{x}" y="{y}" dy="0.35em" text-anchor="{anchor}">{text}</text>"#,
            x = fmt(x),
            y = fmt(y),
            anchor = anchor,
            text = escape_xml(&n.name),
        );
    }
    out.push_str("</g>");

    out.push_str("</svg>");
    out
}
