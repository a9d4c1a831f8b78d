use crate::model::{SankeyConfig, SankeyDiagramLayout};
use crate::route::{LinkRoute, route_links};
use crate::{Result, sankey};
use trawl_core::FlowGraph;

/// Per-link draw decision exposed to the drawing collaborator. The
/// view computes these; styling (opacity values, colors) stays with
/// the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEmphasis {
    Normal,
    /// Touches the hovered node.
    Highlighted,
    /// Does not touch the hovered node.
    Dimmed,
    /// Filtered out by a double-click isolation.
    Hidden,
}

/// Event-driven wrapper over layout + routing.
///
/// Single-threaded by design: every handler runs synchronously on the
/// caller's event loop and leaves the view in a fully rerouted state.
/// Drags mutate only `y`; hover and isolation are cosmetic and touch
/// no layout state.
#[derive(Debug, Clone)]
pub struct InteractiveView {
    config: SankeyConfig,
    layout: SankeyDiagramLayout,
    routes: Vec<LinkRoute>,
    hovered: Option<usize>,
    isolated: Option<usize>,
}

impl InteractiveView {
    pub fn new(graph: &FlowGraph, config: SankeyConfig) -> Result<Self> {
        let layout = sankey::layout(graph, &config)?;
        let routes = route_links(&layout, config.curvature);
        Ok(Self {
            config,
            layout,
            routes,
            hovered: None,
            isolated: None,
        })
    }

    pub fn layout(&self) -> &SankeyDiagramLayout {
        &self.layout
    }

    pub fn routes(&self) -> &[LinkRoute] {
        &self.routes
    }

    pub fn config(&self) -> &SankeyConfig {
        &self.config
    }

    /// Repositions a node vertically. The new position is clamped to
    /// the canvas (silently), bands are repartitioned from the new
    /// positions, and all links are rerouted. The relaxation is not
    /// rerun, so the manual position sticks.
    pub fn on_node_drag(&mut self, node: usize, new_y: f64) {
        let Some(n) = self.layout.nodes.get_mut(node) else {
            return;
        };
        let top = self.config.margin.top;
        let bottom = (self.config.height - self.config.margin.bottom - n.dy).max(top);
        n.y = new_y.clamp(top, bottom);
        sankey::relayout(&mut self.layout);
        self.routes = route_links(&self.layout, self.config.curvature);
    }

    pub fn on_node_hover(&mut self, node: usize) {
        if node < self.layout.nodes.len() {
            self.hovered = Some(node);
        }
    }

    pub fn on_node_leave(&mut self) {
        self.hovered = None;
    }

    /// Toggles isolation of a node: links not touching it become
    /// hidden; a second double-click on the same node restores them.
    pub fn on_node_double_click(&mut self, node: usize) {
        if node >= self.layout.nodes.len() {
            return;
        }
        self.isolated = if self.isolated == Some(node) {
            None
        } else {
            Some(node)
        };
    }

    /// Opacity for a link under the current emphasis, taken from the
    /// configured thresholds. Hidden links get zero.
    pub fn link_opacity(&self, link: usize) -> f64 {
        let o = self.config.link_opacity;
        match self.link_emphasis(link) {
            LinkEmphasis::Normal => o.normal,
            LinkEmphasis::Highlighted => o.highlighted,
            LinkEmphasis::Dimmed => o.dimmed,
            LinkEmphasis::Hidden => 0.0,
        }
    }

    pub fn link_emphasis(&self, link: usize) -> LinkEmphasis {
        let Some(l) = self.layout.links.get(link) else {
            return LinkEmphasis::Normal;
        };
        let touches = |node: usize| l.source == node || l.target == node;
        if let Some(node) = self.isolated {
            if !touches(node) {
                return LinkEmphasis::Hidden;
            }
        }
        match self.hovered {
            Some(node) if touches(node) => LinkEmphasis::Highlighted,
            Some(_) => LinkEmphasis::Dimmed,
            None => LinkEmphasis::Normal,
        }
    }
}
