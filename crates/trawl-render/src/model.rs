use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            top: 10.0,
            right: 10.0,
            bottom: 10.0,
            left: 10.0,
        }
    }
}

impl Margin {
    pub fn zero() -> Self {
        Self {
            top: 0.0,
            right: 0.0,
            bottom: 0.0,
            left: 0.0,
        }
    }
}

/// Link opacity thresholds. The layout never reads these; they pass
/// through to the view's emphasis decisions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkOpacity {
    pub normal: f64,
    pub highlighted: f64,
    pub dimmed: f64,
}

impl Default for LinkOpacity {
    fn default() -> Self {
        Self {
            normal: 0.5,
            highlighted: 0.9,
            dimmed: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SankeyConfig {
    pub width: f64,
    pub height: f64,
    pub margin: Margin,
    /// Fixed horizontal thickness of every node.
    pub node_width: f64,
    /// Minimum vertical gap between sibling nodes in a column.
    pub node_padding: f64,
    /// Relaxation passes; layer assignment never changes across them.
    pub iterations: usize,
    pub curvature: f64,
    pub link_opacity: LinkOpacity,
}

impl Default for SankeyConfig {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 400.0,
            margin: Margin::default(),
            node_width: 15.0,
            node_padding: 8.0,
            iterations: 32,
            curvature: 0.5,
            link_opacity: LinkOpacity::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SankeyNodeLayout {
    pub index: usize,
    pub name: String,
    pub layer: usize,
    pub is_fleet: bool,
    /// Realized trophic level, for axis placement.
    pub trophic_level: f64,
    /// Total throughput: max of incoming and outgoing display value.
    pub value: f64,
    pub x: f64,
    pub y: f64,
    pub dy: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SankeyLinkLayout {
    pub index: usize,
    pub source: usize,
    pub target: usize,
    pub value: f64,
    /// Raw signed flux (`Q`); tooltip data, never geometry.
    pub flux: f64,
    /// Band thickness.
    pub dy: f64,
    /// Vertical start offset within the source node's out face.
    pub sy0: f64,
    /// Vertical start offset within the target node's in face.
    pub ty0: f64,
    pub reversed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SankeyDiagramLayout {
    pub width: f64,
    pub height: f64,
    pub margin: Margin,
    pub node_width: f64,
    pub node_padding: f64,
    pub nodes: Vec<SankeyNodeLayout>,
    pub links: Vec<SankeyLinkLayout>,
    pub bounds: Option<Bounds>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut it = points.into_iter();
        let (x0, y0) = it.next()?;
        let mut b = Self {
            min_x: x0,
            min_y: y0,
            max_x: x0,
            max_y: y0,
        };
        for (x, y) in it {
            b.min_x = b.min_x.min(x);
            b.min_y = b.min_y.min(y);
            b.max_x = b.max_x.max(x);
            b.max_y = b.max_y.max(y);
        }
        Some(b)
    }
}
