use serde::{Deserialize, Serialize};

/// Input document produced by the ecological-model exporter.
///
/// `flows[i][j]` is the biomass flux from group `i` to group `j`; the
/// matrix covers predator/prey groups and harvesting fleets alike, one
/// row and column per entry of `groups`, in the same order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodWebModel {
    pub groups: Vec<GroupInfo>,
    pub flows: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    Producer,
    Consumer,
    Detritus,
    /// Harvesting activity (gear). Not a biological group: carries no
    /// fractional trophic level and is always placed rightmost.
    Fleet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupInfo {
    pub name: String,
    pub kind: GroupKind,
    /// Fractional trophic level (`TLf`). `None` for fleets.
    #[serde(default)]
    pub trophic_level: Option<f64>,
    /// Realized trophic level (`TLr`), used for axis position.
    pub realized_trophic_level: f64,
    #[serde(default)]
    pub biomass: Option<f64>,
    #[serde(default)]
    pub production_rate: Option<f64>,
    #[serde(default)]
    pub consumption_rate: Option<f64>,
    #[serde(default)]
    pub ecotrophic_efficiency: Option<f64>,
}

impl GroupInfo {
    pub fn is_fleet(&self) -> bool {
        self.kind == GroupKind::Fleet
    }

    pub fn is_detritus(&self) -> bool {
        self.kind == GroupKind::Detritus
    }
}

/// Node of the built flow graph. Identity (`node`, `name`) is stable
/// for the lifetime of the dataset; only the renderer's copies of the
/// geometry fields ever change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowNode {
    pub node: usize,
    pub name: String,
    /// Discrete column index derived from rounded trophic level
    /// (fleets forced to the maximum).
    pub layer: usize,
    #[serde(rename = "TLf")]
    pub trophic_level: Option<f64>,
    #[serde(rename = "TLr")]
    pub realized_trophic_level: f64,
    #[serde(rename = "B")]
    pub biomass: Option<f64>,
    #[serde(rename = "PB")]
    pub production_rate: Option<f64>,
    #[serde(rename = "QB")]
    pub consumption_rate: Option<f64>,
    #[serde(rename = "EE")]
    pub ecotrophic_efficiency: Option<f64>,
    pub is_fleet: bool,
}

/// Edge of the built flow graph. `value` is the display width (always
/// non-negative after normalization); `flux` is the raw signed flow
/// (`Q`), shown in tooltips and never used for geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowLink {
    pub source: usize,
    pub target: usize,
    pub value: f64,
    #[serde(rename = "Q")]
    pub flux: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowGraph {
    pub nodes: Vec<FlowNode>,
    pub links: Vec<FlowLink>,
    /// Set when the affine shift ran on display values; shifted values
    /// are not directly flow-comparable to `Q`.
    #[serde(default)]
    pub values_shifted: bool,
}

impl FlowGraph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn max_layer(&self) -> usize {
        self.nodes.iter().map(|n| n.layer).max().unwrap_or(0)
    }
}
