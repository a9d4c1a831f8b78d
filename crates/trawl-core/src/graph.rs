use crate::model::{FlowGraph, FlowLink, FlowNode, FoodWebModel, GroupInfo};
use crate::options::GraphOptions;
use crate::{Error, Result};
use rustc_hash::FxHashSet;

/// Fraction of the display-value range added on top of the minimum
/// when negative values force an affine shift, so the smallest link
/// keeps a visible width.
const SHIFT_MARGIN: f64 = 0.01;

/// Converts a food-web flow matrix plus per-group attributes into an
/// ordered node list and index-resolved links with trophic layering.
///
/// Node order in the output is fleets first, then biological groups in
/// model order; link order is row-major over the flow matrix. Both are
/// stable, so downstream band assignment is deterministic.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    options: GraphOptions,
}

impl GraphBuilder {
    pub fn new(options: GraphOptions) -> Self {
        Self { options }
    }

    pub fn build(&self, model: &FoodWebModel) -> Result<FlowGraph> {
        let n = model.groups.len();
        if model.flows.len() != n || model.flows.iter().any(|row| row.len() != n) {
            return Err(Error::Shape {
                rows: model.flows.len(),
                cols: model.flows.first().map(|r| r.len()).unwrap_or(0),
                groups: n,
            });
        }

        let mut seen = FxHashSet::default();
        for g in &model.groups {
            if !seen.insert(g.name.as_str()) {
                return Err(Error::DuplicateGroup {
                    name: g.name.clone(),
                });
            }
        }

        if self.options.show_detritus {
            tracing::warn!(
                "detritus flows are displayed; detritus sits at trophic level 1 and its inflows break clean layering (experimental)"
            );
        }

        let layers = assign_layers(&model.groups, self.options.round_to);

        // Output node order: fleets first, then groups in model order.
        let mut order: Vec<usize> = Vec::with_capacity(n);
        order.extend((0..n).filter(|&i| model.groups[i].is_fleet()));
        order.extend((0..n).filter(|&i| !model.groups[i].is_fleet()));
        let mut node_index = vec![0usize; n];
        for (new_idx, &model_idx) in order.iter().enumerate() {
            node_index[model_idx] = new_idx;
        }

        let nodes: Vec<FlowNode> = order
            .iter()
            .enumerate()
            .map(|(idx, &i)| {
                let g = &model.groups[i];
                FlowNode {
                    node: idx,
                    name: g.name.clone(),
                    layer: layers[i],
                    trophic_level: g.trophic_level,
                    realized_trophic_level: g.realized_trophic_level,
                    biomass: g.biomass,
                    production_rate: g.production_rate,
                    consumption_rate: g.consumption_rate,
                    ecotrophic_efficiency: g.ecotrophic_efficiency,
                    is_fleet: g.is_fleet(),
                }
            })
            .collect();

        let mut links: Vec<FlowLink> = Vec::new();
        for i in 0..n {
            for j in 0..n {
                let q = model.flows[i][j];
                if q == 0.0 {
                    continue;
                }
                // Flows into detritus are hidden unless explicitly
                // requested; they are return flows, not predation.
                if model.groups[j].is_detritus() && !self.options.show_detritus {
                    continue;
                }
                links.push(FlowLink {
                    source: node_index[i],
                    target: node_index[j],
                    value: self.options.link_scale.apply(q),
                    flux: q,
                });
            }
        }

        let values_shifted = normalize_values(&mut links);
        report_imbalance(&nodes, &links);

        Ok(FlowGraph {
            nodes,
            links,
            values_shifted,
        })
    }
}

/// Maps realized trophic levels onto evenly spaced integer columns.
///
/// Levels are rounded to the nearest multiple of `round_to`; the
/// minimum nonzero gap between distinct rounded levels then becomes
/// the column unit, so clustered levels still land in distinct,
/// evenly spaced columns. Fleets are forced to the maximum column.
fn assign_layers(groups: &[GroupInfo], round_to: f64) -> Vec<usize> {
    let round_to = if round_to > 0.0 { round_to } else { 0.1 };
    let rounded: Vec<Option<f64>> = groups
        .iter()
        .map(|g| {
            (!g.is_fleet()).then(|| (g.realized_trophic_level / round_to).round() * round_to)
        })
        .collect();

    let mut distinct: Vec<f64> = rounded.iter().flatten().copied().collect();
    distinct.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    distinct.dedup();

    let gap = distinct
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|d| *d > 0.0)
        .fold(f64::INFINITY, f64::min);

    if !gap.is_finite() {
        // All groups share one rounded level (or there are none):
        // degenerate single-column layout, not an error.
        if !distinct.is_empty() {
            tracing::warn!("all groups share one rounded trophic level; using a single column");
        }
        return vec![0; groups.len()];
    }

    let raw: Vec<Option<i64>> = rounded
        .iter()
        .map(|r| r.map(|v| (v / gap).round() as i64))
        .collect();
    let min_raw = raw.iter().flatten().min().copied().unwrap_or(0);
    let max_layer = raw
        .iter()
        .flatten()
        .map(|&v| (v - min_raw) as usize)
        .max()
        .unwrap_or(0);

    tracing::debug!(
        columns = max_layer + 1,
        gap,
        "discretized trophic levels into columns"
    );

    raw.iter()
        .map(|r| match r {
            Some(v) => (v - min_raw) as usize,
            None => max_layer,
        })
        .collect()
}

/// Shifts display values so the minimum is non-negative, uniformly
/// across the dataset. Raw `flux` is untouched.
fn normalize_values(links: &mut [FlowLink]) -> bool {
    let min = links.iter().map(|l| l.value).fold(f64::INFINITY, f64::min);
    if !(min < 0.0) {
        return false;
    }
    let max = links
        .iter()
        .map(|l| l.value)
        .fold(f64::NEG_INFINITY, f64::max);
    let shift = -min + SHIFT_MARGIN * (max - min);
    for l in links.iter_mut() {
        l.value += shift;
    }
    tracing::warn!(
        shift,
        "display values shifted to be non-negative; widths are no longer flow-comparable to Q"
    );
    true
}

/// The layout is a passive encoding and never enforces conservation;
/// log the worst per-node imbalance so bad exports are noticeable.
fn report_imbalance(nodes: &[FlowNode], links: &[FlowLink]) {
    let mut net = vec![0.0f64; nodes.len()];
    for l in links {
        net[l.source] -= l.flux;
        net[l.target] += l.flux;
    }
    let worst = net
        .iter()
        .enumerate()
        .max_by(|a, b| {
            a.1.abs()
                .partial_cmp(&b.1.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, v)| (i, *v));
    if let Some((i, v)) = worst {
        tracing::debug!(node = nodes[i].name.as_str(), imbalance = v, "largest net flux imbalance");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GroupInfo, GroupKind};
    use crate::options::LinkScale;

    fn group(name: &str, kind: GroupKind, tl: f64) -> GroupInfo {
        GroupInfo {
            name: name.to_string(),
            kind,
            trophic_level: (kind != GroupKind::Fleet).then_some(tl),
            realized_trophic_level: tl,
            biomass: Some(1.0),
            production_rate: Some(0.5),
            consumption_rate: (kind == GroupKind::Consumer).then_some(2.0),
            ecotrophic_efficiency: Some(0.8),
        }
    }

    fn chain_model() -> FoodWebModel {
        // Phytoplankton -> zooplankton -> fish, with a fleet on fish.
        FoodWebModel {
            groups: vec![
                group("phyto", GroupKind::Producer, 1.0),
                group("zoo", GroupKind::Consumer, 2.0),
                group("fish", GroupKind::Consumer, 3.0),
                group("trawlers", GroupKind::Fleet, 0.0),
            ],
            flows: vec![
                vec![0.0, 10.0, 0.0, 0.0],
                vec![0.0, 0.0, 8.0, 0.0],
                vec![0.0, 0.0, 0.0, 2.0],
                vec![0.0, 0.0, 0.0, 0.0],
            ],
        }
    }

    #[test]
    fn shape_mismatch_fails_fast() {
        let mut model = chain_model();
        model.flows.pop();
        let err = GraphBuilder::default().build(&model).unwrap_err();
        assert!(matches!(err, Error::Shape { rows: 3, cols: 4, groups: 4 }));

        let mut model = chain_model();
        model.flows[1].push(1.0);
        assert!(matches!(
            GraphBuilder::default().build(&model),
            Err(Error::Shape { .. })
        ));
    }

    #[test]
    fn duplicate_group_names_rejected() {
        let mut model = chain_model();
        model.groups[2].name = "zoo".to_string();
        assert!(matches!(
            GraphBuilder::default().build(&model),
            Err(Error::DuplicateGroup { .. })
        ));
    }

    #[test]
    fn fleets_come_first_and_sit_in_the_rightmost_column() {
        let graph = GraphBuilder::default().build(&chain_model()).unwrap();
        assert_eq!(graph.nodes[0].name, "trawlers");
        assert!(graph.nodes[0].is_fleet);
        assert_eq!(graph.nodes[0].layer, graph.max_layer());
        // Landings link resolves to the reordered indices.
        let landing = graph
            .links
            .iter()
            .find(|l| graph.nodes[l.target].is_fleet)
            .unwrap();
        assert_eq!(graph.nodes[landing.source].name, "fish");
    }

    #[test]
    fn layers_are_normalized_and_monotone() {
        let graph = GraphBuilder::default().build(&chain_model()).unwrap();
        let layer_of = |name: &str| {
            graph
                .nodes
                .iter()
                .find(|n| n.name == name)
                .unwrap()
                .layer
        };
        assert_eq!(layer_of("phyto"), 0);
        assert_eq!(layer_of("zoo"), 1);
        assert_eq!(layer_of("fish"), 2);
    }

    #[test]
    fn uneven_trophic_clusters_still_get_even_columns() {
        // Levels 1.0, 1.1, 2.7: rounded gaps are 0.1 and 1.6, so the
        // column unit is 0.1 and level 2.7 lands far right.
        let model = FoodWebModel {
            groups: vec![
                group("a", GroupKind::Producer, 1.0),
                group("b", GroupKind::Consumer, 1.1),
                group("c", GroupKind::Consumer, 2.7),
            ],
            flows: vec![vec![0.0; 3]; 3],
        };
        let graph = GraphBuilder::default().build(&model).unwrap();
        let layers: Vec<usize> = graph.nodes.iter().map(|n| n.layer).collect();
        assert_eq!(layers, vec![0, 1, 17]);
    }

    #[test]
    fn single_rounded_level_degenerates_to_one_column() {
        let model = FoodWebModel {
            groups: vec![
                group("a", GroupKind::Producer, 1.0),
                group("b", GroupKind::Producer, 1.02),
            ],
            flows: vec![vec![0.0, 1.0], vec![0.0, 0.0]],
        };
        let graph = GraphBuilder::default().build(&model).unwrap();
        assert!(graph.nodes.iter().all(|n| n.layer == 0));
    }

    #[test]
    fn all_zero_matrix_yields_edge_free_graph() {
        let model = FoodWebModel {
            groups: vec![
                group("a", GroupKind::Producer, 1.0),
                group("b", GroupKind::Consumer, 2.0),
            ],
            flows: vec![vec![0.0; 2]; 2],
        };
        let graph = GraphBuilder::default().build(&model).unwrap();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.link_count(), 0);
        assert!(!graph.values_shifted);
    }

    #[test]
    fn detritus_inflows_are_hidden_by_default() {
        let model = FoodWebModel {
            groups: vec![
                group("detritus", GroupKind::Detritus, 1.0),
                group("zoo", GroupKind::Consumer, 2.0),
            ],
            flows: vec![vec![0.0, 3.0], vec![5.0, 0.0]],
        };
        let graph = GraphBuilder::default().build(&model).unwrap();
        assert_eq!(graph.link_count(), 1);
        assert_eq!(graph.nodes[graph.links[0].source].name, "detritus");

        let shown = GraphBuilder::new(GraphOptions {
            show_detritus: true,
            ..GraphOptions::default()
        })
        .build(&model)
        .unwrap();
        assert_eq!(shown.link_count(), 2);
    }

    #[test]
    fn negative_value_shift_matches_range_margin() {
        // One -5 among {10, 20, 30}: minimum becomes 0.01 * (30 - (-5)).
        let model = FoodWebModel {
            groups: vec![
                group("a", GroupKind::Producer, 1.0),
                group("b", GroupKind::Consumer, 2.0),
                group("c", GroupKind::Consumer, 3.0),
                group("d", GroupKind::Consumer, 4.0),
            ],
            flows: vec![
                vec![0.0, 10.0, 0.0, 0.0],
                vec![0.0, 0.0, 20.0, 0.0],
                vec![0.0, 0.0, 0.0, 30.0],
                vec![-5.0, 0.0, 0.0, 0.0],
            ],
        };
        let graph = GraphBuilder::default().build(&model).unwrap();
        assert!(graph.values_shifted);
        let min = graph
            .links
            .iter()
            .map(|l| l.value)
            .fold(f64::INFINITY, f64::min);
        assert!((min - 0.01 * 35.0).abs() < 1e-12);
        // Raw flux is untouched.
        assert!(graph.links.iter().any(|l| l.flux == -5.0));
    }

    #[test]
    fn link_scale_applies_to_nonzero_flows_only() {
        let model = FoodWebModel {
            groups: vec![
                group("a", GroupKind::Producer, 1.0),
                group("b", GroupKind::Consumer, 2.0),
            ],
            flows: vec![vec![0.0, 100.0], vec![0.0, 0.0]],
        };
        let graph = GraphBuilder::new(GraphOptions {
            link_scale: LinkScale::Log1p,
            ..GraphOptions::default()
        })
        .build(&model)
        .unwrap();
        assert!((graph.links[0].value - 101.0f64.ln()).abs() < 1e-12);
        assert_eq!(graph.links[0].flux, 100.0);
    }

    #[test]
    fn log1p_scale_stays_finite_for_negative_flows() {
        let model = FoodWebModel {
            groups: vec![
                group("a", GroupKind::Producer, 1.0),
                group("b", GroupKind::Consumer, 2.0),
            ],
            flows: vec![vec![0.0, -5.0], vec![0.0, 0.0]],
        };
        let graph = GraphBuilder::new(GraphOptions {
            link_scale: LinkScale::Log1p,
            ..GraphOptions::default()
        })
        .build(&model)
        .unwrap();
        // sign(-5) * ln(6) before the shift; finite and non-negative after.
        assert!(graph.values_shifted);
        assert!(graph.links[0].value.is_finite());
        assert!(graph.links[0].value >= 0.0);
        assert_eq!(graph.links[0].flux, -5.0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::model::{GroupInfo, GroupKind};
    use proptest::prelude::*;

    fn model_strategy() -> impl Strategy<Value = FoodWebModel> {
        (2usize..8).prop_flat_map(|n| {
            let levels = proptest::collection::vec(1.0f64..5.0, n);
            let flows = proptest::collection::vec(
                proptest::collection::vec(-50.0f64..50.0, n),
                n,
            );
            (levels, flows).prop_map(|(levels, flows)| FoodWebModel {
                groups: levels
                    .iter()
                    .enumerate()
                    .map(|(i, &tl)| GroupInfo {
                        name: format!("g{i}"),
                        kind: GroupKind::Consumer,
                        trophic_level: Some(tl),
                        realized_trophic_level: tl,
                        biomass: None,
                        production_rate: None,
                        consumption_rate: None,
                        ecotrophic_efficiency: None,
                    })
                    .collect(),
                flows,
            })
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn display_values_are_non_negative(model in model_strategy()) {
            let graph = GraphBuilder::default().build(&model).unwrap();
            for l in &graph.links {
                prop_assert!(l.value >= 0.0);
            }
        }

        #[test]
        fn log1p_display_values_are_finite_and_non_negative(model in model_strategy()) {
            let graph = GraphBuilder::new(GraphOptions {
                link_scale: crate::options::LinkScale::Log1p,
                ..GraphOptions::default()
            })
            .build(&model)
            .unwrap();
            for l in &graph.links {
                prop_assert!(l.value.is_finite());
                prop_assert!(l.value >= 0.0);
            }
        }

        #[test]
        fn layer_assignment_is_monotone(model in model_strategy()) {
            let graph = GraphBuilder::default().build(&model).unwrap();
            for a in &graph.nodes {
                for b in &graph.nodes {
                    let ra = (a.realized_trophic_level / 0.1).round();
                    let rb = (b.realized_trophic_level / 0.1).round();
                    if ra > rb {
                        prop_assert!(a.layer >= b.layer);
                    }
                }
            }
        }
    }
}
