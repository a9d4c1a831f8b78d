use trawl_core::{FoodWebModel, GraphBuilder, GroupInfo, GroupKind};
use trawl_render::{LinkRoute, Margin, SankeyConfig, layout, route_links};

fn group(name: &str, tl: f64) -> GroupInfo {
    GroupInfo {
        name: name.to_string(),
        kind: GroupKind::Consumer,
        trophic_level: Some(tl),
        realized_trophic_level: tl,
        biomass: None,
        production_rate: None,
        consumption_rate: None,
        ecotrophic_efficiency: None,
    }
}

fn loop_layout() -> trawl_render::SankeyDiagramLayout {
    let model = FoodWebModel {
        groups: vec![group("A", 1.0), group("B", 2.0), group("C", 3.0)],
        flows: vec![
            vec![0.0, 10.0, 0.0],
            vec![0.0, 0.0, 8.0],
            vec![2.0, 0.0, 0.0],
        ],
    };
    let graph = GraphBuilder::default().build(&model).unwrap();
    let config = SankeyConfig {
        margin: Margin::zero(),
        ..SankeyConfig::default()
    };
    layout(&graph, &config).unwrap()
}

#[test]
fn forward_links_have_one_segment_and_reversed_have_three() {
    let laid = loop_layout();
    let routes = route_links(&laid, 0.5);

    // Creation order: A->B, B->C forward; C->A the feedback edge.
    assert!(!routes[0].is_reversed());
    assert!(!routes[1].is_reversed());
    assert!(routes[2].is_reversed());

    for route in &routes[..2] {
        assert!(route.segment(0).is_some());
        assert!(route.segment(1).is_none());
        assert!(route.segment(2).is_none());
    }
    for index in 0..3 {
        assert!(routes[2].segment(index).is_some());
    }

    match &routes[2] {
        LinkRoute::Reversed {
            departure,
            bridge,
            arrival,
        } => {
            assert!(departure.starts_with('M'));
            assert!(bridge.contains('L'));
            assert!(arrival.contains('C'));
        }
        LinkRoute::Forward { .. } => panic!("feedback link routed as forward"),
    }
}

#[test]
fn classification_matches_layout_flag() {
    let laid = loop_layout();
    let routes = route_links(&laid, 0.5);
    for (link, route) in laid.links.iter().zip(&routes) {
        assert_eq!(link.reversed, route.is_reversed());
    }
}

#[test]
fn routing_is_deterministic() {
    let laid = loop_layout();
    let a = route_links(&laid, 0.5);
    let b = route_links(&laid, 0.5);
    assert_eq!(a, b);
}

#[test]
fn forward_path_spans_source_right_face_to_target_left_face() {
    let laid = loop_layout();
    let routes = route_links(&laid, 0.5);

    let link = &laid.links[0];
    let source = &laid.nodes[link.source];
    let target = &laid.nodes[link.target];
    let path = routes[0].segment(0).unwrap();

    let sx = source.x + laid.node_width;
    assert!(path.starts_with(&format!("M{}", sx)));
    // The path ends at the target's left face.
    let tail = path.rsplit(',').nth(1).unwrap();
    assert!(tail.ends_with(&target.x.to_string()));
}

#[test]
fn bridge_runs_below_the_canvas() {
    let laid = loop_layout();
    let routes = route_links(&laid, 0.5);
    let bridge = routes[2].segment(1).unwrap();

    // "M{x},{y}L{x},{y}": both y coordinates sit below the canvas.
    let after_m = &bridge[1..];
    let (start, end) = after_m.split_once('L').unwrap();
    let y_of = |p: &str| p.split(',').nth(1).unwrap().parse::<f64>().unwrap();
    assert!(y_of(start) > laid.height);
    assert!(y_of(end) > laid.height);
}

#[test]
fn self_loop_is_routed_as_reversed_composite() {
    // Cannibalism: B eats B.
    let model = FoodWebModel {
        groups: vec![group("A", 1.0), group("B", 2.0)],
        flows: vec![vec![0.0, 4.0], vec![0.0, 1.0]],
    };
    let graph = GraphBuilder::default().build(&model).unwrap();
    let config = SankeyConfig {
        margin: Margin::zero(),
        ..SankeyConfig::default()
    };
    let laid = layout(&graph, &config).unwrap();
    let routes = route_links(&laid, 0.5);

    let self_loop = laid
        .links
        .iter()
        .position(|l| l.source == l.target)
        .unwrap();
    assert!(routes[self_loop].is_reversed());
    assert!(routes[self_loop].segment(1).is_some());
}
