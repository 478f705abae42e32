use apex_flow_studio::aggregator::{build_graph, GraphConfig};
use apex_flow_studio::layout::{compute_layout, LayoutConfig};
use apex_flow_studio::parser::sample::SAMPLE_LOG;
use apex_flow_studio::parser::{parse_log, LogData, NodePosition, ParserConfig};
use pretty_assertions::assert_eq;

fn sample_data() -> LogData {
    let parsed = parse_log(SAMPLE_LOG, &ParserConfig::default()).unwrap();
    build_graph(&parsed, &GraphConfig::default())
}

fn position(id: &str, x: f64, level: usize) -> NodePosition {
    NodePosition {
        id: id.to_string(),
        x,
        y: level as f64 * 200.0,
        level,
    }
}

#[test]
fn test_sample_layout_default_config() {
    let positions = compute_layout(&sample_data(), &LayoutConfig::default()).unwrap();

    assert_eq!(
        positions,
        vec![
            position("node-1", 150.0, 0),
            position("node-2", 0.0, 1),
            position("node-3", 0.0, 2),
            position("node-4", 0.0, 3),
            position("node-5", 0.0, 4),
            position("node-6", 300.0, 1),
            position("node-7", 300.0, 2),
        ]
    );
}

#[test]
fn test_parent_centred_over_children() {
    let data = sample_data();
    let positions = compute_layout(&data, &LayoutConfig::default()).unwrap();
    let x_of = |id: &str| positions.iter().find(|p| p.id == id).map(|p| p.x).unwrap();

    for node in &data.nodes {
        let children: Vec<f64> = data.children(&node.id).map(|c| x_of(&c.id)).collect();
        if let (Some(first), Some(last)) = (children.first(), children.last()) {
            assert_eq!(x_of(&node.id), (first + last) / 2.0);
        }
    }
}

#[test]
fn test_custom_spacing() {
    let config = LayoutConfig::new()
        .with_node_width(100.0)
        .with_gap(20.0)
        .with_level_height(80.0);
    let positions = compute_layout(&sample_data(), &config).unwrap();

    assert_eq!(positions[0].x, 60.0);
    assert_eq!(positions[5].x, 120.0);
    assert_eq!(positions[4].y, 320.0);
}

#[test]
fn test_siblings_do_not_overlap() {
    let data = sample_data();
    let config = LayoutConfig::default();
    let positions = compute_layout(&data, &config).unwrap();

    for level in 0..5 {
        let mut xs: Vec<f64> = positions
            .iter()
            .filter(|p| p.level == level)
            .map(|p| p.x)
            .collect();
        xs.sort_by(f64::total_cmp);
        for pair in xs.windows(2) {
            assert!(pair[1] - pair[0] >= config.node_width + config.gap);
        }
    }
}

#[test]
fn test_empty_graph_has_no_positions() {
    let positions = compute_layout(&LogData::default(), &LayoutConfig::default()).unwrap();
    assert!(positions.is_empty());
}
