use super::*;

fn state_with_two_nodes() -> (GraphState, String, String) {
    let mut state = GraphState::new();
    let a = state.add_node("X", "d", 0.0, 0.0, "#111111", 1_000).id;
    let b = state.add_node("Y", "d", 0.0, 0.0, "#222222", 2_000).id;
    (state, a, b)
}

#[test]
fn normalize_color_accepts_six_hex_digits_with_or_without_hash() {
    assert_eq!(normalize_color("#aAbBcC"), "#aAbBcC");
    assert_eq!(normalize_color("112233"), "#112233");
    assert_eq!(normalize_color("  #445566  "), "#445566");
}

#[test]
fn normalize_color_falls_back_on_invalid_input() {
    assert_eq!(normalize_color(""), DEFAULT_NODE_COLOR);
    assert_eq!(normalize_color("#123"), DEFAULT_NODE_COLOR);
    assert_eq!(normalize_color("#35506eff"), DEFAULT_NODE_COLOR);
    assert_eq!(normalize_color("#12345g"), DEFAULT_NODE_COLOR);
    assert_eq!(normalize_color("not-a-color"), DEFAULT_NODE_COLOR);
}

#[test]
fn new_node_has_zeroed_progress_and_normalized_color() {
    let node = Node::new("n1", "t", "d", 1.0, 2.0, "bad");
    assert_eq!(node.progress, [0; PROGRESS_STEPS]);
    assert_eq!(node.color, DEFAULT_NODE_COLOR);
    assert!(!node.locked);
}

#[test]
fn connection_id_is_derived_from_endpoints() {
    let conn = Connection::new("a", "b");
    assert_eq!(conn.id, "a_b");
    assert!(conn.links("a", "b"));
    assert!(conn.links("b", "a"));
    assert!(!conn.links("a", "c"));
}

#[test]
fn node_id_gen_is_unique_within_one_millisecond() {
    let mut id_gen = NodeIdGen::new();
    let first = id_gen.next(42);
    let second = id_gen.next(42);
    let third = id_gen.next(42);
    assert_eq!(first, "node_42");
    assert_ne!(second, first);
    assert_ne!(third, second);
}

#[test]
fn add_nodes_have_distinct_ids_even_with_frozen_clock() {
    let mut state = GraphState::new();
    for _ in 0..20 {
        state.add_node("n", "d", 0.0, 0.0, "#111111", 7);
    }
    let mut ids: Vec<_> = state.nodes.iter().map(|n| n.id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 20);
}

#[test]
fn single_connection_between_pair() {
    let (mut state, a, b) = state_with_two_nodes();
    let conn = state.create_connection(&a, &b).unwrap();
    assert_eq!(conn.from_id, a);
    assert_eq!(conn.to_id, b);
    assert_eq!(state.connections.len(), 1);
}

#[test]
fn reverse_connection_is_rejected_as_duplicate() {
    let (mut state, a, b) = state_with_two_nodes();
    state.create_connection(&a, &b).unwrap();
    assert_eq!(
        state.create_connection(&b, &a).unwrap_err(),
        GraphError::DuplicateConnection
    );
    assert_eq!(state.connections.len(), 1);
}

#[test]
fn self_loop_is_rejected() {
    let (mut state, a, _) = state_with_two_nodes();
    assert_eq!(
        state.create_connection(&a, &a).unwrap_err(),
        GraphError::SelfLoop
    );
}

#[test]
fn connection_requires_existing_endpoints() {
    let (mut state, a, _) = state_with_two_nodes();
    assert_eq!(
        state.create_connection(&a, "ghost").unwrap_err(),
        GraphError::UnknownNode
    );
}

#[test]
fn delete_node_cascades_incident_connections() {
    let (mut state, a, b) = state_with_two_nodes();
    let c = state.add_node("Z", "d", 0.0, 0.0, "#333333", 3_000).id;
    state.create_connection(&a, &b).unwrap();
    state.create_connection(&b, &c).unwrap();
    state.create_connection(&a, &c).unwrap();

    let removal = state.delete_node(&b).unwrap();
    assert_eq!(removal.node.id, b);
    assert_eq!(removal.removed_connections, 2);
    assert_eq!(state.connections.len(), 1);
    assert!(state.connections.iter().all(|conn| !conn.touches(&b)));
}

#[test]
fn delete_connection_reports_endpoint_titles() {
    let (mut state, a, b) = state_with_two_nodes();
    let conn = state.create_connection(&a, &b).unwrap();
    let removal = state.delete_connection(&conn.id).unwrap();
    assert_eq!(removal.endpoint_titles(), Some(("X", "Y")));
    assert!(state.connections.is_empty());
    assert_eq!(
        state.delete_connection(&conn.id).unwrap_err(),
        GraphError::UnknownConnection
    );
}

#[test]
fn progress_click_fills_prefix_up_to_index() {
    let (mut state, a, _) = state_with_two_nodes();
    let level = state.toggle_progress_square(&a, 5).unwrap();
    assert_eq!(level, 6);
    let node = state.node(&a).unwrap();
    assert_eq!(node.progress[..6], [1; 6]);
    assert_eq!(node.progress[6..], [0; 6]);
}

#[test]
fn progress_click_on_active_square_collapses_to_that_index() {
    let (mut state, a, _) = state_with_two_nodes();
    state.toggle_progress_square(&a, 5).unwrap();
    // Re-clicking the active end of the prefix leaves it unchanged.
    assert_eq!(state.toggle_progress_square(&a, 5).unwrap(), 6);
    // Clicking an earlier active square retracts the prefix.
    assert_eq!(state.toggle_progress_square(&a, 2).unwrap(), 3);
    let node = state.node(&a).unwrap();
    assert_eq!(node.progress[..3], [1; 3]);
    assert_eq!(node.progress[3..], [0; 9]);
}

#[test]
fn progress_click_on_active_first_square_clears_everything() {
    let (mut state, a, _) = state_with_two_nodes();
    state.toggle_progress_square(&a, 11).unwrap();
    assert_eq!(state.toggle_progress_square(&a, 0).unwrap(), 0);
    assert_eq!(state.node(&a).unwrap().progress, [0; PROGRESS_STEPS]);
}

#[test]
fn progress_stays_a_prefix_after_arbitrary_clicks() {
    let (mut state, a, _) = state_with_two_nodes();
    for index in [3usize, 7, 7, 1, 11, 0, 0, 4, 2] {
        state.toggle_progress_square(&a, index).unwrap();
        let progress = state.node(&a).unwrap().progress;
        let level = state.node(&a).unwrap().progress_level();
        assert!(progress[..level].iter().all(|v| *v == 1));
        assert!(progress[level..].iter().all(|v| *v == 0));
    }
}

#[test]
fn progress_rejects_out_of_range_index_and_locked_node() {
    let (mut state, a, _) = state_with_two_nodes();
    assert_eq!(
        state.toggle_progress_square(&a, PROGRESS_STEPS).unwrap_err(),
        GraphError::ProgressIndexOutOfRange
    );
    state.toggle_lock_node(&a).unwrap();
    assert_eq!(
        state.toggle_progress_square(&a, 3).unwrap_err(),
        GraphError::NodeLocked
    );
}

#[test]
fn lock_node_releases_global_lock_first() {
    let (mut state, a, _) = state_with_two_nodes();
    assert!(state.toggle_lock_all());
    let outcome = state.toggle_lock_node(&a).unwrap();
    assert!(outcome.global_released);
    assert!(outcome.locked);
    assert!(!outcome.all_nodes_now_locked);
    assert!(!state.all_locked());
}

#[test]
fn locking_last_node_offers_global_lock() {
    let (mut state, a, b) = state_with_two_nodes();
    let first = state.toggle_lock_node(&a).unwrap();
    assert!(!first.all_nodes_now_locked);
    let second = state.toggle_lock_node(&b).unwrap();
    assert!(second.all_nodes_now_locked);
    // The global flag itself only flips via toggle_lock_all.
    assert!(!state.all_locked());
}

#[test]
fn global_lock_refuses_drags() {
    let (mut state, a, _) = state_with_two_nodes();
    state.toggle_lock_all();
    assert_eq!(state.begin_drag(&a).unwrap_err(), GraphError::AllLocked);
    state.toggle_lock_all();
    state.toggle_lock_node(&a).unwrap();
    assert_eq!(state.begin_drag(&a).unwrap_err(), GraphError::NodeLocked);
}

#[test]
fn drag_clamps_into_canvas_bounds() {
    let (mut state, a, _) = state_with_two_nodes();
    let canvas = CanvasBounds {
        width: 1000.0,
        height: 600.0,
    };
    state.begin_drag(&a).unwrap();
    state.drag_to(-50.0, -10.0, canvas).unwrap();
    let node = state.node(&a).unwrap();
    assert_eq!((node.x, node.y), (0.0, 0.0));

    state.drag_to(5000.0, 5000.0, canvas).unwrap();
    let node = state.node(&a).unwrap();
    assert_eq!(node.x, 1000.0 - NODE_WIDTH);
    assert_eq!(node.y, 600.0 - NODE_HEIGHT);

    assert_eq!(state.end_drag(), Some(a.clone()));
    assert_eq!(state.end_drag(), None);
    assert_eq!(
        state.drag_to(1.0, 1.0, canvas).unwrap_err(),
        GraphError::NoActiveDrag
    );
}

#[test]
fn renderable_connections_skip_dangling_endpoints() {
    let (mut state, a, b) = state_with_two_nodes();
    state.create_connection(&a, &b).unwrap();
    state.connections.push(Connection::new("ghost", &a));
    assert_eq!(state.connections.len(), 2);
    assert_eq!(state.renderable_connections().count(), 1);
}

#[test]
fn connect_mode_two_click_flow() {
    let mut mode = ConnectMode::default();
    assert_eq!(mode.select("a"), ConnectSelect::NotConnecting);

    assert!(mode.toggle());
    assert_eq!(mode.select("a"), ConnectSelect::FirstChosen);
    assert_eq!(mode.select("a"), ConnectSelect::SameNode);
    assert_eq!(
        mode.select("b"),
        ConnectSelect::PairChosen {
            from: "a".to_string(),
            to: "b".to_string(),
        }
    );
    assert!(mode.is_idle());
}

#[test]
fn connect_mode_cancel_and_toggle_off() {
    let mut mode = ConnectMode::default();
    mode.toggle();
    mode.select("a");
    mode.cancel();
    assert!(mode.is_idle());

    mode.toggle();
    mode.select("a");
    assert!(!mode.toggle());
    assert!(mode.is_idle());
}

#[test]
fn edit_node_trims_and_normalizes() {
    let (mut state, a, _) = state_with_two_nodes();
    let node = state.edit_node(&a, "  Title  ", " desc ", "zzz").unwrap();
    assert_eq!(node.title, "Title");
    assert_eq!(node.description, "desc");
    assert_eq!(node.color, DEFAULT_NODE_COLOR);
}
