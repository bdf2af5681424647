use nalgebra::{Point3, Vector3};
use scene_db::{
    BoltNode, CollectingRenderer, DeviceCaps, GState, Ownership, PolygonNode, SceneConfig,
    SceneDatabase, ShadowVolume, SphereNode, ViewFrustum, select_database,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Three walls across the view, facing the eye at the origin.
fn build_world(database: &mut dyn SceneDatabase) {
    database.remove_all();
    for (id, y) in [(1, 10.0), (2, 20.0), (3, 30.0)] {
        let wall = PolygonNode::wall(
            Point3::new(-5.0, y, 0.0),
            Vector3::new(10.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 5.0),
            GState(id),
        )
        .unwrap();
        database.add_static(Box::new(wall), Ownership::Database);
    }
    database.finalize_statics();
}

fn make_view() -> ViewFrustum {
    let mut frustum = ViewFrustum::new();
    frustum.set_view(Point3::new(0.0, 0.0, 2.0), Point3::new(0.0, 10.0, 2.0));
    frustum
}

/// One frame in renderer call order.
fn run_frame(database: &mut dyn SceneDatabase, frustum: &ViewFrustum) -> CollectingRenderer {
    let mut renderer = CollectingRenderer::new();
    database.set_eye(frustum.eye());
    database.add_dynamic(Box::new(
        BoltNode::new(Point3::new(0.0, 15.0, 2.0), 0.3, GState(10)).with_light([1.0, 0.8, 0.2]),
    ));
    database.add_dynamic_compound(Box::new(SphereNode::new(
        Point3::new(2.0, 25.0, 2.0),
        1.0,
        GState(11),
    )));

    database.add_lights(&mut renderer);
    database.add_shadow_nodes(&mut renderer, &ShadowVolume::from_frustum(frustum, Vector3::new(0.3, 0.2, 1.0)));
    database.add_render_nodes(&mut renderer, frustum);
    database.render_radar(&mut renderer, &ViewFrustum::radar(frustum, 100.0, 100.0));
    database.remove_dynamics();
    renderer
}

#[test]
fn bsp_frame_draws_back_to_front() {
    init_logging();
    let mut database = select_database(DeviceCaps { depth_buffer: false }, &SceneConfig::default());
    build_world(database.as_mut());
    let frustum = make_view();

    let renderer = run_frame(database.as_mut(), &frustum);

    let walls: Vec<GState> = renderer
        .render_states()
        .into_iter()
        .filter(|state| state.0 < 10)
        .collect();
    assert_eq!(walls, vec![GState(3), GState(2), GState(1)]);
    assert_eq!(renderer.lights().len(), 1);
    assert_eq!(database.dynamic_count(), 0);
    assert_eq!(database.static_count(), 3);
}

#[test]
fn bsp_dynamics_sit_between_walls() {
    init_logging();
    let mut database = select_database(DeviceCaps { depth_buffer: false }, &SceneConfig::default());
    build_world(database.as_mut());

    let renderer = run_frame(database.as_mut(), &make_view());
    let states = renderer.render_states();
    let position = |id: u32| states.iter().position(|state| *state == GState(id)).unwrap();

    assert!(position(10) > position(2), "The bolt is nearer than the second wall");
    assert!(position(10) < position(1), "The bolt is behind the first wall");
}

#[test]
fn flat_frame_draws_everything_visible() {
    init_logging();
    let mut database = select_database(DeviceCaps { depth_buffer: true }, &SceneConfig::default());
    build_world(database.as_mut());

    let renderer = run_frame(database.as_mut(), &make_view());

    let mut states = renderer.render_states();
    states.sort();
    assert_eq!(
        states,
        vec![GState(1), GState(2), GState(3), GState(10), GState(11)]
    );
    assert_eq!(renderer.lights().len(), 1);
    assert_eq!(database.dynamic_count(), 0);
}

#[test]
fn both_databases_see_the_same_statics() {
    init_logging();
    let frustum = make_view();
    let mut results = Vec::new();
    for depth_buffer in [false, true] {
        let mut database = select_database(DeviceCaps { depth_buffer }, &SceneConfig::default());
        build_world(database.as_mut());
        let mut renderer = CollectingRenderer::new();
        database.add_render_nodes(&mut renderer, &frustum);
        let mut states = renderer.render_states();
        states.sort();
        results.push(states);
    }

    assert_eq!(results[0], results[1]);
}

#[test]
fn config_loaded_from_toml_drives_database() {
    init_logging();
    let config = SceneConfig::from_toml_str(
        r#"
        octree_max_depth = 2
        octree_max_leaf_size = 1
        radar_sort = "insertion"
        "#,
    )
    .unwrap();
    let mut database = select_database(DeviceCaps { depth_buffer: true }, &config);
    build_world(database.as_mut());
    let mut renderer = CollectingRenderer::new();

    database.render_radar(&mut renderer, &ViewFrustum::radar(&make_view(), 100.0, 100.0));

    let states: Vec<GState> = renderer.radar_nodes().iter().map(|record| record.gstate).collect();
    assert_eq!(states, vec![GState(1), GState(2), GState(3)]);
}
