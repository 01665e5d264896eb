use calculator_scene::{
    resources::{self, LoadError},
    scene::ModelMount,
};
use cgmath::Vector3;

use crate::common::test_utils::{Quad, glb};
mod common;

#[tokio::test]
async fn glb_nodes_keep_their_names() {
    let bytes = glb(&[
        Quad::new("display", [0.0, 0.5, 0.0]),
        Quad::new("button_1", [-0.5, -0.5, 0.0]),
    ]);
    let scene = resources::model_from_bytes("calculator.glb", &bytes)
        .await
        .unwrap();

    assert_eq!(scene.name, "Scene");
    let names: Vec<_> = scene.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["display", "button_1"]);
    assert_eq!(scene.mesh_count(), 2);

    let button = scene.find("button_1").unwrap();
    assert_eq!(button.meshes[0].indices, vec![0, 1, 2, 0, 2, 3]);
    assert_eq!(button.local.position, Vector3::new(-0.5, -0.5, 0.0));
}

#[tokio::test]
async fn reads_double_sided_materials() {
    let mut quad = Quad::new("button_glass", [0.0; 3]);
    quad.double_sided = true;
    let bytes = glb(&[quad, Quad::new("button_2", [1.0, 0.0, 0.0])]);
    let scene = resources::model_from_bytes("calculator.glb", &bytes)
        .await
        .unwrap();

    assert!(scene.find("button_glass").unwrap().meshes[0].material.double_sided);
    assert!(!scene.find("button_2").unwrap().meshes[0].material.double_sided);
}

#[tokio::test]
async fn mount_scales_the_whole_model() {
    let bytes = glb(&[Quad::new("button_1", [1.0, 0.0, 0.0])]);
    let scene = resources::model_from_bytes("calculator.glb", &bytes)
        .await
        .unwrap();
    let mounted = resources::mount(scene, &ModelMount::default());

    assert_eq!(mounted.local.scale, Vector3::new(1.5, 1.5, 1.5));
    assert_eq!(mounted.local.position, Vector3::new(0.0, 0.0, 0.0));

    let mut world_positions = Vec::new();
    mounted.visit_descendants(&mut |node, world| world_positions.push((node.name.clone(), world.translation())));
    assert_eq!(
        world_positions,
        vec![("button_1".to_string(), Vector3::new(1.5, 0.0, 0.0))]
    );
}

#[tokio::test]
async fn missing_asset_is_an_io_error() {
    let result = resources::load_model_gltf("does_not_exist.glb").await;
    assert!(matches!(result, Err(LoadError::Io { ref name, .. }) if name == "does_not_exist.glb"));
}

#[tokio::test]
async fn garbage_is_not_gltf() {
    let result = resources::model_from_bytes("broken.glb", b"definitely not a model").await;
    assert!(matches!(result, Err(LoadError::Gltf { .. })));
}

#[tokio::test]
async fn asset_without_scene_is_rejected() {
    let result = resources::model_from_bytes("empty.gltf", br#"{"asset":{"version":"2.0"}}"#).await;
    assert!(matches!(result, Err(LoadError::NoScene(_))));
}

#[tokio::test]
async fn unnamed_node_takes_its_mesh_name() {
    let bytes = glb(&[
        Quad::new("", [0.0; 3]).mesh_named("button_clear"),
        Quad::new("display", [0.0, 1.0, 0.0]).mesh_named("display_mesh"),
    ]);
    let scene = resources::model_from_bytes("calculator.glb", &bytes)
        .await
        .unwrap();

    let names: Vec<_> = scene.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["button_clear", "display"]);
}

#[tokio::test]
async fn nested_nodes_keep_their_hierarchy() {
    let bytes = glb(&[Quad::group(
        "body",
        [0.0; 3],
        vec![Quad::group("keypad", [0.5, 0.0, 0.0], vec![Quad::new("button_5", [0.5, 0.0, 0.0])])],
    )]);
    let scene = resources::model_from_bytes("calculator.glb", &bytes)
        .await
        .unwrap();

    let body = &scene.children[0];
    assert_eq!(body.name, "body");
    assert!(body.meshes.is_empty());
    assert_eq!(body.children[0].name, "keypad");
    assert_eq!(body.children[0].children[0].name, "button_5");
    assert_eq!(scene.mesh_count(), 1);
}
