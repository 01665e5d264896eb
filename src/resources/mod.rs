use thiserror::Error;

use crate::{
    data_structures::{instance::Instance, scene_graph::SceneNode},
    scene::ModelMount,
};

/**
 * This module contains all logic for loading the model and building images from
 * external files or constants.
 */
pub mod gradient;
pub mod mesh;

/// Everything that can go wrong between an asset name and a scene graph.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read asset `{name}`: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[cfg(target_arch = "wasm32")]
    #[error("failed to fetch asset `{name}`: {source}")]
    Fetch {
        name: String,
        #[source]
        source: reqwest::Error,
    },
    #[cfg(target_arch = "wasm32")]
    #[error("cannot resolve the URL of asset `{0}`")]
    Url(String),
    #[error("asset `{name}` is not valid glTF: {source}")]
    Gltf {
        name: String,
        #[source]
        source: gltf::Error,
    },
    #[error("buffer {index} of asset `{name}` has no data")]
    MissingBuffer { name: String, index: usize },
    #[error("asset `{0}` contains no scene")]
    NoScene(String),
}

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> Result<reqwest::Url, LoadError> {
    let url_error = || LoadError::Url(file_name.to_string());
    let window = web_sys::window().ok_or_else(url_error)?;
    let origin = window.location().origin().map_err(|_| url_error())?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin)).map_err(|_| url_error())?;
    base.join(file_name).map_err(|_| url_error())
}

/// Read an asset: `./assets/<name>` natively, `<origin>/assets/<name>` on the web.
pub async fn load_binary(file_name: &str) -> Result<Vec<u8>, LoadError> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        let fetch_error = |source| LoadError::Fetch {
            name: file_name.to_string(),
            source,
        };
        reqwest::get(url)
            .await
            .and_then(|response| response.error_for_status())
            .map_err(fetch_error)?
            .bytes()
            .await
            .map_err(fetch_error)?
            .to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = std::path::Path::new("./").join("assets").join(file_name);
        tokio::fs::read(path).await.map_err(|source| LoadError::Io {
            name: file_name.to_string(),
            source,
        })?
    };

    Ok(data)
}

/// Load a `.glb`/`.gltf` asset into a scene graph.
pub async fn load_model_gltf(file_name: &str) -> Result<SceneNode, LoadError> {
    log::info!("Loading model {}", file_name);
    let started = instant::Instant::now();
    let data = load_binary(file_name).await?;
    let scene = model_from_bytes(file_name, &data).await?;
    log::info!(
        "Loaded model {} with {} meshes in {:?}",
        file_name,
        scene.mesh_count(),
        started.elapsed()
    );
    Ok(scene)
}

/**
 * Parse glTF or GLB bytes. Buffers embedded in a GLB are taken from its blob, external
 * buffers are loaded relative to the asset directory.
 *
 * The returned node stands for the glTF scene: it carries the scene's name and the
 * scene's root nodes as children.
 */
pub async fn model_from_bytes(name: &str, bytes: &[u8]) -> Result<SceneNode, LoadError> {
    let gltf = gltf::Gltf::from_slice(bytes).map_err(|source| LoadError::Gltf {
        name: name.to_string(),
        source,
    })?;

    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => match gltf.blob.as_deref() {
                Some(blob) => buffer_data.push(blob.to_vec()),
                None => {
                    return Err(LoadError::MissingBuffer {
                        name: name.to_string(),
                        index: buffer.index(),
                    });
                }
            },
            gltf::buffer::Source::Uri(uri) => {
                let bin = load_binary(uri).await?;
                buffer_data.push(bin);
            }
        }
    }

    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or_else(|| LoadError::NoScene(name.to_string()))?;

    let mut root = SceneNode::new(scene.name().unwrap_or_default());
    for node in scene.nodes() {
        root.add_child(mesh::to_scene_node(node, &buffer_data));
    }
    Ok(root)
}

/// Place a loaded scene at the mount's fixed scale and position.
pub fn mount(mut scene: SceneNode, mount: &ModelMount) -> SceneNode {
    scene.local = Instance::uniform(mount.position.into(), mount.scale);
    scene
}
