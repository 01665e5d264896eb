#![allow(dead_code)]

use std::{cell::RefCell, rc::Rc};

use calculator_scene::{
    camera::{Camera, Projection},
    dispatch::ButtonCallback,
    scene::CameraSettings,
};

const GLB_MAGIC: u32 = 0x4654_6C67;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

/// Half the edge length of a default quad, before the model is mounted.
pub const QUAD_HALF_EXTENT: f32 = 0.5;

/// A named rectangle in the XY plane facing +z, or a plain group node when it
/// has no geometry. Children are emitted as glTF child nodes.
pub struct Quad {
    pub name: &'static str,
    pub translation: [f32; 3],
    /// `[x, y, z, w]`, as glTF stores it.
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    pub half_extents: Option<[f32; 2]>,
    pub double_sided: bool,
    pub mesh_name: Option<&'static str>,
    pub children: Vec<Quad>,
}

impl Quad {
    pub fn new(name: &'static str, translation: [f32; 3]) -> Self {
        Self {
            name,
            translation,
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0; 3],
            half_extents: Some([QUAD_HALF_EXTENT; 2]),
            double_sided: false,
            mesh_name: None,
            children: Vec::new(),
        }
    }

    /// A node without geometry.
    pub fn group(name: &'static str, translation: [f32; 3], children: Vec<Quad>) -> Self {
        Self {
            half_extents: None,
            children,
            ..Self::new(name, translation)
        }
    }

    pub fn rotated(mut self, rotation: [f32; 4]) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn scaled(mut self, scale: [f32; 3]) -> Self {
        self.scale = scale;
        self
    }

    pub fn sized(mut self, half_width: f32, half_height: f32) -> Self {
        self.half_extents = Some([half_width, half_height]);
        self
    }

    pub fn mesh_named(mut self, mesh_name: &'static str) -> Self {
        self.mesh_name = Some(mesh_name);
        self
    }
}

/// Quaternion `[x, y, z, w]` for a rotation of `degrees` about +z.
pub fn about_z(degrees: f32) -> [f32; 4] {
    let half = degrees.to_radians() / 2.0;
    [0.0, 0.0, half.sin(), half.cos()]
}

#[derive(Default)]
struct Builder {
    nodes: Vec<String>,
    meshes: Vec<String>,
    accessors: Vec<String>,
    buffer_views: Vec<String>,
    bin: Vec<u8>,
}

impl Builder {
    fn add_indices(&mut self) {
        for index in [0u16, 1, 2, 0, 2, 3] {
            self.bin.extend_from_slice(&index.to_le_bytes());
        }
        self.buffer_views.push(
            r#"{"buffer":0,"byteOffset":0,"byteLength":12,"target":34963}"#.to_string(),
        );
        self.accessors
            .push(r#"{"bufferView":0,"componentType":5123,"count":6,"type":"SCALAR"}"#.to_string());
    }

    fn add_mesh(&mut self, quad: &Quad, [w, h]: [f32; 2]) -> usize {
        let offset = self.bin.len();
        for position in [[-w, -h, 0.0], [w, -h, 0.0], [w, h, 0.0], [-w, h, 0.0]] {
            for component in position {
                self.bin.extend_from_slice(&component.to_le_bytes());
            }
        }
        let view = self.buffer_views.len();
        self.buffer_views.push(format!(
            r#"{{"buffer":0,"byteOffset":{},"byteLength":48,"target":34962}}"#,
            offset
        ));
        let accessor = self.accessors.len();
        self.accessors.push(format!(
            r#"{{"bufferView":{},"componentType":5126,"count":4,"type":"VEC3","min":[{},{},0.0],"max":[{},{},0.0]}}"#,
            view, -w, -h, w, h
        ));

        let name = quad
            .mesh_name
            .map(|name| format!(r#""name":"{}","#, name))
            .unwrap_or_default();
        // material 1 is the double sided one
        let material = if quad.double_sided { 1 } else { 0 };
        let mesh = self.meshes.len();
        self.meshes.push(format!(
            r#"{{{}"primitives":[{{"attributes":{{"POSITION":{}}},"indices":0,"material":{}}}]}}"#,
            name, accessor, material
        ));
        mesh
    }

    /// Emit `quad` and its subtree in pre-order, returning its node index.
    fn add_node(&mut self, quad: &Quad) -> usize {
        let index = self.nodes.len();
        self.nodes.push(String::new());

        let mut fields = Vec::new();
        if !quad.name.is_empty() {
            fields.push(format!(r#""name":"{}""#, quad.name));
        }
        if let Some(extents) = quad.half_extents {
            let mesh = self.add_mesh(quad, extents);
            fields.push(format!(r#""mesh":{}"#, mesh));
        }
        let [tx, ty, tz] = quad.translation;
        fields.push(format!(r#""translation":[{},{},{}]"#, tx, ty, tz));
        let [rx, ry, rz, rw] = quad.rotation;
        fields.push(format!(r#""rotation":[{},{},{},{}]"#, rx, ry, rz, rw));
        let [sx, sy, sz] = quad.scale;
        fields.push(format!(r#""scale":[{},{},{}]"#, sx, sy, sz));

        let children: Vec<String> = quad
            .children
            .iter()
            .map(|child| self.add_node(child).to_string())
            .collect();
        if !children.is_empty() {
            fields.push(format!(r#""children":[{}]"#, children.join(",")));
        }

        self.nodes[index] = format!("{{{}}}", fields.join(","));
        index
    }
}

/// Build a GLB file with the given top-level nodes in one scene named "Scene".
pub fn glb(quads: &[Quad]) -> Vec<u8> {
    let mut builder = Builder::default();
    builder.add_indices();
    let roots: Vec<String> = quads
        .iter()
        .map(|quad| builder.add_node(quad).to_string())
        .collect();

    let Builder {
        nodes,
        meshes,
        accessors,
        buffer_views,
        mut bin,
    } = builder;

    let json = format!(
        r#"{{"asset":{{"version":"2.0"}},"scene":0,"scenes":[{{"name":"Scene","nodes":[{}]}}],"nodes":[{}],"meshes":[{}],"materials":[{{"name":"single"}},{{"name":"double","doubleSided":true}}],"accessors":[{}],"bufferViews":[{}],"buffers":[{{"byteLength":{}}}]}}"#,
        roots.join(","),
        nodes.join(","),
        meshes.join(","),
        accessors.join(","),
        buffer_views.join(","),
        bin.len(),
    );

    let mut json = json.into_bytes();
    while json.len() % 4 != 0 {
        json.push(b' ');
    }
    while bin.len() % 4 != 0 {
        bin.push(0);
    }

    let total = 12 + 8 + json.len() + 8 + bin.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json.len() as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(&json);
    out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
    out.extend_from_slice(&bin);
    out
}

/// The default camera on an 800x600 viewport.
pub fn default_view() -> (Camera, Projection) {
    let settings = CameraSettings::default();
    (
        Camera::from(&settings),
        Projection::from_settings(800, 600, &settings),
    )
}

/// A button handler that records every name it receives.
pub fn recording_handler() -> (ButtonCallback, Rc<RefCell<Vec<String>>>) {
    let pressed = Rc::new(RefCell::new(Vec::new()));
    let sink = pressed.clone();
    let handler: ButtonCallback = Rc::new(move |name: &str| sink.borrow_mut().push(name.to_string()));
    (handler, pressed)
}
