/*!
Raw static scene graph as handed over by the asset loader.

Leaves carry free-text names and material names exactly as authored. Nothing here interprets
them; see `classify` for that.
*/

use crate::{
    flags::{NodeFlag, NodeFlags},
    math::{Mat4, Transform},
};

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub transparent: bool,
    pub opacity: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self::named("")
    }
}

impl Material {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transparent: false,
            opacity: 1.0,
        }
    }

    pub fn translucent(name: impl Into<String>, opacity: f32) -> Self {
        Self {
            name: name.into(),
            transparent: true,
            opacity,
        }
    }
}

/// Geometry buffers in the mesh's local space.
///
/// `positions` may be missing when the loader failed to decode the attribute; such meshes are
/// skipped. Without `indices` the positions are read as a plain triangle list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub positions: Option<Vec<[f32; 3]>>,
    pub indices: Option<Vec<u32>>,
    pub material: Material,
}

impl MeshData {
    pub fn new(positions: Vec<[f32; 3]>, indices: Vec<u32>, material: Material) -> Self {
        Self {
            positions: Some(positions),
            indices: Some(indices),
            material,
        }
    }

    /// Axis-aligned box centered on the local origin.
    pub fn cuboid(size: [f32; 3], material: Material) -> Self {
        let [hx, hy, hz] = [size[0] * 0.5, size[1] * 0.5, size[2] * 0.5];
        let positions = vec![
            [-hx, -hy, -hz],
            [hx, -hy, -hz],
            [hx, hy, -hz],
            [-hx, hy, -hz],
            [-hx, -hy, hz],
            [hx, -hy, hz],
            [hx, hy, hz],
            [-hx, hy, hz],
        ];
        #[rustfmt::skip]
        let indices = vec![
            0, 2, 1, 0, 3, 2, // back
            4, 5, 6, 4, 6, 7, // front
            0, 1, 5, 0, 5, 4, // bottom
            3, 7, 6, 3, 6, 2, // top
            0, 4, 7, 0, 7, 3, // left
            1, 2, 6, 1, 6, 5, // right
        ];
        Self::new(positions, indices, material)
    }

    /// Single horizontal quad (zero thickness) centered on the local origin.
    pub fn quad(width: f32, depth: f32, material: Material) -> Self {
        let (hx, hz) = (width * 0.5, depth * 0.5);
        let positions = vec![[-hx, 0.0, -hz], [hx, 0.0, -hz], [hx, 0.0, hz], [-hx, 0.0, hz]];
        Self::new(positions, vec![0, 2, 1, 0, 3, 2], material)
    }

    /// Triangles as index triples. Out-of-range indices and trailing partial triangles are dropped.
    pub fn triangles(&self) -> Vec<[u32; 3]> {
        let Some(positions) = &self.positions else {
            return Vec::new();
        };
        let count = positions.len() as u32;

        let tris: Vec<[u32; 3]> = match &self.indices {
            Some(indices) => indices
                .chunks_exact(3)
                .map(|c| [c[0], c[1], c[2]])
                .collect(),
            None => (0..count / 3).map(|t| [t * 3, t * 3 + 1, t * 3 + 2]).collect(),
        };

        tris.into_iter()
            .filter(|t| t.iter().all(|&i| i < count))
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeContent {
    Group,
    Mesh(MeshData),
    /// One geometry drawn at many places. Instance matrices are relative to the node.
    Instanced {
        mesh: MeshData,
        instances: Vec<Mat4>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub local: Transform,
    pub flags: NodeFlags,
    pub content: NodeContent,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local: Transform::identity(),
            flags: NodeFlags::default(),
            content: NodeContent::Group,
            children: Vec::new(),
        }
    }

    pub fn mesh(name: impl Into<String>, mesh: MeshData) -> Self {
        Self {
            content: NodeContent::Mesh(mesh),
            ..Self::group(name)
        }
    }

    pub fn instanced(name: impl Into<String>, mesh: MeshData, instances: Vec<Mat4>) -> Self {
        Self {
            content: NodeContent::Instanced { mesh, instances },
            ..Self::group(name)
        }
    }

    pub fn with_transform(mut self, local: Transform) -> Self {
        self.local = local;
        self
    }

    pub fn with_flag(mut self, flag: NodeFlag) -> Self {
        self.flags.add(flag);
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = SceneNode>) -> Self {
        self.children.extend(children);
        self
    }
}

/// A mesh-bearing node with its accumulated world matrix and inherited flags.
#[derive(Clone, Debug)]
pub struct SceneLeaf<'a> {
    pub name: &'a str,
    pub world: Mat4,
    pub flags: NodeFlags,
    pub content: &'a NodeContent,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneGraph {
    pub roots: Vec<SceneNode>,
}

impl SceneGraph {
    pub fn new(roots: Vec<SceneNode>) -> Self {
        Self { roots }
    }

    /// Depth-first, pre-order list of mesh-bearing nodes.
    ///
    /// Flags are inherited: a hidden group hides its whole subtree.
    pub fn leaves(&self) -> Vec<SceneLeaf<'_>> {
        let mut out = Vec::new();
        let mut stack: Vec<(&SceneNode, Mat4, NodeFlags)> = self
            .roots
            .iter()
            .rev()
            .map(|n| (n, Mat4::identity(), NodeFlags::default()))
            .collect();

        while let Some((node, parent_world, parent_flags)) = stack.pop() {
            let world = parent_world * node.local.to_matrix();
            let flags = parent_flags.union(node.flags);

            if !matches!(node.content, NodeContent::Group) {
                out.push(SceneLeaf {
                    name: &node.name,
                    world,
                    flags,
                    content: &node.content,
                });
            }

            for child in node.children.iter().rev() {
                stack.push((child, world, flags));
            }
        }

        out
    }
}
