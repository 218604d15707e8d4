//! Mesh scenarios driven through the headless backend

mod lifecycle;

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};

use crate::assets::InMemoryProvider;
use crate::foundation::math::{DVec3, Mat4};
use crate::render::headless::{Command, HeadlessBackend};
use crate::render::obj_mesh::ObjMesh;

/// PNG file of the given size with a gradient fill
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_fn(width, height, |x, y| Rgba([(x * 40) as u8, (y * 40) as u8, 128, 255]));
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .expect("encode png fixture");
    png
}

/// Quad with one unassigned face, two textured materials and one colored one
///
/// Groups in draw order: none (1 face), Wood (3), Red (1), Brick (1).
pub(crate) const SCENE_OBJ: &str = "\
mtllib scene.mtl
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1 2 3
usemtl Wood
f 1/1/1 2/2/1 3/3/1
f 1/1/1 3/3/1 4/4/1
usemtl Red
f 1 3 4
usemtl Brick
f 1/1/1 2/2/1 3/3/1
usemtl Wood
f 2/2/1 3/3/1 4/4/1
";

pub(crate) const SCENE_MTL: &str = "\
newmtl Wood
Kd 0.8 0.6 0.4
map_Kd wood.png
newmtl Red
Kd 1 0 0
newmtl Brick
map_Kd brick.png
";

pub(crate) fn scene_provider() -> InMemoryProvider {
    InMemoryProvider::new()
        .with("scene.obj", SCENE_OBJ)
        .with("scene.mtl", SCENE_MTL)
        .with("wood.png", png_bytes(4, 4))
        .with("brick.png", png_bytes(8, 2))
}

pub(crate) fn scene_mesh() -> ObjMesh {
    ObjMesh::open("scene.obj", scene_provider()).expect("open scene")
}

/// Draw once at the origin with the camera at the origin
pub(crate) fn draw_once(mesh: &mut ObjMesh, backend: &mut HeadlessBackend) -> crate::MeshResult<()> {
    let mut ctx = backend.context(Mat4::identity(), DVec3::zeros());
    mesh.draw_in_world(&mut ctx, None, &Mat4::identity(), &Mat4::identity(), DVec3::zeros())
}

pub(crate) fn close(mesh: &mut ObjMesh, backend: &mut HeadlessBackend) -> crate::MeshResult<()> {
    let mut ctx = backend.context(Mat4::identity(), DVec3::zeros());
    mesh.close(&mut ctx)
}

/// Recorded commands between the last `BeginPass` and its `EndPass`, inclusive
pub(crate) fn last_pass(backend: &HeadlessBackend) -> Vec<Command> {
    let commands = backend.commands();
    let start = commands
        .iter()
        .rposition(|c| *c == Command::BeginPass)
        .expect("no mesh pass recorded");
    commands[start..].to_vec()
}
