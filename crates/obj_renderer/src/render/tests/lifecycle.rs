//! Bake, retry and release behavior of `ObjMesh`

use std::fs;

use super::*;
use crate::assets::DirectoryProvider;
use crate::error::{MeshError, MissingAttribute};
use crate::render::obj_mesh::MeshState;
use crate::render::vertex::VertexFormat;

#[test]
fn test_single_untextured_triangle() {
    let provider = InMemoryProvider::new().with("tri.obj", "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");
    let mut mesh = ObjMesh::open("tri.obj", provider).unwrap();
    let mut backend = HeadlessBackend::new();

    draw_once(&mut mesh, &mut backend).unwrap();

    let uploads: Vec<Command> = backend
        .commands()
        .into_iter()
        .filter(|c| matches!(c, Command::CreateBuffer { .. }))
        .collect();
    assert!(matches!(
        uploads.as_slice(),
        [Command::CreateBuffer {
            format: VertexFormat::Position,
            vertex_count: 3,
            ..
        }]
    ));
    assert_eq!(backend.textures.registered_count(), 0);
    assert!(!backend
        .commands()
        .iter()
        .any(|c| matches!(c, Command::BindTexture { .. } | Command::SetUniform { .. })));

    close(&mut mesh, &mut backend).unwrap();
}

#[test]
fn test_bake_happens_once() {
    let mut mesh = scene_mesh();
    let mut backend = HeadlessBackend::new();

    draw_once(&mut mesh, &mut backend).unwrap();
    assert_eq!(mesh.state(), MeshState::Baked);
    assert_eq!(backend.device.upload_count(), 4);
    assert_eq!(backend.textures.registered_count(), 2);

    draw_once(&mut mesh, &mut backend).unwrap();
    draw_once(&mut mesh, &mut backend).unwrap();
    assert_eq!(backend.device.upload_count(), 4);
    assert_eq!(backend.textures.registered_count(), 2);
    assert_eq!(backend.device.draw_count(), 12);

    let stats = mesh.stats();
    assert_eq!(stats.buffers, 4);
    assert_eq!(stats.vertices, 18);
    assert_eq!(stats.textures, 2);
    assert_eq!(stats.materials, 3);

    close(&mut mesh, &mut backend).unwrap();
}

#[test]
fn test_close_releases_everything_once() {
    let mut mesh = scene_mesh();
    let mut backend = HeadlessBackend::new();

    draw_once(&mut mesh, &mut backend).unwrap();
    close(&mut mesh, &mut backend).unwrap();

    assert_eq!(mesh.state(), MeshState::Closed);
    assert_eq!(backend.device.live_buffer_count(), 0);
    assert_eq!(backend.textures.live_count(), 0);
    assert_eq!(backend.textures.destroyed_count(), 2);
    assert!(mesh.materials().is_empty());

    assert!(matches!(
        draw_once(&mut mesh, &mut backend),
        Err(MeshError::InvalidState(_))
    ));
    assert!(matches!(close(&mut mesh, &mut backend), Err(MeshError::InvalidState(_))));
    assert_eq!(backend.textures.destroyed_count(), 2);
}

#[test]
fn test_close_before_bake() {
    let mut mesh = scene_mesh();
    let mut backend = HeadlessBackend::new();

    close(&mut mesh, &mut backend).unwrap();
    assert!(backend.commands().is_empty());
    assert!(matches!(
        draw_once(&mut mesh, &mut backend),
        Err(MeshError::InvalidState(_))
    ));
}

#[test]
fn test_failed_bake_is_retried() {
    let mut mesh = scene_mesh();
    let mut backend = HeadlessBackend::new();
    backend.device.fail_uploads_after(Some(2));

    let err = draw_once(&mut mesh, &mut backend).unwrap_err();
    assert!(matches!(err, MeshError::Render(_)));
    assert_eq!(mesh.state(), MeshState::Unbaked);
    assert_eq!(backend.device.live_buffer_count(), 0);
    assert_eq!(backend.textures.live_count(), 0);
    assert_eq!(backend.device.draw_count(), 0);

    backend.device.fail_uploads_after(None);
    draw_once(&mut mesh, &mut backend).unwrap();
    assert_eq!(mesh.state(), MeshState::Baked);
    assert_eq!(backend.device.live_buffer_count(), 4);
    assert_eq!(backend.textures.live_count(), 2);

    close(&mut mesh, &mut backend).unwrap();
}

#[test]
fn test_textured_face_without_uv_fails_bake() {
    let obj = "mtllib m.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nvt 0 0\n\
               usemtl Wood\nf 1/1/1 2/1/1 3/1/1\nf 1//1 2//1 3//1\n";
    let provider = InMemoryProvider::new()
        .with("m.obj", obj)
        .with("m.mtl", "newmtl Wood\nmap_Kd wood.png\n")
        .with("wood.png", png_bytes(1, 1));
    let mut mesh = ObjMesh::open("m.obj", provider).unwrap();
    let mut backend = HeadlessBackend::new();

    let err = draw_once(&mut mesh, &mut backend).unwrap_err();
    assert!(matches!(
        err,
        MeshError::CorruptGeometry {
            face: 1,
            missing: MissingAttribute::TexCoord,
            ..
        }
    ));
    assert_eq!(mesh.state(), MeshState::Unbaked);
    assert_eq!(backend.textures.live_count(), 0);
}

#[test]
fn test_missing_texture_fails_bake() {
    let provider = InMemoryProvider::new()
        .with("scene.obj", SCENE_OBJ)
        .with("scene.mtl", SCENE_MTL)
        .with("wood.png", png_bytes(4, 4));
    let mut mesh = ObjMesh::open("scene.obj", provider).unwrap();
    let mut backend = HeadlessBackend::new();

    let err = draw_once(&mut mesh, &mut backend).unwrap_err();
    assert!(matches!(err, MeshError::ResourceIo { ref name, .. } if name == "brick.png"));
    assert_eq!(backend.device.live_buffer_count(), 0);
    assert_eq!(backend.textures.live_count(), 0);
}

#[test]
fn test_undefined_material_draws_untextured() {
    let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl Nowhere\nf 1 2 3\n";
    let mut mesh = ObjMesh::open("m.obj", InMemoryProvider::new().with("m.obj", obj)).unwrap();
    let mut backend = HeadlessBackend::new();

    draw_once(&mut mesh, &mut backend).unwrap();
    assert!(backend.commands().contains(&Command::BindProgram("position".to_string())));
}

#[test]
fn test_open_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("scene.obj"), SCENE_OBJ).unwrap();
    fs::write(dir.path().join("scene.mtl"), SCENE_MTL).unwrap();
    fs::write(dir.path().join("wood.png"), png_bytes(4, 4)).unwrap();
    fs::write(dir.path().join("brick.png"), png_bytes(8, 2)).unwrap();

    let mut mesh = ObjMesh::open("scene.obj", DirectoryProvider::new(dir.path())).unwrap();
    let mut backend = HeadlessBackend::new();

    draw_once(&mut mesh, &mut backend).unwrap();
    assert_eq!(mesh.groups().len(), 4);
    assert_eq!(backend.textures.registered_count(), 2);
    close(&mut mesh, &mut backend).unwrap();
}

#[test]
fn test_separate_meshes_mint_distinct_textures() {
    let mut first = scene_mesh();
    let mut second = scene_mesh();
    let mut backend = HeadlessBackend::new();

    draw_once(&mut first, &mut backend).unwrap();
    draw_once(&mut second, &mut backend).unwrap();
    assert_eq!(backend.textures.live_count(), 4);

    close(&mut first, &mut backend).unwrap();
    assert_eq!(backend.textures.live_count(), 2);
    close(&mut second, &mut backend).unwrap();
}
