//! Mesh viewer
//!
//! Loads an OBJ mesh from a directory and draws it for a number of frames on
//! the headless backend while a simulated day passes, logging the light
//! state of every frame and the backend statistics at the end.
//!
//! Usage: `mesh_viewer <dir> <file.obj> [frames] [config.toml|config.ron]`

use std::f32::consts::TAU;

use obj_renderer::config::ConfigError;
use obj_renderer::foundation::logging;
use obj_renderer::prelude::*;
use obj_renderer::render::lighting::TICKS_PER_DAY;
use thiserror::Error;

const DEFAULT_FRAMES: u32 = 48;

#[derive(Error, Debug)]
enum ViewerError {
    #[error("usage: mesh_viewer <dir> <file.obj> [frames] [config.toml|config.ron]")]
    Usage,

    #[error("invalid frame count '{0}'")]
    FrameCount(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Mesh(#[from] MeshError),
}

struct Args {
    dir: String,
    file: String,
    frames: u32,
    config: Option<String>,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, ViewerError> {
        let dir = args.next().ok_or(ViewerError::Usage)?;
        let file = args.next().ok_or(ViewerError::Usage)?;
        let frames = match args.next() {
            Some(frames) => frames.parse().map_err(|_| ViewerError::FrameCount(frames))?,
            None => DEFAULT_FRAMES,
        };

        Ok(Self {
            dir,
            file,
            frames,
            config: args.next(),
        })
    }
}

/// Open-sky world whose clock is advanced by the viewer
struct DayCycleWorld {
    ticks: i64,
}

impl WorldOracle for DayCycleWorld {
    fn time_of_day(&self) -> i64 {
        self.ticks
    }

    #[allow(clippy::cast_precision_loss)]
    fn sky_angle_radians(&self) -> f32 {
        // Sun is overhead at tick 6000
        let day = self.ticks.rem_euclid(TICKS_PER_DAY) as f32 / TICKS_PER_DAY as f32;
        (day - 0.25).rem_euclid(1.0) * TAU
    }

    fn sky_light(&self, _pos: BlockPos) -> u8 {
        15
    }

    fn block_light(&self, pos: BlockPos) -> u8 {
        // A torch at the origin
        let distance = pos.x.abs() + pos.y.abs() + pos.z.abs();
        u8::try_from(14 - distance.min(14)).unwrap_or(0)
    }

    fn rain_intensity(&self) -> f32 {
        0.0
    }

    fn thunder_intensity(&self) -> f32 {
        0.0
    }
}

fn run(args: Args) -> Result<(), ViewerError> {
    let config = match &args.config {
        Some(path) => RendererConfig::load_from_file(path)?,
        None => RendererConfig::default(),
    };

    let mut backend = HeadlessBackend::with_programs(&config);
    let mut mesh = ObjMesh::open_with(args.file.as_str(), DirectoryProvider::new(&args.dir), config)?;

    let projection = Mat4::new_perspective(800.0 / 600.0, 45f32.to_radians(), 0.1, 100.0);
    let camera = DVec3::new(0.0, 2.0, 10.0);
    let origin = DVec3::new(0.0, 0.0, 0.0);
    let view = Mat4::look_at_rh(
        &camera.cast::<f32>().into(),
        &origin.cast::<f32>().into(),
        &Vec3::y(),
    );

    let mut world = DayCycleWorld { ticks: 0 };
    let step = TICKS_PER_DAY / i64::from(args.frames.max(1));

    let mut result = Ok(());
    for frame in 0..args.frames {
        let light = LightingEstimator::estimate_world(&world, BlockPos::floored(&origin));
        log::info!(
            "frame {:>3} tick {:>5}: light {:.3}, sun ({:.2}, {:.2}, {:.2})",
            frame,
            world.ticks,
            light.level,
            light.sun_direction.x,
            light.sun_direction.y,
            light.sun_direction.z
        );

        #[allow(clippy::cast_precision_loss)]
        let spin = Mat4::from_axis_angle(&Vec3::y_axis(), frame as f32 * 0.1);
        let mut ctx = backend.context(projection, camera);
        if let Err(err) = mesh.draw_in_world(&mut ctx, Some(&world), &spin, &view, origin) {
            result = Err(err);
            break;
        }
        world.ticks += step;
    }

    let stats = mesh.stats();
    log::info!(
        "'{}': {} faces, {} groups, {} buffers ({} vertices), {} textures",
        mesh.name(),
        stats.faces,
        stats.groups,
        stats.buffers,
        stats.vertices,
        stats.textures
    );
    log::info!(
        "backend: {} uploads, {} draws, {} textures registered",
        backend.device.upload_count(),
        backend.device.draw_count(),
        backend.textures.registered_count()
    );

    let mut ctx = backend.context(projection, camera);
    mesh.close(&mut ctx)?;
    result.map_err(ViewerError::from)
}

fn main() {
    logging::init_with_level(log::LevelFilter::Info);

    let result = Args::parse(std::env::args().skip(1)).and_then(run);
    if let Err(err) = result {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
