//! Entry point: load a mesh into a volume and report what the render side
//! would receive. Optionally resolves a shader pair.

use anyhow::Result;
use asset::ShaderSource;
use corelib::{Vec3, camera::Camera, transform::Transform};
use renderer::{MeshVolume, Volume};

fn arg_value(name: &str) -> Option<String> {
    let prefix = format!("--{name}=");
    std::env::args().find_map(|arg| arg.strip_prefix(&prefix).map(str::to_owned))
}

fn parse_vec3_arg(name: &str, default: Vec3) -> Vec3 {
    // Accept: --name=x,y,z
    let Some(val) = arg_value(name) else {
        return default;
    };
    let parts: Vec<Result<f32, _>> = val.split(',').map(|p| p.trim().parse::<f32>()).collect();
    match parts.as_slice() {
        [Ok(x), Ok(y), Ok(z)] => Vec3::new(*x, *y, *z),
        _ => {
            log::warn!("Invalid --{}='{}', expected x,y,z; using {:?}", name, val, default);
            default
        }
    }
}

fn parse_offset_arg() -> u32 {
    match arg_value("index-offset") {
        None => 0,
        Some(val) => val.parse().unwrap_or_else(|_| {
            log::warn!("Invalid --index-offset='{}', using 0", val);
            0
        }),
    }
}

fn parse_shader_args() -> Option<ShaderSource> {
    match (arg_value("vertex-shader"), arg_value("fragment-shader")) {
        (Some(vertex), Some(fragment)) => Some(ShaderSource::files(vertex, fragment)),
        (None, None) => None,
        _ => {
            log::warn!("Both --vertex-shader and --fragment-shader are needed; skipping shaders");
            None
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let transform = Transform::from_prs(
        parse_vec3_arg("position", Vec3::ZERO),
        parse_vec3_arg("rotation", Vec3::ZERO),
        parse_vec3_arg("scale", Vec3::ONE),
    );
    let offset = parse_offset_arg();

    match arg_value("mesh") {
        Some(path) => {
            let volume = MeshVolume::from_path(&path).with_transform(transform);
            match volume.indices(offset) {
                Some(indices) => log::info!(
                    "{}: {} vertices, {} indices (offset {})",
                    path,
                    volume.vertex_count(),
                    indices.len(),
                    offset
                ),
                None => log::warn!(
                    "{}: --index-offset={} overflows u32 indices; skipping index report",
                    path,
                    offset
                ),
            }

            let camera = Camera::looking_down_neg_z(Vec3::new(0.0, 0.0, 5.0), 16.0 / 9.0);
            camera.validate()?;
            log::info!("Model matrix: {:?}", volume.model_matrix().to_cols_array_2d());
            log::info!(
                "MVP: {:?}",
                camera.mvp(volume.model_matrix()).to_cols_array_2d()
            );
        }
        None => log::warn!("No --mesh=<path> given; nothing to load"),
    }

    if let Some(source) = parse_shader_args() {
        let text = source.resolve()?;
        log::info!(
            "Shader sources resolved: vertex {} bytes, fragment {} bytes",
            text.vertex.len(),
            text.fragment.len()
        );
    }

    log::info!("Done.");
    Ok(())
}
