use std::path::Path;

use lsc_tuning_rs::iq_pipeline::lsc::synthetic::{measured_tables, synthetic_chromatix};
use lsc_tuning_rs::iq_pipeline::lsc::LscTriggerInput;
use lsc_tuning_rs::iq_pipeline::{
    DumpConfig, LscConfig, LscPipeline, LscRequest, MeshWriter, ResampleGeometry,
    StandardMeshWriter, TiffCompression,
};
use lsc_tuning_rs::logger;

use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    logger::init();

    info!("Starting lsc_tuning...");

    let chromatix = synthetic_chromatix();
    let measured = measured_tables(&chromatix.golden, 0.05);

    let config = LscConfig::builder()
        .enable_calibration(true)
        .build();
    let mut pipeline = LscPipeline::new(&chromatix, config)?.with_measured_calibration(measured);

    info!("LSC pipeline initialized");
    info!(
        "Calibration: {}",
        if pipeline.config().enable_calibration {
            "enabled"
        } else {
            "disabled"
        }
    );

    let triggers = LscTriggerInput {
        lens_position: 180.0,
        drc_gain: 2.0,
        exposure_time_ratio: 1.0,
        lux_index: 320.0,
        real_gain: 4.0,
        color_temperature: 4600.0,
        ..Default::default()
    };
    let geometry = ResampleGeometry {
        full_width: 4000,
        full_height: 3000,
        output_width: 1920,
        output_height: 1080,
        offset_x: 80,
        offset_y: 420,
        scale_x: 2,
        scale_y: 2,
    };

    let setting = pipeline.process(&LscRequest::new(triggers, geometry))?;
    info!(
        grid_h = setting.geometry.grid_count_h,
        grid_v = setting.geometry.grid_count_v,
        subgrid_width = setting.geometry.subgrid_width,
        subgrid_height = setting.geometry.subgrid_height,
        interpolation_factor = setting.geometry.interpolation_factor,
        "Mesh geometry"
    );

    let dump_config = DumpConfig::builder()
        .compression(TiffCompression::None)
        .build();
    match StandardMeshWriter.write_mesh_file(&setting, Path::new("lsc_mesh.tiff"), &dump_config) {
        Ok(_) => info!("Mesh dump written"),
        Err(e) => error!("Mesh dump failed: {}", e),
    }

    Ok(())
}
