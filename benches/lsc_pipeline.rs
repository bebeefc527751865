use criterion::{black_box, criterion_group, criterion_main, Criterion, BenchmarkId};
use lsc_tuning_rs::iq_pipeline::lsc::synthetic::{measured_tables, synthetic_chromatix, vignetting_mesh};
use lsc_tuning_rs::iq_pipeline::lsc::{
    LscInterpolator, LscRegionData, LscTriggerInput, MeshResampler, ResampleContext,
};
use lsc_tuning_rs::iq_pipeline::{LscConfig, LscPipeline, LscRequest, ResampleGeometry};

fn triggers(color_temperature: f32) -> LscTriggerInput {
    LscTriggerInput {
        lens_position: 180.0,
        drc_gain: 2.0,
        exposure_time_ratio: 4.0,
        lux_index: 320.0,
        color_temperature,
        number_of_led: 2,
        led_sensitivity: 250.0,
        led_first_entry_ratio: 0.4,
        ..Default::default()
    }
}

fn benchmark_tree_interpolation(c: &mut Criterion) {
    let chromatix = synthetic_chromatix();
    let mut interpolator = LscInterpolator::new().unwrap();
    let mut out = LscRegionData::default();

    c.bench_function("tree_interpolation", |b| {
        let mut cct = 2800.0;
        b.iter(|| {
            cct = if cct > 6500.0 { 2800.0 } else { cct + 37.0 };
            let _ = interpolator.interpolate(&chromatix, black_box(&triggers(cct)), None, &mut out);
        });
    });
}

fn benchmark_resample_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("resample_by_size");
    let mesh = vignetting_mesh(1.0, [1.0, 1.0, 1.0, 1.1]);
    let resampler = MeshResampler::default();

    let sizes = vec![
        (4000, 3000, "4000x3000"),
        (1920, 1080, "1920x1080"),
        (640, 480, "640x480"),
    ];

    for (width, height, label) in sizes {
        let geometry = ResampleGeometry {
            output_width: width,
            output_height: height,
            scale_x: 4000 / width,
            scale_y: 3000 / height,
            ..ResampleGeometry::identity(4000, 3000)
        };
        group.bench_with_input(BenchmarkId::from_parameter(label), &geometry, |b, geometry| {
            b.iter(|| {
                // Fresh context so the previous-frame shortcut never applies.
                let mut context = ResampleContext::new();
                let _ = resampler.resample(&mut context, black_box(&mesh), geometry);
            });
        });
    }

    group.finish();
}

fn benchmark_calibration_overhead(c: &mut Criterion) {
    let mut group = c.benchmark_group("calibration_overhead");
    let chromatix = synthetic_chromatix();
    let geometry = ResampleGeometry::identity(1920, 1080);

    group.bench_function("without_calibration", |b| {
        let mut pipeline = LscPipeline::new(&chromatix, LscConfig::default()).unwrap();
        let mut cct = 2800.0;
        b.iter(|| {
            cct = if cct > 6500.0 { 2800.0 } else { cct + 37.0 };
            let _ = pipeline.process(black_box(&LscRequest::new(triggers(cct), geometry)));
        });
    });

    group.bench_function("with_calibration", |b| {
        let mut pipeline = LscPipeline::new(&chromatix, LscConfig::default())
            .unwrap()
            .with_measured_calibration(measured_tables(&chromatix.golden, 0.05));
        let mut cct = 2800.0;
        b.iter(|| {
            cct = if cct > 6500.0 { 2800.0 } else { cct + 37.0 };
            let _ = pipeline.process(black_box(&LscRequest::new(triggers(cct), geometry)));
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_tree_interpolation,
    benchmark_resample_sizes,
    benchmark_calibration_overhead
);
criterion_main!(benches);
