//! Mesh resampling from the native sensor grid to the output grid
//!
//! The 17x13 input mesh is first extended by one extrapolated ring, then sampled at each
//! output grid point: bilinear on the output boundary, bicubic inside.

use tracing::{debug, instrument};

use crate::iq_pipeline::common::error::{IqError, Result};
use crate::iq_pipeline::lsc::chromatix::{
    BayerChannel, MESH_GRID_H, MESH_GRID_V, MESH_POINTS_H, MESH_POINTS_V, MESH_SIZE, MeshGains,
};
use crate::iq_pipeline::lsc::grid::{GridLayout, optimize_grid};

pub const MESH_VALUE_MIN: f32 = 1.0;
pub const MESH_VALUE_MAX: f32 = 7.999;

const EXTENDED_H: usize = MESH_POINTS_H + 2;
const EXTENDED_V: usize = MESH_POINTS_V + 2;

pub type ExtendedMesh = [[f32; EXTENDED_H]; EXTENDED_V];

/// Sensor and output geometry for one resample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResampleGeometry {
    pub full_width: u32,
    pub full_height: u32,
    pub output_width: u32,
    pub output_height: u32,
    /// Crop offset in full-resolution pixels.
    pub offset_x: u32,
    pub offset_y: u32,
    /// Full-resolution pixels per output pixel.
    pub scale_x: u32,
    pub scale_y: u32,
}

impl ResampleGeometry {
    pub fn identity(width: u32, height: u32) -> Self {
        Self {
            full_width: width,
            full_height: height,
            output_width: width,
            output_height: height,
            offset_x: 0,
            offset_y: 0,
            scale_x: 1,
            scale_y: 1,
        }
    }
}

/// Mesh on the output grid; each channel is row-major with `layout.points_h()` points
/// per row.
#[derive(Debug, Clone, PartialEq)]
pub struct ResampledMesh {
    pub layout: GridLayout,
    pub gains: MeshGains,
}

impl ResampledMesh {
    pub fn value(&self, channel: BayerChannel, h: usize, v: usize) -> f32 {
        self.gains.channel(channel)[v * self.layout.points_h() + h]
    }
}

#[derive(Debug, Clone)]
struct PreviousFrame {
    geometry: ResampleGeometry,
    value_range: (f32, f32),
    input: MeshGains,
    output: ResampledMesh,
}

/// Per-stream resample state. One camera stream owns one context.
#[derive(Debug, Clone)]
pub struct ResampleContext {
    last_grid: (u32, u32),
    full_size: Option<(u32, u32)>,
    output_layout: Option<((u32, u32), GridLayout)>,
    previous: Option<PreviousFrame>,
    reused_frames: u64,
}

impl Default for ResampleContext {
    fn default() -> Self {
        Self {
            last_grid: (1, 1),
            full_size: None,
            output_layout: None,
            previous: None,
            reused_frames: 0,
        }
    }
}

impl ResampleContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grid counts of the last successful resample, `(1, 1)` before the first.
    pub fn last_grid(&self) -> (u32, u32) {
        self.last_grid
    }

    pub fn reused_frames(&self) -> u64 {
        self.reused_frames
    }

    fn layout_for(&mut self, geometry: &ResampleGeometry) -> Result<GridLayout> {
        let full_size = (geometry.full_width, geometry.full_height);
        if self.full_size != Some(full_size) {
            optimize_grid(geometry.full_width, geometry.full_height)?;
            self.full_size = Some(full_size);
        }

        let output_size = (geometry.output_width, geometry.output_height);
        if let Some((size, layout)) = self.output_layout
            && size == output_size
        {
            return Ok(layout);
        }
        let layout = optimize_grid(geometry.output_width, geometry.output_height)?;
        self.output_layout = Some((output_size, layout));
        Ok(layout)
    }
}

/// Extends a mesh channel by one ring, `2 * inner - next_inner` on every edge and
/// diagonally at the corners.
pub fn extend_mesh(mesh: &[f32; MESH_SIZE]) -> ExtendedMesh {
    let nx = MESH_POINTS_H;
    let ny = MESH_POINTS_V;
    let mut ext = [[0.0; EXTENDED_H]; EXTENDED_V];

    for (y, row) in mesh.chunks_exact(nx).enumerate() {
        ext[y + 1][1..=nx].copy_from_slice(row);
    }

    for row in ext.iter_mut().take(ny + 1).skip(1) {
        row[0] = 2.0 * row[1] - row[2];
        row[nx + 1] = 2.0 * row[nx] - row[nx - 1];
    }
    for x in 1..=nx {
        ext[0][x] = 2.0 * ext[1][x] - ext[2][x];
        ext[ny + 1][x] = 2.0 * ext[ny][x] - ext[ny - 1][x];
    }

    ext[0][0] = 2.0 * ext[1][1] - ext[2][2];
    ext[0][nx + 1] = 2.0 * ext[1][nx] - ext[2][nx - 1];
    ext[ny + 1][0] = 2.0 * ext[ny][1] - ext[ny - 1][2];
    ext[ny + 1][nx + 1] = 2.0 * ext[ny][nx] - ext[ny - 1][nx - 1];
    ext
}

/// Catmull-Rom weights for taps at -1, 0, 1 and 2 around a fractional position.
pub fn bicubic_coefficients(f: f32) -> [f32; 4] {
    let f2 = f * f;
    let f3 = f2 * f;
    [
        0.5 * (-f3 + 2.0 * f2 - f),
        0.5 * (3.0 * f3 - 5.0 * f2 + 2.0),
        0.5 * (-3.0 * f3 + 4.0 * f2 + f),
        0.5 * (f3 - f2),
    ]
}

#[derive(Debug, Clone, Copy, Default)]
struct Tap {
    index: usize,
    fraction: f32,
}

fn axis_taps<const N: usize>(
    points: usize,
    cell: f64,
    delta: f64,
    offset: f64,
    full_cell: f64,
) -> [Tap; N] {
    let mut taps = [Tap::default(); N];
    for (point, tap) in taps.iter_mut().enumerate().take(points) {
        let position = (point as f64 * cell - delta + offset + full_cell) / full_cell;
        let index = position.floor();
        *tap = Tap {
            index: index.max(0.0) as usize,
            fraction: (position - index) as f32,
        };
    }
    taps
}

fn bilinear(ext: &ExtendedMesh, x: Tap, y: Tap) -> f32 {
    let ix = x.index.min(EXTENDED_H - 2);
    let iy = y.index.min(EXTENDED_V - 2);
    let top = (1.0 - x.fraction) * ext[iy][ix] + x.fraction * ext[iy][ix + 1];
    let bottom = (1.0 - x.fraction) * ext[iy + 1][ix] + x.fraction * ext[iy + 1][ix + 1];
    (1.0 - y.fraction) * top + y.fraction * bottom
}

fn bicubic(ext: &ExtendedMesh, x: Tap, y: Tap) -> f32 {
    let ix = x.index.clamp(1, EXTENDED_H - 3);
    let iy = y.index.clamp(1, EXTENDED_V - 3);
    let cx = bicubic_coefficients(x.fraction);
    let cy = bicubic_coefficients(y.fraction);

    let mut value = 0.0;
    for (j, wy) in cy.iter().enumerate() {
        let row = &ext[iy - 1 + j][ix - 1..ix + 3];
        let across: f32 = row.iter().zip(cx.iter()).map(|(v, w)| v * w).sum();
        value += wy * across;
    }
    value
}

/// Resamples native-resolution meshes onto the output grid.
#[derive(Debug, Clone, Copy)]
pub struct MeshResampler {
    value_min: f32,
    value_max: f32,
}

impl Default for MeshResampler {
    fn default() -> Self {
        Self {
            value_min: MESH_VALUE_MIN,
            value_max: MESH_VALUE_MAX,
        }
    }
}

impl MeshResampler {
    /// Resampler clamping to `[value_min, value_max]`. The range must be non-empty.
    pub fn new(value_min: f32, value_max: f32) -> Result<Self> {
        if !(value_min < value_max) {
            return Err(IqError::InvalidArgument(format!(
                "mesh range [{}, {}] is empty",
                value_min, value_max
            )));
        }
        Ok(Self {
            value_min,
            value_max,
        })
    }

    pub fn value_range(&self) -> (f32, f32) {
        (self.value_min, self.value_max)
    }

    #[instrument(skip(self, context, input), fields(
        output_width = geometry.output_width,
        output_height = geometry.output_height
    ))]
    pub fn resample(
        &self,
        context: &mut ResampleContext,
        input: &MeshGains,
        geometry: &ResampleGeometry,
    ) -> Result<ResampledMesh> {
        if geometry.scale_x == 0 || geometry.scale_y == 0 {
            return Err(IqError::InvalidArgument(format!(
                "resample scale must be positive, got {}x{}",
                geometry.scale_x, geometry.scale_y
            )));
        }

        if let Some(previous) = &context.previous
            && previous.geometry == *geometry
            && previous.value_range == self.value_range()
            && previous.input == *input
        {
            context.reused_frames += 1;
            debug!("Geometry and mesh unchanged, reusing previous output");
            return Ok(previous.output.clone());
        }

        let layout = context.layout_for(geometry)?;
        let points_h = layout.points_h();
        let points_v = layout.points_v();

        let full_cell_h = (f64::from(geometry.full_width >> 1) - 1.0) / MESH_GRID_H as f64;
        let full_cell_v = (f64::from(geometry.full_height >> 1) - 1.0) / MESH_GRID_V as f64;
        let columns: [Tap; MESH_POINTS_H] = axis_taps(
            points_h,
            f64::from(layout.subgrid_width * layout.scale) * f64::from(geometry.scale_x),
            f64::from(layout.delta_h) * f64::from(geometry.scale_x),
            f64::from(geometry.offset_x / 2),
            full_cell_h,
        );
        let rows: [Tap; MESH_POINTS_V] = axis_taps(
            points_v,
            f64::from(layout.subgrid_height * layout.scale) * f64::from(geometry.scale_y),
            f64::from(layout.delta_v) * f64::from(geometry.scale_y),
            f64::from(geometry.offset_y / 2),
            full_cell_v,
        );

        let mut gains = MeshGains::default();
        for channel in BayerChannel::ALL {
            let ext = extend_mesh(input.channel(channel));
            let out = gains.channel_mut(channel);
            for (v, &row) in rows.iter().enumerate().take(points_v) {
                for (h, &column) in columns.iter().enumerate().take(points_h) {
                    let boundary = h == 0 || v == 0 || h == points_h - 1 || v == points_v - 1;
                    let value = if boundary {
                        bilinear(&ext, column, row)
                    } else {
                        bicubic(&ext, column, row)
                    };
                    out[v * points_h + h] = value.clamp(self.value_min, self.value_max);
                }
            }
        }

        let grid = (layout.grid_count_h, layout.grid_count_v);
        if grid != context.last_grid {
            debug!(
                from_h = context.last_grid.0,
                from_v = context.last_grid.1,
                to_h = grid.0,
                to_v = grid.1,
                "Mesh grid changed"
            );
            context.last_grid = grid;
        }

        let output = ResampledMesh { layout, gains };
        context.previous = Some(PreviousFrame {
            geometry: *geometry,
            value_range: self.value_range(),
            input: input.clone(),
            output: output.clone(),
        });
        Ok(output)
    }
}
