//! Output mesh grid search under hardware block constraints

use tracing::debug;

use crate::iq_pipeline::common::error::{IqError, Result};
use crate::iq_pipeline::lsc::chromatix::{MESH_GRID_H, MESH_GRID_V};

pub const MAX_BICUBIC_LEVEL: u32 = 3;
pub const GRID_STEP_H: u32 = 4;
pub const GRID_STEP_V: u32 = 3;
pub const MIN_GRID_H: u32 = 4;
pub const MIN_GRID_V: u32 = 3;
pub const MIN_BLOCK_WIDTH: u32 = 18;
pub const MIN_BLOCK_HEIGHT: u32 = 9;
pub const MIN_SUBGRID_SIZE: u32 = 9;
pub const MIN_SUPPORTED_WIDTH: u32 = 160;
pub const MIN_SUPPORTED_HEIGHT: u32 = 120;

/// Grid chosen for one output resolution, in Bayer-plane (half resolution) units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    /// Subgrids per block, `1 << level`.
    pub scale: u32,
    pub level: u32,
    /// Half of the horizontal rounding overhead.
    pub delta_h: u32,
    pub delta_v: u32,
    pub subgrid_width: u32,
    pub subgrid_height: u32,
    pub grid_count_h: u32,
    pub grid_count_v: u32,
}

impl GridLayout {
    pub fn block_width(&self) -> u32 {
        self.subgrid_width << self.level
    }

    pub fn block_height(&self) -> u32 {
        self.subgrid_height << self.level
    }

    pub fn points_h(&self) -> usize {
        self.grid_count_h as usize + 1
    }

    pub fn points_v(&self) -> usize {
        self.grid_count_v as usize + 1
    }
}

/// Picks the largest grid and bicubic level whose blocks satisfy the hardware minimums.
///
/// Starts at the full 16x12 grid one level above [`MAX_BICUBIC_LEVEL`], lowering the
/// level first and shrinking the grid by 4x3 cells once the level reaches zero.
pub fn optimize_grid(raw_width: u32, raw_height: u32) -> Result<GridLayout> {
    let unsupported = IqError::UnsupportedGeometry {
        width: raw_width,
        height: raw_height,
    };
    if raw_width < MIN_SUPPORTED_WIDTH || raw_height < MIN_SUPPORTED_HEIGHT {
        return Err(unsupported);
    }

    let plane_width = raw_width >> 1;
    let plane_height = raw_height >> 1;

    let mut grid_h = MESH_GRID_H as u32;
    let mut grid_v = MESH_GRID_V as u32;
    let mut level = MAX_BICUBIC_LEVEL + 1;

    loop {
        if level > 0 {
            level -= 1;
        } else if grid_h <= MIN_GRID_H || grid_v <= MIN_GRID_V {
            return Err(unsupported);
        } else {
            grid_h -= GRID_STEP_H;
            grid_v -= GRID_STEP_V;
            level = MAX_BICUBIC_LEVEL;
        }

        let subgrid_width = plane_width.div_ceil(grid_h).div_ceil(1 << level);
        let subgrid_height = plane_height.div_ceil(grid_v).div_ceil(1 << level);
        let block_width = subgrid_width << level;
        let block_height = subgrid_height << level;
        let overhead_h = block_width * grid_h - plane_width;
        let overhead_v = block_height * grid_v - plane_height;

        let rejected = block_width < MIN_BLOCK_WIDTH
            || block_height < MIN_BLOCK_HEIGHT
            || subgrid_width < MIN_SUBGRID_SIZE
            || subgrid_height < MIN_SUBGRID_SIZE
            || overhead_h >= block_width
            || overhead_v >= block_height
            || block_width - (overhead_h + 1) / 2 < MIN_BLOCK_WIDTH
            || subgrid_width - ((overhead_h + 1) / 2) % subgrid_width < MIN_SUBGRID_SIZE;
        if rejected {
            continue;
        }

        let layout = GridLayout {
            scale: 1 << level,
            level,
            delta_h: (overhead_h + 1) >> 1,
            delta_v: (overhead_v + 1) >> 1,
            subgrid_width,
            subgrid_height,
            grid_count_h: grid_h,
            grid_count_v: grid_v,
        };
        debug!(
            width = raw_width,
            height = raw_height,
            grid_h,
            grid_v,
            level,
            "Mesh grid optimized"
        );
        return Ok(layout);
    }
}
