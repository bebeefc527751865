use std::io::Write;
use tracing::debug;

use crate::iq_pipeline::common::error::{IqError, Result};
use crate::iq_pipeline::lsc::{BayerChannel, LscSetting};
use crate::iq_pipeline::tiff::types::{DumpConfig, TiffCompression};
use crate::iq_pipeline::tiff::writer::MeshWriter;

pub struct StandardMeshWriter;

impl MeshWriter for StandardMeshWriter {
    fn write_mesh(&self, setting: &LscSetting, output: &mut dyn Write, config: &DumpConfig) -> Result<()> {
        let width = setting.mesh.layout.points_h() as u32;
        let height = setting.mesh.layout.points_v() as u32;
        debug!("Encoding mesh dump: {}x{} per channel", width, height);

        let mut data = Vec::with_capacity((width * height) as usize * BayerChannel::ALL.len());
        for channel in BayerChannel::ALL {
            data.extend(setting.packed_channel(channel));
        }

        let compression = match config.compression {
            TiffCompression::None => tiff::encoder::Compression::Uncompressed,
            TiffCompression::Lzw => tiff::encoder::Compression::Lzw,
            TiffCompression::DeflateFast => tiff::encoder::Compression::Deflate(tiff::encoder::compression::DeflateLevel::Fast),
            TiffCompression::DeflateBalanced => tiff::encoder::Compression::Deflate(tiff::encoder::compression::DeflateLevel::Balanced),
            TiffCompression::DeflateBest => tiff::encoder::Compression::Deflate(tiff::encoder::compression::DeflateLevel::Best),
        };

        let mut buffer = Vec::new();
        let mut encoder = tiff::encoder::TiffEncoder::new(std::io::Cursor::new(&mut buffer))
            .map_err(|e| IqError::EncodeError(e.to_string()))?
            .with_compression(compression);

        if let Some(predictor_val) = config.predictor {
            let predictor = match predictor_val {
                2 => tiff::tags::Predictor::Horizontal,
                _ => tiff::tags::Predictor::None,
            };
            encoder = encoder.with_predictor(predictor);
        }

        encoder.write_image::<tiff::encoder::colortype::Gray16>(
            width,
            height * BayerChannel::ALL.len() as u32,
            &data,
        ).map_err(|e| IqError::EncodeError(e.to_string()))?;

        output.write_all(&buffer)?;

        debug!("Mesh dump encoding complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::iq_pipeline::lsc::{
        AlscParams, MeshGains, MeshGeometry, ResampledMesh, TintlessOutcome, optimize_grid,
    };

    fn setting(width: u32, height: u32) -> LscSetting {
        let layout = optimize_grid(width, height).unwrap();
        let mut gains = MeshGains::uniform(1.0);
        gains.gr = [2.0; 221];
        gains.gb = [9.0; 221];
        gains.b[0] = 1.5;
        LscSetting {
            rolloff_enable: true,
            mesh: ResampledMesh { layout, gains },
            geometry: MeshGeometry::from_layout(&layout),
            alsc_params: AlscParams::default(),
            tintless: TintlessOutcome::Disabled,
            alsc_enabled: false,
            alsc: None,
            calibration: None,
        }
    }

    fn decode(bytes: Vec<u8>) -> ((u32, u32), Vec<u16>) {
        let mut decoder = tiff::decoder::Decoder::new(Cursor::new(bytes)).unwrap();
        let dimensions = decoder.dimensions().unwrap();
        match decoder.read_image().unwrap() {
            tiff::decoder::DecodingResult::U16(data) => (dimensions, data),
            _ => panic!("expected 16-bit samples"),
        }
    }

    #[test]
    fn test_channels_stacked_in_bayer_order() {
        let mut output = Vec::new();
        let config = DumpConfig::builder()
            .compression(TiffCompression::None)
            .predictor(None)
            .build();
        StandardMeshWriter
            .write_mesh(&setting(4000, 3000), &mut output, &config)
            .unwrap();

        let ((width, height), data) = decode(output);
        assert_eq!((width, height), (17, 52));
        let plane = 17 * 13;
        assert_eq!(data[0], 1024);
        assert_eq!(data[plane], 2048);
        // 9.0 saturates at 13 bits.
        assert_eq!(data[2 * plane], 8191);
        assert_eq!(data[3 * plane], 1536);
        assert_eq!(data[3 * plane + 1], 1024);
    }

    #[test]
    fn test_coarse_grid_dump_size() {
        let mut output = Vec::new();
        StandardMeshWriter
            .write_mesh(&setting(320, 240), &mut output, &DumpConfig::default())
            .unwrap();

        let ((width, height), data) = decode(output);
        assert_eq!((width, height), (9, 28));
        assert_eq!(data.len(), 9 * 28);
    }

    #[test]
    fn test_compressed_round_trip_matches_uncompressed() {
        let setting = setting(1920, 1080);
        let mut plain = Vec::new();
        StandardMeshWriter
            .write_mesh(
                &setting,
                &mut plain,
                &DumpConfig::builder().compression(TiffCompression::None).predictor(None).build(),
            )
            .unwrap();
        let mut packed = Vec::new();
        StandardMeshWriter
            .write_mesh(
                &setting,
                &mut packed,
                &DumpConfig::builder().compression(TiffCompression::DeflateBest).build(),
            )
            .unwrap();

        assert_eq!(decode(plain).1, decode(packed).1);
    }

    #[test]
    fn test_write_mesh_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mesh.tiff");
        StandardMeshWriter
            .write_mesh_file(&setting(1920, 1080), &path, &DumpConfig::default())
            .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let ((width, height), _) = decode(bytes);
        assert_eq!((width, height), (17, 52));
    }

    #[test]
    fn test_write_mesh_file_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("mesh.tiff");
        let result = StandardMeshWriter.write_mesh_file(&setting(1920, 1080), &path, &DumpConfig::default());
        assert!(matches!(result, Err(IqError::IoError(_))));
    }
}
