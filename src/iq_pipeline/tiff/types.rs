//! Mesh dump configuration types

/// TIFF compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiffCompression {
    /// No compression
    None,
    /// LZW compression
    Lzw,
    /// Deflate compression - fast level
    DeflateFast,
    /// Deflate compression - balanced
    DeflateBalanced,
    /// Deflate compression - best compression
    DeflateBest,
}

/// Configuration of the mesh dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpConfig {
    /// Compression method to use
    pub compression: TiffCompression,
    /// Predictor value (2 for horizontal differencing)
    pub predictor: Option<u16>,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            compression: TiffCompression::Lzw,
            predictor: Some(2),
        }
    }
}

impl DumpConfig {
    pub fn builder() -> DumpConfigBuilder {
        DumpConfigBuilder::default()
    }
}

/// Builder for DumpConfig
#[derive(Default)]
pub struct DumpConfigBuilder {
    compression: Option<TiffCompression>,
    predictor: Option<Option<u16>>,
}

impl DumpConfigBuilder {
    pub fn compression(mut self, compression: TiffCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn predictor(mut self, predictor: Option<u16>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn build(self) -> DumpConfig {
        let default = DumpConfig::default();
        DumpConfig {
            compression: self.compression.unwrap_or(default.compression),
            predictor: self.predictor.unwrap_or(default.predictor),
        }
    }
}
