use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::iq_pipeline::common::error::Result;
use crate::iq_pipeline::lsc::LscSetting;
use crate::iq_pipeline::tiff::types::DumpConfig;

pub trait MeshWriter {
    fn write_mesh(&self, setting: &LscSetting, output: &mut dyn Write, config: &DumpConfig) -> Result<()>;

    fn write_mesh_file(&self, setting: &LscSetting, path: &Path, config: &DumpConfig) -> Result<()> {
        info!(output = %path.display(), "Writing mesh dump");
        let mut file = {
            let _span = tracing::info_span!("create_output_file").entered();
            std::fs::File::create(path)?
        };
        self.write_mesh(setting, &mut file, config)
    }
}
