use thiserror::Error;

#[derive(Error, Debug)]
pub enum IqError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Tree build failed: level {level} search selected no children for node {node}")]
    TreeBuildFailure { level: usize, node: usize },

    #[error("Node arena overflow: level {level} selected {requested} children, fan-out is {fan_out}")]
    ArenaOverflow {
        level: usize,
        requested: usize,
        fan_out: usize,
    },

    #[error("Interpolation ratio out of range: {0}")]
    InvalidRatio(f32),

    #[error("Unsupported geometry: width={width}, height={height}")]
    UnsupportedGeometry { width: u32, height: u32 },

    #[error("Collaborator failed: {0}")]
    CollaboratorFailure(String),

    #[error("Failed to encode TIFF image: {0}")]
    EncodeError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IqError>;
