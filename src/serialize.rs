use std::{fs, io, path::Path};

use bincode::{
    config,
    error::{DecodeError, EncodeError},
    serde::{decode_from_slice, encode_to_vec},
};
use thiserror::Error;
use tracing::info;

use crate::ir::GeneratedProgram;

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("cannot access IR file: {0}")]
    Io(#[from] io::Error),
    #[error("cannot encode IR: {0}")]
    Encode(#[from] EncodeError),
    #[error("cannot decode IR: {0}")]
    Decode(#[from] DecodeError),
}

pub fn save(path: &Path, program: &GeneratedProgram) -> Result<(), SerializeError> {
    let encoded = encode_to_vec(program, config::standard())?;
    fs::write(path, &encoded)?;
    info!(
        path = %path.display(),
        bytes = encoded.len(),
        instructions = program.instructions.len(),
        "saved IR"
    );
    Ok(())
}

pub fn load(path: &Path) -> Result<GeneratedProgram, SerializeError> {
    let bytes = fs::read(path)?;
    let (program, _): (GeneratedProgram, _) = decode_from_slice(&bytes, config::standard())?;
    info!(
        path = %path.display(),
        instructions = program.instructions.len(),
        "loaded IR"
    );
    Ok(program)
}
