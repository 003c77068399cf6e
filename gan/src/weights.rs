use std::{io::Write, path::Path};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::network::{Activation, BatchNorm, Dense, Dropout, Layer, Sequential};

pub const MAGIC: &[u8; 4] = b"RRGW";
pub const VERSION: u32 = 1;

const DENSE_TAG: u32 = 0;
const BATCH_NORM_TAG: u32 = 1;
const DROPOUT_TAG: u32 = 2;

#[derive(Debug, thiserror::Error)]
pub enum WeightsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a weight file")]
    BadMagic,
    #[error("unsupported weight file version: {0}")]
    UnsupportedVersion(u32),
    #[error("unsupported layer tag: {0}")]
    UnsupportedLayer(u32),
    #[error("unsupported activation index: {0}")]
    UnsupportedActivation(u32),
    #[error("weight file architecture does not match the network")]
    ArchitectureMismatch,
    #[error("{0} trailing bytes after the last layer")]
    TrailingBytes(usize),
}

fn write_values(wtr: &mut impl Write, values: &[f32]) -> std::io::Result<()> {
    for value in values {
        wtr.write_f32::<LittleEndian>(*value)?;
    }
    Ok(())
}

fn read_values(rdr: &mut &[u8], len: usize) -> std::io::Result<Vec<f32>> {
    (0..len).map(|_| rdr.read_f32::<LittleEndian>()).collect()
}

pub fn pack(network: &Sequential, wtr: &mut impl Write) -> std::io::Result<()> {
    wtr.write_all(MAGIC)?;
    wtr.write_u32::<LittleEndian>(VERSION)?;
    wtr.write_u32::<LittleEndian>(network.layers.len() as u32)?;
    for layer in &network.layers {
        match layer {
            Layer::Dense(dense) => {
                wtr.write_u32::<LittleEndian>(DENSE_TAG)?;
                wtr.write_u32::<LittleEndian>(dense.inputs as u32)?;
                wtr.write_u32::<LittleEndian>(dense.outputs as u32)?;
                wtr.write_u32::<LittleEndian>(dense.activation.as_u32())?;
                write_values(wtr, &dense.weights)?;
                write_values(wtr, &dense.bias)?;
            }
            Layer::BatchNorm(norm) => {
                wtr.write_u32::<LittleEndian>(BATCH_NORM_TAG)?;
                wtr.write_u32::<LittleEndian>(norm.width as u32)?;
                write_values(wtr, &norm.gamma)?;
                write_values(wtr, &norm.beta)?;
                write_values(wtr, &norm.running_mean)?;
                write_values(wtr, &norm.running_var)?;
            }
            Layer::Dropout(dropout) => {
                wtr.write_u32::<LittleEndian>(DROPOUT_TAG)?;
                wtr.write_f32::<LittleEndian>(dropout.rate)?;
            }
        }
    }
    Ok(())
}

pub fn decode(input_buffer: &[u8]) -> Result<Sequential, WeightsError> {
    let mut rdr = input_buffer;
    let mut magic = [0u8; 4];
    std::io::Read::read_exact(&mut rdr, &mut magic)?;
    if &magic != MAGIC {
        return Err(WeightsError::BadMagic);
    }
    let version = rdr.read_u32::<LittleEndian>()?;
    if version != VERSION {
        return Err(WeightsError::UnsupportedVersion(version));
    }

    let layer_count = rdr.read_u32::<LittleEndian>()?;
    let mut layers = Vec::new();
    for _ in 0..layer_count {
        let layer = match rdr.read_u32::<LittleEndian>()? {
            DENSE_TAG => {
                let inputs = rdr.read_u32::<LittleEndian>()? as usize;
                let outputs = rdr.read_u32::<LittleEndian>()? as usize;
                let activation_index = rdr.read_u32::<LittleEndian>()?;
                let activation = Activation::from_u32(activation_index).ok_or(WeightsError::UnsupportedActivation(activation_index))?;
                let weights = read_values(&mut rdr, inputs * outputs)?;
                let bias = read_values(&mut rdr, outputs)?;
                Layer::Dense(Dense::from_parts(inputs, outputs, activation, weights, bias))
            }
            BATCH_NORM_TAG => {
                let width = rdr.read_u32::<LittleEndian>()? as usize;
                let gamma = read_values(&mut rdr, width)?;
                let beta = read_values(&mut rdr, width)?;
                let running_mean = read_values(&mut rdr, width)?;
                let running_var = read_values(&mut rdr, width)?;
                Layer::BatchNorm(BatchNorm::from_parts(width, gamma, beta, running_mean, running_var))
            }
            DROPOUT_TAG => Layer::Dropout(Dropout::new(rdr.read_f32::<LittleEndian>()?)),
            tag => return Err(WeightsError::UnsupportedLayer(tag)),
        };
        layers.push(layer);
    }
    if !rdr.is_empty() {
        return Err(WeightsError::TrailingBytes(rdr.len()));
    }
    Ok(Sequential::new(layers))
}

pub fn save(network: &Sequential, path: impl AsRef<Path>) -> Result<(), WeightsError> {
    let mut bytes = Vec::new();
    pack(network, &mut bytes)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

pub fn load(path: impl AsRef<Path>) -> Result<Sequential, WeightsError> {
    let bytes = std::fs::read(path)?;
    decode(&bytes)
}

/// Loads weights and checks them against the architecture of `template`.
pub fn load_matching(path: impl AsRef<Path>, template: &Sequential) -> Result<Sequential, WeightsError> {
    let network = load(path)?;
    if !network.same_shape(template) {
        return Err(WeightsError::ArchitectureMismatch);
    }
    Ok(network)
}
