//! Implements the binary network file format, every number is written big-endian:
//!
//! ```text
//! u8      version (= 1)
//! i32     n_0, n_1, ..., n_k
//! i32     0
//! u8      activation function code
//! u8      cost function code
//! f64     the weights of layers 1..=k, in (layer, neuron, source neuron) order
//! f64     the biases of layers 1..=k, in (layer, neuron) order
//! ```

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use ndarray::{Array1, Array2};

use super::{Network, activations::ActFn, loss::LossFn, network::check_pairing};
use crate::{MlErr, Result};

/// The only file version this crate reads and writes.
pub const VERSION: u8 = 1;

const PREALLOCATED_VALUES: usize = 1 << 16;

impl Network {
    /// Writes this network into a new file at `path`, replacing any previous file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut sink = BufWriter::new(File::create(path)?);
        self.write_to(&mut sink)?;
        sink.flush()?;
        Ok(())
    }

    /// Reads a network back from the file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::read_from(BufReader::new(File::open(path)?))
    }

    /// Serializes this network into `sink`.
    ///
    /// # Returns
    /// An io error if writing fails, or `InvalidTopology` if a layer is too large for the format.
    pub fn write_to<W: Write>(&self, mut sink: W) -> Result<()> {
        sink.write_all(&[VERSION])?;

        for &n in self.topology() {
            let n = i32::try_from(n).map_err(|_| MlErr::InvalidTopology {
                reason: "layer too large to be persisted",
            })?;
            sink.write_all(&n.to_be_bytes())?;
        }

        sink.write_all(&0i32.to_be_bytes())?;
        sink.write_all(&[self.act_fn().code(), self.loss_fn().code()])?;

        for (w, _) in self.params() {
            for x in w {
                sink.write_all(&x.to_be_bytes())?;
            }
        }

        for (_, b) in self.params() {
            for x in b {
                sink.write_all(&x.to_be_bytes())?;
            }
        }

        Ok(())
    }

    /// Deserializes a network out of `src`.
    ///
    /// # Returns
    /// The loaded network or an error if the file has an unsupported version, an unknown
    /// function code, an invalid topology or is truncated. Trailing bytes are ignored.
    ///
    /// Layer sizes are checked before reading any parameter, a header whose parameter count
    /// doesn't fit in memory is a `MalformedFile` error.
    pub fn read_from<R: Read>(mut src: R) -> Result<Self> {
        let version = read_u8(&mut src)?;
        if version != VERSION {
            return Err(MlErr::UnsupportedVersion(version));
        }

        let mut topology = Vec::new();
        loop {
            let n = read_i32(&mut src)?;
            if n == 0 {
                break;
            }

            let n = usize::try_from(n).map_err(|_| MlErr::MalformedFile {
                reason: "negative layer size",
            })?;
            topology.push(n);
        }

        if topology.len() < 2 {
            return Err(MlErr::MalformedFile {
                reason: "a network needs an input and an output layer",
            });
        }

        let act_code = read_u8(&mut src)?;
        let act_fn = ActFn::from_code(act_code).ok_or(MlErr::UnknownActivation(act_code))?;

        let loss_code = read_u8(&mut src)?;
        let loss_fn = LossFn::from_code(loss_code).ok_or(MlErr::UnknownLoss(loss_code))?;
        check_pairing(&act_fn, &loss_fn)?;

        check_param_count(&topology)?;

        let mut weights = Vec::with_capacity(topology.len() - 1);
        for dim in topology.windows(2) {
            let (fan_in, fan_out) = (dim[0], dim[1]);
            let values = read_f64s(&mut src, fan_in * fan_out)?;
            let w = Array2::from_shape_vec((fan_out, fan_in), values).map_err(|_| {
                MlErr::MalformedFile {
                    reason: "weight matrix doesn't fit its layer",
                }
            })?;
            weights.push(w);
        }

        let mut biases = Vec::with_capacity(topology.len() - 1);
        for &n in &topology[1..] {
            biases.push(Array1::from_vec(read_f64s(&mut src, n)?));
        }

        Network::from_params(weights, biases, act_fn, loss_fn)
    }
}

/// Checks that the parameters of `topology` can be addressed in memory.
fn check_param_count(topology: &[usize]) -> Result<()> {
    let overflow = || MlErr::MalformedFile {
        reason: "parameter count overflows",
    };

    let mut count: usize = 0;
    for dim in topology.windows(2) {
        count = dim[0]
            .checked_mul(dim[1])
            .and_then(|weights| weights.checked_add(dim[1]))
            .and_then(|params| count.checked_add(params))
            .ok_or_else(overflow)?;
    }

    let bytes = count.checked_mul(size_of::<f64>()).ok_or_else(overflow)?;
    if bytes > isize::MAX as usize {
        return Err(overflow());
    }

    Ok(())
}

/// Reads `len` values, growing the buffer as they arrive so that a header promising more values
/// than the source holds fails with an eof error instead of a huge allocation.
fn read_f64s<R: Read>(src: &mut R, len: usize) -> Result<Vec<f64>> {
    let mut values = Vec::with_capacity(len.min(PREALLOCATED_VALUES));
    for _ in 0..len {
        values.push(read_f64(src)?);
    }

    Ok(values)
}

fn read_u8<R: Read>(src: &mut R) -> Result<u8> {
    let mut buf = [0; 1];
    src.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_i32<R: Read>(src: &mut R) -> Result<i32> {
    let mut buf = [0; 4];
    src.read_exact(&mut buf)?;
    Ok(i32::from_be_bytes(buf))
}

fn read_f64<R: Read>(src: &mut R) -> Result<f64> {
    let mut buf = [0; 8];
    src.read_exact(&mut buf)?;
    Ok(f64::from_be_bytes(buf))
}
