//! Functions for managing FreeSurfer brain volumes in binary 'MGH' files.
//!
//! ICA component maps are stored as 4D volumes, with one frame per component. Grey matter masks are
//! 3D volumes (a single frame) in which nonzero voxels are part of the mask.


use byteordered::ByteOrdered;
use flate2::bufread::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use ndarray::{Array, Array4, ShapeBuilder};

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{HemisymError, Result};
use crate::util::is_gz_file;

pub const MGH_VERSION: i32 = 1;

pub const MGH_DATA_START : usize = 284; // The index in bytes where the data part starts in an MGH file.

const MRI_UCHAR: i32 = 0;
const MRI_INT: i32 = 1;
const MRI_FLOAT: i32 = 3;
const MRI_SHORT: i32 = 4;

/// Models the header of a FreeSurfer MGH file containing a brain volume.
#[derive(Debug, Clone, PartialEq)]
pub struct FsMghHeader {
    pub mgh_format_version: i32,
    pub dim1len: i32,
    pub dim2len: i32,
    pub dim3len: i32,
    pub dim4len: i32,  // aka "num_frames", the number of ICA components for component maps
    pub dtype: i32,
    pub dof: i32,
    pub is_ras_good: i16,
    pub delta: [f32; 3],
    pub mdc_raw: [f32; 9],
    pub p_xyz_c: [f32; 3],
}


/// Models a FreeSurfer MGH file. The voxel data is converted to `f32`, whatever the on-disk data type.
#[derive(Debug, Clone, PartialEq)]
pub struct FsMgh {
    pub header: FsMghHeader,
    pub data: Array4<f32>,
}


impl Default for FsMghHeader {
    fn default() -> FsMghHeader {
        FsMghHeader {
            mgh_format_version: MGH_VERSION,
            dim1len: 0,
            dim2len: 0,
            dim3len: 0,
            dim4len: 0,
            dtype: MRI_FLOAT,
            dof: 0,
            is_ras_good: 0,
            delta: [1.; 3],
            mdc_raw: [0.; 9],
            p_xyz_c: [0.; 3],
        }
    }
}

/// The header of an MGH/MGZ file.
impl FsMghHeader {

    /// Read an MGH header from the given byte stream.
    /// It is assumed that the input is currently at the start of the
    /// header. Exactly the header fields are consumed, not the padding up to [`MGH_DATA_START`].
    pub fn from_reader<S>(input: &mut S) -> Result<FsMghHeader>
    where
        S: Read,
    {
        let mut hdr = FsMghHeader::default();

        let mut input = ByteOrdered::be(input);

        hdr.mgh_format_version = input.read_i32()?;

        if hdr.mgh_format_version != MGH_VERSION {
            return Err(HemisymError::InvalidMghFormat);
        }

        hdr.dim1len = input.read_i32()?;
        hdr.dim2len = input.read_i32()?;
        hdr.dim3len = input.read_i32()?;
        hdr.dim4len = input.read_i32()?;

        if hdr.dim1len < 1 || hdr.dim2len < 1 || hdr.dim3len < 1 || hdr.dim4len < 1 {
            return Err(HemisymError::InvalidMghFormat);
        }

        hdr.dtype = input.read_i32()?;
        hdr.dof = input.read_i32()?;

        hdr.is_ras_good = input.read_i16()?;

        if hdr.is_ras_good == 1 {
            for idx in 0..3 { hdr.delta[idx] = input.read_f32()?; }
            for idx in 0..9 { hdr.mdc_raw[idx] = input.read_f32()?; }
            for idx in 0..3 { hdr.p_xyz_c[idx] = input.read_f32()?; }
        }
        Ok(hdr)
    }

    /// Number of bytes `from_reader` consumed for this header.
    fn num_bytes_read(&self) -> usize {
        if self.is_ras_good == 1 { 30 + 15 * 4 } else { 30 }
    }

    /// The volume dimensions, in voxels and frames.
    pub fn dim(&self) -> (usize, usize, usize, usize) {
        (self.dim1len as usize, self.dim2len as usize, self.dim3len as usize, self.dim4len as usize)
    }

    /// Write this header to the given byte stream, including the padding up to [`MGH_DATA_START`].
    fn to_writer<S>(&self, output: &mut S) -> Result<()>
    where
        S: Write,
    {
        let mut output = ByteOrdered::be(output);
        output.write_i32(self.mgh_format_version)?;
        output.write_i32(self.dim1len)?;
        output.write_i32(self.dim2len)?;
        output.write_i32(self.dim3len)?;
        output.write_i32(self.dim4len)?;
        output.write_i32(self.dtype)?;
        output.write_i32(self.dof)?;
        output.write_i16(self.is_ras_good)?;
        for v in self.delta.iter().chain(self.mdc_raw.iter()).chain(self.p_xyz_c.iter()) {
            output.write_f32(*v)?;
        }
        for _ in (30 + 15 * 4)..MGH_DATA_START {
            output.write_u8(0)?;
        }
        Ok(())
    }
}


impl FsMgh {

    /// Read an MGH or MGZ file.
    /// If the file's name ends with ".mgz" or ".gz", the file is gunzipped on the fly.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<FsMgh> {
        let gz = is_gz_file(&path);
        let file = BufReader::new(File::open(path)?);
        if gz {
            FsMgh::from_reader(GzDecoder::new(file))
        } else {
            FsMgh::from_reader(file)
        }
    }

    /// Read a full MGH volume from the given byte stream, which must be at the start of the header.
    pub fn from_reader<S>(mut input: S) -> Result<FsMgh>
    where
        S: Read,
    {
        let hdr = FsMghHeader::from_reader(&mut input)?;

        // Gz streams cannot seek, so the padding is read and dropped.
        let mut padding = vec![0u8; MGH_DATA_START - hdr.num_bytes_read()];
        input.read_exact(&mut padding)?;

        let (d1, d2, d3, d4) = hdr.dim();
        let num_values = d1.checked_mul(d2)
            .and_then(|n| n.checked_mul(d3))
            .and_then(|n| n.checked_mul(d4))
            .ok_or(HemisymError::InvalidMghFormat)?;
        let mut input = ByteOrdered::be(input);
        // Header dimensions are untrusted, values are collected as they are read.
        let mut values : Vec<f32> = Vec::new();
        match hdr.dtype {
            MRI_UCHAR => for _ in 0..num_values { values.push(input.read_u8()? as f32); },
            MRI_INT => for _ in 0..num_values { values.push(input.read_i32()? as f32); },
            MRI_FLOAT => for _ in 0..num_values { values.push(input.read_f32()?); },
            MRI_SHORT => for _ in 0..num_values { values.push(input.read_i16()? as f32); },
            other => return Err(HemisymError::UnsupportedMghDatatype(other)),
        }

        // MGH stores voxels in Fortran order: the first dimension varies fastest.
        let data = Array::from_shape_vec((d1, d2, d3, d4).f(), values)
            .map_err(|_| HemisymError::InvalidMghFormat)?;

        Ok(FsMgh { header: hdr, data })
    }

    /// Write this volume as MRI_FLOAT to an MGH file, or a gzipped MGZ file if the name ends with ".mgz" or ".gz".
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let gz = is_gz_file(&path);
        let file = BufWriter::new(File::create(path)?);
        if gz {
            let mut encoder = GzEncoder::new(file, Compression::default());
            self.to_writer(&mut encoder)?;
            encoder.finish()?.flush()?;
        } else {
            let mut file = file;
            self.to_writer(&mut file)?;
            file.flush()?;
        }
        Ok(())
    }

    fn to_writer<S>(&self, output: &mut S) -> Result<()>
    where
        S: Write,
    {
        let (d1, d2, d3, d4) = self.data.dim();
        let hdr = FsMghHeader {
            dim1len: d1 as i32,
            dim2len: d2 as i32,
            dim3len: d3 as i32,
            dim4len: d4 as i32,
            dtype: MRI_FLOAT,
            ..self.header.clone()
        };
        hdr.to_writer(output)?;

        let mut output = ByteOrdered::be(output);
        // The reversed-axes view iterates in Fortran order of the array.
        for v in self.data.t().iter() {
            output.write_f32(*v)?;
        }
        Ok(())
    }
}


/// Read an MGH or MGZ file.
pub fn read_mgh<P: AsRef<Path>>(path: P) -> Result<FsMgh> {
    FsMgh::from_file(path)
}


/// Write a float volume to an MGH or MGZ file, with a default header.
pub fn write_mgh<P: AsRef<Path>>(path: P, data: &Array4<f32>) -> Result<()> {
    let mgh = FsMgh {
        header: FsMghHeader::default(),
        data: data.clone(),
    };
    mgh.to_file(path)
}
