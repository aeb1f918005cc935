//! Raw binary dumps of the solver
//!
//! Layout of a run directory `<root>/<label>/`:
//! - `grid.0000000`: `x`, `xh`, `y`, `yh`, `z`, `zh` as consecutive
//!   floats of length `nx`, `nx`, `ny`, `ny`, `nz`, `nz`
//! - `<field>.<timestep>`: `nz * ny * nx` floats, `x` fastest
//!
//! All floats are 8 bytes wide, without header.
use super::{timestep_suffix, RunLoader, DEFAULT_FIELDS};
use crate::error::{Result, VerifyError};
use crate::field::GridField;
use crate::grid::{Grid, Resolution, Stagger};
use crate::io::{read_f64_file, write_f64_file, ByteOrder};
use crate::run::SimulationRun;
use ndarray::{Array1, Array3};
use std::fs;
use std::path::{Path, PathBuf};

/// Loads runs from raw binary dumps
#[derive(Clone, Debug)]
pub struct BinaryLoader {
    /// Directory holding one sub-directory per run label
    pub root: PathBuf,
    /// Number of points in the homogeneous direction
    pub ny: usize,
    /// Byte order of the dumps
    pub byte_order: ByteOrder,
    /// Fields to read
    pub fields: Vec<String>,
}

impl BinaryLoader {
    /// Loader for 2-D little endian runs with fields `u`, `w` and `p`
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            ny: 1,
            byte_order: ByteOrder::default(),
            fields: DEFAULT_FIELDS.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    /// Path of the grid file of a run
    pub fn grid_path(&self, label: &str) -> PathBuf {
        self.root
            .join(label)
            .join(format!("grid.{}", timestep_suffix(0)))
    }

    /// Path of a field dump of a run
    pub fn field_path(&self, label: &str, field: &str, timestep: usize) -> PathBuf {
        self.root
            .join(label)
            .join(format!("{}.{}", field, timestep_suffix(timestep)))
    }

    fn read_grid(&self, label: &str, resolution: Resolution) -> Result<Grid> {
        let path = self.grid_path(label);
        let data =
            read_f64_file(&path, self.byte_order).map_err(|e| VerifyError::load_failure(label, e))?;
        let (nx, ny, nz) = (resolution.nx, self.ny, resolution.nz);
        let lengths = [nx, nx, ny, ny, nz, nz];
        let required: usize = lengths.iter().sum();
        if data.len() < required {
            return Err(VerifyError::load_failure(
                label,
                format!(
                    "grid file {:?} holds {} values, expected at least {}",
                    path,
                    data.len(),
                    required
                ),
            ));
        }
        log::debug!(" <== {:?}", path);
        let mut offset = 0;
        let mut take = |n: usize| {
            let axis = Array1::from(data[offset..offset + n].to_vec());
            offset += n;
            axis
        };
        let (x, xh) = (take(nx), take(nx));
        let (y, yh) = (take(ny), take(ny));
        let (z, zh) = (take(nz), take(nz));
        Grid::new(x, xh, y, yh, z, zh).map_err(|e| VerifyError::load_failure(label, e))
    }

    fn read_field(&self, label: &str, name: &str, timestep: usize, grid: &Grid) -> Result<GridField> {
        let path = self.field_path(label, name, timestep);
        let data =
            read_f64_file(&path, self.byte_order).map_err(|e| VerifyError::load_failure(label, e))?;
        let stagger = Stagger::for_field(name);
        let [nz, ny, nx] = grid.shape_of(stagger);
        let v = Array3::from_shape_vec((nz, ny, nx), data).map_err(|e| {
            VerifyError::load_failure(label, format!("field file {:?}: {}", path, e))
        })?;
        log::debug!(" <== {:?}", path);
        GridField::new(name, stagger, v, grid)
    }

    /// Write a run in the layout this loader reads
    ///
    /// # Errors
    /// `LoadFailure` if a directory or file can't be written
    pub fn write(&self, run: &SimulationRun) -> Result<()> {
        let fail = |e: std::io::Error| VerifyError::load_failure(&run.label, e);
        fs::create_dir_all(self.root.join(&run.label)).map_err(fail)?;
        let grid = &run.grid;
        let coords = [&grid.x, &grid.xh, &grid.y, &grid.yh, &grid.z, &grid.zh];
        write_f64_file(
            self.grid_path(&run.label),
            coords.iter().flat_map(|a| a.iter().copied()),
            self.byte_order,
        )
        .map_err(fail)?;
        for (name, field) in &run.fields {
            write_f64_file(
                self.field_path(&run.label, name, run.timestep),
                field.v.iter().copied(),
                self.byte_order,
            )
            .map_err(fail)?;
        }
        Ok(())
    }
}

impl RunLoader for BinaryLoader {
    fn load(&self, label: &str, resolution: Resolution, timestep: usize) -> Result<SimulationRun> {
        let grid = self.read_grid(label, resolution)?;
        let mut run = SimulationRun::new(label, resolution, timestep, grid);
        for name in &self.fields {
            let field = self.read_field(label, name, timestep, &run.grid)?;
            run.insert(field)?;
        }
        Ok(run)
    }
}
