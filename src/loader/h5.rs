//! Runs stored as hdf5 files
//!
//! One file per run and timestep, `<root>/<label>/fields.<timestep>.h5`,
//! holding the coordinate datasets `x`, `xh`, `y`, `yh`, `z`, `zh`,
//! one 3-D dataset (`[k, j, i]`) per field, and the scalar `time`.
use super::{timestep_suffix, RunLoader, DEFAULT_FIELDS};
use crate::error::{Result, VerifyError};
use crate::field::GridField;
use crate::grid::{Grid, Resolution, Stagger};
use crate::io::{read_from_hdf5, read_scalar_from_hdf5, write_scalar_to_hdf5, write_to_hdf5};
use crate::run::SimulationRun;
use ndarray::{Array1, Ix1, Ix3};
use std::fs;
use std::path::{Path, PathBuf};

/// Loads runs from hdf5 files
#[derive(Clone, Debug)]
pub struct Hdf5Loader {
    /// Directory holding one sub-directory per run label
    pub root: PathBuf,
    /// Fields to read
    pub fields: Vec<String>,
}

impl Hdf5Loader {
    /// Loader for fields `u`, `w` and `p`
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            fields: DEFAULT_FIELDS.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    /// Path of the file of a run at a timestep
    pub fn path(&self, label: &str, timestep: usize) -> PathBuf {
        self.root
            .join(label)
            .join(format!("fields.{}.h5", timestep_suffix(timestep)))
    }

    /// Physical time stored alongside the fields
    ///
    /// # Errors
    /// `LoadFailure` if the file or the scalar can't be read
    pub fn read_time(&self, label: &str, timestep: usize) -> Result<f64> {
        read_scalar_from_hdf5::<f64, _>(self.path(label, timestep), "time")
            .map_err(|e| VerifyError::load_failure(label, e))
    }

    /// Write a run in the layout this loader reads
    ///
    /// # Errors
    /// `LoadFailure` if the directory or file can't be written
    pub fn write(&self, run: &SimulationRun, time: f64) -> Result<()> {
        let label = run.label.as_str();
        fs::create_dir_all(self.root.join(label)).map_err(|e| VerifyError::load_failure(label, e))?;
        let path = self.path(label, run.timestep);
        let grid = &run.grid;
        let coords = [
            ("x", &grid.x),
            ("xh", &grid.xh),
            ("y", &grid.y),
            ("yh", &grid.yh),
            ("z", &grid.z),
            ("zh", &grid.zh),
        ];
        for (name, axis) in coords {
            write_to_hdf5(&path, name, axis).map_err(|e| VerifyError::load_failure(label, e))?;
        }
        for (name, field) in &run.fields {
            write_to_hdf5(&path, name, &field.v).map_err(|e| VerifyError::load_failure(label, e))?;
        }
        write_scalar_to_hdf5(&path, "time", time).map_err(|e| VerifyError::load_failure(label, e))?;
        log::debug!(" ==> {:?}", path);
        Ok(())
    }
}

impl RunLoader for Hdf5Loader {
    fn load(&self, label: &str, resolution: Resolution, timestep: usize) -> Result<SimulationRun> {
        let path = self.path(label, timestep);
        let read_axis = |name: &str| -> Result<Array1<f64>> {
            read_from_hdf5::<f64, Ix1, _>(&path, name)
                .map_err(|e| VerifyError::load_failure(label, e))
        };
        let grid = Grid::new(
            read_axis("x")?,
            read_axis("xh")?,
            read_axis("y")?,
            read_axis("yh")?,
            read_axis("z")?,
            read_axis("zh")?,
        )
        .map_err(|e| VerifyError::load_failure(label, e))?;
        if grid.x.len() != resolution.nx || grid.z.len() != resolution.nz {
            return Err(VerifyError::load_failure(
                label,
                format!(
                    "file {:?} holds a {}x{} grid, expected {}",
                    path,
                    grid.x.len(),
                    grid.z.len(),
                    resolution
                ),
            ));
        }

        let mut run = SimulationRun::new(label, resolution, timestep, grid);
        for name in &self.fields {
            let v = read_from_hdf5::<f64, Ix3, _>(&path, name)
                .map_err(|e| VerifyError::load_failure(label, e))?;
            let field = GridField::new(name, Stagger::for_field(name), v, &run.grid)?;
            run.insert(field)?;
        }
        log::debug!(" <== {:?}", path);
        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::TaylorGreen;

    #[test]
    fn test_write_then_load() {
        let root = std::env::temp_dir().join(format!("taylorgreen-h5-{}", std::process::id()));
        let grid = Grid::uniform(16, 1, 8, [1., 1., 0.5]).unwrap();
        let reference = TaylorGreen::new(0.1).unwrap().evaluate_on(&grid, 0.1).unwrap();
        let mut run = SimulationRun::new("tg16", Resolution::new(16, 8), 2000, grid);
        for field in reference.fields.into_values() {
            run.insert(field).unwrap();
        }
        let loader = Hdf5Loader::new(&root);
        loader.write(&run, 0.1).unwrap();

        let loaded = loader.load("tg16", Resolution::new(16, 8), 2000).unwrap();
        assert_eq!(loaded.grid, run.grid);
        assert_eq!(loaded.fields, run.fields);
        assert!((loader.read_time("tg16", 2000).unwrap() - 0.1).abs() < 1e-15);
        assert!(loader.load("tg16", Resolution::new(32, 16), 2000).is_err());
        fs::remove_dir_all(&root).unwrap();
    }
}
