//! Saving frame snapshots to HDF5.
//!
//! A file holds `start/voltages` and `end/voltages`, one value per frame for the
//! driven and terminated nodes, and optionally `full/voltages` with one row of
//! `N + 1` node voltages per frame.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{Error, SimulationParameters};

/// How data should be saved to file.
#[derive(Debug)]
pub struct SaveSettings<P: AsRef<Path>> {
    /// The path to the save file.
    pub filename: P,
    /// What information to save.
    pub save_type: SaveType,
    /// Whether or not to overwrite any possible saved data.
    pub overwrite: bool,
}

/// Represents what data to save.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum SaveType {
    /// Save voltage data for every node on the line.
    Full,
    /// Save voltage data for only the end nodes.
    End,
}

/// An open-for-appending snapshot file.
pub(crate) struct SnapshotFile {
    filename: PathBuf,
    save_type: SaveType,
    end_offset: usize,
    full_offset: usize,
}

impl SnapshotFile {
    /// Creates the file, or grows the datasets of an existing one, to receive
    /// `nframes` more frames.
    pub(crate) fn prepare<P: AsRef<Path>>(
        settings: &SaveSettings<P>,
        nframes: usize,
        npoints: usize,
        sim_params: &SimulationParameters,
        sub_steps: usize,
    ) -> Result<Self, Error> {
        let filename = settings.filename.as_ref();
        let total_points = npoints + 1;
        let mut end_offset = 0;
        let mut full_offset = 0;

        if filename.exists() && !settings.overwrite {
            let file = hdf5::File::append(filename)?;

            let previous_end_size = file.dataset("end/voltages")?.shape()[0];
            end_offset = previous_end_size;

            // resize end datasets
            file.dataset("end/voltages")?.resize(previous_end_size + nframes)?;
            file.dataset("start/voltages")?.resize(previous_end_size + nframes)?;

            if settings.save_type == SaveType::Full {
                if let Ok(full_group) = file.group("full") {
                    let previous_full_size = file.dataset("full/voltages")?.shape()[0];
                    full_offset = previous_full_size;
                    full_group.dataset("voltages")?.resize(
                        (previous_full_size + nframes, total_points)
                    )?;
                } else {
                    let full_group = file.create_group("full")?;
                    full_group.new_dataset::<f32>()
                        .shape((hdf5::Extent::resizable(nframes), total_points))
                        .create("voltages")?;
                }
            }

            file.close()?;
        } else {
            let file = hdf5::File::create(filename)?;

            let end_group = file.create_group("end")?;
            end_group.new_dataset::<f32>()
                .shape(hdf5::Extent::resizable(nframes))
                .create("voltages")?;
            let start_group = file.create_group("start")?;
            start_group.new_dataset::<f32>()
                .shape(hdf5::Extent::resizable(nframes))
                .create("voltages")?;

            if settings.save_type == SaveType::Full {
                let full_group = file.create_group("full")?;
                full_group.new_dataset::<f32>()
                    .shape((hdf5::Extent::resizable(nframes), total_points))
                    .create("voltages")?;
            }

            // run constants as file attributes
            file.new_attr::<f32>()
                .shape(hdf5::Extents::Scalar)
                .create("time_step")?
                .write_scalar(&sim_params.delta_t)?;
            file.new_attr::<f32>()
                .shape(hdf5::Extents::Scalar)
                .create("characteristic_impedance")?
                .write_scalar(&sim_params.impedance)?;
            file.new_attr::<u64>()
                .shape(hdf5::Extents::Scalar)
                .create("sub_steps")?
                .write_scalar(&(sub_steps as u64))?;

            file.close()?;
        }

        debug!(file = %filename.display(), end_offset, full_offset, "prepared snapshot file");

        Ok(Self {
            filename: filename.to_path_buf(),
            save_type: settings.save_type,
            end_offset,
            full_offset,
        })
    }

    /// Appends a block of frames, one row of node voltages per frame.
    pub(crate) fn write_frames(&mut self, voltages: ndarray::ArrayView2<f32>) -> Result<(), Error> {
        let nrows = voltages.nrows();
        let file = hdf5::File::open_rw(&self.filename)?;

        file.dataset("end/voltages")?
            .write_slice(
                voltages.slice(ndarray::s![.., -1]).to_owned().view(),
                ndarray::s![self.end_offset..(self.end_offset + nrows)],
            )?;
        file.dataset("start/voltages")?
            .write_slice(
                voltages.slice(ndarray::s![.., 0]).to_owned().view(),
                ndarray::s![self.end_offset..(self.end_offset + nrows)],
            )?;

        if self.save_type == SaveType::Full {
            file.dataset("full/voltages")?
                .write_slice(
                    voltages,
                    ndarray::s![self.full_offset..(self.full_offset + nrows), ..],
                )?;
            self.full_offset += nrows;
        }
        self.end_offset += nrows;

        file.close()?;
        Ok(())
    }

    /// Shrinks the datasets to the frames written so far, dropping rows
    /// `prepare` reserved but the run never filled.
    pub(crate) fn truncate(&self) -> Result<(), Error> {
        let file = hdf5::File::open_rw(&self.filename)?;

        file.dataset("end/voltages")?.resize(self.end_offset)?;
        file.dataset("start/voltages")?.resize(self.end_offset)?;
        if self.save_type == SaveType::Full {
            let full = file.dataset("full/voltages")?;
            let total_points = full.shape()[1];
            full.resize((self.full_offset, total_points))?;
        }

        debug!(
            file = %self.filename.display(),
            frames = self.end_offset,
            "truncated snapshot file"
        );
        file.close()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScenarioConfig;

    #[test]
    fn saves_and_appends_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frames.h5");
        let config = ScenarioConfig { npoints: 10, ..Default::default() };
        let mut simulation = config.build().unwrap();

        simulation.run(crate::RunDescriptor {
            frames: 4,
            verbose: false,
            halt_on_divergence: true,
            frame_interval: None,
            save_settings: Some(SaveSettings {
                filename: &path,
                save_type: SaveType::End,
                overwrite: true,
            }),
        }).unwrap();
        simulation.run(crate::RunDescriptor {
            frames: 3,
            verbose: false,
            halt_on_divergence: true,
            frame_interval: None,
            save_settings: Some(SaveSettings {
                filename: &path,
                save_type: SaveType::Full,
                overwrite: false,
            }),
        }).unwrap();

        let file = hdf5::File::open(&path).unwrap();
        let ends = file.dataset("end/voltages").unwrap().read_1d::<f32>().unwrap();
        let full = file.dataset("full/voltages").unwrap().read_2d::<f32>().unwrap();

        assert_eq!(ends.len(), 7);
        assert_eq!(full.shape(), &[3, 11]);
        // short circuit end
        assert!(ends.iter().all(|&v| v == 0.0));
        let last = simulation.state().voltages.clone();
        assert_eq!(full.row(2), last);
    }

    #[test]
    fn diverged_run_keeps_only_finite_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diverged.h5");
        let config = ScenarioConfig { npoints: 50, stability_margin: 1.1, ..Default::default() };
        let mut simulation = config.build().unwrap();
        let descriptor = |overwrite| crate::RunDescriptor {
            frames: 2000,
            verbose: false,
            halt_on_divergence: true,
            frame_interval: None,
            save_settings: Some(SaveSettings {
                filename: &path,
                save_type: SaveType::Full,
                overwrite,
            }),
        };

        let frame = match simulation.run(descriptor(true)) {
            Err(Error::Diverged { frame }) => frame,
            other => panic!("expected divergence, got {:?}", other),
        };
        assert!(frame > 0 && frame < 2000);

        // a later append starts right after the kept frames
        assert!(matches!(
            simulation.run(descriptor(false)),
            Err(Error::Diverged { .. })
        ));

        let file = hdf5::File::open(&path).unwrap();
        let ends = file.dataset("end/voltages").unwrap().read_1d::<f32>().unwrap();
        let starts = file.dataset("start/voltages").unwrap().read_1d::<f32>().unwrap();
        let full = file.dataset("full/voltages").unwrap().read_2d::<f32>().unwrap();

        assert_eq!(ends.len(), frame);
        assert_eq!(starts.len(), frame);
        assert_eq!(full.shape(), &[frame, 51]);
        assert!(full.iter().all(|v| v.is_finite()));
        // the drive reaches the line from the second frame on
        assert!(starts.iter().skip(1).any(|&v| v != 0.0));
    }
}
