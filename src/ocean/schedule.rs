//! Per-frame dispatch list with declared field access and derived barriers.
//!
//! Each dispatch names the fields it reads and writes. The scheduler inserts a
//! barrier before any dispatch that would observe (or overwrite) a field
//! touched since the previous barrier. On the GPU every barrier becomes a
//! compute-pass boundary.

use bitflags::bitflags;

use super::fft::FftAxis;

bitflags! {
    /// GPU-resident fields owned by the simulation
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Fields: u32 {
        const GAUSSIAN = 1 << 0;
        const BUTTERFLY = 1 << 1;
        const H0 = 1 << 2;
        const H0_MINUS = 1 << 3;
        const SPECTRUM_HEIGHT = 1 << 4;
        const SPECTRUM_DX = 1 << 5;
        const SPECTRUM_DZ = 1 << 6;
        const SPECTRUM_SLOPE_X = 1 << 7;
        const SPECTRUM_SLOPE_Z = 1 << 8;
        const PINGPONG = 1 << 9;
        const HEIGHT = 1 << 10;
        const DISPLACEMENT_X = 1 << 11;
        const DISPLACEMENT_Z = 1 << 12;
        const SLOPE_X = 1 << 13;
        const SLOPE_Z = 1 << 14;
        const NORMAL_MAP = 1 << 15;
    }
}

/// One of the five per-frame inverse transforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FftTarget {
    Height,
    DisplacementX,
    DisplacementZ,
    SlopeX,
    SlopeZ,
}

impl FftTarget {
    pub const ALL: [FftTarget; 5] = [
        FftTarget::Height,
        FftTarget::DisplacementX,
        FftTarget::DisplacementZ,
        FftTarget::SlopeX,
        FftTarget::SlopeZ,
    ];

    /// Frequency-domain field transformed in place
    pub fn spectrum(self) -> Fields {
        match self {
            FftTarget::Height => Fields::SPECTRUM_HEIGHT,
            FftTarget::DisplacementX => Fields::SPECTRUM_DX,
            FftTarget::DisplacementZ => Fields::SPECTRUM_DZ,
            FftTarget::SlopeX => Fields::SPECTRUM_SLOPE_X,
            FftTarget::SlopeZ => Fields::SPECTRUM_SLOPE_Z,
        }
    }

    /// Spatial-domain field produced by the finalize pass
    pub fn output(self) -> Fields {
        match self {
            FftTarget::Height => Fields::HEIGHT,
            FftTarget::DisplacementX => Fields::DISPLACEMENT_X,
            FftTarget::DisplacementZ => Fields::DISPLACEMENT_Z,
            FftTarget::SlopeX => Fields::SLOPE_X,
            FftTarget::SlopeZ => Fields::SLOPE_Z,
        }
    }
}

/// Compute stage kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Synthesize,
    Evolve,
    Butterfly {
        target: FftTarget,
        axis: FftAxis,
        stage: u32,
        /// True when reading the spectrum field and writing the ping-pong
        from_field: bool,
    },
    Finalize {
        target: FftTarget,
    },
    NormalMap,
}

/// A compute dispatch and the fields it touches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    pub stage: Stage,
    pub reads: Fields,
    pub writes: Fields,
}

/// Ordered frame step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Barrier,
    Dispatch(Dispatch),
}

/// Ordered dispatch list for one frame
#[derive(Debug, Clone, Default)]
pub struct FrameSchedule {
    steps: Vec<Step>,
    written: Fields,
    read: Fields,
}

impl FrameSchedule {
    /// Full frame: optional synthesis, evolve, five 2D inverse FFTs, normal map
    pub fn for_frame(butterfly_stages: u32, synthesize: bool) -> Self {
        let mut schedule = Self::default();

        if synthesize {
            schedule.push(Dispatch {
                stage: Stage::Synthesize,
                reads: Fields::GAUSSIAN,
                writes: Fields::H0 | Fields::H0_MINUS,
            });
        }

        schedule.push(Dispatch {
            stage: Stage::Evolve,
            reads: Fields::H0 | Fields::H0_MINUS,
            writes: FftTarget::ALL
                .iter()
                .fold(Fields::empty(), |acc, t| acc | t.spectrum()),
        });

        for target in FftTarget::ALL {
            schedule.push_fft(target, butterfly_stages);
        }

        schedule.push(Dispatch {
            stage: Stage::NormalMap,
            reads: Fields::HEIGHT
                | Fields::SLOPE_X
                | Fields::SLOPE_Z
                | Fields::DISPLACEMENT_X
                | Fields::DISPLACEMENT_Z,
            writes: Fields::NORMAL_MAP,
        });

        schedule
    }

    fn push_fft(&mut self, target: FftTarget, butterfly_stages: u32) {
        let mut from_field = true;
        for axis in [FftAxis::Horizontal, FftAxis::Vertical] {
            for stage in 0..butterfly_stages {
                let (reads, writes) = if from_field {
                    (target.spectrum(), Fields::PINGPONG)
                } else {
                    (Fields::PINGPONG, target.spectrum())
                };
                self.push(Dispatch {
                    stage: Stage::Butterfly {
                        target,
                        axis,
                        stage,
                        from_field,
                    },
                    reads: reads | Fields::BUTTERFLY,
                    writes,
                });
                from_field = !from_field;
            }
        }

        // 2 log2(N) passes always end back in the spectrum field
        self.push(Dispatch {
            stage: Stage::Finalize { target },
            reads: target.spectrum(),
            writes: target.output(),
        });
    }

    /// Append a dispatch, inserting a barrier on any hazard
    pub fn push(&mut self, dispatch: Dispatch) {
        let read_after_write = dispatch.reads.intersects(self.written);
        let write_after_any = dispatch.writes.intersects(self.written | self.read);
        if read_after_write || write_after_any {
            self.steps.push(Step::Barrier);
            self.written = Fields::empty();
            self.read = Fields::empty();
        }
        self.written |= dispatch.writes;
        self.read |= dispatch.reads;
        self.steps.push(Step::Dispatch(dispatch));
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn dispatches(&self) -> impl Iterator<Item = &Dispatch> {
        self.steps.iter().filter_map(|step| match step {
            Step::Dispatch(d) => Some(d),
            Step::Barrier => None,
        })
    }

    pub fn barrier_count(&self) -> usize {
        self.steps.iter().filter(|s| matches!(s, Step::Barrier)).count()
    }

    /// Dispatches grouped into barrier-free passes
    pub fn passes(&self) -> Vec<Vec<Dispatch>> {
        let mut passes = vec![Vec::new()];
        for step in &self.steps {
            match step {
                Step::Barrier => passes.push(Vec::new()),
                Step::Dispatch(d) => {
                    if let Some(current) = passes.last_mut() {
                        current.push(*d);
                    }
                }
            }
        }
        passes.retain(|p| !p.is_empty());
        passes
    }
}
