//! Turn PGN games into `<fen> | <score> | <outcome>` training rows, scoring
//! sampled positions with an external UCI engine.

pub mod chess;

pub use chess::{LabelError, LabelStats, LabelerConfig, SamplingConfig, run};
