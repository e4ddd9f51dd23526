//! Core of the honeypot-log heatmap renderer: IP -> coordinate mapping on a
//! Hilbert curve, time-bin aggregation, decay/residue memory, and frame
//! compositing. Log parsing, gzip decoding, GeoIP, video encoding, and CLI
//! concerns all live in the driver binary that composes this crate.

pub mod bin;
pub mod cidr;
pub mod compositor;
pub mod coord;
pub mod decay;
pub mod error;
pub mod governor;
pub mod hilbert;
pub mod mask;
pub mod pipeline;

pub use bin::{Event, Protocol, TimeBin};
pub use cidr::{CidrEntry, CidrMap};
pub use compositor::Frame;
pub use decay::{DecayCache, ResidueMap};
pub use error::{CoreError, Result};
pub use governor::GovernorResult;
pub use mask::NonRoutableMask;
pub use pipeline::{CoreConfig, Pipeline};
