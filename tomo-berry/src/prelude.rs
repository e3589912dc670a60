//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{ConfigError, ExecStream, Precision, ProcError, ProcResult, TomoFloat};

pub use crate::conf::{FbpFilter, PhaseMethod, ReconAlgorithm, ScanType, StripeMethod, TomoConf};

pub use crate::backend::{FilterSizing, Reconstructor, RustFftFilter, SpectralFilter};
pub use crate::mode::{select_mode, Geometry, Mode, ReconLayout};

pub use crate::correct::{darkflat_correction, minus_log, remove_outliers};
pub use crate::external::{Collaborators, PhaseRetrieval, StripeRemoval};
pub use crate::pad360::{pad360, pad360_into};
pub use crate::ramp::{fbp_filter_center, padded_len, ramp_weights};

pub use crate::TomoFunctions;
