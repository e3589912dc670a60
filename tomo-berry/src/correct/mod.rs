//! 逐块校正: 暗场/平场归一化, 去坏点, 负对数.

mod darkflat;
mod neglog;
mod outlier;

pub use darkflat::{darkflat_correction, mean_frame};
pub use neglog::{minus_log, minus_log_value};
pub use outlier::{median_filter_2d, remove_outliers};
