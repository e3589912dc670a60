//! 外部去条纹/相位恢复算法的接入.
//!
//! 两类算法都不在本 crate 中实现, 只约定调用签名. 闭包可以直接充当实现.

use crate::conf::{PhaseMethod, StripeMethod};
use crate::error::{check_shape, ConfigError, ExternalError, ProcError, ProcResult};
use crate::float::TomoFloat;
use ndarray::{Array3, ArrayView3, ArrayViewMut3};

/// 去条纹算法.
pub trait StripeRemoval<T>: Send + Sync {
    /// 对 `data` 做傅里叶-小波去条纹, 返回与输入同形状的新数组.
    fn remove_stripe(
        &self,
        data: ArrayView3<T>,
        sigma: f64,
        filter: &str,
        level: Option<u32>,
    ) -> Result<Array3<T>, ExternalError>;
}

impl<T, F> StripeRemoval<T> for F
where
    F: Fn(ArrayView3<T>, f64, &str, Option<u32>) -> Result<Array3<T>, ExternalError> + Send + Sync,
{
    #[inline]
    fn remove_stripe(
        &self,
        data: ArrayView3<T>,
        sigma: f64,
        filter: &str,
        level: Option<u32>,
    ) -> Result<Array3<T>, ExternalError> {
        self(data, sigma, filter, level)
    }
}

/// 相位恢复算法. 长度单位均为厘米, 能量单位为 keV.
pub trait PhaseRetrieval<T>: Send + Sync {
    /// 对 `data` 做 Paganin 相位恢复, 返回与输入同形状的新数组.
    fn retrieve_phase(
        &self,
        data: ArrayView3<T>,
        pixel_size_cm: f64,
        propagation_distance_cm: f64,
        energy: f64,
        alpha: f64,
    ) -> Result<Array3<T>, ExternalError>;
}

impl<T, F> PhaseRetrieval<T> for F
where
    F: Fn(ArrayView3<T>, f64, f64, f64, f64) -> Result<Array3<T>, ExternalError> + Send + Sync,
{
    #[inline]
    fn retrieve_phase(
        &self,
        data: ArrayView3<T>,
        pixel_size_cm: f64,
        propagation_distance_cm: f64,
        energy: f64,
        alpha: f64,
    ) -> Result<Array3<T>, ExternalError> {
        self(data, pixel_size_cm, propagation_distance_cm, energy, alpha)
    }
}

/// 注入的外部算法. 未配置对应方法时可以为空.
pub struct Collaborators<T> {
    /// 去条纹实现.
    pub stripe: Option<Box<dyn StripeRemoval<T>>>,

    /// 相位恢复实现.
    pub phase: Option<Box<dyn PhaseRetrieval<T>>>,
}

impl<T> Default for Collaborators<T> {
    fn default() -> Self {
        Self {
            stripe: None,
            phase: None,
        }
    }
}

impl<T> std::fmt::Debug for Collaborators<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("stripe", &self.stripe.is_some())
            .field("phase", &self.phase.is_some())
            .finish()
    }
}

impl<T> Collaborators<T> {
    /// 不注入任何外部算法.
    #[inline]
    pub fn none() -> Self {
        Self::default()
    }

    /// 注入去条纹实现.
    pub fn with_stripe(mut self, imp: impl StripeRemoval<T> + 'static) -> Self {
        self.stripe = Some(Box::new(imp));
        self
    }

    /// 注入相位恢复实现.
    pub fn with_phase(mut self, imp: impl PhaseRetrieval<T> + 'static) -> Self {
        self.phase = Some(Box::new(imp));
        self
    }
}

/// 把外部算法的结果写回 `data`. 形状不符时 `data` 不变.
fn write_back<T: TomoFloat>(
    what: &'static str,
    mut data: ArrayViewMut3<T>,
    res: Array3<T>,
) -> ProcResult<()> {
    check_shape(what, data.shape(), res.shape())?;
    data.assign(&res);
    Ok(())
}

/// 按 `method` 就地去条纹. `method` 为 [`StripeMethod::Disabled`] 时什么都不做.
///
/// 外部算法的失败以 [`ProcError::External`] 原样返回.
pub fn remove_stripe<T: TomoFloat>(
    data: ArrayViewMut3<T>,
    method: &StripeMethod,
    imp: Option<&dyn StripeRemoval<T>>,
) -> ProcResult<()> {
    let StripeMethod::FourierWavelet {
        sigma,
        filter,
        level,
    } = method
    else {
        return Ok(());
    };
    let imp = imp.ok_or(ConfigError::MissingCollaborator("fw"))?;

    let res = imp
        .remove_stripe(data.view(), *sigma, filter, *level)
        .map_err(|source| ProcError::External {
            algorithm: "fw",
            source,
        })?;
    log::trace!("stripe removal (fw, sigma = {sigma}, filter = {filter}) done");
    write_back("stripe removal result", data, res)
}

/// 按 `method` 就地相位恢复. `method` 为 [`PhaseMethod::Disabled`] 时什么都不做.
pub fn retrieve_phase<T: TomoFloat>(
    data: ArrayViewMut3<T>,
    method: &PhaseMethod,
    imp: Option<&dyn PhaseRetrieval<T>>,
) -> ProcResult<()> {
    let &PhaseMethod::Paganin {
        pixel_size_cm,
        propagation_distance_cm,
        energy,
        alpha,
    } = method
    else {
        return Ok(());
    };
    let imp = imp.ok_or(ConfigError::MissingCollaborator("paganin"))?;

    let res = imp
        .retrieve_phase(
            data.view(),
            pixel_size_cm,
            propagation_distance_cm,
            energy,
            alpha,
        )
        .map_err(|source| ProcError::External {
            algorithm: "paganin",
            source,
        })?;
    log::trace!("phase retrieval (paganin, alpha = {alpha}) done");
    write_back("phase retrieval result", data, res)
}
