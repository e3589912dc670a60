//! 执行流令牌.
//!
//! 外层调度器拥有执行流的生命周期, 并在每次调用时显式传入.
//! 本 crate 不保存任何全局 "当前流".

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use std::sync::Arc;
        use rayon::ThreadPool;
    }
}

/// 调用方持有的执行流. 后端把工作提交到该流上.
///
/// 对 CPU 后端而言, 提交即执行: 若流绑定了线程池, 工作在该线程池内完成,
/// 否则在调用线程上完成. [`ExecStream::synchronize`] 因此总是立即返回.
#[derive(Clone, Debug, Default)]
pub struct ExecStream {
    id: usize,

    #[cfg(feature = "rayon")]
    pool: Option<Arc<ThreadPool>>,
}

impl ExecStream {
    /// 创建一个编号为 `id` 的执行流.
    #[inline]
    pub fn new(id: usize) -> Self {
        Self {
            id,
            #[cfg(feature = "rayon")]
            pool: None,
        }
    }

    /// 创建一个绑定到线程池 `pool` 的执行流.
    #[cfg(feature = "rayon")]
    #[inline]
    pub fn with_pool(id: usize, pool: Arc<ThreadPool>) -> Self {
        Self {
            id,
            pool: Some(pool),
        }
    }

    /// 流编号.
    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    /// 在该流上执行 `op`.
    pub fn run<R, F>(&self, op: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        #[cfg(feature = "rayon")]
        if let Some(pool) = self.pool.as_ref() {
            return pool.install(op);
        }
        op()
    }

    /// 等待该流上已提交的工作全部完成.
    #[inline]
    pub fn synchronize(&self) {
        log::trace!("stream {} synchronized", self.id);
    }
}
