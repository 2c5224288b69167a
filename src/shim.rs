//! Shim module to abstract over std and loom primitives.
//!
//! This module provides a unified interface for synchronization primitives that transparently
//! switches between the `std` implementation (for production) and the `loom` implementation
//! (for permutation testing).
//!
//! 用于抽象 std 和 loom 原语的 shim 模块。
//!
//! 该模块为同步原语提供统一接口，在 `std` 实现（用于生产）和 `loom` 实现
//! （用于排列测试）之间透明切换。

#[cfg(not(feature = "loom"))]
pub mod sync {
    pub use std::sync::{Condvar, Mutex, MutexGuard};
}

#[cfg(feature = "loom")]
pub mod sync {
    pub use loom::sync::{Condvar, Mutex, MutexGuard};
}
