//! # lossy-chan
//!
//! Lightweight blocking MPMC channel for Rust, with drop-oldest overflow and a
//! graceful seal/drain shutdown.
//!
//! 轻量级的 Rust 阻塞式 MPMC 通道，支持旧者先淘汰的溢出策略和优雅的封口/排空关闭。
//!
//! ## Overview / 概述
//!
//! `lossy-chan` provides a bounded, thread-safe message channel that favors
//! freshness over losslessness: when the buffer is full, sending evicts the
//! oldest pending messages instead of blocking or failing. This suits
//! pipelines (frame streams, telemetry sampling) where a slow consumer should
//! see the most recent data rather than stall its producers.
//!
//! `lossy-chan` 提供一个有界的线程安全消息通道，偏向数据的新鲜度而非无损传输：
//! 缓冲区满时，发送操作会淘汰最旧的待处理消息，而不是阻塞或失败。
//! 适合消费者过慢时应看到最新数据（如帧流、遥测采样）而不是让生产者停滞的流水线。
//!
//! ## Key Features / 主要特性
//!
//! - **Drop-oldest overflow**: bounded sends never block by default; the newest
//!   message always survives
//! - **Two-stage shutdown**: `close` discards everything at once, `seal` lets
//!   consumers drain buffered messages before the channel closes itself
//! - **MPMC sharing**: every operation takes `&self`; one channel serves any
//!   number of producer and consumer threads
//! - **No unsafe code**: one mutex, one condvar, and a FIFO buffer
//!
//! - **旧者先淘汰的溢出策略**：有界发送默认永不阻塞；最新消息总能幸存
//! - **两阶段关闭**：`close` 立即丢弃一切，`seal` 允许消费者先排空缓冲的
//!   消息，之后通道自行关闭
//! - **MPMC 共享**：所有操作都通过 `&self` 调用；一个通道可服务任意数量的
//!   生产者和消费者线程
//! - **无 unsafe 代码**：一个互斥锁、一个条件变量和一个 FIFO 缓冲区
//!
//! ## Modules / 模块
//!
//! ### [`mpmc`]
//!
//! The channel itself: [`mpmc::Channel`], its blocking (`send`/`recv`) and
//! non-blocking (`try_send`/`try_recv`) operations, the lifecycle signals
//! (`seal`/`close`), and the [`mpmc::Drain`] iterator.
//!
//! 通道本体：[`mpmc::Channel`]、其阻塞（`send`/`recv`）与非阻塞
//! （`try_send`/`try_recv`）操作、生命周期信号（`seal`/`close`），
//! 以及 [`mpmc::Drain`] 迭代器。
//!
//! ## Examples / 示例
//!
//! ### Graceful shutdown without losing buffered work
//!
//! ```
//! use lossy_chan::mpmc::Channel;
//! use std::sync::Arc;
//! use std::thread;
//!
//! # #[cfg(not(feature = "loom"))]
//! # {
//! let channel = Arc::new(Channel::new(16));
//!
//! let producer = channel.clone();
//! let handle = thread::spawn(move || {
//!     for i in 0..10 {
//!         producer.try_send(i).unwrap();
//!     }
//!     // No more data: reject further sends, keep buffered messages consumable.
//!     producer.seal();
//! });
//!
//! let mut received = Vec::new();
//! while let Some(value) = channel.recv() {
//!     received.push(value);
//! }
//!
//! assert_eq!(received, (0..10).collect::<Vec<_>>());
//! assert!(channel.is_closed());
//! handle.join().unwrap();
//! # }
//! ```
//!
//! ### Lossy telemetry with loss accounting
//!
//! ```
//! use lossy_chan::mpmc::Channel;
//!
//! # #[cfg(not(feature = "loom"))]
//! # {
//! let channel = Channel::new(2);
//! let mut lost = 0;
//!
//! for sample in 0..5 {
//!     channel.try_send(sample).unwrap();
//!     lost += channel.dropped_count();
//! }
//!
//! // Only the two freshest samples remain.
//! assert_eq!(lost, 3);
//! assert_eq!(channel.drain().collect::<Vec<_>>(), vec![3, 4]);
//! # }
//! ```
//!
//! ## Testing / 测试
//!
//! Concurrency permutations are checked with `loom` behind the `loom` cargo
//! feature; the [`shim`] module switches the lock and condvar between `std`
//! and `loom` implementations.
//!
//! 并发排列通过 `loom` cargo feature 下的 `loom` 进行检查；[`shim`] 模块
//! 在 `std` 与 `loom` 实现之间切换互斥锁和条件变量。

pub mod mpmc;
pub mod shim;
