//! Blocking bounded MPMC channel with drop-oldest overflow and a two-stage shutdown
//!
//! Built on a single `Mutex`-guarded FIFO buffer and one `Condvar`. Any number of
//! producer and consumer threads may share one [`Channel`]. When the buffer is at
//! capacity, [`Channel::try_send`] evicts the oldest pending messages instead of
//! blocking or rejecting, so a slow consumer only ever costs stale data.
//!
//! 基于单个 `Mutex` 保护的 FIFO 缓冲区和一个 `Condvar` 构建的阻塞式有界 MPMC 通道。
//! 任意数量的生产者和消费者线程可以共享同一个 [`Channel`]。当缓冲区达到容量上限时，
//! [`Channel::try_send`] 会淘汰最旧的待处理消息，而不是阻塞或拒绝，
//! 因此消费者过慢只会损失过期数据。
//!
//! # Shutdown / 关闭
//!
//! Two independent signals end a channel's life:
//!
//! - [`Channel::close`] is abrupt: every later operation fails and buffered
//!   messages are abandoned.
//! - [`Channel::seal`] is graceful: new sends are rejected, but consumers keep
//!   draining buffered messages; once the buffer runs dry the channel closes
//!   itself exactly once.
//!
//! 两个相互独立的信号可以结束通道的生命周期：
//!
//! - [`Channel::close`] 是立即关闭：之后的所有操作都会失败，缓冲的消息被丢弃。
//! - [`Channel::seal`] 是优雅关闭：新的发送被拒绝，但消费者可以继续取走已缓冲的
//!   消息；缓冲区排空后通道会恰好一次地自行关闭。
//!
//! Both flags are monotonic: a channel never un-seals and never re-opens.
//!
//! 两个标志都是单调的：通道不会取消封口，也不会重新打开。
//!
//! # Examples
//!
//! ```
//! use lossy_chan::mpmc::Channel;
//! use std::sync::Arc;
//! use std::thread;
//!
//! # #[cfg(not(feature = "loom"))]
//! # {
//! let channel = Arc::new(Channel::new(8));
//! let producer = channel.clone();
//!
//! let handle = thread::spawn(move || {
//!     for i in 0..4 {
//!         producer.try_send(i).unwrap();
//!     }
//!     producer.seal();
//! });
//!
//! let mut sum = 0;
//! while let Some(value) = channel.recv() {
//!     sum += value;
//! }
//! assert_eq!(sum, 6); // 0+1+2+3
//! handle.join().unwrap();
//! # }
//! ```

use crate::shim::sync::{Condvar, Mutex, MutexGuard};
use std::collections::VecDeque;
use std::fmt;
use std::sync::PoisonError;

/// Buffer bound used by [`Channel::default`].
///
/// [`Channel::default`] 使用的缓冲区上限。
pub const DEFAULT_CAPACITY: usize = 1;

// ============================================================================
// Error Types
// ============================================================================

/// Error returned when sending into a channel that no longer accepts messages,
/// giving the rejected message back to the caller.
///
/// A send fails for exactly one reason: the channel has been sealed or closed.
/// Callers that need to tell the two apart query [`Channel::is_closed`] and
/// [`Channel::is_sealed`].
///
/// 当通道不再接受消息时发送操作返回的错误，将被拒绝的消息归还给调用者。
///
/// 发送失败的原因只有一种：通道已被封口或关闭。需要区分两者的调用者
/// 应查询 [`Channel::is_closed`] 和 [`Channel::is_sealed`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendError<T>(pub T);

impl<T> SendError<T> {
    /// Consume the error and recover the rejected message
    ///
    /// 消耗错误并取回被拒绝的消息
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Display for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel sealed or closed")
    }
}

impl<T: fmt::Debug> std::error::Error for SendError<T> {}

/// Error returned from [`Channel::try_recv`] when no message could be taken
///
/// [`Channel::try_recv`] 无法取出消息时返回的错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryRecvError {
    /// The channel is open but currently holds no messages
    ///
    /// 通道处于打开状态，但当前没有消息
    Empty,

    /// The channel is closed, or sealed with an empty buffer
    ///
    /// 通道已关闭，或已封口且缓冲区为空
    Closed,
}

impl fmt::Display for TryRecvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TryRecvError::Empty => write!(f, "channel empty"),
            TryRecvError::Closed => write!(f, "channel closed"),
        }
    }
}

impl std::error::Error for TryRecvError {}

// ============================================================================
// Channel
// ============================================================================

/// State guarded by the channel lock.
///
/// Every field is read and written only while the lock is held.
///
/// 由通道锁保护的状态。
///
/// 所有字段都只在持有锁时读写。
struct State<T> {
    /// FIFO buffer: insertion order is delivery order
    ///
    /// FIFO 缓冲区：插入顺序即投递顺序
    buffer: VecDeque<T>,

    /// Terminal flag: no operation succeeds once set
    ///
    /// 终止标志：一旦置位，任何操作都不再成功
    closed: bool,

    /// No-more-producers flag: sends fail, buffered messages remain consumable
    ///
    /// 不再有生产者的标志：发送失败，已缓冲的消息仍可消费
    sealed: bool,

    /// Number of messages evicted by the most recent overflowing send
    ///
    /// 最近一次溢出发送所淘汰的消息数量
    last_dropped: usize,
}

/// Blocking bounded MPMC channel
///
/// All operations take `&self`; share the channel between threads with
/// [`std::sync::Arc`] or plain references. A capacity of `0` means unbounded:
/// the channel is never full, never evicts, and a blocking send never waits.
///
/// 阻塞式有界 MPMC 通道
///
/// 所有操作都通过 `&self` 调用；使用 [`std::sync::Arc`] 或普通引用在线程间
/// 共享通道。容量为 `0` 表示无界：通道永远不满、永远不淘汰消息，
/// 阻塞发送也永远不会等待。
pub struct Channel<T> {
    /// Buffer bound; immutable after construction, so it lives outside the lock
    ///
    /// 缓冲区上限；构造后不可变，因此放在锁外
    capacity: usize,

    state: Mutex<State<T>>,

    /// Waiting producers and consumers all block on this one signal
    ///
    /// 所有等待中的生产者和消费者都阻塞在这一个信号上
    cond: Condvar,
}

impl<T> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Channel")
            .field("closed", &state.closed)
            .field("sealed", &state.sealed)
            .field("len", &state.buffer.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<T> Channel<T> {
    /// Create a channel holding at most `capacity` messages
    ///
    /// A `capacity` of `0` creates an unbounded channel.
    ///
    /// 创建最多容纳 `capacity` 条消息的通道
    ///
    /// `capacity` 为 `0` 时创建无界通道。
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(State {
                buffer: VecDeque::new(),
                closed: false,
                sealed: false,
                last_dropped: 0,
            }),
            cond: Condvar::new(),
        }
    }

    /// Send a message without blocking, evicting the oldest buffered messages
    /// if the buffer would exceed capacity
    ///
    /// The new message is appended at the tail first and always survives the
    /// eviction; the count of evicted messages is readable through
    /// [`Channel::dropped_count`] until the next send overwrites it. On a
    /// bounded channel this operation cannot fail with "full"; it only fails
    /// once the channel is sealed or closed, handing the message back.
    ///
    /// 非阻塞地发送消息；若缓冲区将超出容量，则淘汰最旧的已缓冲消息
    ///
    /// 新消息先追加到队尾，且总能在淘汰中幸存；被淘汰的消息数量可通过
    /// [`Channel::dropped_count`] 读取，直到下一次发送将其覆盖。在有界通道上
    /// 此操作不会因"满"而失败，只有当通道已封口或关闭时才失败，并归还消息。
    pub fn try_send(&self, message: T) -> Result<(), SendError<T>> {
        let mut state = self.lock();
        if state.closed || state.sealed {
            return Err(SendError(message));
        }

        state.buffer.push_back(message);

        // Drop-oldest overflow: trim from the head until the bound holds again.
        // 旧者先淘汰的溢出策略：从队头裁剪，直到重新满足上限。
        let mut dropped = 0;
        if self.capacity > 0 {
            while state.buffer.len() > self.capacity {
                state.buffer.pop_front();
                dropped += 1;
            }
        }
        state.last_dropped = dropped;

        drop(state);
        self.cond.notify_one();
        Ok(())
    }

    /// Send a message, waiting while the buffer is at capacity
    ///
    /// The wait ends when a consumer frees a slot or the channel is sealed or
    /// closed; there is no timeout. An unbounded channel never waits. Because
    /// the slot is claimed under the same lock acquisition that observed it,
    /// this variant never evicts anything.
    ///
    /// # Errors
    /// Returns [`SendError`] with the message if the channel is sealed or
    /// closed, either on entry or while waiting.
    ///
    /// 发送消息，在缓冲区满时等待
    ///
    /// 等待在消费者腾出空位、或通道被封口或关闭时结束；没有超时。无界通道
    /// 永远不等待。由于空位是在观察到它的同一次持锁期间占用的，此变体永远
    /// 不会淘汰任何消息。
    ///
    /// # 错误
    /// 若通道在进入时或等待期间被封口或关闭，返回携带原消息的 [`SendError`]。
    pub fn send(&self, message: T) -> Result<(), SendError<T>> {
        let mut state = self.lock();
        if self.capacity > 0 {
            while !state.closed && !state.sealed && state.buffer.len() >= self.capacity {
                state = self.wait(state);
            }
        }
        if state.closed || state.sealed {
            return Err(SendError(message));
        }

        state.buffer.push_back(message);
        state.last_dropped = 0;

        drop(state);
        self.cond.notify_one();
        Ok(())
    }

    /// Receive the oldest message without blocking
    ///
    /// # Errors
    /// - [`TryRecvError::Empty`] if the channel is open but holds no messages
    /// - [`TryRecvError::Closed`] if the channel is closed, or was sealed and
    ///   has just drained its final message
    ///
    /// 非阻塞地接收最旧的消息
    ///
    /// # 错误
    /// - 通道打开但没有消息时返回 [`TryRecvError::Empty`]
    /// - 通道已关闭、或已封口且刚刚排空最后一条消息时返回 [`TryRecvError::Closed`]
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        let state = self.lock();
        self.take(state)
    }

    /// Receive the oldest message, waiting while the channel is open, unsealed
    /// and empty
    ///
    /// Returns `None`, the end-of-stream signal, once the channel is closed
    /// or sealed with nothing left to drain. There is no timeout; the wait is
    /// released only by a send, a seal, or a close.
    ///
    /// 接收最旧的消息，在通道处于打开、未封口且为空的状态时等待
    ///
    /// 当通道已关闭、或已封口且没有剩余消息可取时返回 `None`，即流结束信号。
    /// 没有超时；等待只会被发送、封口或关闭唤醒。
    pub fn recv(&self) -> Option<T> {
        let mut state = self.lock();
        while !state.closed && !state.sealed && state.buffer.is_empty() {
            state = self.wait(state);
        }
        // The loop exits with the lock still held, so the buffer cannot be
        // emptied by another consumer between the check and the take.
        // 循环退出时仍然持有锁，因此在检查与取出之间缓冲区不会被其他消费者清空。
        self.take(state).ok()
    }

    /// Shut the channel down immediately
    ///
    /// Idempotent and irreversible. Buffered messages are abandoned, every
    /// waiting thread is woken, and all future operations fail.
    ///
    /// 立即关闭通道
    ///
    /// 幂等且不可逆。已缓冲的消息被丢弃，所有等待中的线程被唤醒，
    /// 之后的所有操作都会失败。
    pub fn close(&self) {
        let mut state = self.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        drop(state);
        self.cond.notify_all();
    }

    /// Announce that no more messages will be sent
    ///
    /// Idempotent; a no-op on a channel that is already sealed or closed.
    /// Later sends fail, but consumers keep draining buffered messages; once
    /// the buffer is empty the channel closes itself.
    ///
    /// 宣告不会再发送新消息
    ///
    /// 幂等；对已封口或已关闭的通道不产生任何效果。之后的发送会失败，
    /// 但消费者可以继续取走已缓冲的消息；缓冲区排空后通道会自行关闭。
    pub fn seal(&self) {
        let mut state = self.lock();
        if state.closed || state.sealed {
            return;
        }
        state.sealed = true;
        drop(state);
        self.cond.notify_all();
    }

    /// Check whether the channel has been closed
    ///
    /// 检查通道是否已关闭
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Check whether the channel has been sealed
    ///
    /// 检查通道是否已封口
    #[inline]
    pub fn is_sealed(&self) -> bool {
        self.lock().sealed
    }

    /// Check whether the buffer currently holds no messages
    ///
    /// 检查缓冲区当前是否没有消息
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lock().buffer.is_empty()
    }

    /// Check whether the buffer is at capacity
    ///
    /// An unbounded channel is never full.
    ///
    /// 检查缓冲区是否已达容量上限
    ///
    /// 无界通道永远不满。
    #[inline]
    pub fn is_full(&self) -> bool {
        if self.capacity == 0 {
            return false;
        }
        self.lock().buffer.len() >= self.capacity
    }

    /// Get the number of messages currently buffered
    ///
    /// 获取当前缓冲的消息数量
    #[inline]
    pub fn len(&self) -> usize {
        self.lock().buffer.len()
    }

    /// Get the buffer bound this channel was created with (`0` = unbounded)
    ///
    /// 获取通道创建时设定的缓冲区上限（`0` 表示无界）
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the number of messages evicted by the most recent send
    ///
    /// `0` unless the most recent send overflowed the buffer. Every send
    /// overwrites this counter, so callers tracking total loss must read it
    /// after each send.
    ///
    /// 获取最近一次发送所淘汰的消息数量
    ///
    /// 除非最近一次发送导致缓冲区溢出，否则为 `0`。每次发送都会覆盖该计数器，
    /// 因此统计总损失的调用者必须在每次发送后读取它。
    #[inline]
    pub fn dropped_count(&self) -> usize {
        self.lock().last_dropped
    }

    /// Create a non-blocking draining iterator
    ///
    /// Yields messages until a [`Channel::try_recv`] fails, which includes the
    /// seal-drain transition: draining a sealed channel to the end closes it.
    ///
    /// 创建非阻塞的排空迭代器
    ///
    /// 持续产出消息直到一次 [`Channel::try_recv`] 失败，这包含封口排空转换：
    /// 将已封口的通道排空到底会将其关闭。
    #[inline]
    pub fn drain(&self) -> Drain<'_, T> {
        Drain { channel: self }
    }

    /// Pop the head message under an already-held lock, handling the terminal
    /// states. Consumes the guard so every wake-up happens with the lock
    /// released, and so no other thread can slip in between the caller's last
    /// check and the pop.
    ///
    /// 在已持有锁的情况下弹出队头消息，并处理各终止状态。消耗锁守卫，
    /// 使所有唤醒都在释放锁之后发生，也使其他线程无法插入调用者的
    /// 最后一次检查与弹出之间。
    fn take(&self, mut state: MutexGuard<'_, State<T>>) -> Result<T, TryRecvError> {
        if state.closed {
            return Err(TryRecvError::Closed);
        }

        if state.sealed && state.buffer.is_empty() {
            // Seal-drain-to-close: exactly one receiver performs this
            // transition, because `closed` is checked and set under the lock.
            // 封口排空后关闭：该转换恰好由一个接收者执行，
            // 因为 `closed` 的检查与置位都在锁内完成。
            state.closed = true;
            drop(state);
            self.cond.notify_all();
            return Err(TryRecvError::Closed);
        }

        let Some(message) = state.buffer.pop_front() else {
            return Err(TryRecvError::Empty);
        };

        let now_empty = state.buffer.is_empty();
        drop(state);
        if now_empty {
            // An empty buffer can satisfy many different waiters at once
            // (parked producers, seal-drain detection), so broadcast.
            // 缓冲区变空可能同时满足多种等待条件（被阻塞的生产者、
            // 封口排空检测），因此广播唤醒。
            self.cond.notify_all();
        } else {
            self.cond.notify_one();
        }
        Ok(message)
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, State<T>>) -> MutexGuard<'a, State<T>> {
        self.cond.wait(guard).unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Drop for Channel<T> {
    fn drop(&mut self) {
        // Destruction implies close, so a thread still parked in send/recv
        // through a raw pointer misuse is released rather than leaked.
        // 析构即关闭，这样即使有线程通过裸指针误用仍停留在 send/recv 中，
        // 也会被释放而不是泄漏。
        self.close();
    }
}

// ============================================================================
// Drain
// ============================================================================

/// Draining iterator for the channel
///
/// 通道的排空迭代器
///
/// Removes and returns messages until the channel is empty, closed, or a
/// concurrent consumer takes the rest.
///
/// 移除并返回消息，直到通道为空、已关闭、或剩余消息被并发的消费者取走。
pub struct Drain<'a, T> {
    channel: &'a Channel<T>,
}

impl<'a, T> fmt::Debug for Drain<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Drain")
            .field("len", &self.channel.len())
            .field("is_empty", &self.channel.is_empty())
            .finish()
    }
}

impl<'a, T> Iterator for Drain<'a, T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.channel.try_recv().ok()
    }
}
