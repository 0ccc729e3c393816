//! Cooperative coroutines that turn straight-line task code into a lazy
//! stream of progress [`Step`]s.
//!
//! Task bodies are ordinary `async` code receiving a [`Co`] handle. Each
//! call to [`Co::notify`], [`Co::progress`], or [`Co::info`] suspends the
//! body and hands the step to whoever drives the [`Coroutine`]. The body
//! resumes when the driver pulls the next step.
//!
//! # Overview
//!
//! - Nothing runs until the first pull; wrapping a body only stores it.
//! - Exactly one step is in flight at a time, and steps arrive in execution order.
//! - Nested bodies share the outer [`Co`] (see [`Co::delegate`]) or are
//!   re-emitted step by step (see [`Co::forward`]), so the driver always
//!   sees one flat stream.
//! - An error ends the stream: it is returned by the pull that observes it
//!   and every later pull returns `None`.
//! - Dropping a coroutine before it finishes cancels it; code after the
//!   last reached suspension point never runs.
//!
//! The scheduler runs on the caller's task. Suspension never registers a
//! waker, so it never spawns or parks a thread; only real IO inside a body
//! reports `Pending` to the surrounding executor.
//!
//! # Example
//!
//! ```no_run
//! use kodegen_bundler_compile::bundler::coroutine::{Coroutine, Phase, Step, TaskKind};
//!
//! # async fn example() -> kodegen_bundler_compile::bundler::Result<()> {
//! let mut coroutine = Coroutine::<u32>::new(|co| async move {
//!     co.notify(Step::new(TaskKind::Prepare, Phase::Ready, "starting")).await;
//!     Ok(42)
//! });
//!
//! while let Some(step) = coroutine.next().await {
//!     println!("{}", step?);
//! }
//! assert_eq!(coroutine.take_output(), Some(42));
//! # Ok(())
//! # }
//! ```

mod step;

pub use step::{Level, Phase, Step, TaskKind};

use crate::bundler::error::{Error, Result};
use futures_lite::Stream;
use std::{
    cell::Cell,
    fmt,
    future::{Future, poll_fn},
    pin::Pin,
    rc::Rc,
    task::{Context, Poll},
};

type Body<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a>>;
type Start<'a, T, R> = Box<dyn FnOnce(Co<R>) -> Body<'a, T> + 'a>;

/// Hand-off slot between a body and its driver.
struct Slot<R> {
    step: Cell<Option<Step>>,
    resume: Cell<Option<R>>,
}

/// Handle a coroutine body uses to report progress.
///
/// `R` is the type of value the driver may send back at each suspension
/// point with [`Coroutine::resume`]. Most tasks use `()` and ignore it.
pub struct Co<R = ()> {
    slot: Rc<Slot<R>>,
}

impl<R> Clone for Co<R> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<R> fmt::Debug for Co<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Co").finish_non_exhaustive()
    }
}

impl<R> Co<R> {
    /// Reports a state transition and suspends.
    pub async fn notify(&self, step: Step) -> Option<R> {
        self.emit(step.with_level(Level::Notify)).await
    }

    /// Reports in-flight work and suspends.
    pub async fn progress(&self, step: Step) -> Option<R> {
        self.emit(step.with_level(Level::Progress)).await
    }

    /// Reports supplementary detail and suspends.
    pub async fn info(&self, step: Step) -> Option<R> {
        self.emit(step.with_level(Level::Info)).await
    }

    /// Emits a step with its level unchanged and suspends until the
    /// driver pulls again. Returns the value the driver sent back, if any.
    pub async fn emit(&self, step: Step) -> Option<R> {
        self.slot.resume.set(None);
        self.slot.step.set(Some(step));
        Suspend { suspended: false }.await;
        self.slot.resume.take()
    }

    /// Runs a nested body on this handle, so its steps go straight to the
    /// outer driver.
    pub async fn delegate<T, F, Fut>(&self, body: F) -> Result<T>
    where
        F: FnOnce(Co<R>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        body(self.clone()).await
    }

    /// Drains an independently created coroutine, re-emitting each of its
    /// steps unchanged and passing resume values back into it.
    pub async fn forward<'b, T>(&self, mut inner: Coroutine<'b, T, R>) -> Result<T>
    where
        T: 'b,
        R: 'b,
    {
        let mut reply = None;
        loop {
            if let Some(value) = reply.take() {
                inner.slot.resume.set(Some(value));
            }
            match inner.next().await {
                Some(Ok(step)) => reply = self.emit(step).await,
                Some(Err(e)) => return Err(e),
                None => {
                    return inner.take_output().ok_or_else(|| {
                        Error::GenericError("nested coroutine finished without a result".into())
                    });
                }
            }
        }
    }
}

/// Future that is pending exactly once without registering a waker.
struct Suspend {
    suspended: bool,
}

impl Future for Suspend {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if self.suspended {
            Poll::Ready(())
        } else {
            self.suspended = true;
            Poll::Pending
        }
    }
}

enum State<'a, T, R> {
    Created(Start<'a, T, R>),
    Running(Body<'a, T>),
    Returned(Option<T>),
    Failed,
}

/// Lazy, single-pass sequence of [`Step`]s with a final return value.
///
/// Pulling requires `&mut self`, so one coroutine is only ever driven from
/// one place at a time.
pub struct Coroutine<'a, T, R = ()> {
    slot: Rc<Slot<R>>,
    state: State<'a, T, R>,
}

// The body is boxed and pinned on the heap; nothing else is structurally pinned.
impl<T, R> Unpin for Coroutine<'_, T, R> {}

impl<'a, T: 'a, R: 'a> Coroutine<'a, T, R> {
    /// Wraps a body. The body does not start until the first pull.
    pub fn new<F, Fut>(body: F) -> Self
    where
        F: FnOnce(Co<R>) -> Fut + 'a,
        Fut: Future<Output = Result<T>> + 'a,
    {
        Self {
            slot: Rc::new(Slot {
                step: Cell::new(None),
                resume: Cell::new(None),
            }),
            state: State::Created(Box::new(move |co| -> Body<'a, T> { Box::pin(body(co)) })),
        }
    }

    /// Returns true once the body has returned or failed.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Returned(_) | State::Failed)
    }

    /// Runs the body up to its next suspension point.
    ///
    /// - `Some(Ok(step))`: the body suspended with `step`
    /// - `Some(Err(e))`: the body failed; the stream is over
    /// - `None`: the body returned; see [`Coroutine::take_output`]
    pub async fn next(&mut self) -> Option<Result<Step>> {
        poll_fn(|cx| self.poll_step(cx)).await
    }

    /// Sends `value` to the suspended body and pulls the next step.
    ///
    /// The value is what the pending `notify`/`progress`/`info` call returns.
    pub async fn resume(&mut self, value: R) -> Option<Result<Step>> {
        self.slot.resume.set(Some(value));
        self.next().await
    }

    /// Polls for the next step.
    pub fn poll_step(&mut self, cx: &mut Context<'_>) -> Poll<Option<Result<Step>>> {
        loop {
            match std::mem::replace(&mut self.state, State::Failed) {
                State::Created(start) => {
                    let co = Co {
                        slot: Rc::clone(&self.slot),
                    };
                    self.state = State::Running(start(co));
                }
                State::Running(mut body) => {
                    return match body.as_mut().poll(cx) {
                        Poll::Ready(Ok(value)) => {
                            self.state = State::Returned(Some(value));
                            Poll::Ready(None)
                        }
                        Poll::Ready(Err(e)) => Poll::Ready(Some(Err(e))),
                        Poll::Pending => {
                            self.state = State::Running(body);
                            match self.slot.step.take() {
                                Some(step) => Poll::Ready(Some(Ok(step))),
                                None => Poll::Pending,
                            }
                        }
                    };
                }
                finished => {
                    self.state = finished;
                    return Poll::Ready(None);
                }
            }
        }
    }

    /// Takes the return value once the body has returned.
    pub fn take_output(&mut self) -> Option<T> {
        match &mut self.state {
            State::Returned(value) => value.take(),
            _ => None,
        }
    }

    /// Drives the coroutine to the end, handing every step to `on_step`.
    pub async fn complete(mut self, mut on_step: impl FnMut(Step)) -> Result<T> {
        while let Some(step) = self.next().await {
            on_step(step?);
        }
        self.take_output()
            .ok_or_else(|| Error::GenericError("coroutine result was already taken".into()))
    }

    /// Drives the coroutine to the end and collects its steps.
    pub async fn collect(self) -> Result<(Vec<Step>, T)> {
        let mut steps = Vec::new();
        let output = self.complete(|step| steps.push(step)).await?;
        Ok((steps, output))
    }
}

impl<T, R> fmt::Debug for Coroutine<'_, T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            State::Created(_) => "created",
            State::Running(_) => "running",
            State::Returned(_) => "returned",
            State::Failed => "failed",
        };
        f.debug_struct("Coroutine").field("state", &state).finish()
    }
}

impl<'a, T: 'a, R: 'a> Stream for Coroutine<'a, T, R> {
    type Item = Result<Step>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().poll_step(cx)
    }
}
