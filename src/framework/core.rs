//! # Core Actor Framework
//!
//! This module defines the generic building blocks used by the session-scoped
//! stores in this crate.
//!
//! ## Key Types
//!
//! - [`SessionEntity`]: The trait that every session state type implements.
//! - [`SessionActor`]: The generic actor that owns one state value and processes commands.
//! - [`SessionClient`]: The generic client for sending commands and observing state.
//! - [`StatePublisher`]: Handle given to handlers so they can publish intermediate states.
//! - [`FrameworkError`]: Transport errors (actor closed, response dropped).

use async_trait::async_trait;
use std::fmt::Debug;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

// =============================================================================
// 1. THE ABSTRACTION
// =============================================================================

/// Trait that a session state type implements to be driven by a [`SessionActor`].
///
/// # Architecture Note
/// The cart store and the checkout orchestrator both follow the same shape: one
/// state value owned by the calling view, a closed set of commands, and a group of
/// injected collaborators. Writing the message loop once against this trait keeps
/// the two stores focused on their own semantics.
///
/// # Async & Context
/// Collaborators are not stored in the state. They live in `Context`, which is
/// injected into [`SessionActor::run`] ("late binding"), so the state stays a plain
/// `Clone` value that can be published to subscribers wholesale.
#[async_trait]
pub trait SessionEntity: Clone + Debug + Send + Sync + 'static {
    /// Commands accepted by the entity.
    type Command: Send + Debug;

    /// Value returned to the caller when a command succeeds.
    type Outcome: Send + Debug;

    /// Per-entity error type. Transport failures are folded into it.
    type Error: std::error::Error + From<FrameworkError> + Send + Sync + 'static;

    /// The runtime context (collaborators) injected into the actor.
    type Context: Send + Sync;

    /// Called once before the first command is processed.
    async fn on_mount(&mut self, _ctx: &Self::Context, _publisher: &StatePublisher<Self>) {}

    /// Handle one command. Runs to completion before the next command is received.
    async fn handle(
        &mut self,
        command: Self::Command,
        ctx: &Self::Context,
        publisher: &StatePublisher<Self>,
    ) -> Result<Self::Outcome, Self::Error>;
}

// =============================================================================
// 2. THE GENERIC MESSAGES & ERRORS
// =============================================================================

/// Errors that can occur within the actor framework itself.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum FrameworkError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped response channel")]
    ActorDropped,
}

/// Type alias for the one-shot response channel used by actors.
pub type Response<T> = oneshot::Sender<Result<<T as SessionEntity>::Outcome, <T as SessionEntity>::Error>>;

/// Message sent to the actor: one command plus the channel to answer on.
#[derive(Debug)]
pub struct SessionRequest<T: SessionEntity> {
    pub command: T::Command,
    pub respond_to: Response<T>,
}

/// Publishes snapshots of the state to every subscriber.
pub struct StatePublisher<T: SessionEntity> {
    sender: watch::Sender<T>,
}

impl<T: SessionEntity> StatePublisher<T> {
    /// Replaces the published snapshot with a copy of `state`.
    pub fn publish(&self, state: &T) {
        self.sender.send_replace(state.clone());
    }
}

// =============================================================================
// 3. THE GENERIC ACTOR SERVER
// =============================================================================

/// The generic actor that owns a single session state value.
///
/// **Concurrency Model**:
/// Commands are processed *sequentially*: a command's handler (including every
/// collaborator call it awaits) finishes before the next command is received.
/// Two mutations fired back to back therefore reach the collaborator in send order
/// and the later response is the one left on display.
pub struct SessionActor<T: SessionEntity> {
    receiver: mpsc::Receiver<SessionRequest<T>>,
    state: T,
    publisher: StatePublisher<T>,
}

impl<T: SessionEntity> SessionActor<T> {
    pub fn new(buffer_size: usize, initial: T) -> (Self, SessionClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let (state_tx, state_rx) = watch::channel(initial.clone());
        let actor = Self {
            receiver,
            state: initial,
            publisher: StatePublisher { sender: state_tx },
        };
        let client = SessionClient::new(sender, state_rx);
        (actor, client)
    }

    /// Runs the actor's event loop until every client is dropped.
    pub async fn run(mut self, context: T::Context) {
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(entity_type, "Actor started");

        self.state.on_mount(&context, &self.publisher).await;
        self.publisher.publish(&self.state);
        debug!(entity_type, "Mounted");

        while let Some(SessionRequest { command, respond_to }) = self.receiver.recv().await {
            debug!(entity_type, ?command, "Command");
            let result = self
                .state
                .handle(command, &context, &self.publisher)
                .await;
            self.publisher.publish(&self.state);
            match &result {
                Ok(_) => debug!(entity_type, "Command ok"),
                Err(e) => warn!(entity_type, error = %e, "Command failed"),
            }
            let _ = respond_to.send(result);
        }

        info!(entity_type, "Shutdown");
    }
}

// =============================================================================
// 4. THE GENERIC CLIENT
// =============================================================================

/// A type-safe client for interacting with a [`SessionActor`].
pub struct SessionClient<T: SessionEntity> {
    sender: mpsc::Sender<SessionRequest<T>>,
    state: watch::Receiver<T>,
}

impl<T: SessionEntity> Clone for SessionClient<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            state: self.state.clone(),
        }
    }
}

impl<T: SessionEntity> SessionClient<T> {
    pub fn new(sender: mpsc::Sender<SessionRequest<T>>, state: watch::Receiver<T>) -> Self {
        Self { sender, state }
    }

    pub async fn send(&self, command: T::Command) -> Result<T::Outcome, T::Error> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(SessionRequest { command, respond_to })
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    /// Latest published state.
    pub fn snapshot(&self) -> T {
        self.state.borrow().clone()
    }

    /// A receiver that is notified on every published state.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Counter {
        value: i64,
        mounted: bool,
        busy: bool,
    }

    #[derive(Debug)]
    enum CounterCommand {
        Add(i64),
        SlowAdd(i64),
    }

    #[derive(Debug, thiserror::Error)]
    enum CounterError {
        #[error("overflow")]
        Overflow,
        #[error(transparent)]
        Framework(#[from] FrameworkError),
    }

    #[async_trait]
    impl SessionEntity for Counter {
        type Command = CounterCommand;
        type Outcome = i64;
        type Error = CounterError;
        type Context = i64;

        async fn on_mount(&mut self, _ctx: &i64, _publisher: &StatePublisher<Self>) {
            self.mounted = true;
        }

        async fn handle(
            &mut self,
            command: CounterCommand,
            limit: &i64,
            publisher: &StatePublisher<Self>,
        ) -> Result<i64, CounterError> {
            let delta = match command {
                CounterCommand::Add(d) => d,
                CounterCommand::SlowAdd(d) => {
                    self.busy = true;
                    publisher.publish(self);
                    tokio::task::yield_now().await;
                    self.busy = false;
                    d
                }
            };
            if self.value + delta > *limit {
                return Err(CounterError::Overflow);
            }
            self.value += delta;
            Ok(self.value)
        }
    }

    #[tokio::test]
    async fn test_session_actor_processes_commands_in_order() {
        let (actor, client) = SessionActor::new(8, Counter::default());
        tokio::spawn(actor.run(10));

        let first = client.clone();
        let second = client.clone();
        let a = tokio::spawn(async move { first.send(CounterCommand::SlowAdd(3)).await });
        let b = tokio::spawn(async move { second.send(CounterCommand::Add(4)).await });
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let state = client.snapshot();
        assert_eq!(state.value, 7);
        assert!(state.mounted);
        assert!(!state.busy);
    }

    #[tokio::test]
    async fn test_failed_command_returns_entity_error() {
        let (actor, client) = SessionActor::new(8, Counter::default());
        tokio::spawn(actor.run(5));

        let result = client.send(CounterCommand::Add(6)).await;
        assert!(matches!(result, Err(CounterError::Overflow)));
        assert_eq!(client.snapshot().value, 0);
    }

    #[tokio::test]
    async fn test_closed_actor_maps_to_framework_error() {
        let (actor, client) = SessionActor::new(8, Counter::default());
        drop(actor);

        let result = client.send(CounterCommand::Add(1)).await;
        assert!(matches!(
            result,
            Err(CounterError::Framework(FrameworkError::ActorClosed))
        ));
    }
}
