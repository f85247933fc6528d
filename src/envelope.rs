//! # Request Envelopes
//!
//! An [`Envelope`] is the unit of work passed between a caller and the worker. It carries
//! the caller's operation on the way in and the operation's result on the way back.
//! The worker answers with a [`Completion`], which is either the same envelope or the
//! termination sentinel.

use std::any::Any;
use std::fmt;

pub(crate) type Payload = Box<dyn Any + Send>;

type Operation<R> = Box<dyn FnOnce(&mut R) -> Payload + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Produces a value.
    Query,
    /// Produces nothing.
    Command,
}

/// A uniquely identified request against a resource of type `R`.
pub struct Envelope<R> {
    id: u64,
    kind: RequestKind,
    operation: Option<Operation<R>>,
    result: Option<Payload>,
}

impl<R> Envelope<R> {
    pub(crate) fn query<T, Q>(id: u64, query: Q) -> Self
    where
        Q: FnOnce(&mut R) -> T + Send + 'static,
        T: Send + 'static,
    {
        Self {
            id,
            kind: RequestKind::Query,
            operation: Some(Box::new(move |resource| Box::new(query(resource)) as Payload)),
            result: None,
        }
    }

    pub(crate) fn command<C>(id: u64, command: C) -> Self
    where
        C: FnOnce(&mut R) + Send + 'static,
    {
        Self {
            id,
            kind: RequestKind::Command,
            operation: Some(Box::new(move |resource| {
                command(resource);
                Box::new(()) as Payload
            })),
            result: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Whether the operation has run and attached its result.
    pub fn is_executed(&self) -> bool {
        self.result.is_some()
    }

    /// Runs the operation against `resource` and attaches the result.
    ///
    /// The operation runs at most once; later calls do nothing.
    pub(crate) fn execute(&mut self, resource: &mut R) {
        if let Some(operation) = self.operation.take() {
            self.result = Some(operation(resource));
        }
    }

    /// Takes the attached result, if it is a `T`.
    pub(crate) fn into_result<T: 'static>(self) -> Option<T> {
        self.result
            .and_then(|payload| payload.downcast::<T>().ok())
            .map(|value| *value)
    }
}

impl<R> fmt::Debug for Envelope<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("executed", &self.is_executed())
            .finish()
    }
}

/// What a caller can receive on the completion channel.
pub enum Completion<R> {
    /// The caller's envelope, with its result attached.
    Done(Envelope<R>),
    /// The worker is terminating; stop waiting.
    Terminated,
}

impl<R> fmt::Debug for Completion<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Completion::Done(envelope) => f.debug_tuple("Done").field(envelope).finish(),
            Completion::Terminated => f.write_str("Terminated"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_result_is_attached_on_execute() {
        let mut envelope = Envelope::<Vec<u32>>::query(3, |v| v.iter().sum::<u32>());
        assert_eq!(envelope.kind(), RequestKind::Query);
        assert!(!envelope.is_executed());

        let mut resource = vec![1, 2, 3];
        envelope.execute(&mut resource);
        assert!(envelope.is_executed());
        assert_eq!(envelope.id(), 3);
        assert_eq!(envelope.into_result::<u32>(), Some(6));
    }

    #[test]
    fn test_command_runs_once() {
        let mut envelope = Envelope::<Vec<u32>>::command(0, |v| v.push(9));
        let mut resource = Vec::new();
        envelope.execute(&mut resource);
        envelope.execute(&mut resource);
        assert_eq!(resource, vec![9]);
        assert_eq!(envelope.kind(), RequestKind::Command);
        assert_eq!(envelope.into_result::<()>(), Some(()));
    }

    #[test]
    fn test_unexecuted_or_mistyped_result_is_none() {
        let envelope = Envelope::<u8>::query(1, |r| *r);
        assert_eq!(envelope.into_result::<u8>(), None);

        let mut envelope = Envelope::<u8>::query(2, |r| *r);
        envelope.execute(&mut 5);
        assert_eq!(envelope.into_result::<String>(), None);
    }
}
