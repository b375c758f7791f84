//! Runtime contract for generated proxies.
//!
//! A proxy method packs its arguments into an [`Invocation`] and hands it to
//! the first interceptor of the method's chain. Each interceptor decides
//! whether to call [`Invocation::proceed`], which runs the next interceptor
//! or, after the last one, the real method. Every step returns a future so
//! an interceptor may suspend; synchronous proxies drive the chain to
//! completion with [`invoke_blocking`].
//!
//! There is no ambient cancellation. A method that supports cancellation
//! takes its token as an ordinary argument, and interceptors see it there.

use futures::future::BoxFuture;
use std::any::Any;
use std::sync::Arc;
use thiserror::Error;

/// A type-erased call argument.
pub type Argument = Box<dyn Any + Send>;

/// The real method, called once the chain is exhausted.
pub type Target<'a> = Box<dyn FnOnce(Vec<Argument>) -> BoxFuture<'a, ReturnValue> + Send + 'a>;

/// What a proxied call produced.
pub enum ReturnValue {
    Value(Box<dyn Any + Send>),
    Unit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvocationError {
    #[error("`{method}` returned no value")]
    MissingValue { method: String },

    #[error("`{method}` returned a value of an unexpected type, expected `{expected}`")]
    UnexpectedType {
        method: String,
        expected: &'static str,
    },
}

impl ReturnValue {
    pub fn value<T: Any + Send>(value: T) -> Self {
        ReturnValue::Value(Box::new(value))
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, ReturnValue::Unit)
    }

    /// Unwrap the produced value as `T`.
    pub fn into_value<T: Any>(self, method: &str) -> Result<T, InvocationError> {
        match self {
            ReturnValue::Value(value) => value.downcast::<T>().map(|v| *v).map_err(|_| {
                InvocationError::UnexpectedType {
                    method: method.to_string(),
                    expected: std::any::type_name::<T>(),
                }
            }),
            ReturnValue::Unit => Err(InvocationError::MissingValue {
                method: method.to_string(),
            }),
        }
    }
}

impl std::fmt::Debug for ReturnValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReturnValue::Value(_) => f.write_str("Value(..)"),
            ReturnValue::Unit => f.write_str("Unit"),
        }
    }
}

/// A cross-cutting handler around proxied method calls.
pub trait Interceptor: Send + Sync {
    fn intercept<'a>(&'a self, invocation: Invocation<'a>) -> BoxFuture<'a, ReturnValue>;
}

/// The call being intercepted: method identity, arguments, and the rest of
/// the chain.
pub struct Invocation<'a> {
    method: &'a str,
    arguments: Vec<Argument>,
    remaining: &'a [Arc<dyn Interceptor>],
    target: Target<'a>,
}

impl<'a> Invocation<'a> {
    /// Qualified method identity, e.g. `OrderService::place`.
    pub fn method(&self) -> &str {
        self.method
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    pub fn arguments_mut(&mut self) -> &mut Vec<Argument> {
        &mut self.arguments
    }

    /// Borrow argument `index` as `T`.
    pub fn argument<T: Any>(&self, index: usize) -> Option<&T> {
        self.arguments.get(index).and_then(|a| a.downcast_ref::<T>())
    }

    /// Continue with the next interceptor, or the real method after the last.
    pub fn proceed(self) -> BoxFuture<'a, ReturnValue> {
        let remaining: &'a [Arc<dyn Interceptor>] = self.remaining;
        match remaining.split_first() {
            Some((next, rest)) => next.intercept(Invocation {
                method: self.method,
                arguments: self.arguments,
                remaining: rest,
                target: self.target,
            }),
            None => (self.target)(self.arguments),
        }
    }
}

/// Run `chain` around `target`, outermost interceptor first.
pub fn invoke<'a>(
    chain: &'a [Arc<dyn Interceptor>],
    method: &'a str,
    arguments: Vec<Argument>,
    target: Target<'a>,
) -> BoxFuture<'a, ReturnValue> {
    Invocation {
        method,
        arguments,
        remaining: chain,
        target,
    }
    .proceed()
}

/// Drive the chain to completion on the current thread.
pub fn invoke_blocking<'a>(
    chain: &'a [Arc<dyn Interceptor>],
    method: &'a str,
    arguments: Vec<Argument>,
    target: Target<'a>,
) -> ReturnValue {
    futures::executor::block_on(invoke(chain, method, arguments, target))
}
