//! Method interception: proxy synthesis and the runtime call chain.

pub mod proxy;
pub mod runtime;

pub use proxy::{
    proxy_identity, reachable_methods, synthesize_proxies, CallKind, ProxyDescriptor, ProxyMethod,
};
pub use runtime::{
    invoke, invoke_blocking, Argument, Interceptor, Invocation, InvocationError, ReturnValue,
    Target,
};
