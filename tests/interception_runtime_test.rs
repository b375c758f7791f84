use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::{Arc, Mutex};
use wiremap::intercept::{
    invoke, invoke_blocking, Argument, Interceptor, Invocation, InvocationError, ReturnValue,
    Target,
};

/// Records the methods it sees and the arguments it was handed.
struct Audit {
    seen: Arc<Mutex<Vec<String>>>,
}

impl Interceptor for Audit {
    fn intercept<'a>(&'a self, invocation: Invocation<'a>) -> BoxFuture<'a, ReturnValue> {
        async move {
            let entry = format!("{}/{}", invocation.method(), invocation.arguments().len());
            self.seen.lock().unwrap().push(entry);
            invocation.proceed().await
        }
        .boxed()
    }
}

/// Suspends once before proceeding.
struct Yielding;

impl Interceptor for Yielding {
    fn intercept<'a>(&'a self, invocation: Invocation<'a>) -> BoxFuture<'a, ReturnValue> {
        async move {
            futures::future::ready(()).await;
            invocation.proceed().await
        }
        .boxed()
    }
}

fn chain(seen: &Arc<Mutex<Vec<String>>>) -> Vec<Arc<dyn Interceptor>> {
    vec![
        Arc::new(Audit { seen: seen.clone() }),
        Arc::new(Yielding),
    ]
}

fn total(arguments: &[Argument]) -> u64 {
    arguments.iter().filter_map(|a| a.downcast_ref::<u64>()).sum()
}

fn place<'a>() -> Target<'a> {
    Box::new(|arguments: Vec<Argument>| {
        let total = total(&arguments);
        async move { ReturnValue::value(format!("receipt-{}", total)) }.boxed()
    })
}

/// Suspends before producing its value.
fn submit<'a>() -> Target<'a> {
    Box::new(|arguments: Vec<Argument>| {
        let total = total(&arguments);
        async move {
            futures::future::ready(()).await;
            ReturnValue::value(format!("receipt-{}", total))
        }
        .boxed()
    })
}

fn ping<'a>(called: Arc<Mutex<bool>>) -> Target<'a> {
    Box::new(move |_arguments: Vec<Argument>| {
        async move {
            *called.lock().unwrap() = true;
            ReturnValue::Unit
        }
        .boxed()
    })
}

#[test]
fn test_sync_method_returns_its_value_through_the_chain() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let interceptors = chain(&seen);

    let result = invoke_blocking(
        &interceptors,
        "OrderService::place",
        vec![Box::new(2_u64) as Argument, Box::new(3_u64) as Argument],
        place(),
    );

    assert_eq!(
        result.into_value::<String>("OrderService::place"),
        Ok("receipt-5".to_string())
    );
    assert_eq!(*seen.lock().unwrap(), vec!["OrderService::place/2"]);
}

#[test]
fn test_async_method_is_awaited_before_returning() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let interceptors = chain(&seen);

    let result = futures::executor::block_on(async {
        invoke(
            &interceptors,
            "OrderService::submit",
            vec![Box::new(10_u64) as Argument],
            submit(),
        )
        .await
    });

    assert_eq!(
        result.into_value::<String>("OrderService::submit"),
        Ok("receipt-10".to_string())
    );
}

#[test]
fn test_unit_method_produces_no_value() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let interceptors = chain(&seen);
    let called = Arc::new(Mutex::new(false));

    let result = invoke_blocking(
        &interceptors,
        "OrderService::ping",
        Vec::new(),
        ping(called.clone()),
    );

    assert!(result.is_unit());
    assert!(*called.lock().unwrap());
    assert_eq!(
        result.into_value::<()>("OrderService::ping"),
        Err(InvocationError::MissingValue {
            method: "OrderService::ping".into()
        })
    );
}

#[test]
fn test_empty_chain_calls_the_target_directly() {
    let result = invoke_blocking(
        &[],
        "OrderService::place",
        vec![Box::new(1_u64) as Argument],
        place(),
    );
    assert_eq!(
        result.into_value::<String>("OrderService::place"),
        Ok("receipt-1".to_string())
    );
}
