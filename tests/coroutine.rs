use futures_lite::StreamExt;
use kodegen_bundler_compile::bundler::{Coroutine, Error, Level, Phase, Step, TaskKind};
use std::{cell::Cell, rc::Rc};

fn step(label: &str) -> Step {
    Step::new(TaskKind::Prepare, Phase::Running, label)
}

#[tokio::test]
async fn body_does_not_run_until_first_pull() {
    let started = Rc::new(Cell::new(false));
    let flag = Rc::clone(&started);

    let mut coroutine = Coroutine::<()>::new(move |co| async move {
        flag.set(true);
        co.notify(step("one")).await;
        Ok(())
    });

    assert!(!started.get());
    let first = coroutine.next().await.unwrap().unwrap();
    assert!(started.get());
    assert_eq!(first.label(), "one");
}

#[tokio::test]
async fn steps_arrive_in_order_with_their_levels() {
    let coroutine = Coroutine::<i32>::new(|co| async move {
        co.notify(step("ready")).await;
        co.progress(step("working")).await;
        co.info(step("detail")).await;
        Ok(7)
    });

    let (steps, output) = coroutine.collect().await.unwrap();

    let labels: Vec<_> = steps.iter().map(Step::label).collect();
    let levels: Vec<_> = steps.iter().map(Step::level).collect();
    assert_eq!(labels, ["ready", "working", "detail"]);
    assert_eq!(levels, [Level::Notify, Level::Progress, Level::Info]);
    assert_eq!(output, 7);
}

#[tokio::test]
async fn resume_value_reaches_the_suspended_call() {
    let mut coroutine = Coroutine::<Vec<u32>, u32>::new(|co| async move {
        let mut received = Vec::new();
        for label in ["a", "b"] {
            if let Some(value) = co.notify(step(label)).await {
                received.push(value);
            }
        }
        Ok(received)
    });

    assert!(coroutine.next().await.is_some());
    assert!(coroutine.resume(10).await.is_some());
    assert!(coroutine.next().await.is_none());
    assert_eq!(coroutine.take_output(), Some(vec![10]));
}

#[tokio::test]
async fn error_ends_the_stream() {
    let mut coroutine = Coroutine::<()>::new(|co| async move {
        co.notify(step("before")).await;
        Err(Error::GenericError("boom".into()))
    });

    assert!(coroutine.next().await.unwrap().is_ok());
    let error = coroutine.next().await.unwrap().unwrap_err();
    assert_eq!(error.to_string(), "boom");
    assert!(coroutine.next().await.is_none());
    assert!(coroutine.is_finished());
    assert!(coroutine.take_output().is_none());
}

#[tokio::test]
async fn dropping_cancels_unreached_work() {
    let reached_end = Rc::new(Cell::new(false));
    let flag = Rc::clone(&reached_end);

    let mut coroutine = Coroutine::<()>::new(move |co| async move {
        co.notify(step("first")).await;
        co.notify(step("second")).await;
        flag.set(true);
        Ok(())
    });

    coroutine.next().await;
    drop(coroutine);
    assert!(!reached_end.get());
}

#[tokio::test]
async fn nested_coroutines_flatten_into_one_stream() {
    let coroutine = Coroutine::<i32>::new(|co| async move {
        co.notify(step("outer-start")).await;

        let inner = Coroutine::<i32>::new(|inner_co| async move {
            inner_co.notify(step("inner-1")).await;
            inner_co.progress(step("inner-2")).await;
            Ok(2)
        });
        let forwarded = co.forward(inner).await?;

        let delegated = co
            .delegate(|shared| async move {
                shared.info(step("delegated")).await;
                Ok(3)
            })
            .await?;

        co.notify(step("outer-end")).await;
        Ok(forwarded + delegated)
    });

    let (steps, output) = coroutine.collect().await.unwrap();

    let labels: Vec<_> = steps.iter().map(Step::label).collect();
    assert_eq!(
        labels,
        ["outer-start", "inner-1", "inner-2", "delegated", "outer-end"]
    );
    assert_eq!(steps[2].level(), Level::Progress);
    assert_eq!(output, 5);
}

#[tokio::test]
async fn inner_failure_propagates_to_outer_pull() {
    let mut coroutine = Coroutine::<()>::new(|co| async move {
        let inner = Coroutine::<()>::new(|inner_co| async move {
            inner_co.notify(step("inner")).await;
            Err(Error::GenericError("inner failed".into()))
        });
        co.forward(inner).await?;
        co.notify(step("unreachable")).await;
        Ok(())
    });

    assert_eq!(coroutine.next().await.unwrap().unwrap().label(), "inner");
    assert!(coroutine.next().await.unwrap().is_err());
    assert!(coroutine.next().await.is_none());
}

#[tokio::test]
async fn real_io_inside_a_body_is_awaited() {
    let coroutine = Coroutine::<()>::new(|co| async move {
        co.notify(step("before sleep")).await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        co.notify(step("after sleep")).await;
        Ok(())
    });

    let (steps, ()) = coroutine.collect().await.unwrap();
    assert_eq!(steps.len(), 2);
}

#[test]
fn drives_as_a_stream_without_a_runtime() {
    let mut coroutine = Coroutine::<()>::new(|co| async move {
        co.notify(step("a")).await;
        co.notify(step("b")).await;
        Ok(())
    });

    let labels = futures_lite::future::block_on(async {
        let mut labels = Vec::new();
        while let Some(item) = StreamExt::next(&mut coroutine).await {
            labels.push(item.unwrap().label().to_string());
        }
        labels
    });

    assert_eq!(labels, ["a", "b"]);
}
