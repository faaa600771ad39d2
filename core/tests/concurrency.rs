use arc_core::api::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

struct Cart {
    items: parking_lot::Mutex<Vec<String>>,
}

fn container(created: &Arc<AtomicUsize>, destroyed: &Arc<AtomicUsize>) -> Container {
    let _ = env_logger::builder().is_test(true).try_init();
    let created = Arc::clone(created);
    let destroyed = Arc::clone(destroyed);
    Container::builder()
        .register(
            BeanDefinition::builder(ScopeKind::Request, move |_| {
                created.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(2));
                Ok(Cart {
                    items: parking_lot::Mutex::new(Vec::new()),
                })
            })
            .destructor(move |_: &Cart| {
                destroyed.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .build(),
        )
        .build()
        .unwrap()
}

#[test]
fn test_state_hand_off_between_threads() {
    let created = Arc::new(AtomicUsize::new(0));
    let destroyed = Arc::new(AtomicUsize::new(0));
    let container = container(&created, &destroyed);
    let cart = container.select::<Cart>().unwrap();
    let request = container.request_context();

    request.activate().unwrap();
    cart.with(|c| c.items.lock().push("book".to_string())).unwrap();
    let original = cart.get().unwrap();
    let state = request.state().unwrap();
    request.deactivate().unwrap();

    let worker = {
        let container = container.clone();
        let cart = cart.clone();
        thread::spawn(move || {
            let request = container.request_context();
            request.activate_with(&state).unwrap();
            cart.with(|c| c.items.lock().push("pen".to_string())).unwrap();
            let seen = cart.get().unwrap();
            request.terminate().unwrap();
            seen
        })
    };
    let seen = worker.join().unwrap();

    assert!(Arc::ptr_eq(&original, &seen));
    assert_eq!(*original.items.lock(), vec!["book", "pen"]);
    assert_eq!(created.load(Ordering::SeqCst), 1);
    assert_eq!(destroyed.load(Ordering::SeqCst), 1);
}

#[test]
fn test_threads_have_independent_windows() {
    let created = Arc::new(AtomicUsize::new(0));
    let destroyed = Arc::new(AtomicUsize::new(0));
    let container = container(&created, &destroyed);
    let barrier = Arc::new(Barrier::new(4));

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let container = container.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let request = container.request_context();
                let cart = container.select::<Cart>().unwrap();
                request.activate().unwrap();
                barrier.wait();
                let mine = cart.get().unwrap();
                let again = cart.get().unwrap();
                assert!(Arc::ptr_eq(&mine, &again));
                request.terminate().unwrap();
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }
    assert_eq!(created.load(Ordering::SeqCst), 4);
    assert_eq!(destroyed.load(Ordering::SeqCst), 4);
}

#[test]
fn test_activation_on_one_thread_is_invisible_to_another() {
    let created = Arc::new(AtomicUsize::new(0));
    let destroyed = Arc::new(AtomicUsize::new(0));
    let container = container(&created, &destroyed);
    let cart = container.select::<Cart>().unwrap();
    let request = container.request_context();

    request.activate().unwrap();
    let outcome = {
        let cart = cart.clone();
        thread::spawn(move || cart.get().map(|_| ())).join().unwrap()
    };
    assert!(matches!(outcome, Err(ArcError::ContextNotActive { .. })));
    assert_eq!(created.load(Ordering::SeqCst), 0);
    request.terminate().unwrap();
}

#[test]
fn test_concurrent_resolution_in_shared_registry_creates_once() {
    let created = Arc::new(AtomicUsize::new(0));
    let destroyed = Arc::new(AtomicUsize::new(0));
    let container = container(&created, &destroyed);
    let request = container.request_context();

    request.activate().unwrap();
    let state = request.state().unwrap();
    request.deactivate().unwrap();

    // Several call paths resolve through one registry, one thread at a time
    // holding it active; creation still happens once.
    let gate = Arc::new(parking_lot::Mutex::new(()));
    let workers: Vec<_> = (0..4)
        .map(|_| {
            let container = container.clone();
            let state = state.clone();
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                let _turn = gate.lock();
                let request = container.request_context();
                request.activate_with(&state).unwrap();
                let cart = container.select::<Cart>().unwrap().get().unwrap();
                request.deactivate().unwrap();
                Arc::as_ptr(&cart) as usize
            })
        })
        .collect();

    let addresses: Vec<usize> = workers.into_iter().map(|w| w.join().unwrap()).collect();
    assert!(addresses.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(created.load(Ordering::SeqCst), 1);

    request.destroy_state(&state).unwrap();
    assert_eq!(destroyed.load(Ordering::SeqCst), 1);
}

struct Catalog;

#[test]
fn test_shutdown_during_resolution_destroys_late_instance() {
    let _ = env_logger::builder().is_test(true).try_init();
    let created = Arc::new(AtomicUsize::new(0));
    let destroyed = Arc::new(AtomicUsize::new(0));
    let entered = Arc::new(Barrier::new(2));
    let release = Arc::new(Barrier::new(2));

    let container = {
        let created = Arc::clone(&created);
        let destroyed = Arc::clone(&destroyed);
        let entered = Arc::clone(&entered);
        let release = Arc::clone(&release);
        Container::builder()
            .register(
                BeanDefinition::builder(ScopeKind::Application, move |_| {
                    created.fetch_add(1, Ordering::SeqCst);
                    entered.wait();
                    release.wait();
                    Ok(Catalog)
                })
                .destructor(move |_: &Catalog| {
                    destroyed.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .build(),
            )
            .build()
            .unwrap()
    };
    let catalog = container.select::<Catalog>().unwrap();

    let worker = thread::spawn(move || catalog.get().map(|_| ()));
    entered.wait();
    container.shutdown().unwrap();
    release.wait();
    let outcome = worker.join().unwrap();

    assert!(matches!(outcome, Err(ArcError::ContextNotActive { .. })));
    assert_eq!(created.load(Ordering::SeqCst), 1);
    assert_eq!(destroyed.load(Ordering::SeqCst), 1);
}
