//! Per-host exclusion under real threads.

mod common;

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

use common::{fake_csr, fake_service, FakeEngine};
use hostca::AutosignConfig;

const CALLERS: usize = 16;

#[test]
fn test_concurrent_getcert_signs_once() {
    let dir = TempDir::new().unwrap();
    let engine = Arc::new(FakeEngine::with_delay(Duration::from_millis(20)));
    let service = fake_service(dir.path(), AutosignConfig::AlwaysOn, Arc::clone(&engine));
    let barrier = Barrier::new(CALLERS);

    let certificates: Vec<String> = thread::scope(|s| {
        let handles: Vec<_> = (0..CALLERS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    let response = service
                        .getcert(&fake_csr("new.example.com"), None, None)
                        .unwrap();
                    response.certificate().unwrap().to_string()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(engine.sign_count(), 1);
    assert_eq!(certificates.len(), CALLERS);
    assert!(certificates.iter().all(|c| c == &certificates[0]));
}

#[test]
fn test_distinct_hosts_sign_independently() {
    let dir = TempDir::new().unwrap();
    let engine = Arc::new(FakeEngine::with_delay(Duration::from_millis(5)));
    let service = fake_service(dir.path(), AutosignConfig::AlwaysOn, Arc::clone(&engine));

    thread::scope(|s| {
        for i in 0..8 {
            let service = &service;
            s.spawn(move || {
                let host = format!("host{i}.example.com");
                for _ in 0..3 {
                    assert!(service.getcert(&fake_csr(&host), None, None).unwrap().is_issued());
                }
            });
        }
    });

    assert_eq!(engine.sign_count(), 8);
    assert_eq!(service.ca().store().list_signed().unwrap().len(), 8);
}

#[test]
fn test_clean_and_getcert_do_not_interleave() {
    let dir = TempDir::new().unwrap();
    let engine = Arc::new(FakeEngine::with_delay(Duration::from_millis(2)));
    let service = fake_service(dir.path(), AutosignConfig::AlwaysOn, Arc::clone(&engine));
    let host = "churn.example.com";

    thread::scope(|s| {
        s.spawn(|| {
            for _ in 0..20 {
                service.getcert(&fake_csr(host), None, None).unwrap();
            }
        });
        s.spawn(|| {
            for _ in 0..20 {
                match service.clean(host) {
                    Ok(()) => {}
                    Err(e) => assert!(e.is_not_found(), "unexpected error: {e}"),
                }
            }
        });
    });

    // whatever the interleaving, the store holds either a whole record or nothing
    let store = service.ca().store();
    if store.exists(host) {
        let certificate = store.certificate(host).unwrap().unwrap();
        assert!(certificate.starts_with("FAKE CERT churn.example.com"));
    } else {
        assert!(store.load(host).unwrap_err().is_not_found());
    }
}
