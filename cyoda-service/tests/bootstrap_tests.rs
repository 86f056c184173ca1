use cyoda_client::{ClientConfig, StaticTokenAuth};
use cyoda_service::{BootstrapError, CyodaServices};
use std::sync::Arc;

fn config(api_url: &str) -> ClientConfig {
    ClientConfig {
        api_url: api_url.to_string(),
        ..Default::default()
    }
}

fn auth() -> Arc<StaticTokenAuth> {
    Arc::new(StaticTokenAuth::new("token"))
}

#[test]
fn build_rejects_invalid_config() {
    let result = CyodaServices::build(config(""), auth());
    assert!(matches!(result, Err(BootstrapError::Client(_))));
}

#[test]
fn build_wires_default_version() {
    let services = CyodaServices::build(config("http://localhost:1/api"), auth()).unwrap();
    assert_eq!(services.service().default_version(), "1000");
    assert_eq!(services.repository().config().api_url, "http://localhost:1/api");
}

// The shared slot is process-wide, so every assertion about it lives in
// this one test.
#[test]
fn shared_services_initialize_once() {
    assert!(CyodaServices::shared().is_none());

    let url = "http://shared.example/api";
    let instances: Vec<usize> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(move || {
                    let services = CyodaServices::init_shared(config(url), auth()).unwrap();
                    services as *const CyodaServices as usize
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(instances.windows(2).all(|pair| pair[0] == pair[1]));

    let shared = CyodaServices::shared().unwrap();
    assert_eq!(shared as *const CyodaServices as usize, instances[0]);
    assert_eq!(shared.config().api_url, url);

    let again = CyodaServices::init_shared(config(url), auth()).unwrap();
    assert!(std::ptr::eq(again, shared));

    let conflict = CyodaServices::init_shared(config("http://other.example/api"), auth());
    assert!(matches!(conflict, Err(BootstrapError::AlreadyInitialized)));
}
