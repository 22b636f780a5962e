use super::*;

type Tagged = (&'static str, Role);

fn tagged(tag: &'static str) -> SharedTransport<(), Tagged> {
    Arc::new(move |(): (), role: Role| -> Result<Tagged, TransportError> { Ok((tag, role)) })
}

fn resolve(registry: &Registry<(), Tagged>, protocol: &str) -> Option<&'static str> {
    registry
        .get(protocol)
        .map(|transport| transport.new_conn((), Role::Accepting).expect("transport succeeds").0)
}

#[test]
fn empty_registry_has_no_entries() {
    let registry: Registry<(), Tagged> = Registry::new();
    assert_eq!(registry.len(), 0);
    assert!(registry.supported().is_empty());
    assert!(registry.preferences().is_empty());
    assert!(registry.get("/echo/1.0.0").is_none());
}

#[test]
fn preferences_follow_registration_order() {
    let registry = Registry::new();
    registry.register("/b/1".to_owned(), tagged("b"), PreferencePolicy::KeepDuplicates);
    registry.register("/a/1".to_owned(), tagged("a"), PreferencePolicy::KeepDuplicates);

    assert_eq!(registry.preferences(), ["/b/1", "/a/1"]);
    assert_eq!(registry.supported(), ["/b/1", "/a/1"]);
}

#[test]
fn last_registration_replaces_transport() {
    let registry = Registry::new();
    registry.register("/x/1".to_owned(), tagged("first"), PreferencePolicy::KeepDuplicates);
    registry.register("/x/1".to_owned(), tagged("second"), PreferencePolicy::KeepDuplicates);

    assert_eq!(resolve(&registry, "/x/1"), Some("second"));
    assert_eq!(registry.len(), 1);
}

#[test]
fn keep_duplicates_repeats_preference_entries() {
    let registry = Registry::new();
    registry.register("/x/1".to_owned(), tagged("first"), PreferencePolicy::KeepDuplicates);
    registry.register("/y/1".to_owned(), tagged("y"), PreferencePolicy::KeepDuplicates);
    registry.register("/x/1".to_owned(), tagged("second"), PreferencePolicy::KeepDuplicates);

    assert_eq!(registry.preferences(), ["/x/1", "/y/1", "/x/1"]);
    assert_eq!(registry.supported(), ["/x/1", "/y/1"]);
}

#[test]
fn deduplicate_keeps_first_position() {
    let registry = Registry::new();
    registry.register("/x/1".to_owned(), tagged("first"), PreferencePolicy::Deduplicate);
    registry.register("/y/1".to_owned(), tagged("y"), PreferencePolicy::Deduplicate);
    registry.register("/x/1".to_owned(), tagged("second"), PreferencePolicy::Deduplicate);

    assert_eq!(registry.preferences(), ["/x/1", "/y/1"]);
    assert_eq!(resolve(&registry, "/x/1"), Some("second"));
}

#[test]
fn registration_from_many_threads_is_not_lost() {
    let registry: Registry<(), Tagged> = Registry::new();
    std::thread::scope(|scope| {
        for worker in 0..8 {
            let registry = &registry;
            scope.spawn(move || {
                for index in 0..16 {
                    registry.register(
                        format!("/w{worker}/{index}"),
                        tagged("w"),
                        PreferencePolicy::KeepDuplicates,
                    );
                }
            });
        }
    });

    assert_eq!(registry.len(), 128);
    assert_eq!(registry.preferences().len(), 128);
}
