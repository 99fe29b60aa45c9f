//! Component registry.
//!
//! Holds the named schemas of a run in first-registration order, plus the claim table
//! that decides which thread builds each object schema. A thread that finds a name
//! being built elsewhere blocks until it is complete, unless waiting would close a
//! wait-for cycle between threads. Such a cycle means the types reference each other,
//! so the waiter treats the name as a self-reference and emits a `$ref` to it.

use crate::schema::SchemaNode;
use indexmap::IndexMap;
use log::debug;
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::thread::{self, ThreadId};

pub struct ComponentRegistry {
    state: Mutex<RegistryState>,
    ready: Condvar,
}

#[derive(Default)]
struct RegistryState {
    schemas: IndexMap<String, SchemaNode>,
    /// Names whose bodies are being built, and by whom
    in_progress: HashMap<String, ThreadId>,
    /// Threads blocked in `claim`, and the name each waits for
    waiting: HashMap<ThreadId, String>,
}

/// Outcome of [`ComponentRegistry::claim`]
pub enum Claim<'a> {
    /// The body is complete
    Registered,
    /// The name is being built further up a reference cycle
    Reentrant,
    /// The caller owns the name and must populate it
    Acquired(ClaimGuard<'a>),
}

/// Exclusive right to populate one named schema.
///
/// Dropping the guard without calling [`ClaimGuard::complete`] releases the name and
/// removes its placeholder, so waiters retry instead of seeing an empty body.
pub struct ClaimGuard<'a> {
    registry: &'a ComponentRegistry,
    name: String,
    completed: bool,
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            ready: Condvar::new(),
        }
    }

    /// Claim `name` for building, wait for its builder, or detect a cycle
    pub fn claim(&self, name: &str) -> Claim<'_> {
        let me = thread::current().id();
        let mut state = self.state.lock();
        loop {
            match state.in_progress.get(name).copied() {
                Some(owner) if owner == me => return Claim::Reentrant,
                Some(owner) => {
                    if state.leads_back_to(owner, me) {
                        debug!("Cross-thread reference cycle through {}", name);
                        return Claim::Reentrant;
                    }
                    debug!("Waiting for {} to be completed by another thread", name);
                    state.waiting.insert(me, name.to_string());
                    self.ready.wait(&mut state);
                    state.waiting.remove(&me);
                    continue;
                }
                None => {}
            }

            if state.schemas.contains_key(name) {
                return Claim::Registered;
            }

            state
                .schemas
                .insert(name.to_string(), SchemaNode::empty_object());
            state.in_progress.insert(name.to_string(), me);
            return Claim::Acquired(ClaimGuard {
                registry: self,
                name: name.to_string(),
                completed: false,
            });
        }
    }

    /// Register a schema that needs no claim (enums); returns false if the name exists
    pub fn register_once(&self, name: &str, schema: SchemaNode) -> bool {
        let mut state = self.state.lock();
        if state.schemas.contains_key(name) {
            return false;
        }
        debug!("Registered schema {}", name);
        state.schemas.insert(name.to_string(), schema);
        true
    }

    pub fn get(&self, name: &str) -> Option<SchemaNode> {
        self.state.lock().schemas.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.state.lock().schemas.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.state.lock().schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every registered schema in registration order
    pub fn snapshot(&self) -> IndexMap<String, SchemaNode> {
        self.state.lock().schemas.clone()
    }

    pub fn into_schemas(self) -> IndexMap<String, SchemaNode> {
        self.state.into_inner().schemas
    }

    fn finish(&self, name: &str, body: Option<SchemaNode>) {
        let mut state = self.state.lock();
        state.in_progress.remove(name);
        match body {
            Some(body) => {
                debug!("Completed schema {}", name);
                state.schemas.insert(name.to_string(), body);
            }
            None => {
                debug!("Released unfinished claim on {}", name);
                state.schemas.shift_remove(name);
            }
        }
        drop(state);
        self.ready.notify_all();
    }
}

impl RegistryState {
    /// Whether following the wait-for chain from `owner` reaches `me`
    fn leads_back_to(&self, owner: ThreadId, me: ThreadId) -> bool {
        let mut current = owner;
        for _ in 0..=self.waiting.len() {
            if current == me {
                return true;
            }
            let next = self
                .waiting
                .get(&current)
                .and_then(|name| self.in_progress.get(name));
            match next {
                Some(next) => current = *next,
                None => return false,
            }
        }
        false
    }
}

impl ClaimGuard<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the placeholder with the finished body and wake waiters
    pub fn complete(mut self, body: SchemaNode) {
        self.completed = true;
        self.registry.finish(&self.name, Some(body));
    }
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.registry.finish(&self.name, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaKind;
    use std::sync::Barrier;
    use std::time::Duration;

    fn body() -> SchemaNode {
        let mut properties = IndexMap::new();
        properties.insert("id".to_string(), SchemaNode::string());
        SchemaNode::object(properties, Default::default())
    }

    #[test]
    fn test_claim_then_registered() {
        let registry = ComponentRegistry::new();
        match registry.claim("User") {
            Claim::Acquired(guard) => {
                assert_eq!(guard.name(), "User");
                assert_eq!(registry.get("User"), Some(SchemaNode::empty_object()));
                guard.complete(body());
            }
            _ => panic!("Expected first claim to be acquired"),
        }
        assert!(matches!(registry.claim("User"), Claim::Registered));
        assert_eq!(registry.get("User"), Some(body()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_same_thread_reentry() {
        let registry = ComponentRegistry::new();
        let guard = match registry.claim("Node") {
            Claim::Acquired(guard) => guard,
            _ => panic!("Expected claim"),
        };
        assert!(matches!(registry.claim("Node"), Claim::Reentrant));
        guard.complete(body());
    }

    #[test]
    fn test_dropped_guard_releases_name() {
        let registry = ComponentRegistry::new();
        if let Claim::Acquired(guard) = registry.claim("Broken") {
            drop(guard);
        }
        assert!(!registry.contains("Broken"));
        assert!(matches!(registry.claim("Broken"), Claim::Acquired(_)));
    }

    #[test]
    fn test_register_once_keeps_first() {
        let registry = ComponentRegistry::new();
        assert!(registry.register_once("Status", SchemaNode::string_enum(vec!["A".into()])));
        assert!(!registry.register_once("Status", SchemaNode::opaque()));
        assert!(matches!(
            registry.get("Status").map(|s| s.kind),
            Some(SchemaKind::StringEnum { .. })
        ));
    }

    #[test]
    fn test_waiter_sees_only_complete_body() {
        let registry = ComponentRegistry::new();
        let guard = match registry.claim("User") {
            Claim::Acquired(guard) => guard,
            _ => panic!("Expected claim"),
        };

        thread::scope(|scope| {
            let waiter = scope.spawn(|| {
                let outcome = matches!(registry.claim("User"), Claim::Registered);
                (outcome, registry.get("User"))
            });
            thread::sleep(Duration::from_millis(50));
            guard.complete(body());
            let (registered, seen) = waiter.join().unwrap();
            assert!(registered);
            assert_eq!(seen, Some(body()));
        });
    }

    #[test]
    fn test_cross_thread_cycle_does_not_deadlock() {
        let registry = ComponentRegistry::new();
        let barrier = Barrier::new(2);

        let outcomes: Vec<&'static str> = thread::scope(|scope| {
            let run = |mine: &'static str, theirs: &'static str| {
                let registry = &registry;
                let barrier = &barrier;
                scope.spawn(move || {
                    let guard = match registry.claim(mine) {
                        Claim::Acquired(guard) => guard,
                        _ => panic!("Expected claim on {}", mine),
                    };
                    barrier.wait();
                    let outcome = match registry.claim(theirs) {
                        Claim::Registered => "registered",
                        Claim::Reentrant => "reentrant",
                        Claim::Acquired(_) => "acquired",
                    };
                    guard.complete(body());
                    outcome
                })
            };
            let a = run("A", "B");
            let b = run("B", "A");
            vec![a.join().unwrap(), b.join().unwrap()]
        });

        let mut sorted = outcomes.clone();
        sorted.sort();
        assert_eq!(sorted, vec!["registered", "reentrant"]);
        assert_eq!(registry.get("A"), Some(body()));
        assert_eq!(registry.get("B"), Some(body()));
    }

    #[test]
    fn test_snapshot_keeps_registration_order() {
        let registry = ComponentRegistry::new();
        registry.register_once("Zeta", SchemaNode::opaque());
        registry.register_once("Alpha", SchemaNode::opaque());
        let names: Vec<String> = registry.snapshot().keys().cloned().collect();
        assert_eq!(names, vec!["Zeta", "Alpha"]);
    }
}
