//! The service resolver: constructs `[Service]` slot values for a factory
//! operation from a dependency graph, the way an injected DI container
//! would, without requiring one to exist ambiently in the process.
//!
//! A [`ServiceRegistry`] is built once at startup with `provide`/`register`
//! calls; the dispatcher and event scheduler each open a fresh
//! [`ServiceScope`] per operation by calling [`ServiceRegistry::resolve`].
//! Resolution fails with [`ResolveError::MissingDependency`] when a
//! `[Service]` slot names a type nothing can supply — the dispatcher turns
//! that into `NeatooError::MissingService`.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Marker trait for types the registry can construct synchronously from a
/// [`ServiceScope`].
pub trait Service: Clone + Send + Sync + 'static {
    fn dependencies() -> Vec<(TypeId, &'static str)>;
    fn build(scope: &ServiceScope) -> Self;
}

/// Marker trait for types that require async construction (DB pools, HTTP
/// clients and similar).
pub trait AsyncService: Clone + Send + Sync + 'static {
    fn dependencies() -> Vec<(TypeId, &'static str)>;
    fn build(scope: &ServiceScope) -> impl Future<Output = Self> + Send + '_;
}

/// Trait for producer functions that build a type the application doesn't
/// own (e.g. a third-party client) from the scope.
pub trait Producer: Send + 'static {
    type Output: Clone + Send + Sync + 'static;
    fn dependencies() -> Vec<(TypeId, &'static str)>;
    fn produce(scope: &ServiceScope) -> impl Future<Output = Self::Output> + Send + '_;
}

/// Read-only container holding every resolved service instance for one
/// operation scope. Produced by [`ServiceRegistry::resolve`].
pub struct ServiceScope {
    entries: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl fmt::Debug for ServiceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceScope")
            .field("entry_count", &self.entries.len())
            .finish()
    }
}

impl ServiceScope {
    /// An empty scope with no resolved services, for operations whose
    /// delegate declares no `[Service]` slots.
    pub fn empty() -> Self {
        ServiceScope { entries: HashMap::new() }
    }

    /// Retrieve a service by type.
    ///
    /// # Panics
    ///
    /// Panics if the requested type was not registered or provided. Use
    /// this only for slots the registration graph already guarantees
    /// exist; use [`try_get`](Self::try_get) at the dispatcher boundary
    /// where a missing slot must become `MissingService` instead of a
    /// panic.
    pub fn get<T: Clone + 'static>(&self) -> T {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
            .unwrap_or_else(|| {
                panic!("service of type `{}` not found in scope", type_name::<T>())
            })
            .clone()
    }

    /// Try to retrieve a service by type, returning `None` if absent.
    pub fn try_get<T: Clone + 'static>(&self) -> Option<T> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
    }
}

type Factory = Box<
    dyn FnOnce(
            ServiceScope,
        ) -> Pin<Box<dyn Future<Output = (ServiceScope, Box<dyn Any + Send + Sync>)> + Send>>
        + Send,
>;

struct Registration {
    type_id: TypeId,
    type_name: &'static str,
    dependencies: Vec<(TypeId, &'static str)>,
    factory: Factory,
}

/// Builder that collects service registrations and provided instances,
/// resolves the dependency graph, and produces a [`ServiceScope`].
pub struct ServiceRegistry {
    services: Vec<Registration>,
    provided: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

/// Errors that can occur while resolving the service graph.
#[derive(Debug)]
pub enum ResolveError {
    CyclicDependency { cycle: Vec<String> },
    MissingDependency { service: String, dependency: String },
    DuplicateService { type_name: String },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::CyclicDependency { cycle } => {
                write!(f, "circular dependency detected: {}", cycle.join(" -> "))
            }
            ResolveError::MissingDependency { service, dependency } => {
                write!(
                    f,
                    "missing dependency for service '{service}': type '{dependency}' is not registered"
                )
            }
            ResolveError::DuplicateService { type_name } => {
                write!(f, "service of type '{type_name}' registered twice")
            }
        }
    }
}

impl std::error::Error for ResolveError {}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self {
            services: Vec::new(),
            provided: HashMap::new(),
        }
    }

    /// Provide a pre-built instance, available to any service that depends
    /// on type `T`. The dispatcher uses this to seed the per-request
    /// cancellation token and correlation id before resolving the rest of
    /// the scope.
    pub fn provide<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        self.provided.insert(TypeId::of::<T>(), Box::new(value));
        self
    }

    pub fn register<T: Service>(&mut self) -> &mut Self {
        self.services.push(Registration {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            dependencies: T::dependencies(),
            factory: Box::new(|scope| {
                Box::pin(async move {
                    let value = T::build(&scope);
                    (scope, Box::new(value) as Box<dyn Any + Send + Sync>)
                })
            }),
        });
        self
    }

    pub fn register_async<T: AsyncService>(&mut self) -> &mut Self {
        self.services.push(Registration {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            dependencies: T::dependencies(),
            factory: Box::new(|scope| {
                Box::pin(async move {
                    let value = T::build(&scope).await;
                    (scope, Box::new(value) as Box<dyn Any + Send + Sync>)
                })
            }),
        });
        self
    }

    pub fn register_producer<P: Producer>(&mut self) -> &mut Self {
        self.services.push(Registration {
            type_id: TypeId::of::<P::Output>(),
            type_name: type_name::<P::Output>(),
            dependencies: P::dependencies(),
            factory: Box::new(|scope| {
                Box::pin(async move {
                    let output = P::produce(&scope).await;
                    (scope, Box::new(output) as Box<dyn Any + Send + Sync>)
                })
            }),
        });
        self
    }

    /// Resolve the dependency graph and build every registered service, in
    /// topological order (Kahn's algorithm), returning the populated scope.
    pub async fn resolve(self) -> Result<ServiceScope, ResolveError> {
        let mut entries: HashMap<TypeId, Box<dyn Any + Send + Sync>> = HashMap::new();
        for (tid, value) in self.provided {
            entries.insert(tid, value);
        }

        let count = self.services.len();
        if count == 0 {
            return Ok(ServiceScope { entries });
        }

        Self::check_duplicates(&self.services, &entries)?;
        let id_to_idx = Self::build_index(&self.services);
        Self::check_missing(&self.services, &entries, &id_to_idx)?;
        let order = Self::topo_sort(&self.services, &id_to_idx, count)?;
        entries = Self::construct_in_order(self.services, order, entries).await;

        Ok(ServiceScope { entries })
    }

    fn check_duplicates(
        services: &[Registration],
        entries: &HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    ) -> Result<(), ResolveError> {
        let mut seen: HashMap<TypeId, &str> = HashMap::new();
        for reg in services {
            if entries.contains_key(&reg.type_id) || seen.insert(reg.type_id, reg.type_name).is_some() {
                return Err(ResolveError::DuplicateService {
                    type_name: reg.type_name.to_string(),
                });
            }
        }
        Ok(())
    }

    fn build_index(services: &[Registration]) -> HashMap<TypeId, usize> {
        services.iter().enumerate().map(|(i, r)| (r.type_id, i)).collect()
    }

    fn check_missing(
        services: &[Registration],
        entries: &HashMap<TypeId, Box<dyn Any + Send + Sync>>,
        id_to_idx: &HashMap<TypeId, usize>,
    ) -> Result<(), ResolveError> {
        for reg in services {
            for (dep_id, dep_name) in &reg.dependencies {
                if !entries.contains_key(dep_id) && !id_to_idx.contains_key(dep_id) {
                    return Err(ResolveError::MissingDependency {
                        service: reg.type_name.to_string(),
                        dependency: dep_name.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn topo_sort(
        services: &[Registration],
        id_to_idx: &HashMap<TypeId, usize>,
        count: usize,
    ) -> Result<Vec<usize>, ResolveError> {
        let mut in_degree: Vec<usize> = services
            .iter()
            .map(|r| r.dependencies.iter().filter(|(d, _)| id_to_idx.contains_key(d)).count())
            .collect();

        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];
        for (i, reg) in services.iter().enumerate() {
            for (dep_id, _) in &reg.dependencies {
                if let Some(&dep_idx) = id_to_idx.get(dep_id) {
                    dependents[dep_idx].push(i);
                }
            }
        }

        let mut queue: Vec<usize> = (0..count).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(count);

        while let Some(idx) = queue.pop() {
            order.push(idx);
            for &dep_idx in &dependents[idx] {
                in_degree[dep_idx] -= 1;
                if in_degree[dep_idx] == 0 {
                    queue.push(dep_idx);
                }
            }
        }

        if order.len() != count {
            let cycle = (0..count)
                .filter(|&i| in_degree[i] > 0)
                .map(|i| services[i].type_name.to_string())
                .collect();
            return Err(ResolveError::CyclicDependency { cycle });
        }

        Ok(order)
    }

    async fn construct_in_order(
        services: Vec<Registration>,
        order: Vec<usize>,
        mut entries: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    ) -> HashMap<TypeId, Box<dyn Any + Send + Sync>> {
        let mut data: Vec<Option<(TypeId, Factory)>> = services
            .into_iter()
            .map(|r| Some((r.type_id, r.factory)))
            .collect();

        for idx in order {
            let (type_id, factory) = data[idx].take().unwrap();
            let scope = ServiceScope { entries };
            let (scope, value) = factory(scope).await;
            entries = scope.entries;
            entries.insert(type_id, value);
        }

        entries
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Dep {
        value: i32,
    }

    #[derive(Clone)]
    struct ServiceA {
        dep: Dep,
    }

    impl Service for ServiceA {
        fn dependencies() -> Vec<(TypeId, &'static str)> {
            vec![(TypeId::of::<Dep>(), type_name::<Dep>())]
        }
        fn build(scope: &ServiceScope) -> Self {
            Self { dep: scope.get::<Dep>() }
        }
    }

    #[tokio::test]
    async fn resolves_simple_graph() {
        let mut reg = ServiceRegistry::new();
        reg.provide(Dep { value: 42 });
        reg.register::<ServiceA>();
        let scope = reg.resolve().await.unwrap();
        let a: ServiceA = scope.get();
        assert_eq!(a.dep.value, 42);
    }

    #[tokio::test]
    async fn missing_dependency_names_the_type() {
        let mut reg = ServiceRegistry::new();
        reg.register::<ServiceA>();
        let err = reg.resolve().await.unwrap_err();
        match err {
            ResolveError::MissingDependency { dependency, .. } => {
                assert!(dependency.contains("Dep"));
            }
            other => panic!("expected MissingDependency, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn duplicate_registration_fails() {
        let mut reg = ServiceRegistry::new();
        reg.provide(Dep { value: 1 });
        reg.register::<ServiceA>();
        reg.register::<ServiceA>();
        let err = reg.resolve().await.unwrap_err();
        assert!(matches!(err, ResolveError::DuplicateService { .. }));
    }

    #[derive(Clone)]
    struct CycleA;
    #[derive(Clone)]
    struct CycleB;

    impl Service for CycleA {
        fn dependencies() -> Vec<(TypeId, &'static str)> {
            vec![(TypeId::of::<CycleB>(), type_name::<CycleB>())]
        }
        fn build(scope: &ServiceScope) -> Self {
            let _ = scope.get::<CycleB>();
            Self
        }
    }
    impl Service for CycleB {
        fn dependencies() -> Vec<(TypeId, &'static str)> {
            vec![(TypeId::of::<CycleA>(), type_name::<CycleA>())]
        }
        fn build(scope: &ServiceScope) -> Self {
            let _ = scope.get::<CycleA>();
            Self
        }
    }

    #[tokio::test]
    async fn cyclic_dependency_detected() {
        let mut reg = ServiceRegistry::new();
        reg.register::<CycleA>();
        reg.register::<CycleB>();
        let err = reg.resolve().await.unwrap_err();
        assert!(matches!(err, ResolveError::CyclicDependency { .. }));
    }

    #[derive(Clone)]
    struct AsyncThing {
        dep: Dep,
    }

    impl AsyncService for AsyncThing {
        fn dependencies() -> Vec<(TypeId, &'static str)> {
            vec![(TypeId::of::<Dep>(), type_name::<Dep>())]
        }
        async fn build(scope: &ServiceScope) -> Self {
            tokio::task::yield_now().await;
            Self { dep: scope.get::<Dep>() }
        }
    }

    #[tokio::test]
    async fn async_service_resolution() {
        let mut reg = ServiceRegistry::new();
        reg.provide(Dep { value: 99 });
        reg.register_async::<AsyncThing>();
        let scope = reg.resolve().await.unwrap();
        let thing: AsyncThing = scope.get();
        assert_eq!(thing.dep.value, 99);
    }

    #[tokio::test]
    async fn try_get_missing_returns_none() {
        let reg = ServiceRegistry::new();
        let scope = reg.resolve().await.unwrap();
        assert!(scope.try_get::<Dep>().is_none());
    }
}
