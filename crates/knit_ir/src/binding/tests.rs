use std::collections::HashMap;

use smallvec::smallvec;

use super::*;

struct Engine(u32);
struct Car;

fn make_engine(_: &dyn ObjectGraph) -> Option<Instance> {
    Some(Arc::new(Engine(4)))
}

fn make_engine_v8(_: &dyn ObjectGraph) -> Option<Instance> {
    Some(Arc::new(Engine(8)))
}

fn make_car(graph: &dyn ObjectGraph) -> Option<Instance> {
    let engine = graph.instance(TypeKey::of::<Engine>());
    engine.downcast_ref::<Engine>()?;
    Some(Arc::new(Car))
}

fn make_nothing(_: &dyn ObjectGraph) -> Option<Instance> {
    None
}

#[derive(Default)]
struct MapGraph(HashMap<TypeKey, Instance>);

impl ObjectGraph for MapGraph {
    fn instance(&self, ty: TypeKey) -> Instance {
        match self.0.get(&ty) {
            Some(instance) => Arc::clone(instance),
            None => panic!("`{ty}` was not constructed"),
        }
    }
}

fn engine_binding(create: CreateFn) -> ConstructibleBinding {
    ConstructibleBinding::new(
        TypeKey::of::<Engine>(),
        create,
        smallvec![],
        Allocation::arena::<Engine>(),
    )
}

#[test]
fn constructible_equivalence_uses_create_and_allocation() {
    let a = engine_binding(make_engine);
    let b = engine_binding(make_engine);
    let c = engine_binding(make_engine_v8);
    assert!(a.is_equivalent(&b));
    assert!(!a.is_equivalent(&c));

    let mut external = engine_binding(make_engine);
    external.allocation = Allocation::External;
    assert!(!a.is_equivalent(&external));
}

#[test]
fn constructed_equivalence_uses_pointer_identity() {
    let shared: Instance = Arc::new(Engine(1));
    let a = ConstructedBinding::new(TypeKey::of::<Engine>(), Arc::clone(&shared));
    let b = ConstructedBinding::new(TypeKey::of::<Engine>(), shared);
    let other = ConstructedBinding::new(TypeKey::of::<Engine>(), Arc::new(Engine(1)));
    assert!(a.is_equivalent(&b));
    assert!(!a.is_equivalent(&other));
}

#[test]
fn constructed_and_constructible_never_equivalent() {
    let constructed: Binding =
        ConstructedBinding::new(TypeKey::of::<Engine>(), Arc::new(Engine(1))).into();
    let constructible: Binding = engine_binding(make_engine).into();
    assert!(!constructed.is_equivalent(&constructible));
    assert!(!constructible.is_equivalent(&constructed));
}

#[test]
fn binding_accessors() {
    let car: Binding = ConstructibleBinding::new(
        TypeKey::of::<Car>(),
        make_car,
        smallvec![TypeKey::of::<Engine>()],
        Allocation::External,
    )
    .into();
    assert_eq!(car.ty(), TypeKey::of::<Car>());
    assert_eq!(car.deps(), &[TypeKey::of::<Engine>()]);
    assert_eq!(car.allocation(), Some(Allocation::External));
    assert!(car.as_constructible().is_some());

    let engine: Binding =
        ConstructedBinding::new(TypeKey::of::<Engine>(), Arc::new(Engine(2))).into();
    assert!(engine.deps().is_empty());
    assert_eq!(engine.allocation(), None);
}

#[test]
fn construct_reads_dependencies_from_graph() {
    let mut graph = MapGraph::default();
    let engine = engine_binding(make_engine).construct(&graph);
    graph.0.insert(TypeKey::of::<Engine>(), engine);

    let car = ConstructibleBinding::new(
        TypeKey::of::<Car>(),
        make_car,
        smallvec![TypeKey::of::<Engine>()],
        Allocation::arena::<Car>(),
    );
    assert!(car.construct(&graph).downcast_ref::<Car>().is_some());
}

#[test]
#[should_panic(expected = "returned no instance")]
fn construct_panics_on_null_instance() {
    let binding = engine_binding(make_nothing);
    let _ = binding.construct(&MapGraph::default());
}

#[test]
fn allocation_heap_slot() {
    assert!(Allocation::arena::<u64>().needs_heap_slot());
    assert!(!Allocation::External.needs_heap_slot());
    assert!(!Allocation::Shared.needs_heap_slot());
}
