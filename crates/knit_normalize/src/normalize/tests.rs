use pretty_assertions::assert_eq;

use knit_ir::{Binding, Entry};

use super::*;
use crate::test_helpers::*;

fn undoable_base() -> NormalizedComponentStorage {
    normalize_with_undoable_compression(bind_interface::<Iface, Impl>(&[]), &[]).unwrap()
}

fn layer_err<Base: NormalizedBase + ?Sized>(entries: Vec<Entry>, base: &Base) -> NormalizationError {
    match normalize_layered(entries, base) {
        Ok(_) => panic!("expected layered normalization to fail"),
        Err(err) => err,
    }
}

// ── Standalone ──────────────────────────────────────────────────

#[test]
fn compression_modes() {
    let disabled = normalize(bind_interface::<Iface, Impl>(&[]), &[], CompressionMode::Disabled)
        .unwrap();
    assert_eq!(disabled.num_bindings(), 2);

    let permanent =
        normalize_with_permanent_compression(bind_interface::<Iface, Impl>(&[]), &[]).unwrap();
    assert_eq!(permanent.num_bindings(), 1);
    assert_eq!(permanent.compression_mode(), CompressionMode::Permanent);
    assert_eq!(permanent.compression_undos().count(), 0);

    let undoable = undoable_base();
    assert_eq!(undoable.num_bindings(), 1);
    assert_eq!(undoable.compression_mode(), CompressionMode::Undoable);
    assert_eq!(undoable.compression_undos().count(), 1);
}

#[test]
fn default_mode_is_permanent() {
    assert_eq!(CompressionMode::default(), CompressionMode::Permanent);
}

#[test]
fn compression_keeps_layout() {
    let disabled = normalize(bind_interface::<Iface, Impl>(&[]), &[], CompressionMode::Disabled)
        .unwrap();
    let compressed = undoable_base();

    assert_eq!(disabled.layout(), compressed.layout());
    assert_eq!(compressed.layout().num_arena_objects(), 1);
}

#[test]
fn exposed_types_are_not_compressed() {
    let storage =
        normalize_with_permanent_compression(bind_interface::<Iface, Impl>(&[]), &[key::<Impl>()])
            .unwrap();

    assert_eq!(storage.num_bindings(), 2);
}

// ── Layered ─────────────────────────────────────────────────────

#[test]
fn layer_dependency_undoes_compression() {
    let base = undoable_base();
    let layer = normalize_layered(vec![constructible::<B>(&[key::<Impl>()]).into()], &base).unwrap();

    assert_eq!(layer.undone(), &[key::<Impl>()]);
    assert_eq!(
        layer.binding(key::<Impl>()),
        Some(&Binding::from(constructible::<Impl>(&[])))
    );
    assert_eq!(
        layer.binding(key::<Iface>()),
        Some(&Binding::from(interface::<Iface, Impl>()))
    );
    // The base is untouched.
    assert!(base.binding(key::<Impl>()).is_none());
    // Only `B` is new; `Impl` was already counted by the base.
    assert_eq!(layer.layout().num_arena_objects(), 2);
}

#[test]
fn depending_on_the_interface_keeps_compression() {
    let base = undoable_base();
    let layer = normalize_layered(vec![constructible::<B>(&[key::<Iface>()]).into()], &base).unwrap();

    assert!(layer.undone().is_empty());
    assert!(layer.binding(key::<Impl>()).is_none());
    assert!(layer
        .binding(key::<Iface>())
        .unwrap()
        .as_constructible()
        .unwrap()
        .uses(create_as::<Iface, Impl>));
}

#[test]
fn multibinding_dependency_undoes_compression() {
    let base = undoable_base();
    let layer = normalize_layered(vec![multibinding::<Listener>(&[key::<Impl>()])], &base).unwrap();

    assert_eq!(layer.undone(), &[key::<Impl>()]);
    assert_eq!(layer.multibindings(key::<Listener>()).map(|s| s.len()), Some(1));
}

#[test]
fn redeclared_implementation_restores_compression() {
    let base = undoable_base();
    let layer = normalize_layered(vec![constructible::<Impl>(&[]).into()], &base).unwrap();

    assert_eq!(layer.undone(), &[key::<Impl>()]);
    assert_eq!(layer.delta().num_bindings(), 2);
    assert_eq!(layer.layout(), base.layout());
}

#[test]
fn redeclared_implementation_must_match() {
    let base = undoable_base();
    let err = layer_err(vec![constructible_alt::<Impl>().into()], &base);

    assert_eq!(err, NormalizationError::ConflictingBinding { ty: key::<Impl>() });
}

#[test]
fn redeclared_interface_is_accepted_in_either_form() {
    let base = undoable_base();
    let layer = normalize_layered(vec![interface::<Iface, Impl>().into()], &base).unwrap();

    assert_eq!(layer.delta().num_bindings(), 0);
    assert!(layer.undone().is_empty());
}

#[test]
fn permanent_base_cannot_undo() {
    let base =
        normalize_with_permanent_compression(bind_interface::<Iface, Impl>(&[]), &[]).unwrap();
    let layer = normalize_layered(vec![constructible::<B>(&[key::<Impl>()]).into()], &base).unwrap();

    assert!(layer.undone().is_empty());
    assert!(layer.binding(key::<Impl>()).is_none());
}

#[test]
fn layer_conflicting_with_base_fails() {
    let base = normalize(vec![constructible::<A>(&[]).into()], &[], CompressionMode::Disabled).unwrap();
    let err = layer_err(vec![constructible_alt::<A>().into()], &base);

    assert_eq!(err, NormalizationError::ConflictingBinding { ty: key::<A>() });
}

#[test]
fn layer_appends_to_base_multibindings() {
    let base = normalize(
        vec![multibinding::<Listener>(&[]), multibinding::<Listener>(&[])],
        &[],
        CompressionMode::Disabled,
    )
    .unwrap();
    let layer = normalize_layered(vec![multibinding::<Listener>(&[])], &base).unwrap();

    assert_eq!(layer.multibindings(key::<Listener>()).map(|s| s.len()), Some(3));
    assert_eq!(base.multibindings(key::<Listener>()).map(|s| s.len()), Some(2));
    // One set, counted by the base.
    assert_eq!(
        layer.layout().num_external_objects(),
        base.layout().num_external_objects()
    );
}

#[test]
fn layer_ignores_compression_markers() {
    let base = normalize(vec![constructible::<A>(&[]).into()], &[], CompressionMode::Undoable).unwrap();
    let layer = normalize_layered(bind_interface::<Iface, Impl>(&[]), &base).unwrap();

    assert_eq!(layer.delta().num_bindings(), 2);
    assert_eq!(layer.delta().compression_undos().count(), 0);
}

#[test]
fn layers_stack() {
    let base = normalize(vec![constructible::<A>(&[]).into()], &[], CompressionMode::Disabled).unwrap();
    let first = normalize_layered(vec![constructible::<B>(&[key::<A>()]).into()], &base).unwrap();
    let second = normalize_layered(
        vec![
            constructible::<C>(&[key::<A>(), key::<B>()]).into(),
            constructible::<B>(&[key::<A>()]).into(),
        ],
        &first,
    )
    .unwrap();

    assert_eq!(second.delta().num_bindings(), 1);
    assert!(second.binding(key::<A>()).is_some());
    assert!(second.binding(key::<B>()).is_some());
    assert_eq!(second.layout().num_arena_objects(), 3);
}

#[test]
fn stacked_layer_sees_undo_through_first_layer() {
    let base = undoable_base();
    let first = normalize_layered(vec![constructible::<A>(&[]).into()], &base).unwrap();
    let second = normalize_layered(vec![constructible::<B>(&[key::<Impl>()]).into()], &first).unwrap();

    assert_eq!(second.undone(), &[key::<Impl>()]);
    assert!(second.binding(key::<Impl>()).is_some());
}
