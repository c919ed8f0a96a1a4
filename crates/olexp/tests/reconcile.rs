//! Collection/outline reconciliation scenarios.

mod common;

use std::sync::Arc;

use common::{Harness, tile, vector};
use olexp::layer::layer_eq;
use olexp::prelude::*;

#[test]
fn front_insertion_order() {
    let h = Harness::new();
    h.map.layers.push(tile("OSM"));
    h.map.layers.push(tile("Stamen"));

    assert_eq!(h.outline.texts("layers"), vec!["Stamen", "OSM"]);
}

#[test]
fn every_layer_has_an_item_and_a_node() {
    let h = Harness::new();
    let layers: Vec<LayerRef> = (0..5).map(|i| tile(&format!("L{i}"))).collect();
    for layer in &layers {
        h.map.layers.push(layer.clone());
    }

    let manager = h.explorer.layers();
    assert_eq!(manager.len(), h.map.layers.len());
    for layer in &layers {
        let item = manager.get_by_layer(layer, false).expect("tracked");
        assert!(layer_eq(item.layer(), layer));
        assert!(h.outline.get(item.id()).is_some());
    }
}

#[test]
fn reconcile_twice_adds_nothing() {
    let h = Harness::new();
    h.map.layers.push(tile("A"));
    h.map.layers.push(tile("B"));
    let nodes = h.outline.node_count();

    h.explorer.layers().reconcile();
    h.explorer.layers().reconcile();

    assert_eq!(h.explorer.layers().len(), 2);
    assert_eq!(h.outline.node_count(), nodes);
}

#[test]
fn group_with_two_vectors() {
    let h = Harness::new();
    let group = Layer::group(vec![vector("Roads"), vector("Rivers")]).into_ref();
    h.map.layers.push(group);

    let manager = h.explorer.layers();
    assert_eq!(manager.len(), 1);
    assert_eq!(h.ids("layers"), vec!["layers-1"]);

    let child = manager.manager("layers-1").expect("group manager");
    assert_eq!(child.len(), 2);
    assert_eq!(h.outline.texts("layers-1"), vec!["Rivers", "Roads"]);
    assert_eq!(h.outline.get("layers-1").unwrap().nodes.len(), 2);
}

#[test]
fn child_layer_lands_under_its_group() {
    let h = Harness::new();
    let children = Arc::new(LayerCollection::new());
    h.map.layers.push(Layer::group_with(children.clone()).with_name("Group").into_ref());

    children.push(tile("Inner"));

    assert_eq!(h.ids("layers"), vec!["layers-1"]);
    assert_eq!(h.ids("layers-1"), vec!["layers-1-1"]);
    assert_eq!(h.explorer.layers().len(), 1);
}

#[test]
fn nested_groups_get_nested_managers() {
    let h = Harness::new();
    let inner = Layer::group(vec![tile("Deep")]).with_name("Inner").into_ref();
    let outer = Layer::group(vec![inner]).with_name("Outer").into_ref();
    h.map.layers.push(outer);

    let deep = h.explorer.get_by_id("layers-1-1-1").expect("deep item");
    assert_eq!(deep.name(), "Deep");
    assert_eq!(h.outline.parent_of("layers-1-1-1").as_deref(), Some("layers-1-1"));
    assert!(h.explorer.layers().owner_of("layers-1-1-1").is_some());
}

#[test]
fn external_removal_publishes_remove_item() {
    let h = Harness::new();
    let events = h.record_events();
    let osm = tile("OSM");
    h.map.layers.push(osm.clone());
    h.map.layers.push(tile("Stamen"));

    h.map.layers.remove(&osm);

    assert_eq!(
        *events.lock(),
        vec![("remove:item".to_string(), Some("layers-1".to_string()))]
    );
    assert_eq!(h.ids("layers"), vec!["layers-2"]);
    assert!(h.explorer.get_by_id("layers-1").is_none());
}

#[test]
fn removal_inside_group_is_reported() {
    let h = Harness::new();
    let events = h.record_events();
    let children = Arc::new(LayerCollection::new());
    h.map.layers.push(Layer::group_with(children.clone()).into_ref());
    let inner = tile("Inner");
    children.push(inner.clone());

    children.remove(&inner);

    assert_eq!(
        *events.lock(),
        vec![("remove:item".to_string(), Some("layers-1-1".to_string()))]
    );
    assert!(h.ids("layers-1").is_empty());
}

#[test]
fn lookups_at_any_depth() {
    let h = Harness::new();
    let deep = tile("Deep");
    h.map.layers.push(Layer::group(vec![deep.clone()]).into_ref());

    let by_layer = h.explorer.get_by_layer(&deep).expect("found by layer");
    assert_eq!(by_layer.id(), "layers-1-1");
    assert!(h.explorer.layers().get_by_layer(&deep, false).is_none());
    assert!(h.explorer.get_by_id("layers-404").is_none());
    assert!(h.explorer.get_by_layer(&tile("Stranger")).is_none());
}

#[test]
fn set_layers_retargets() {
    let h = Harness::new();
    let events = h.record_events();
    h.map.layers.push(tile("Old"));

    let fresh = Arc::new(LayerCollection::from_layers(vec![tile("New A"), tile("New B")]));
    h.explorer.layers().set_layers(fresh.clone());

    assert_eq!(events.lock().len(), 1);
    assert_eq!(h.outline.texts("layers"), vec!["New B", "New A"]);

    h.map.layers.push(tile("Ignored"));
    assert_eq!(h.explorer.layers().len(), 2);

    fresh.push(tile("New C"));
    assert_eq!(h.explorer.layers().len(), 3);
}

#[test]
fn listeners_reach_groups_created_later() {
    let h = Harness::new();
    let events = h.record_events();

    let children = Arc::new(LayerCollection::new());
    h.map.layers.push(Layer::group_with(children.clone()).into_ref());
    let inner = tile("Inner");
    children.push(inner.clone());
    children.remove(&inner);

    assert_eq!(
        *events.lock(),
        vec![("remove:item".to_string(), Some("layers-1-1".to_string()))]
    );
}

#[test]
fn hidden_property_from_settings() {
    let settings = ExplorerSettings {
        hidden_property: "internal".into(),
        ..ExplorerSettings::default()
    };
    let h = Harness::with_settings(settings);
    h.map.overlays.push(Layer::overlay(None).with_property("internal", true).into_ref());
    h.map.overlays.push(Layer::overlay(None).into_ref());

    assert_eq!(h.explorer.overlays().len(), 1);
    assert_eq!(h.ids("overlays"), vec!["overlays-1"]);
}

#[test]
fn replaced_layer_is_added_then_removed_in_one_pass() {
    let h = Harness::new();
    let events = h.record_events();
    let old = tile("Same");
    h.map.layers.push(old.clone());

    // Swap the instance without an intermediate notification.
    h.map.layers.length_changed().set_blocked(true);
    h.map.layers.remove(&old);
    h.map.layers.length_changed().set_blocked(false);
    h.map.layers.push(tile("Same"));

    assert_eq!(h.ids("layers"), vec!["layers-2"]);
    assert_eq!(
        *events.lock(),
        vec![("remove:item".to_string(), Some("layers-1".to_string()))]
    );
}
