//! Master creation end to end against the in-memory store.

use fridge_backend::models::{Address, Grid, StockFields, Well, WellContents};
use fridge_backend::repositories::{MemoryPlateStore, PlateStore};
use fridge_backend::services::slot_planner::destination_slots;
use fridge_backend::services::{
    InventoryIndex, LayoutStrategy, MasterRequest, MasterService, Orientation, PlateError,
    SourceItem,
};

fn at(label: &str) -> Address {
    label.parse().expect("label")
}

/// fr1..fr10 on a1..a10, shuffled so the layout strategy has work to do.
fn seed_stock(store: &MemoryPlateStore, volume: f64) -> i32 {
    let order = [7, 2, 10, 1, 5, 9, 3, 8, 4, 6];
    let wells: Grid<Well> = order
        .iter()
        .enumerate()
        .map(|(i, n)| (Address::ALL[i], Well::new(format!("fr{n}"), format!("EC{n}"), volume)))
        .collect();
    let stock = store
        .create_stock(
            StockFields {
                name: "library".into(),
                species: Some("E. coli".into()),
                ..StockFields::default()
            },
            wells,
        )
        .expect("create stock");
    stock.plate_id
}

fn request(plate_id: i32, orientation: Orientation) -> MasterRequest {
    MasterRequest {
        plate_id,
        items: None,
        dose: 2.0,
        replicates: 3,
        plate_count: 1,
        strategy: LayoutStrategy::AscendingFr,
        orientation,
        name: "triplicates".into(),
    }
}

#[test]
fn triplicates_land_in_order_and_debit_six_each() {
    let store = MemoryPlateStore::new();
    let plate_id = seed_stock(&store, 20.0);
    let service = MasterService::new(&store, 3);

    let master = service
        .create_master(&request(plate_id, Orientation::Horizontally))
        .expect("create master");
    let detail = service.get(master.id).expect("detail");
    assert_eq!(detail.plates.len(), 1);
    let wells = &detail.plates[0].wells;

    let slots = destination_slots(3).expect("slots");
    for (k, copies) in slots.chunks(3).take(10).enumerate() {
        let expected = format!("fr{}", k + 1);
        for address in copies {
            assert_eq!(wells[*address].fr(), Some(expected.as_str()));
            assert_eq!(wells[*address].upper.volume, 2.0);
            assert_eq!(wells[*address].lower.volume, 2.0);
        }
    }
    assert_eq!(wells.iter().filter(|(_, w)| w.is_occupied()).count(), 30);
    assert!(!wells[at("a1")].is_occupied());
    assert!(!wells[at("b3")].is_occupied());

    let source = store.load_stock_plate(plate_id).expect("source");
    for i in 0..10 {
        assert_eq!(source.wells[Address::ALL[i]].volume, 14.0);
    }
    assert_eq!(master.volume, 2.0);
    assert_eq!(master.species.as_deref(), Some("E. coli"));
}

#[test]
fn vertical_copies_run_down_the_first_column() {
    let store = MemoryPlateStore::new();
    let plate_id = seed_stock(&store, 20.0);
    let service = MasterService::new(&store, 3);

    let master = service
        .create_master(&request(plate_id, Orientation::Vertically))
        .expect("create master");
    let plate = &service.get(master.id).expect("detail").plates[0];
    for label in ["c1", "d1", "e1"] {
        assert_eq!(plate.wells[at(label)].fr(), Some("fr1"));
    }
    for label in ["f1", "g1", "h1"] {
        assert_eq!(plate.wells[at(label)].fr(), Some("fr2"));
    }
}

#[test]
fn shortfall_leaves_everything_as_it_was() {
    let store = MemoryPlateStore::new();
    let plate_id = seed_stock(&store, 20.0);
    let mut source = store.load_stock_plate(plate_id).expect("source");
    source.wells[Address::ALL[4]].volume = 5.0;
    store.save_stock_plate(&source).expect("save");
    let before = store.load_stock_plate(plate_id).expect("source");

    let service = MasterService::new(&store, 3);
    let err = service
        .create_master(&request(plate_id, Orientation::Vertically))
        .expect_err("not enough volume");
    match err {
        PlateError::InsufficientVolume {
            address,
            available,
            requested,
            ..
        } => {
            assert_eq!(address, Address::ALL[4]);
            assert_eq!(available, 5.0);
            assert_eq!(requested, 6.0);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(store.load_stock_plate(plate_id).expect("source"), before);
    assert!(store.list_masters().expect("masters").is_empty());
}

#[test]
fn picked_items_only_consume_what_was_placed() {
    let store = MemoryPlateStore::new();
    let plate_id = seed_stock(&store, 20.0);
    let service = MasterService::new(&store, 3);

    let mut req = request(plate_id, Orientation::Horizontally);
    req.items = Some(vec![
        SourceItem::new("fr3", "EC3", 20.0),
        SourceItem::new("fr1", "EC1", 20.0),
    ]);
    req.strategy = LayoutStrategy::ClickOrder;
    req.plate_count = 2;
    service.create_master(&req).expect("create master");

    let source = store.load_stock_plate(plate_id).expect("source");
    for (_, well) in source.wells.iter().filter(|(_, w)| w.is_occupied()) {
        let expected = match well.fr() {
            Some("fr1") | Some("fr3") => 8.0,
            _ => 20.0,
        };
        assert_eq!(well.volume, expected, "{:?}", well.fr());
    }
}

#[test]
fn picks_must_name_wells_on_the_source_plate() {
    let store = MemoryPlateStore::new();
    let plate_id = seed_stock(&store, 10.0);
    let service = MasterService::new(&store, 3);
    let before = store.load_stock_plate(plate_id).expect("source");

    let mut req = request(plate_id, Orientation::Horizontally);
    req.strategy = LayoutStrategy::ClickOrder;
    req.items = Some(vec![
        SourceItem::new("FR999", "EC777", 10.0),
        SourceItem::new("fr1", "ECWRONG", 10.0),
    ]);
    assert!(matches!(
        service.create_master(&req),
        Err(PlateError::InvalidRequest(_))
    ));
    req.items = Some(vec![SourceItem::new("", "EC1", 10.0)]);
    assert!(matches!(
        service.create_master(&req),
        Err(PlateError::InvalidRequest(_))
    ));
    assert_eq!(store.load_stock_plate(plate_id).expect("source"), before);
    assert!(store.list_masters().expect("masters").is_empty());

    // a real FR with a stale EC is laid out under the plate's EC
    req.items = Some(vec![SourceItem::new("fr1", "ECWRONG", 10.0)]);
    let master = service.create_master(&req).expect("create master");
    let plate = &service.get(master.id).expect("detail").plates[0];
    for label in ["c1", "c2", "c3"] {
        assert_eq!(plate.wells[at(label)].fr(), Some("fr1"));
        assert_eq!(plate.wells[at(label)].ec(), Some("EC1"));
    }
    let index = InventoryIndex::snapshot(&store).expect("snapshot");
    assert!(index.search("ECWRONG").is_empty());
}

#[test]
fn new_master_plates_show_up_in_the_inventory() {
    let store = MemoryPlateStore::new();
    let plate_id = seed_stock(&store, 20.0);
    let service = MasterService::new(&store, 3);
    let master = service
        .create_master(&request(plate_id, Orientation::Horizontally))
        .expect("create master");

    let index = InventoryIndex::snapshot(&store).expect("snapshot");
    assert_eq!(index.plates().len(), 2);
    let groups = index.aggregate_by_external_code();
    let ec1 = groups.iter().find(|g| g.ec == "EC1").expect("EC1 group");
    // 14 left on the stock plate, three dual wells of 2 + 2 on the master plate
    assert_eq!(ec1.volume, 26.0);
    assert_eq!(ec1.frs.len(), 2);

    let master_plate_id = service.get(master.id).expect("detail").plates[0].id;
    // EC1 and EC10 on each plate; the three identical master wells collapse
    assert_eq!(index.search("ec1").len(), 4);
    assert!(index
        .search("EC10")
        .iter()
        .any(|hit| hit.plate_id == master_plate_id));

    service
        .apply(master.id, fridge_backend::models::LifecycleAction::Delete)
        .expect("delete");
    let index = InventoryIndex::snapshot(&store).expect("snapshot");
    assert_eq!(index.plates().len(), 1);
}
