use foodwebs::persist;
use foodwebs::{BlockConfig, BlockModel, FoodWeb, Generator, NicheConfig, NicheModel};
use std::{fs, path::PathBuf};

fn test_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(name);
    fs::remove_dir_all(&dir).ok();
    fs::create_dir_all(&dir).expect("failed to create test directory");
    dir
}

fn block_web() -> FoodWeb {
    let cfg = BlockConfig {
        n_species: Some(8),
        n_blocks: 2,
        n_binary_attributes: 1,
        n_numeric_attributes: 1,
        seed: Some(4),
        ..BlockConfig::default()
    };
    let mut model = BlockModel::new(&cfg).expect("failed to construct model");
    model.generate().expect("failed to generate web")
}

fn assert_webs_equal(left: &FoodWeb, right: &FoodWeb) {
    assert_eq!(left.n_species(), right.n_species());
    assert_eq!(left.links(), right.links());
    for id in 0..left.n_species() {
        assert_eq!(left.species(id).block, right.species(id).block);
        assert_eq!(left.species(id).attributes, right.species(id).attributes);
    }
}

#[test]
fn graphml_round_trip_preserves_web() {
    let dir = test_dir("graphml_round_trip");
    let web = block_web();

    let file = dir.join("web.graphml");
    persist::write_graphml(&web, &file).expect("failed to write graphml");
    let restored = persist::read_graphml(&file).expect("failed to read graphml");

    assert_webs_equal(&web, &restored);
}

#[test]
fn flat_round_trip_preserves_web() {
    let dir = test_dir("flat_round_trip");
    let web = block_web();

    persist::write_flat(&web, &dir).expect("failed to write flat files");
    assert!(dir.join("attributes.csv").exists());
    let restored = persist::read_flat(&dir).expect("failed to read flat files");

    assert_webs_equal(&web, &restored);
}

#[test]
fn attribute_table_is_omitted_for_bare_webs() {
    let dir = test_dir("bare_flat_round_trip");
    let cfg = NicheConfig {
        n_species: 10,
        connectance: 0.2,
        seed: Some(1),
    };
    let mut model = NicheModel::new(&cfg).expect("failed to construct model");
    let web = model.generate().expect("failed to generate web");

    persist::write_flat(&web, &dir).expect("failed to write flat files");
    assert!(!dir.join("attributes.csv").exists());
    let restored = persist::read_flat(&dir).expect("failed to read flat files");

    assert_webs_equal(&web, &restored);
}

#[test]
fn edgeless_nodes_survive_round_trips() {
    let dir = test_dir("edgeless_round_trip");
    let mut web = FoodWeb::new(3);
    web.add_link(0, 1);

    let file = dir.join("web.graphml");
    persist::write_graphml(&web, &file).expect("failed to write graphml");
    let restored = persist::read_graphml(&file).expect("failed to read graphml");
    assert_eq!(restored.n_species(), 3);
    assert!(restored.is_isolate(2));

    persist::write_flat(&web, &dir).expect("failed to write flat files");
    let restored = persist::read_flat(&dir).expect("failed to read flat files");
    assert_eq!(restored.n_species(), 3);
    assert!(restored.is_isolate(2));
    assert_webs_equal(&web, &restored);
}
