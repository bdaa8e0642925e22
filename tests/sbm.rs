use foodwebs::{BlockConfig, BlockModel, Generator};
use std::collections::BTreeMap;

fn numeric_config(n_species: usize, n_blocks: usize, seed: u64) -> BlockConfig {
    BlockConfig {
        n_species: Some(n_species),
        n_blocks,
        n_numeric_attributes: 1,
        seed: Some(seed),
        ..BlockConfig::default()
    }
}

#[test]
fn block_structure_is_consistent() {
    let mut model = BlockModel::new(&numeric_config(20, 4, 3)).expect("failed to construct model");
    let web = model.generate().expect("failed to generate web");
    let params = model.params().expect("params missing after generation");

    assert_eq!(web.n_species(), 20);
    assert_eq!(params.block_sizes.len(), 4);
    assert_eq!(params.block_sizes.iter().sum::<usize>(), 20);

    let mut expected = Vec::new();
    for (block, &size) in params.block_sizes.iter().enumerate() {
        expected.extend(std::iter::repeat_n(block, size));
    }
    assert_eq!(params.block_assignments, expected);

    for id in 0..web.n_species() {
        assert_eq!(web.species(id).block, Some(params.block_assignments[id]));
    }
}

#[test]
fn scaled_attributes_lie_in_unit_interval() {
    let mut model = BlockModel::new(&numeric_config(20, 4, 3)).expect("failed to construct model");
    let web = model.generate().expect("failed to generate web");

    let values: Vec<f64> = (0..web.n_species())
        .map(|id| web.species(id).attributes["numeric_attr_0"])
        .collect();
    assert!(values.iter().all(|&value| (0.0..=1.0).contains(&value)));

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    assert!(
        (min == 0.0 && max == 1.0) || values.iter().all(|&value| value == 1.0),
        "scaling endpoints missing: min {min}, max {max}"
    );
}

#[test]
fn binary_attributes_stay_binary() {
    let cfg = BlockConfig {
        n_species: Some(12),
        n_blocks: 2,
        n_binary_attributes: 2,
        seed: Some(6),
        ..BlockConfig::default()
    };
    let mut model = BlockModel::new(&cfg).expect("failed to construct model");
    let web = model.generate().expect("failed to generate web");

    for id in 0..web.n_species() {
        for (name, &value) in &web.species(id).attributes {
            assert!(
                value == 0.0 || value == 1.0,
                "binary attribute {name} of species {id} is {value}"
            );
        }
    }
}

#[test]
fn hierarchical_bias_forces_edge_direction() {
    let cfg = BlockConfig {
        n_species: Some(6),
        n_blocks: 2,
        n_numeric_attributes: 1,
        block_sizes: Some(vec![3, 3]),
        block_probabilities: Some(vec![vec![0.0, 1.0], vec![0.0, 0.0]]),
        reciprocal_proportion: 0.0,
        seed: Some(2),
        ..BlockConfig::default()
    };
    let mut model = BlockModel::new(&cfg).expect("failed to construct model");
    let web = model.generate().expect("failed to generate web");
    let params = model.params().expect("params missing after generation");

    // Every block-0 -> block-1 edge is certain, every other edge impossible.
    assert_eq!(web.n_links(), 9);
    for (prey, consumer) in web.links() {
        assert_eq!(params.block_assignments[prey], 0);
        assert_eq!(params.block_assignments[consumer], 1);
    }
}

#[test]
fn explicit_attributes_are_scaled() {
    let mut species_attributes = BTreeMap::new();
    for (id, mass) in [(0, 2.0), (1, 4.0), (2, 4.0)] {
        let attrs: BTreeMap<String, f64> =
            [("mass".to_owned(), mass), ("depth".to_owned(), 7.0)].into();
        species_attributes.insert(id, attrs);
    }
    let cfg = BlockConfig {
        species_attributes: Some(species_attributes),
        n_blocks: 1,
        reciprocal_proportion: 1.0,
        seed: Some(5),
        ..BlockConfig::default()
    };
    let mut model = BlockModel::new(&cfg).expect("failed to construct model");
    let web = model.generate().expect("failed to generate web");

    assert_eq!(web.n_species(), 3);
    assert_eq!(web.species(0).attributes["mass"], 0.0);
    assert_eq!(web.species(1).attributes["mass"], 1.0);
    assert_eq!(web.species(2).attributes["mass"], 1.0);
    // All carriers share one depth value, so scaling degenerates to 1.0.
    for id in 0..3 {
        assert_eq!(web.species(id).attributes["depth"], 1.0);
    }
}

#[test]
fn same_seed_reproduces_web_and_params() {
    let mut first = BlockModel::new(&numeric_config(15, 3, 9)).expect("failed to construct model");
    let mut second =
        BlockModel::new(&numeric_config(15, 3, 9)).expect("failed to construct model");

    let web_a = first.generate().expect("failed to generate web");
    let web_b = second.generate().expect("failed to generate web");
    assert_eq!(web_a.links(), web_b.links());

    let params_a = first.params().expect("params missing after generation");
    let params_b = second.params().expect("params missing after generation");
    assert_eq!(params_a.block_sizes, params_b.block_sizes);
    assert_eq!(params_a.block_probabilities, params_b.block_probabilities);
    assert_eq!(params_a.attribute_values, params_b.attribute_values);
}

#[test]
fn rejects_invalid_configuration() {
    let valid = numeric_config(6, 2, 0);

    let cfg = BlockConfig {
        n_species: None,
        ..valid.clone()
    };
    assert!(BlockModel::new(&cfg).is_err());

    let cfg = BlockConfig {
        n_numeric_attributes: 0,
        ..valid.clone()
    };
    assert!(BlockModel::new(&cfg).is_err());

    let cfg = BlockConfig {
        n_species: Some(1),
        ..valid.clone()
    };
    assert!(BlockModel::new(&cfg).is_err());

    let cfg = BlockConfig {
        n_blocks: 0,
        ..valid.clone()
    };
    assert!(BlockModel::new(&cfg).is_err());

    let cfg = BlockConfig {
        reciprocal_proportion: 1.5,
        ..valid.clone()
    };
    assert!(BlockModel::new(&cfg).is_err());

    let cfg = BlockConfig {
        block_sizes: Some(vec![2, 2]),
        ..valid.clone()
    };
    assert!(BlockModel::new(&cfg).is_err());

    let cfg = BlockConfig {
        block_sizes: Some(vec![2, 2, 2]),
        ..valid.clone()
    };
    assert!(BlockModel::new(&cfg).is_err());

    let cfg = BlockConfig {
        block_probabilities: Some(vec![vec![0.5]]),
        ..valid.clone()
    };
    assert!(BlockModel::new(&cfg).is_err());

    let cfg = BlockConfig {
        block_probabilities: Some(vec![vec![0.5, 1.5], vec![0.2, 0.3]]),
        ..valid.clone()
    };
    assert!(BlockModel::new(&cfg).is_err());
}
